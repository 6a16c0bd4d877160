// midimap - MIDI collection note extraction and similarity map
// Main library entry point

pub mod config;
pub mod corpus;
pub mod error;
pub mod similarity;
pub mod storage;

pub use config::Config;
pub use corpus::Corpus;
pub use error::{MidimapError, Result};
pub use similarity::EmbeddingResult;

/// Extract the input directory and write the corpus dump.
pub fn extract(config: &Config) -> Result<Corpus> {
    let corpus = corpus::extract_corpus(&config.input_directory, config.verbose)?;
    corpus.write_json(&config.corpus_output)?;
    Ok(corpus)
}

/// Embed an extracted corpus and write the embedding dump.
pub fn embed(corpus: &Corpus, config: &Config) -> Result<EmbeddingResult> {
    let embedding = similarity::embed_corpus(corpus, &config.tsne_params())?;
    embedding.write_json(&config.embedding_output)?;
    Ok(embedding)
}

/// Re-load a previously written corpus dump and embed it.
pub fn embed_from_dump(config: &Config) -> Result<EmbeddingResult> {
    let corpus = Corpus::read_json(&config.corpus_output)?;
    log::info!(
        "Loaded {} files from {}",
        corpus.len(),
        config.corpus_output.display()
    );
    embed(&corpus, config)
}

/// Full batch job: extract, then embed the in-memory corpus.
pub fn run(config: &Config) -> Result<(Corpus, EmbeddingResult)> {
    let corpus = extract(config)?;
    let embedding = embed(&corpus, config)?;
    log::info!("Mapped {} files", embedding.len());
    Ok((corpus, embedding))
}

/// Rank the files nearest to `target` in a written embedding dump.
pub fn neighbors(config: &Config, target: &str, max_results: usize) -> Result<Vec<(String, f64)>> {
    let embedding = EmbeddingResult::read_json(&config.embedding_output)?;
    similarity::find_nearest(&embedding, target, max_results)
}
