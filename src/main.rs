//! midimap - extract MIDI note events and map files onto a 2-D similarity plane
//!
//! Subcommands:
//! - `midimap run` - extract the input directory, then embed it (default)
//! - `midimap extract` - write only the corpus dump
//! - `midimap embed` - embed a previously written corpus dump
//! - `midimap neighbors <file>` - list the files nearest to one file

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use midimap_lib::Config;

#[derive(Parser)]
#[command(name = "midimap")]
#[command(about = "Extract MIDI note events and map each file onto a 2-D plane")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args)]
struct GlobalArgs {
    /// TOML config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log per-track details and optimiser progress
    #[arg(short, long, global = true)]
    verbose: bool,

    /// t-SNE perplexity
    #[arg(long, global = true)]
    perplexity: Option<f64>,

    /// t-SNE iterations
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    /// Seed for a reproducible embedding
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the input directory and embed it
    Run {
        /// Directory scanned for files ending in "mid"
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Corpus dump path
        #[arg(long)]
        corpus_out: Option<PathBuf>,

        /// Embedding dump path
        #[arg(long)]
        embedding_out: Option<PathBuf>,
    },

    /// Extract the input directory into a corpus dump
    Extract {
        /// Directory scanned for files ending in "mid"
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Corpus dump path
        #[arg(long)]
        corpus_out: Option<PathBuf>,
    },

    /// Embed a previously written corpus dump
    Embed {
        /// Corpus dump to read
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Embedding dump path
        #[arg(long)]
        embedding_out: Option<PathBuf>,
    },

    /// List the files nearest to FILE in an embedding dump
    Neighbors {
        /// Filename as it appears in the dump
        file: String,

        /// Embedding dump to read
        #[arg(long)]
        embedding: Option<PathBuf>,

        /// Maximum number of files listed
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.global.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = execute(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli.global)?;

    match cli.command.unwrap_or(Commands::Run {
        input: None,
        corpus_out: None,
        embedding_out: None,
    }) {
        Commands::Run { input, corpus_out, embedding_out } => {
            override_path(&mut config.input_directory, input);
            override_path(&mut config.corpus_output, corpus_out);
            override_path(&mut config.embedding_output, embedding_out);
            midimap_lib::run(&config)?;
        }
        Commands::Extract { input, corpus_out } => {
            override_path(&mut config.input_directory, input);
            override_path(&mut config.corpus_output, corpus_out);
            midimap_lib::extract(&config)?;
        }
        Commands::Embed { corpus, embedding_out } => {
            override_path(&mut config.corpus_output, corpus);
            override_path(&mut config.embedding_output, embedding_out);
            midimap_lib::embed_from_dump(&config)?;
        }
        Commands::Neighbors { file, embedding, limit } => {
            override_path(&mut config.embedding_output, embedding);
            let ranked = midimap_lib::neighbors(&config, &file, limit)?;
            for (name, distance) in ranked {
                println!("{:>10.1}  {}", distance, name);
            }
        }
    }

    Ok(())
}

fn load_config(args: &GlobalArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load_or_default(),
    };

    if args.verbose {
        config.verbose = true;
    }
    if let Some(perplexity) = args.perplexity {
        config.perplexity = perplexity;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    if args.seed.is_some() {
        config.random_seed = args.seed;
    }

    Ok(config)
}

fn override_path(target: &mut PathBuf, value: Option<PathBuf>) {
    if let Some(value) = value {
        *target = value;
    }
}
