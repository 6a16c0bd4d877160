// Corpus -> 2D coordinates in [0, 1000]

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::features::{NoteHistogram, HISTOGRAM_BINS};
use super::reduction::{self, TsneParams};
use crate::corpus::Corpus;
use crate::error::{MidimapError, Result};
use crate::storage;

/// Upper bound of the normalised coordinate range
pub const COORDINATE_SCALE: f64 = 1000.0;

/// Filename -> [x, y], both in [0, 1000]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingResult {
    pub coords: BTreeMap<String, [u32; 2]>,
}

impl EmbeddingResult {
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<[u32; 2]> {
        self.coords.get(filename).copied()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        storage::write_json(path, self)
    }

    pub fn read_json(path: &Path) -> Result<Self> {
        storage::read_json(path)
    }
}

/// Stack one histogram row per file, in corpus order.
pub fn histogram_matrix(corpus: &Corpus) -> Array2<f64> {
    let histograms: Vec<NoteHistogram> = corpus
        .iter()
        .map(|(_, record)| NoteHistogram::from_file(record))
        .collect();

    Array2::from_shape_fn((histograms.len(), HISTOGRAM_BINS), |(i, j)| {
        histograms[i].weight(j) as f64
    })
}

/// Scale every value with one min/max taken over both columns together.
pub fn normalize_global(coords: &Array2<f64>) -> Result<Vec<[u32; 2]>> {
    if coords.iter().any(|v| !v.is_finite()) {
        return Err(MidimapError::DegenerateInput(
            "cannot normalise non-finite coordinates".to_string(),
        ));
    }

    let min = coords.iter().copied().fold(f64::INFINITY, f64::min);
    let max = coords.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if coords.is_empty() || max == min {
        return Err(MidimapError::DegenerateInput(format!(
            "all embedding coordinates are equal ({}); cannot normalise",
            min
        )));
    }

    let range = max - min;
    let scale = |v: f64| ((v - min) / range * COORDINATE_SCALE).round_ties_even() as u32;

    Ok(coords
        .rows()
        .into_iter()
        .map(|row| [scale(row[0]), scale(row[1])])
        .collect())
}

/// Build histograms, reduce them jointly and normalise the result.
pub fn embed_corpus(corpus: &Corpus, params: &TsneParams) -> Result<EmbeddingResult> {
    let matrix = histogram_matrix(corpus);
    log::info!(
        "Embedding {} files (perplexity {}, {} iterations)",
        matrix.nrows(),
        params.perplexity,
        params.max_iterations
    );

    let layout = reduction::tsne(&matrix, params)?;
    let normalized = normalize_global(&layout)?;

    let coords = corpus
        .iter()
        .map(|(name, _)| name.clone())
        .zip(normalized)
        .collect();

    Ok(EmbeddingResult { coords })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{FileRecord, NoteEvent, Track};
    use ndarray::array;

    #[test]
    fn global_extremes_map_to_zero_and_thousand() {
        let coords = array![[-2.0, 0.0], [1.0, 3.0], [0.5, -1.0]];
        let normalized = normalize_global(&coords).unwrap();

        assert_eq!(normalized, vec![[0, 400], [600, 1000], [500, 200]]);
    }

    #[test]
    fn scaling_is_joint_not_per_axis() {
        // x spans 0..1, y spans 0..10; per-axis scaling would stretch x to 1000
        let coords = array![[0.0, 0.0], [1.0, 10.0]];
        let normalized = normalize_global(&coords).unwrap();

        assert_eq!(normalized, vec![[0, 0], [100, 1000]]);
    }

    #[test]
    fn constant_coordinates_are_rejected() {
        let coords = array![[3.0, 3.0], [3.0, 3.0]];
        let err = normalize_global(&coords).unwrap_err();
        assert!(matches!(err, MidimapError::DegenerateInput(_)));
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let coords = array![[0.0, f64::NAN], [1.0, 2.0]];
        assert!(normalize_global(&coords).is_err());
    }

    fn corpus_of(n_files: usize) -> Corpus {
        let mut corpus = Corpus::default();
        for f in 0..n_files {
            let mut track = Track::new(0);
            for k in 0..8 {
                let pitch = 40 + ((f * 5 + k * 3) % 30) as u8;
                track.notes.push(NoteEvent::new(0, pitch, 100, (f as u32 + 1) * (k as u32 + 1)));
            }
            let mut record = FileRecord::new();
            record.insert(0, track);
            corpus.insert(format!("{:02}.mid", f), record);
        }
        corpus
    }

    #[test]
    fn histogram_rows_follow_corpus_order() {
        let corpus = corpus_of(3);
        let matrix = histogram_matrix(&corpus);

        assert_eq!(matrix.dim(), (3, HISTOGRAM_BINS));
        for (row, (_, record)) in matrix.rows().into_iter().zip(corpus.iter()) {
            assert_eq!(row.to_vec(), NoteHistogram::from_file(record).to_vector());
        }
    }

    #[test]
    fn too_small_corpus_is_degenerate() {
        let err = embed_corpus(&corpus_of(3), &TsneParams::default()).unwrap_err();
        assert!(matches!(err, MidimapError::DegenerateInput(_)));
    }

    #[test]
    fn every_file_gets_bounded_coordinates() {
        let corpus = corpus_of(10);
        let params = TsneParams { random_seed: Some(3), ..TsneParams::default() };
        let result = embed_corpus(&corpus, &params).unwrap();

        assert_eq!(result.len(), 10);
        let values: Vec<u32> = result.coords.values().flat_map(|c| c.iter().copied()).collect();
        assert!(values.iter().all(|&v| v <= 1000));
        assert_eq!(values.iter().min(), Some(&0));
        assert_eq!(values.iter().max(), Some(&1000));
        for name in corpus.iter().map(|(name, _)| name) {
            assert!(result.get(name).is_some());
        }
    }

    #[test]
    fn dump_is_filename_to_pair() {
        let mut result = EmbeddingResult::default();
        result.coords.insert("a.mid".to_string(), [0, 1000]);
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"a.mid":[0,1000]}"#);
    }
}
