// Nearest files in the embedded plane

use super::embedding::EmbeddingResult;
use crate::error::{MidimapError, Result};

/// Euclidean distance between two embedded coordinates
pub fn distance(a: [u32; 2], b: [u32; 2]) -> f64 {
    let dx = a[0] as f64 - b[0] as f64;
    let dy = a[1] as f64 - b[1] as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Find the files closest to `target`, nearest first.
///
/// Ties are broken by filename so the ranking is stable.
pub fn find_nearest(
    embedding: &EmbeddingResult,
    target: &str,
    max_results: usize,
) -> Result<Vec<(String, f64)>> {
    let origin = embedding
        .get(target)
        .ok_or_else(|| MidimapError::UnknownFile(target.to_string()))?;

    let mut ranked: Vec<(String, f64)> = embedding
        .coords
        .iter()
        .filter(|(name, _)| name.as_str() != target)
        .map(|(name, &coords)| (name.clone(), distance(origin, coords)))
        .collect();

    ranked.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(max_results);
    Ok(ranked)
}
