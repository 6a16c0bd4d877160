// Error type shared by the extractor, embedder and neighbour query

use std::path::PathBuf;

/// Every failure is fatal to a run; variants carry the offending file or condition.
#[derive(Debug, thiserror::Error)]
pub enum MidimapError {
    #[error("cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse MIDI file {file}: {message}")]
    Parse { file: String, message: String },

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("file not present in embedding: {0}")]
    UnknownFile(String),
}

impl MidimapError {
    pub(crate) fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, MidimapError>;
