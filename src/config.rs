// Configuration management for midimap

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MidimapError, Result};
use crate::similarity::TsneParams;

/// Run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned for files ending in "mid"
    #[serde(default = "default_input_directory")]
    pub input_directory: PathBuf,

    /// Where the corpus dump is written (and read back by `embed`)
    #[serde(default = "default_corpus_output")]
    pub corpus_output: PathBuf,

    /// Where the embedding dump is written (and read back by `neighbors`)
    #[serde(default = "default_embedding_output")]
    pub embedding_output: PathBuf,

    /// t-SNE perplexity
    #[serde(default = "default_perplexity")]
    pub perplexity: f64,

    /// t-SNE optimisation iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Fixed seed for reproducible embeddings
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Log per-track details while extracting
    #[serde(default)]
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_directory: default_input_directory(),
            corpus_output: default_corpus_output(),
            embedding_output: default_embedding_output(),
            perplexity: default_perplexity(),
            max_iterations: default_max_iterations(),
            random_seed: None,
            verbose: false,
        }
    }
}

impl Config {
    /// Load an explicitly requested config file; any failure is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| MidimapError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        toml::from_str(&contents).map_err(|e| MidimapError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load the config from the default location or return defaults
    pub fn load_or_default() -> Self {
        let config_path = get_config_path();

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(config) => {
                        log::debug!("Loaded config from {}", config_path.display());
                        return config;
                    }
                    Err(e) => {
                        log::warn!("Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read config file: {}", e);
                }
            }
        }

        Self::default()
    }

    /// Save config to disk
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    pub fn tsne_params(&self) -> TsneParams {
        TsneParams {
            perplexity: self.perplexity,
            max_iterations: self.max_iterations,
            random_seed: self.random_seed,
        }
    }
}

/// Get the default config file path
pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("midimap")
        .join("config.toml")
}

fn default_input_directory() -> PathBuf {
    PathBuf::from("midiFiles")
}

fn default_corpus_output() -> PathBuf {
    PathBuf::from("midiData.json")
}

fn default_embedding_output() -> PathBuf {
    PathBuf::from("clusterData.json")
}

fn default_perplexity() -> f64 {
    5.0
}

fn default_max_iterations() -> usize {
    300
}
