//! Persisted config (embedding backend, chunk size, result count) in the app data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app_data;
use crate::chunks::{ChunkOptions, DEFAULT_WORDS_PER_CHUNK};
use crate::ollama::{DEFAULT_BASE_URL, DEFAULT_EMBED_MODEL};
use crate::service::DEFAULT_TOP_K;

const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Ollama server used for embeddings.
    pub ollama_url: String,
    pub embed_model: String,
    pub words_per_chunk: usize,
    /// Fragments returned per query.
    pub top_k: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_BASE_URL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            words_per_chunk: DEFAULT_WORDS_PER_CHUNK,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl Config {
    pub fn chunk_options(&self) -> ChunkOptions {
        ChunkOptions::with_words(self.words_per_chunk)
    }
}

/// Path of the config file, if the app data directory is available.
pub fn config_path() -> Option<PathBuf> {
    app_data::app_data_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

/// Load config from the app data directory. Returns default config if missing or invalid.
pub fn load_config() -> Config {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Config::default(),
    }
}

/// Load config from `path`. Missing keys take their defaults; a missing or invalid
/// file yields the default config.
pub fn load_config_from(path: &Path) -> Config {
    let Ok(s) = std::fs::read_to_string(path) else {
        return Config::default();
    };
    toml::from_str(&s).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "invalid config; using defaults");
        Config::default()
    })
}

/// Save config to the app data directory.
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    let path = config_path().ok_or(ConfigError::NoDataDir)?;
    save_config_to(config, &path)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let s = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    std::fs::write(path, s).map_err(ConfigError::Write)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine app data directory")]
    NoDataDir,
    #[error("failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(std::io::Error),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config_from(&dir.path().join("nope.toml")), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "words_per_chunk = 40\n").unwrap();
        let config = load_config_from(&path);
        assert_eq!(config.words_per_chunk, 40);
        assert_eq!(config.top_k, DEFAULT_TOP_K);
        assert_eq!(config.chunk_options(), ChunkOptions::with_words(40));
    }

    #[test]
    fn invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "top_k = \"lots\"").unwrap();
        assert_eq!(load_config_from(&path), Config::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        let config = Config {
            embed_model: "all-minilm".into(),
            top_k: 5,
            ..Config::default()
        };
        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path), config);
    }
}
