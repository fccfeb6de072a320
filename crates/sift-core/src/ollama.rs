//! Ollama embedding backend. Wraps ollama-rs behind the [`Embedder`] trait.

use async_trait::async_trait;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use ollama_rs::Ollama;
use thiserror::Error;

use crate::embed::{EmbedError, Embedder};

pub const DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Thin wrapper around Ollama for embedding.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    inner: Ollama,
    embed_model: String,
}

impl OllamaClient {
    /// Create from URL string, e.g. `http://localhost:11434`.
    pub fn from_url(url: &str) -> Result<Self, OllamaError> {
        let inner = Ollama::try_new(url).map_err(OllamaError::ParseUrl)?;
        Ok(Self {
            inner,
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
        })
    }

    /// Set the embedding model (e.g. `nomic-embed-text`, `all-minilm`).
    pub fn with_embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = model.into();
        self
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }
}

impl Default for OllamaClient {
    /// Local Ollama on the default port.
    fn default() -> Self {
        Self {
            inner: Ollama::default(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let req = GenerateEmbeddingsRequest::new(
            self.embed_model.clone(),
            EmbeddingsInput::Single(text.to_string()),
        );
        let res = self
            .inner
            .generate_embeddings(req)
            .await
            .map_err(OllamaError::Request)?;
        res.embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or(EmbedError::EmptyResponse)
    }
}

#[derive(Debug, Error)]
pub enum OllamaError {
    #[error("invalid Ollama URL: {0}")]
    ParseUrl(#[from] url::ParseError),
    #[error("Ollama request failed: {0}")]
    Request(#[from] ollama_rs::error::OllamaError),
}
