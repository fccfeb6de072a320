//! All backend logic independent of how the app is run.
//!
//! A document is chunked into fragments ([chunks]), each fragment is embedded
//! ([embed], [ollama]), and the vectors go into an exact nearest-neighbour
//! index ([index]). A [corpus] pairs that index with the fragment text, and the
//! [service] keeps the current corpus and answers queries against it.

pub mod app_data;
pub mod chunks;
pub mod config;
pub mod corpus;
pub mod document;
pub mod embed;
pub mod index;
pub mod ollama;
pub mod service;
pub mod watcher;

pub use app_data::app_data_dir;
pub use chunks::{chunk_text, ChunkOptions, DEFAULT_WORDS_PER_CHUNK};
pub use config::{load_config, save_config, Config, ConfigError};
pub use corpus::{Corpus, CorpusError, Hit};
pub use document::{load_document, DocumentError};
pub use embed::{EmbedError, Embedder, HashEmbedder};
pub use index::{IndexError, Neighbor, VectorIndex};
pub use ollama::{OllamaClient, OllamaError};
pub use service::{IngestSummary, RetrievalService, ServiceError, ServiceStatus, DEFAULT_TOP_K};
pub use watcher::{watch_document, DocumentWatcher, WatchError};

/// Returns a short status string. Used to verify the backend is wired up.
pub fn status() -> &'static str {
    "sift-core ready"
}
