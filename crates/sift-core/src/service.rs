//! Retrieval service: ingest fragments into a corpus, answer queries against it.
//!
//! The current corpus lives in a single [`ArcSwapOption`] slot. An ingest builds its
//! corpus without touching that slot and then publishes it with one atomic store.
//! A query loads the slot once and works only on that snapshot, so it sees one whole
//! generation even if an ingest lands while it runs. Concurrent ingests are not
//! ordered against each other: the last store wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chunks::{chunk_text, ChunkOptions};
use crate::corpus::{Corpus, CorpusError, Hit};
use crate::embed::{EmbedError, Embedder};
use crate::index::IndexError;

/// Fragments returned by a query when the caller does not say.
pub const DEFAULT_TOP_K: usize = 3;

pub struct RetrievalService {
    embedder: Arc<dyn Embedder>,
    current: ArcSwapOption<Corpus>,
    generations: AtomicU64,
}

/// What a successful ingest published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub generation: u64,
    pub fragments: usize,
    pub dimension: usize,
}

/// Health view of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServiceStatus {
    Empty,
    Ready {
        generation: u64,
        fragments: usize,
        dimension: usize,
    },
}

impl RetrievalService {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            current: ArcSwapOption::empty(),
            generations: AtomicU64::new(0),
        }
    }

    /// Build a corpus from `fragments` and make it current.
    /// On failure the previously current corpus (or none) stays in place.
    pub async fn ingest(&self, fragments: Vec<String>) -> Result<IngestSummary, ServiceError> {
        let count = fragments.len();
        let corpus = match Corpus::from_fragments(fragments, self.embedder.as_ref()).await {
            Ok(corpus) => corpus,
            Err(e) => {
                warn!(fragments = count, error = %e, "ingest failed; keeping previous corpus");
                return Err(e.into());
            }
        };

        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let corpus = corpus.with_generation(generation);
        let summary = IngestSummary {
            generation,
            fragments: corpus.len(),
            dimension: corpus.dimension(),
        };
        self.current.store(Some(Arc::new(corpus)));
        info!(
            generation,
            fragments = summary.fragments,
            dimension = summary.dimension,
            "published corpus"
        );
        Ok(summary)
    }

    /// Chunk `text` and ingest the fragments.
    pub async fn ingest_text(
        &self,
        text: &str,
        options: &ChunkOptions,
    ) -> Result<IngestSummary, ServiceError> {
        let fragments = chunk_text(text, options);
        debug!(
            fragments = fragments.len(),
            words_per_chunk = options.words_per_chunk,
            "chunked document"
        );
        self.ingest(fragments).await
    }

    /// The `k` fragments nearest to `text` in the current corpus, nearest first.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<Hit>, ServiceError> {
        let corpus = self.current.load_full().ok_or(ServiceError::NotReady)?;
        if k == 0 {
            return Err(IndexError::InvalidK.into());
        }

        let embedding = self.embedder.embed(text).await?;
        let hits = corpus.search(&embedding, k)?;
        debug!(
            generation = corpus.generation(),
            k,
            returned = hits.len(),
            "query answered"
        );
        Ok(hits)
    }

    /// Pin the current corpus. The returned snapshot outlives later ingests.
    pub fn snapshot(&self) -> Option<Arc<Corpus>> {
        self.current.load_full()
    }

    pub fn status(&self) -> ServiceStatus {
        match self.current.load().as_deref() {
            None => ServiceStatus::Empty,
            Some(corpus) => ServiceStatus::Ready {
                generation: corpus.generation(),
                fragments: corpus.len(),
                dimension: corpus.dimension(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("no document ingested yet")]
    NotReady,
    #[error("document produced no fragments")]
    EmptyCorpus,
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),
    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

impl ServiceError {
    /// Only upstream embedding failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Embedding(_))
    }
}

impl From<CorpusError> for ServiceError {
    fn from(e: CorpusError) -> Self {
        match e {
            CorpusError::Empty => ServiceError::EmptyCorpus,
            CorpusError::Embedding(e) => ServiceError::Embedding(e),
            CorpusError::Index(e) => ServiceError::Index(e),
        }
    }
}
