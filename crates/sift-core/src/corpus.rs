//! A corpus pairs a [`VectorIndex`] with the fragment text it was built from.
//!
//! Fragment `i` is the text behind handle `i`. A corpus is built in one go and never
//! modified; a new document means a new corpus.

use serde::Serialize;

use crate::embed::{EmbedError, Embedder};
use crate::index::{IndexError, VectorIndex};

/// A fragment returned for a query, with its handle and squared distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub handle: usize,
    pub fragment: String,
    pub distance: f32,
}

#[derive(Debug)]
pub struct Corpus {
    index: VectorIndex,
    fragments: Vec<String>,
    generation: u64,
}

impl Corpus {
    /// Embed every fragment in order and index the results.
    /// Any embedding failure aborts construction.
    pub async fn from_fragments(
        fragments: Vec<String>,
        embedder: &dyn Embedder,
    ) -> Result<Self, CorpusError> {
        if fragments.is_empty() {
            return Err(CorpusError::Empty);
        }

        let mut vectors = Vec::with_capacity(fragments.len());
        for fragment in &fragments {
            vectors.push(embedder.embed(fragment).await?);
        }
        let index = VectorIndex::build(&vectors)?;

        Ok(Self {
            index,
            fragments,
            generation: 0,
        })
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Fragment text for `handle`.
    pub fn resolve(&self, handle: usize) -> Result<&str, IndexError> {
        self.fragments
            .get(handle)
            .map(String::as_str)
            .ok_or(IndexError::InvalidHandle {
                handle,
                len: self.fragments.len(),
            })
    }

    /// Nearest fragments to `query`, nearest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, IndexError> {
        self.index
            .search(query, k)?
            .into_iter()
            .map(|n| {
                Ok(Hit {
                    handle: n.handle,
                    fragment: self.resolve(n.handle)?.to_string(),
                    distance: n.distance,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Ingest generation this corpus was published as (0 if never published).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("no fragments to index")]
    Empty,
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),
    #[error("index error: {0}")]
    Index(#[from] IndexError),
}
