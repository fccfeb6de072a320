//! The embedding seam: anything that turns text into a fixed-length vector.
//!
//! [`OllamaClient`](crate::ollama::OllamaClient) is the real backend. [`HashEmbedder`]
//! is deterministic and offline, for tests and for trying the pipeline without a model.

use async_trait::async_trait;
use thiserror::Error;

use crate::ollama::OllamaError;

/// Maps text to a vector. Every call on one embedder must return the same length.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

/// Upstream embedding failure. Possibly transient; never retried inside the core.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error(transparent)]
    Ollama(#[from] OllamaError),
    #[error("embedding backend returned no vector")]
    EmptyResponse,
    #[error("embedding backend failed: {0}")]
    Backend(String),
}

/// Deterministic embedder: FNV-1a of the text seeds a splitmix64 stream, one
/// component per step in [-1, 1), then the vector is scaled to unit length.
/// Identical text always maps to the identical vector.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub const DEFAULT_DIMENSION: usize = 64;

    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut state =
            fnv1a_64(text.as_bytes()) ^ (self.dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut v: Vec<f32> = (0..self.dimension)
            .map(|_| {
                let bits = splitmix64(&mut state);
                let mantissa = ((bits >> 32) as u32) >> 9;
                let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
                unit.mul_add(2.0, -1.0)
            })
            .collect();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(self.embed_sync(text))
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_embedder_is_deterministic() {
        let e = HashEmbedder::new(8);
        assert_eq!(e.embed_sync("the cat sat"), e.embed_sync("the cat sat"));
        assert_ne!(e.embed_sync("the cat sat"), e.embed_sync("the dog ran"));
    }

    #[test]
    fn hash_embedder_has_requested_dimension_and_unit_norm() {
        let v = HashEmbedder::new(3).embed_sync("a bird flew");
        assert_eq!(v.len(), 3);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_dimension_is_clamped() {
        assert_eq!(HashEmbedder::new(0).dimension(), 1);
    }

    #[tokio::test]
    async fn trait_object_matches_sync_path() {
        let e = HashEmbedder::new(16);
        let dynamic: &dyn Embedder = &e;
        assert_eq!(dynamic.embed("query").await.unwrap(), e.embed_sync("query"));
    }
}
