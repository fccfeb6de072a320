//! Exact nearest-neighbour index over fixed-dimension embeddings.
//!
//! Vectors are stored row-major in one flat buffer; handle `i` is the `i`-th vector
//! passed to [`VectorIndex::build`]. Search is a brute-force scan using squared
//! Euclidean distance, keeping the best `k` in a bounded max-heap.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;

/// One search result: the handle of a stored vector and its squared distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub handle: usize,
    pub distance: f32,
}

/// Immutable set of same-dimension vectors addressed by insertion order.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    len: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Build an index from `vectors`. Every vector must have the same, non-zero length.
    pub fn build<V: AsRef<[f32]>>(vectors: &[V]) -> Result<Self, IndexError> {
        let first = vectors.first().ok_or(IndexError::EmptyInput)?;
        let dimension = first.as_ref().len();
        if dimension == 0 {
            return Err(IndexError::EmptyInput);
        }

        let mut data = Vec::with_capacity(dimension * vectors.len());
        for v in vectors {
            let v = v.as_ref();
            if v.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: v.len(),
                });
            }
            data.extend_from_slice(v);
        }

        Ok(Self {
            dimension,
            len: vectors.len(),
            data,
        })
    }

    /// Return the `min(k, len)` stored vectors closest to `query`, nearest first.
    /// Equal distances are ordered by ascending handle.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Err(IndexError::InvalidK);
        }

        let k = k.min(self.len);
        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        for (handle, row) in self.rows().enumerate() {
            let mut distance = squared_l2(query, row);
            // total_cmp orders by sign bit first; canonical NaN sorts after +inf.
            if distance.is_nan() {
                distance = f32::NAN;
            }
            let candidate = Candidate { distance, handle };
            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                heap.pop();
                heap.push(candidate);
            }
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                handle: c.handle,
                distance: c.distance,
            })
            .collect())
    }

    /// The stored vector for `handle`.
    pub fn vector(&self, handle: usize) -> Result<&[f32], IndexError> {
        if handle >= self.len {
            return Err(IndexError::InvalidHandle {
                handle,
                len: self.len,
            });
        }
        let start = handle * self.dimension;
        Ok(&self.data[start..start + self.dimension])
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false for a built index.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn rows(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.dimension)
    }
}

/// Squared Euclidean distance. Callers guarantee equal lengths.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Heap entry ordered by (distance, handle); the heap top is the current worst.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f32,
    handle: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.handle.cmp(&other.handle))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("cannot build an index from no vectors")]
    EmptyInput,
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("k must be at least 1")]
    InvalidK,
    #[error("handle {handle} out of range for index of {len} vectors")]
    InvalidHandle { handle: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn handles(neighbors: &[Neighbor]) -> Vec<usize> {
        neighbors.iter().map(|n| n.handle).collect()
    }

    fn grid() -> VectorIndex {
        VectorIndex::build(&[
            vec![0.0, 0.0],
            vec![3.0, 4.0],
            vec![1.0, 1.0],
            vec![-2.0, 0.5],
            vec![10.0, -10.0],
        ])
        .unwrap()
    }

    #[test]
    fn build_records_shape() {
        let index = grid();
        assert_eq!(index.len(), 5);
        assert_eq!(index.dimension(), 2);
        assert!(!index.is_empty());
        assert_eq!(index.vector(1).unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn build_empty_fails() {
        let none: Vec<Vec<f32>> = Vec::new();
        assert_eq!(VectorIndex::build(&none).unwrap_err(), IndexError::EmptyInput);
    }

    #[test]
    fn build_zero_dimension_fails() {
        assert_eq!(
            VectorIndex::build(&[Vec::<f32>::new()]).unwrap_err(),
            IndexError::EmptyInput
        );
    }

    #[test]
    fn build_mixed_dimensions_fails() {
        let err = VectorIndex::build(&[vec![1.0, 2.0], vec![1.0, 2.0, 3.0]]).unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn stored_vector_is_its_own_nearest() {
        let index = grid();
        for handle in 0..index.len() {
            let query = index.vector(handle).unwrap().to_vec();
            let hits = index.search(&query, 2).unwrap();
            assert_eq!(hits[0].handle, handle);
            assert_eq!(hits[0].distance, 0.0);
        }
    }

    #[test]
    fn search_orders_by_squared_distance() {
        let hits = grid().search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(
            hits,
            vec![
                Neighbor { handle: 0, distance: 0.0 },
                Neighbor { handle: 2, distance: 2.0 },
                Neighbor { handle: 3, distance: 4.25 },
            ]
        );
    }

    #[test]
    fn k_larger_than_len_returns_everything_sorted() {
        let hits = grid().search(&[0.0, 0.0], 50).unwrap();
        assert_eq!(hits.len(), 5);
        assert_eq!(handles(&hits), vec![0, 2, 3, 1, 4]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn ties_prefer_lower_handle() {
        let index = VectorIndex::build(&[
            vec![5.0, 5.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![-1.0, 0.0],
            vec![0.0, -1.0],
        ])
        .unwrap();
        let hits = index.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(handles(&hits), vec![1, 2, 3]);
        assert!(hits.iter().all(|n| n.distance == 1.0));

        let all = index.search(&[0.0, 0.0], 5).unwrap();
        assert_eq!(handles(&all), vec![1, 2, 3, 4, 0]);
    }

    #[test]
    fn duplicate_vectors_keep_insertion_order() {
        let index = VectorIndex::build(&[vec![2.0], vec![2.0], vec![2.0]]).unwrap();
        let hits = index.search(&[2.0], 2).unwrap();
        assert_eq!(handles(&hits), vec![0, 1]);
    }

    #[test]
    fn search_rejects_wrong_dimension() {
        let err = grid().search(&[1.0, 2.0, 3.0], 1).unwrap_err();
        assert_eq!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn search_rejects_zero_k() {
        assert_eq!(grid().search(&[0.0, 0.0], 0).unwrap_err(), IndexError::InvalidK);
    }

    #[test]
    fn vector_out_of_range() {
        assert_eq!(
            grid().vector(5).unwrap_err(),
            IndexError::InvalidHandle { handle: 5, len: 5 }
        );
    }

    #[test]
    fn nan_distances_sort_last() {
        let index = VectorIndex::build(&[vec![f32::NAN], vec![1.0], vec![0.5]]).unwrap();
        let hits = index.search(&[0.0], 3).unwrap();
        assert_eq!(handles(&hits), vec![2, 1, 0]);
    }
}
