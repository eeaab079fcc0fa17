//! Exact nearest-neighbor search by inner product.
//!
//! Vectors are expected to be L2-normalized, so inner product equals cosine
//! similarity. The index is rebuilt for every run and never persisted.

use std::cmp::Ordering;

use disaster_dedup_core::{Error as CoreError, dot};

/// Position reported for a slot the index could not fill.
pub const INVALID_POSITION: i64 = -1;

/// One search hit: position in insertion order plus its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: i64,
    pub score: f32,
}

impl Neighbor {
    #[must_use]
    pub const fn sentinel() -> Self {
        Self { position: INVALID_POSITION, score: f32::NEG_INFINITY }
    }

    /// The position as an index into a collection of `len` items, or `None`
    /// for sentinels and out-of-range positions.
    #[must_use]
    pub fn index(&self, len: usize) -> Option<usize> {
        usize::try_from(self.position).ok().filter(|&i| i < len)
    }
}

pub trait AnnIndex: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dimension(&self) -> usize;

    /// Exactly `k` neighbors, best first, padded with [`Neighbor::sentinel`].
    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor>;
}

/// Brute-force inner-product index.
#[derive(Debug, Clone)]
pub struct FlatIpIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIpIndex {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension, vectors: Vec::new() }
    }

    /// Build an index over `vectors`, taking the dimension from the first one.
    pub fn from_vectors(vectors: Vec<Vec<f32>>) -> Result<Self, CoreError> {
        let dimension = vectors.first().map_or(0, Vec::len);
        let mut index = Self::new(dimension);
        for vector in vectors {
            index.add(vector)?;
        }
        Ok(index)
    }

    pub fn add(&mut self, vector: Vec<f32>) -> Result<(), CoreError> {
        if vector.len() != self.dimension {
            return Err(CoreError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.push(vector);
        Ok(())
    }
}

impl AnnIndex for FlatIpIndex {
    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        let mut hits: Vec<Neighbor> = if query.len() == self.dimension {
            self.vectors
                .iter()
                .enumerate()
                .filter_map(|(i, v)| {
                    let score = dot(query, v);
                    let position = i64::try_from(i).ok()?;
                    (!score.is_nan()).then_some(Neighbor { position, score })
                })
                .collect()
        } else {
            tracing::debug!(
                expected = self.dimension,
                actual = query.len(),
                "query dimension mismatch, returning no neighbors"
            );
            Vec::new()
        };

        hits.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then(a.position.cmp(&b.position))
        });
        hits.truncate(k);
        hits.resize(k, Neighbor::sentinel());
        hits
    }
}
