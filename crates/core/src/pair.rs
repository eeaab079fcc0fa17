//! Canonical similarity pairs and the evaluated-pair bookkeeping shared by
//! both comparison passes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::RecordId;

/// Unordered pair of record ids, always stored as `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimilarityPair {
    low: RecordId,
    high: RecordId,
}

impl SimilarityPair {
    /// Canonicalize `(a, b)`. Returns `None` for a self-pair.
    #[must_use]
    pub fn new(a: RecordId, b: RecordId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[must_use]
    pub const fn low(&self) -> RecordId {
        self.low
    }

    #[must_use]
    pub const fn high(&self) -> RecordId {
        self.high
    }

    #[must_use]
    pub const fn ids(&self) -> (RecordId, RecordId) {
        (self.low, self.high)
    }
}

/// Pairs evaluated during one detection run.
///
/// `evaluated` holds every pair that has been classified, accepted or not, so
/// a pair reached again from the other pass (or from the neighbor's own query)
/// is never re-classified.
#[derive(Debug, Default)]
pub struct PairSet {
    evaluated: HashSet<SimilarityPair>,
    accepted: Vec<SimilarityPair>,
}

impl PairSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `pair` is about to be classified.
    /// Returns `false` when it was already evaluated earlier in the run.
    pub fn begin_evaluation(&mut self, pair: SimilarityPair) -> bool {
        self.evaluated.insert(pair)
    }

    /// Accept a pair previously passed to [`Self::begin_evaluation`].
    pub fn accept(&mut self, pair: SimilarityPair) {
        debug_assert!(self.evaluated.contains(&pair), "accepted pair was never evaluated");
        self.accepted.push(pair);
    }

    #[must_use]
    pub fn evaluated_count(&self) -> usize {
        self.evaluated.len()
    }

    #[must_use]
    pub fn accepted(&self) -> &[SimilarityPair] {
        &self.accepted
    }

    #[must_use]
    pub fn into_accepted(self) -> Vec<SimilarityPair> {
        self.accepted
    }
}
