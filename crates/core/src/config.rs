//! Dedup run configuration.

use crate::{
    DEFAULT_DUPLICATE_THRESHOLD, DEFAULT_EMBED_CACHE_MAX_ENTRIES, DEFAULT_FUZZY_FLOOR,
    env_flag_with_default, env_parse_with_default,
};

/// Thresholds and commit policy for one dedup run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupConfig {
    /// Scores at or above this are accepted without the oracle.
    pub duplicate_threshold: f32,
    /// Scores in `[fuzzy_floor, duplicate_threshold)` go to the oracle.
    pub fuzzy_floor: f32,
    /// Commit the `checked` flip and the merge writes in one transaction.
    ///
    /// When `false` (the default) the flip is committed before clustering, so
    /// a crash between the two commits leaves records marked checked with their
    /// pairs lost.
    pub single_transaction: bool,
    /// Capacity of the per-process embedding cache; `0` disables it.
    pub embed_cache_max_entries: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            fuzzy_floor: DEFAULT_FUZZY_FLOOR,
            single_transaction: false,
            embed_cache_max_entries: DEFAULT_EMBED_CACHE_MAX_ENTRIES,
        }
    }
}

impl DedupConfig {
    /// Build from explicit thresholds, clamping them into a valid band.
    #[must_use]
    pub fn with_thresholds(duplicate_threshold: f32, fuzzy_floor: f32) -> Self {
        Self { duplicate_threshold, fuzzy_floor, ..Self::default() }.normalized()
    }

    #[must_use]
    pub const fn with_single_transaction(mut self, single_transaction: bool) -> Self {
        self.single_transaction = single_transaction;
        self
    }

    /// Read the configuration from `DISASTER_DEDUP_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let duplicate_threshold =
            env_parse_with_default("DISASTER_DEDUP_DUPLICATE_THRESHOLD", DEFAULT_DUPLICATE_THRESHOLD);
        let fuzzy_floor = env_parse_with_default("DISASTER_DEDUP_FUZZY_FLOOR", DEFAULT_FUZZY_FLOOR);
        let single_transaction = env_flag_with_default("DISASTER_DEDUP_SINGLE_TRANSACTION", false);
        let embed_cache_max_entries = env_parse_with_default(
            "DISASTER_DEDUP_EMBED_CACHE_MAX",
            DEFAULT_EMBED_CACHE_MAX_ENTRIES,
        );
        Self { duplicate_threshold, fuzzy_floor, single_transaction, embed_cache_max_entries }
            .normalized()
    }

    /// Clamp the threshold to `[0, 1]` and the floor to `[0, threshold]`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let raw_threshold = self.duplicate_threshold;
        self.duplicate_threshold =
            if raw_threshold.is_nan() { DEFAULT_DUPLICATE_THRESHOLD } else { raw_threshold.clamp(0.0, 1.0) };
        if (self.duplicate_threshold - raw_threshold).abs() > f32::EPSILON {
            tracing::warn!(
                original = raw_threshold,
                clamped = self.duplicate_threshold,
                "duplicate threshold clamped to [0.0, 1.0]"
            );
        }

        let raw_floor = self.fuzzy_floor;
        self.fuzzy_floor = if raw_floor.is_nan() {
            DEFAULT_FUZZY_FLOOR.min(self.duplicate_threshold)
        } else {
            raw_floor.clamp(0.0, self.duplicate_threshold)
        };
        if (self.fuzzy_floor - raw_floor).abs() > f32::EPSILON {
            tracing::warn!(
                original = raw_floor,
                clamped = self.fuzzy_floor,
                threshold = self.duplicate_threshold,
                "fuzzy floor clamped to [0.0, duplicate threshold]"
            );
        }
        self
    }

    /// Whether a score must be adjudicated by the oracle.
    #[must_use]
    pub fn in_fuzzy_band(&self, score: f32) -> bool {
        score >= self.fuzzy_floor && score < self.duplicate_threshold
    }
}
