//! Shared constants for disaster-dedup.
//!
//! Centralizes thresholds and pool sizes used across crates.

/// Score at or above which a candidate pair is accepted without asking the oracle.
pub const DEFAULT_DUPLICATE_THRESHOLD: f32 = 0.9;

/// Lower edge of the fuzzy band. Scores below this are discarded outright.
pub const DEFAULT_FUZZY_FLOOR: f32 = 0.6;

/// Neighbors requested per query in both comparison passes.
pub const NEIGHBOR_TOP_K: usize = 5;

/// Embedding vector dimension (BGE-M3 model: 1024d, 100+ languages).
pub const EMBEDDING_DIMENSION: usize = 1024;

/// Weight of the `time` field in the composed record embedding.
pub const TIME_FIELD_WEIGHT: f32 = 0.3;

/// Weight of the `location` field in the composed record embedding.
pub const LOCATION_FIELD_WEIGHT: f32 = 0.25;

/// Weight of the `event_type` field in the composed record embedding.
pub const EVENT_FIELD_WEIGHT: f32 = 0.2;

/// Weight of the `severity` field in the composed record embedding.
pub const SEVERITY_FIELD_WEIGHT: f32 = 0.25;

/// Separator used when severity texts are joined without the narrator.
pub const SEVERITY_FALLBACK_SEPARATOR: &str = "; ";

/// Default capacity of the per-process embedding cache.
pub const DEFAULT_EMBED_CACHE_MAX_ENTRIES: usize = 10_000;

/// Default timeout for a single chat-completion request, in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 5;

/// PostgreSQL connection pool: acquire timeout in seconds.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;

/// Default number of dedup log entries listed by the CLI.
pub const DEFAULT_LOG_LIMIT: usize = 20;

/// Maximum number of dedup log entries returned by one query (DoS protection).
pub const MAX_LOG_LIMIT: usize = 1000;
