//! Service layer for disaster-dedup
//!
//! Duplicate detection, clustering and merge, orchestrated over a record
//! store with explicit commit boundaries.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]

pub mod ann;
mod dedup_service;
mod detector;
mod embedding_cache;
mod error;
mod merger;
mod ports;

#[cfg(test)]
mod test_support;

pub use dedup_service::DedupService;
pub use detector::{Detection, SimilarityDetector};
pub use embedding_cache::{CachingRecordEmbedder, content_fingerprint};
pub use error::ServiceError;
pub use merger::{ClusterMerger, MergeReport};
pub use ports::{LevelNarrator, SemanticOracle};
