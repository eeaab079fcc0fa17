//! Typed error enum for the service layer.
//!
//! Oracle and narrator failures are recovered where they occur and never surface here.

use disaster_dedup_embeddings::EmbeddingError;
use disaster_dedup_storage::StorageError;
use thiserror::Error;

/// Service-layer error unifying storage and embedding failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed (DB, not found, commit).
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Embedding generation failed. Fatal for a run.
    #[error("embedding: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Domain-level rejection (dimension mismatch, malformed vectors).
    #[error("domain: {0}")]
    Domain(#[from] disaster_dedup_core::Error),

    /// Runtime failure outside the domain (blocking task panicked).
    #[error("system: {0}")]
    System(#[source] anyhow::Error),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Whether this error represents a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_not_found())
    }
}
