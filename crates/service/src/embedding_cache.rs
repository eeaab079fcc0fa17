//! Per-record embedding cache.
//!
//! Historical records are re-embedded on every run; caching by record id
//! with a content fingerprint skips the model for rows that did not change.
//! A merge rewrites the survivor's fields, so its fingerprint changes and the
//! stale vector is replaced on the next run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use disaster_dedup_core::{DisasterEventRecord, RecordId};
use disaster_dedup_embeddings::{EmbeddingError, RecordEmbedder};
use sha2::{Digest, Sha256};

type Fingerprint = [u8; 32];

/// SHA-256 over the four embedded fields, length-prefixed.
#[must_use]
pub fn content_fingerprint(record: &DisasterEventRecord) -> Fingerprint {
    let mut hasher = Sha256::new();
    for field in record.text_fields() {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.finalize().into()
}

struct CacheEntry {
    fingerprint: Fingerprint,
    vector: Vec<f32>,
}

pub struct CachingRecordEmbedder {
    inner: Arc<dyn RecordEmbedder>,
    max_entries: usize,
    entries: Mutex<HashMap<RecordId, CacheEntry>>,
}

impl CachingRecordEmbedder {
    #[must_use]
    pub fn new(inner: Arc<dyn RecordEmbedder>, max_entries: usize) -> Self {
        Self { inner, max_entries, entries: Mutex::new(HashMap::new()) }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordEmbedder for CachingRecordEmbedder {
    fn embed_record(&self, record: &DisasterEventRecord) -> Result<Vec<f32>, EmbeddingError> {
        let fingerprint = content_fingerprint(record);
        {
            let entries = self.entries.lock().map_err(|_| EmbeddingError::LockPoisoned)?;
            if let Some(entry) = entries.get(&record.id)
                && entry.fingerprint == fingerprint
            {
                return Ok(entry.vector.clone());
            }
        }

        let vector = self.inner.embed_record(record)?;

        let mut entries = self.entries.lock().map_err(|_| EmbeddingError::LockPoisoned)?;
        if entries.len() >= self.max_entries && !entries.contains_key(&record.id) {
            tracing::debug!(capacity = self.max_entries, "embedding cache full, clearing");
            entries.clear();
        }
        if self.max_entries > 0 {
            entries.insert(record.id, CacheEntry { fingerprint, vector: vector.clone() });
        }
        Ok(vector)
    }
}
