//! Field-weighted composition of a record's four text fields into one vector.
//!
//! Each field is embedded on its own and the results are summed with fixed
//! weights, so noise in one long field can't dominate the similarity score.

use std::sync::Arc;

use disaster_dedup_core::{
    DisasterEventRecord, EVENT_FIELD_WEIGHT, LOCATION_FIELD_WEIGHT, SEVERITY_FIELD_WEIGHT,
    TIME_FIELD_WEIGHT,
};

use crate::{EmbeddingError, EmbeddingProvider};

/// Record → vector capability consumed by the similarity detector.
pub trait RecordEmbedder: Send + Sync {
    fn embed_record(&self, record: &DisasterEventRecord) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed many records; any failure fails the whole batch.
    fn embed_records(
        &self,
        records: &[DisasterEventRecord],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        records.iter().map(|r| self.embed_record(r)).collect()
    }
}

/// Per-field weights, in `time, location, event_type, severity` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldWeights {
    pub time: f32,
    pub location: f32,
    pub event_type: f32,
    pub severity: f32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            time: TIME_FIELD_WEIGHT,
            location: LOCATION_FIELD_WEIGHT,
            event_type: EVENT_FIELD_WEIGHT,
            severity: SEVERITY_FIELD_WEIGHT,
        }
    }
}

impl FieldWeights {
    const fn as_array(&self) -> [f32; 4] {
        [self.time, self.location, self.event_type, self.severity]
    }
}

pub struct WeightedFieldEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    weights: FieldWeights,
}

impl WeightedFieldEmbedder {
    #[must_use]
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider, weights: FieldWeights::default() }
    }

    #[must_use]
    pub const fn with_weights(mut self, weights: FieldWeights) -> Self {
        self.weights = weights;
        self
    }
}

impl RecordEmbedder for WeightedFieldEmbedder {
    fn embed_record(&self, record: &DisasterEventRecord) -> Result<Vec<f32>, EmbeddingError> {
        let fields = record.text_fields();
        let vectors = self.provider.embed_batch(&fields)?;
        if vectors.len() != fields.len() {
            return Err(EmbeddingError::Generation(format!(
                "expected {} field vectors, got {}",
                fields.len(),
                vectors.len()
            )));
        }

        let dimension = self.provider.dimension();
        let mut composed = vec![0.0_f32; dimension];
        for (vector, weight) in vectors.iter().zip(self.weights.as_array()) {
            if vector.len() != dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            for (acc, x) in composed.iter_mut().zip(vector) {
                *acc += weight * x;
            }
        }
        Ok(composed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disaster_dedup_core::ReportId;

    /// Maps the first byte of a text onto one of three axes.
    struct AxisProvider;

    impl EmbeddingProvider for AxisProvider {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let mut v = vec![0.0; 3];
            let axis = usize::from(text.bytes().next().unwrap_or(0)) % 3;
            v[axis] = 1.0;
            Ok(v)
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    struct WrongDimension;

    impl EmbeddingProvider for WrongDimension {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0])
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    struct Failing;

    impl EmbeddingProvider for Failing {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Generation("model offline".to_owned()))
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    fn record() -> DisasterEventRecord {
        // 'a' = 97 → axis 1, 'b' = 98 → axis 2, 'c' = 99 → axis 0
        DisasterEventRecord::new(1, Some(ReportId(1)), "a", "b", "c", "a")
    }

    #[test]
    fn fields_are_weighted_and_summed() {
        let embedder = WeightedFieldEmbedder::new(Arc::new(AxisProvider));
        let v = embedder.embed_record(&record()).unwrap();
        assert!((v[0] - 0.2).abs() < 1e-6, "event weight on axis 0");
        assert!((v[1] - 0.55).abs() < 1e-6, "time + severity on axis 1");
        assert!((v[2] - 0.25).abs() < 1e-6, "location on axis 2");
    }

    #[test]
    fn custom_weights_apply() {
        let weights = FieldWeights { time: 1.0, location: 0.0, event_type: 0.0, severity: 0.0 };
        let embedder = WeightedFieldEmbedder::new(Arc::new(AxisProvider)).with_weights(weights);
        let v = embedder.embed_record(&record()).unwrap();
        assert_eq!(v, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn deterministic_for_identical_fields() {
        let embedder = WeightedFieldEmbedder::new(Arc::new(AxisProvider));
        let rec = record();
        assert_eq!(embedder.embed_record(&rec).unwrap(), embedder.embed_record(&rec).unwrap());
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let embedder = WeightedFieldEmbedder::new(Arc::new(WrongDimension));
        let err = embedder.embed_record(&record()).unwrap_err();
        assert!(matches!(err, EmbeddingError::DimensionMismatch { expected: 4, actual: 1 }));
    }

    #[test]
    fn provider_failure_fails_batch() {
        let embedder = WeightedFieldEmbedder::new(Arc::new(Failing));
        assert!(embedder.embed_records(&[record(), record()]).is_err());
    }
}
