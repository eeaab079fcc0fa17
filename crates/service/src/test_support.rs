//! Deterministic stand-ins for the embedding model and the LLM.

use std::sync::Mutex;

use async_trait::async_trait;
use disaster_dedup_core::DisasterEventRecord;
use disaster_dedup_embeddings::{EmbeddingError, RecordEmbedder};
use disaster_dedup_llm::LlmError;

use crate::ports::{LevelNarrator, SemanticOracle};

/// Embeds by the `time` field: `"s<N>"` lands at cosine `N/100` from
/// `"s100"`; anything else sits on an orthogonal axis.
pub(crate) struct AxisEmbedder;

impl RecordEmbedder for AxisEmbedder {
    fn embed_record(&self, record: &DisasterEventRecord) -> Result<Vec<f32>, EmbeddingError> {
        let Some(percent) = record.time.strip_prefix('s').and_then(|n| n.parse::<f32>().ok())
        else {
            return Ok(vec![0.0, 0.0, 1.0]);
        };
        let cos = (percent / 100.0).clamp(-1.0, 1.0);
        Ok(vec![cos, (1.0 - cos * cos).max(0.0).sqrt(), 0.0])
    }
}

pub(crate) struct FailingEmbedder;

impl RecordEmbedder for FailingEmbedder {
    fn embed_record(&self, _record: &DisasterEventRecord) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Generation("model offline".to_owned()))
    }
}

pub(crate) struct ScriptedOracle {
    answer: Option<bool>,
    questions: Mutex<Vec<(String, String)>>,
}

impl ScriptedOracle {
    pub(crate) fn always(answer: bool) -> Self {
        Self { answer: Some(answer), questions: Mutex::new(Vec::new()) }
    }

    pub(crate) fn failing() -> Self {
        Self { answer: None, questions: Mutex::new(Vec::new()) }
    }

    pub(crate) fn calls(&self) -> usize {
        self.questions.lock().unwrap().len()
    }

    /// Every `(text_a, text_b)` the oracle was asked about, in order.
    pub(crate) fn questions(&self) -> Vec<(String, String)> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl SemanticOracle for ScriptedOracle {
    async fn similar(&self, text_a: &str, text_b: &str) -> Result<bool, LlmError> {
        self.questions.lock().unwrap().push((text_a.to_owned(), text_b.to_owned()));
        self.answer.ok_or(LlmError::EmptyResponse)
    }
}

pub(crate) struct ScriptedNarrator {
    answer: Option<String>,
    inputs: Mutex<Vec<Vec<String>>>,
}

impl ScriptedNarrator {
    pub(crate) fn answering(answer: &str) -> Self {
        Self { answer: Some(answer.to_owned()), inputs: Mutex::new(Vec::new()) }
    }

    pub(crate) fn failing() -> Self {
        Self { answer: None, inputs: Mutex::new(Vec::new()) }
    }

    pub(crate) fn inputs(&self) -> Vec<Vec<String>> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl LevelNarrator for ScriptedNarrator {
    async fn combine(&self, texts: &[String]) -> Result<String, LlmError> {
        self.inputs.lock().unwrap().push(texts.to_vec());
        self.answer.clone().ok_or(LlmError::HttpStatus { code: 500, body: "offline".to_owned() })
    }
}
