//! Model-backed capabilities the detector and merger depend on.

use async_trait::async_trait;
use disaster_dedup_llm::{LlmClient, LlmError};

/// Second opinion for pairs whose similarity falls in the fuzzy band.
#[async_trait]
pub trait SemanticOracle: Send + Sync {
    /// Whether two record renderings describe the same event.
    async fn similar(&self, text_a: &str, text_b: &str) -> Result<bool, LlmError>;
}

/// Combines differing severity descriptions into one sentence.
#[async_trait]
pub trait LevelNarrator: Send + Sync {
    async fn combine(&self, texts: &[String]) -> Result<String, LlmError>;
}

#[async_trait]
impl SemanticOracle for LlmClient {
    async fn similar(&self, text_a: &str, text_b: &str) -> Result<bool, LlmError> {
        self.check_similarity(text_a, text_b).await
    }
}

#[async_trait]
impl LevelNarrator for LlmClient {
    async fn combine(&self, texts: &[String]) -> Result<String, LlmError> {
        self.combine_severity_texts(texts).await
    }
}
