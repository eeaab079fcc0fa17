use crate::ai_types::{ChatRequest, Message};
use crate::client::{LlmClient, MAX_RETRIES};
use crate::error::LlmError;

const SEVERITY_SYSTEM_PROMPT: &str = "You merge damage descriptions from several reports of the \
same disaster into one short, clear sentence.\n\
Rules:\n\
1. If all lines say the same thing, output it once.\n\
2. If they differ, output one sentence that covers every distinct description. Connectives \
are allowed.\n\
3. Never add information that is not in the input.\n\
Each input line is one independent description. Output only the merged sentence.";

const SEVERITY_MAX_TOKENS: u32 = 256;

impl LlmClient {
    /// Combine distinct severity descriptions into one sentence.
    ///
    /// # Errors
    /// Returns `LlmError` if the request fails or the model answers with an
    /// empty string.
    pub async fn combine_severity_texts(&self, texts: &[String]) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::system(SEVERITY_SYSTEM_PROMPT), Message::user(texts.join("\n"))],
            max_tokens: Some(SEVERITY_MAX_TOKENS),
            temperature: Some(0.3),
        };

        let combined = self.chat_completion(&request, MAX_RETRIES).await?;
        if combined.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        tracing::debug!(inputs = texts.len(), combined_len = combined.len(), "severity combined");
        Ok(combined)
    }
}
