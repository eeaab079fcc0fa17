use crate::ai_types::{ChatRequest, Message};
use crate::client::LlmClient;
use crate::error::LlmError;

const SIMILARITY_SYSTEM_PROMPT: &str = "You compare disaster event records. Each record is a \
time/location/event/severity quadruple. Decide whether the two records describe the same \
real-world event. Answer with exactly one word: yes or no.";

const SIMILARITY_MAX_TOKENS: u32 = 10;

// similarity checks retry once
const SIMILARITY_MAX_RETRIES: usize = 1;

/// Interpret the model's answer. Only an explicit affirmative counts.
#[must_use]
pub fn parse_similarity_verdict(answer: &str) -> bool {
    let normalized = answer
        .trim()
        .trim_matches(|c: char| c.is_ascii_punctuation() || matches!(c, '。' | '！' | '"'))
        .trim()
        .to_lowercase();
    matches!(normalized.as_str(), "yes" | "y" | "true" | "是")
}

impl LlmClient {
    /// Ask the model whether two record texts describe the same event.
    ///
    /// Transport and format errors are returned to the caller; deciding what
    /// a failed check means is the detector's job.
    ///
    /// # Errors
    /// Returns `LlmError` if the chat completion fails.
    pub async fn check_similarity(&self, text_a: &str, text_b: &str) -> Result<bool, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(SIMILARITY_SYSTEM_PROMPT),
                Message::user(format!(
                    "Record 1: {text_a}\nRecord 2: {text_b}\nDo these describe the same event? \
                     Answer yes or no."
                )),
            ],
            max_tokens: Some(SIMILARITY_MAX_TOKENS),
            temperature: Some(0.0),
        };

        let answer = self.chat_completion(&request, SIMILARITY_MAX_RETRIES).await?;
        let verdict = parse_similarity_verdict(&answer);
        tracing::debug!(answer = %answer, verdict, "similarity oracle answered");
        Ok(verdict)
    }
}
