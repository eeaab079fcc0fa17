//! LLM client for semantic duplicate checks and severity text combination
//!
//! Talks to any OpenAI-compatible `/v1/chat/completions` endpoint.

mod ai_types;
mod client;
mod error;
mod severity;
mod similarity;


pub use client::{DEFAULT_MODEL, LlmClient, truncate};
pub use error::LlmError;
pub use similarity::parse_similarity_verdict;
