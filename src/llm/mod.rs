mod client;
mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{LlmStatus, OllamaClient, OllamaSettings};
pub use prompts::build_nlp_query_prompt;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("text generator is not reachable")]
    Unavailable,
    #[error("HTTP request failed: {0}")]
    Connection(#[source] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("failed to decode generator response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("failed to parse generator payload: {0}")]
    Payload(#[source] serde_json::Error),
    #[error("text generator returned an empty response")]
    EmptyResponse,
    #[error("text generation timed out after {0:?}")]
    Timeout(Duration),
}

/// Free-text generator used for questions the rule pipeline cannot answer.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn is_available(&self) -> bool;

    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, GenerationError>;
}
