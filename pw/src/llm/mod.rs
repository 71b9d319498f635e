//! LLM client module
//!
//! Completion requests against a chat-completions provider. The rest of
//! the crate only sees the [`LlmClient`] trait, so tests swap in
//! [`client::mock::MockLlmClient`].

use std::sync::Arc;

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
#[allow(unused_imports)]
pub use types::Role;
pub use types::{CompletionRequest, CompletionResponse, Message, TokenUsage};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIClient::from_config(config)?)),
        other => Err(LlmError::Unusable(format!(
            "Unknown LLM provider: '{}'. Supported: openai",
            other
        ))),
    }
}
