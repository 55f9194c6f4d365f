pub mod providers;
pub mod review;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ReviewConfig;

/// LLM provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI chat completions, credential from the environment
    OpenAi,
    /// OpenAI-compatible local endpoint (LM Studio and friends)
    Local,
}

/// Chat message for LLM communication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// LLM response
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub tokens_used: Option<u32>,
}

/// Trait for LLM providers
#[async_trait]
pub trait Llm: Send + Sync {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LlmResponse>;
    async fn is_available(&self) -> bool;
    fn provider(&self) -> LlmProvider;
}

/// Create an LLM instance based on configuration
pub fn create_llm(config: &ReviewConfig) -> Result<Box<dyn Llm>> {
    match config.provider {
        LlmProvider::OpenAi => Ok(Box::new(providers::OpenAiProvider::new(config.clone())?)),
        LlmProvider::Local => Ok(Box::new(providers::LocalProvider::new(config.clone())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LlmProvider::OpenAi).unwrap(), "\"openai\"");
        assert_eq!(serde_json::to_string(&LlmProvider::Local).unwrap(), "\"local\"");
    }

    #[test]
    fn user_message_has_user_role() {
        let msg = ChatMessage::user("hello");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content, "hello");
    }
}
