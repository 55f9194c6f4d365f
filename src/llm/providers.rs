use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{ChatMessage, Llm, LlmProvider, LlmResponse};
use crate::config::ReviewConfig;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_MODELS_URL: &str = "https://api.openai.com/v1/models";

/// Chat-completions wire format, shared by both providers
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionUsage {
    total_tokens: u32,
}

fn build_client(config: &ReviewConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()?)
}

fn extract_content(response: ChatCompletionResponse, provider: &str) -> Result<LlmResponse> {
    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no response from {}", provider))?
        .message
        .content;

    let tokens_used = response.usage.map(|u| u.total_tokens);

    Ok(LlmResponse {
        content,
        tokens_used,
    })
}

/// OpenAI provider, credential read from the configured environment variable
#[derive(Debug)]
pub struct OpenAiProvider {
    config: ReviewConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: ReviewConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow!("{} is not set", config.api_key_env))?;

        if api_key.trim().is_empty() {
            return Err(anyhow!("{} is empty", config.api_key_env));
        }

        let client = build_client(&config)?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl Llm for OpenAiProvider {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LlmResponse> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: &messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending request to OpenAI ({})", self.config.model);

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI API error {}: {}", status, text));
        }

        extract_content(response.json().await?, "OpenAI")
    }

    async fn is_available(&self) -> bool {
        match self
            .client
            .get(OPENAI_MODELS_URL)
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::OpenAi
    }
}

/// OpenAI-compatible local endpoint provider
pub struct LocalProvider {
    config: ReviewConfig,
    endpoint: String,
    client: reqwest::Client,
}

impl LocalProvider {
    pub fn new(config: ReviewConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow!("local LLM endpoint not configured"))?;

        let client = build_client(&config)?;

        Ok(Self {
            config,
            endpoint,
            client,
        })
    }
}

#[async_trait]
impl Llm for LocalProvider {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LlmResponse> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: &messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending request to local endpoint at {}", self.endpoint);

        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("local LLM API error {}: {}", status, text));
        }

        extract_content(response.json().await?, "local endpoint")
    }

    async fn is_available(&self) -> bool {
        // Models listing is the cheapest probe LM Studio exposes
        let models_endpoint = self.endpoint.replace("/chat/completions", "/models");

        match self.client.get(&models_endpoint).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Local
    }
}
