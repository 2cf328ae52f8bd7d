//! Anthropic Messages API backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use hr_rag_core::{ChatMessage, GenerationResult, GeneratorBackend, Result, Role};

use crate::error::GeneratorError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeGenerator {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    endpoint: String,
    context_window: usize,
}

impl ClaudeGenerator {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self::with_base_url(
            api_key,
            model,
            "https://api.anthropic.com".to_string(),
            max_tokens,
            temperature,
            timeout,
        )
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: String,
        max_tokens: u32,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            temperature,
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
            context_window: 200_000,
        }
    }
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<ClaudeMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContentBlock>,
    usage: ClaudeUsage,
}

#[derive(Deserialize)]
struct ClaudeContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ClaudeUsage {
    input_tokens: usize,
    output_tokens: usize,
}

#[async_trait]
impl GeneratorBackend for ClaudeGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<GenerationResult> {
        let mut messages: Vec<ClaudeMessage> = history
            .iter()
            .map(|m| ClaudeMessage {
                role: match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: &m.content,
            })
            .collect();
        messages.push(ClaudeMessage { role: "user", content: user_message });

        let request = ClaudeRequest {
            model: &self.model,
            system: system_prompt,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(GeneratorError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api(format!("{status}: {body}")).into());
        }

        let parsed: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

        let text = parsed.content.into_iter().map(|b| b.text).collect::<Vec<_>>().join("");

        Ok(GenerationResult {
            text,
            prompt_tokens: parsed.usage.input_tokens,
            completion_tokens: parsed.usage.output_tokens,
        })
    }

    fn context_window(&self) -> usize {
        self.context_window
    }
}
