//! OpenAI chat-completions backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use hr_rag_core::{ChatMessage, GenerationResult, GeneratorBackend, Result, Role};

use crate::error::GeneratorError;

pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    endpoint: String,
    context_window: usize,
}

impl OpenAiGenerator {
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
            "https://api.openai.com".to_string(),
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
        let model = model.into();
        let context_window = context_window_for(&model);
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            model,
            max_tokens,
            temperature,
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            context_window,
        }
    }
}

fn context_window_for(model: &str) -> usize {
    match model {
        "gpt-4o" | "gpt-4-turbo" => 128_000,
        "gpt-4" => 8_192,
        "gpt-3.5-turbo" => 16_385,
        _ => 8_000,
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatCompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: ChatUsage,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[async_trait]
impl GeneratorBackend for OpenAiGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<GenerationResult> {
        let mut messages = vec![ChatCompletionMessage { role: "system", content: system_prompt }];
        messages.extend(history.iter().map(|m| ChatCompletionMessage {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &m.content,
        }));
        messages.push(ChatCompletionMessage { role: "user", content: user_message });

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(GeneratorError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api(format!("{status}: {body}")).into());
        }

        let mut parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .choices
            .pop()
            .map(|c| c.message.content)
            .ok_or_else(|| GeneratorError::InvalidResponse("empty choices".into()))?;

        Ok(GenerationResult {
            text,
            prompt_tokens: parsed.usage.prompt_tokens,
            completion_tokens: parsed.usage.completion_tokens,
        })
    }

    fn context_window(&self) -> usize {
        self.context_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpt4o_gets_128k_window() {
        assert_eq!(context_window_for("gpt-4o"), 128_000);
        assert_eq!(context_window_for("gpt-4-turbo"), 128_000);
    }

    #[test]
    fn gpt4_gets_8k_window() {
        assert_eq!(context_window_for("gpt-4"), 8_192);
    }

    #[test]
    fn gpt35_turbo_gets_16385_window() {
        assert_eq!(context_window_for("gpt-3.5-turbo"), 16_385);
    }
}
