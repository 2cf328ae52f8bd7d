//! Ollama `/api/chat` backend, for self-hosted open-weight models.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;

use hr_rag_core::{ChatMessage, GenerationResult, GeneratorBackend, Result, Role};

use crate::error::GeneratorError;

pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    context_window: usize,
}

impl OllamaGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        let model = model.into();
        let context_window = context_window_for(&model);
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            base_url: base_url.into(),
            model,
            temperature,
            context_window,
        }
    }

    fn api_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

fn context_window_for(model: &str) -> usize {
    if model.starts_with("llama3.1") || model.starts_with("llama3.2") {
        128_000
    } else if model.starts_with("mistral") || model.starts_with("mixtral") {
        32_000
    } else {
        8_000
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[async_trait]
impl GeneratorBackend for OllamaGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<GenerationResult> {
        let mut messages = vec![OllamaMessage { role: "system", content: system_prompt }];
        messages.extend(history.iter().map(|m| OllamaMessage {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &m.content,
        }));
        messages.push(OllamaMessage { role: "user", content: user_message });

        let request = OllamaRequest {
            model: &self.model,
            messages,
            stream: false,
            options: OllamaOptions { temperature: self.temperature },
        };

        let response = self
            .client
            .post(self.api_url())
            .json(&request)
            .send()
            .await
            .map_err(GeneratorError::from)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api(format!("{status}: {body}")).into());
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

        Ok(GenerationResult {
            text: parsed.message.content,
            prompt_tokens: parsed.prompt_eval_count,
            completion_tokens: parsed.eval_count,
        })
    }

    /// Grapheme-cluster count gives a closer estimate than byte or char
    /// count for mixed-script HR documents (Cyrillic/Latin/Uzbek text).
    fn estimate_tokens(&self, text: &str) -> usize {
        let graphemes = text.graphemes(true).count();
        (graphemes as f32 / 3.5).ceil() as usize
    }

    fn context_window(&self) -> usize {
        self.context_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llama31_gets_extended_context_window() {
        assert_eq!(context_window_for("llama3.1"), 128_000);
        assert_eq!(context_window_for("llama3.2"), 128_000);
    }

    #[test]
    fn mistral_family_gets_32k_window() {
        assert_eq!(context_window_for("mixtral-8x7b"), 32_000);
    }

    #[test]
    fn unrecognized_model_falls_back_to_8k() {
        assert_eq!(context_window_for("some-custom-model"), 8_000);
    }
}
