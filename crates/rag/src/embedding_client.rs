//! HTTP client for the external embedding service.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use hr_rag_core::{EmbeddingClient, Result};

use crate::error::RagError;

const BATCH_SIZE: usize = 32;

pub struct HttpEmbeddingClient {
    client: Client,
    base_url: String,
    dim: usize,
}

impl HttpEmbeddingClient {
    pub fn new(base_url: impl Into<String>, dim: usize, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            base_url: base_url.into(),
            dim,
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct Req<'a> {
            texts: &'a [String],
        }
        #[derive(Deserialize)]
        struct Resp {
            embeddings: Vec<Vec<f32>>,
        }

        let url = format!("{}/embed/documents", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&Req { texts })
            .send()
            .await
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RagError::Embedding(format!("status {}", response.status())).into());
        }

        let parsed: Resp =
            response.json().await.map_err(|e| RagError::Embedding(e.to_string()))?;
        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            let embeddings = self.embed_batch(chunk).await?;
            all.extend(embeddings);
        }
        Ok(all)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct Req<'a> {
            text: &'a str,
        }
        #[derive(Deserialize)]
        struct Resp {
            embedding: Vec<f32>,
        }

        let url = format!("{}/embed/query", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&Req { text })
            .send()
            .await
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RagError::Embedding(format!("status {}", response.status())).into());
        }

        let parsed: Resp =
            response.json().await.map_err(|e| RagError::Embedding(e.to_string()))?;
        Ok(parsed.embedding)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
