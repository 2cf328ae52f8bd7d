//! HTTP client for the external cross-encoder reranker service.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use hr_rag_core::{RerankedCandidate, RerankerClient, Result};

use crate::error::RagError;

pub struct HttpRerankerClient {
    client: Client,
    base_url: String,
}

impl HttpRerankerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [String],
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResultEntry>,
}

#[derive(Deserialize)]
struct RerankResultEntry {
    index: usize,
    score: f32,
}

#[async_trait]
impl RerankerClient for HttpRerankerClient {
    async fn rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<RerankedCandidate>> {
        let url = format!("{}/rerank", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&RerankRequest { query, texts: candidates })
            .send()
            .await
            .map_err(|e| RagError::Reranker(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RagError::Reranker(format!("status {}", response.status())).into());
        }

        let mut parsed: RerankResponse =
            response.json().await.map_err(|e| RagError::Reranker(e.to_string()))?;

        // Results may arrive in original or sorted order; the caller owns sorting.
        parsed.results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        Ok(parsed
            .results
            .into_iter()
            .map(|r| RerankedCandidate { index: r.index, score: r.score })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reranker_client_constructs_with_trimmed_base_url() {
        let client = HttpRerankerClient::new("http://localhost:8090/", std::time::Duration::from_secs(1));
        assert_eq!(client.base_url, "http://localhost:8090/");
    }
}
