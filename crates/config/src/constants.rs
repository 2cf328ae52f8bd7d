//! Centralized constants for the HR policy RAG pipeline.
//!
//! This module holds generic infrastructure defaults only: service endpoints,
//! timeouts, and retrieval tuning. Per-turn runtime behavior (language,
//! expertise level, response style) lives in `Settings`, not here.

/// Service endpoints (loaded from env vars with fallback defaults).
pub mod endpoints {
    use once_cell::sync::Lazy;

    /// Ollama endpoint, used for both generation and embeddings (env: OLLAMA_URL).
    pub static OLLAMA_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string())
    });

    /// Qdrant vector store endpoint (env: QDRANT_URL).
    pub static QDRANT_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://127.0.0.1:6333".to_string())
    });

    /// Reranker / model-server endpoint (env: MODEL_SERVER_URL).
    pub static MODEL_SERVER_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("MODEL_SERVER_URL").unwrap_or_else(|_| "http://127.0.0.1:8088".to_string())
    });

    /// OpenAI API endpoint (env: OPENAI_API_BASE).
    pub static OPENAI_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
    });

    /// Anthropic API endpoint (env: ANTHROPIC_API_BASE).
    pub static ANTHROPIC_DEFAULT: Lazy<String> = Lazy::new(|| {
        std::env::var("ANTHROPIC_API_BASE")
            .unwrap_or_else(|_| "https://api.anthropic.com".to_string())
    });
}

/// Timeouts, in milliseconds.
pub mod timeouts {
    pub const GENERATOR_REQUEST_MS: u64 = 60_000;
    pub const EMBEDDING_BATCH_MS: u64 = 300_000;
    pub const EMBEDDING_QUERY_MS: u64 = 60_000;
    pub const VECTOR_STORE_MS: u64 = 10_000;
    pub const RERANKER_MS: u64 = 30_000;
}

/// Retrieval tuning defaults, mirrored from the settings surface so callers
/// that construct components directly (tests, tools) share the same numbers.
pub mod rag {
    pub const RETRIEVAL_TOP_K: usize = 15;
    pub const RETRIEVAL_PREFETCH_LIMIT: usize = 30;
    pub const RERANK_TOP_K: usize = 7;
    pub const RRF_K: usize = 40;
    pub const MAX_RETRIES: u32 = 3;
    pub const EMBEDDING_DIM: usize = 768;
    pub const GRADER_SCORE_THRESHOLD: f32 = 0.15;
    pub const GRADER_MIN_KEEP: usize = 3;
    pub const CONTEXT_RESERVE_OUTPUT: usize = 4000;
    pub const CONTEXT_TEMPLATE_OVERHEAD: usize = 200;
    pub const CONTEXT_MIN_DOC_BUDGET: usize = 1000;
    pub const LANGUAGE_AFFINITY_BOOST: f32 = 1.10;
    pub const NEIGHBOR_WINDOW: usize = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rag_thresholds_are_sane() {
        assert!(rag::GRADER_SCORE_THRESHOLD > 0.0 && rag::GRADER_SCORE_THRESHOLD < 1.0);
        assert!(rag::MAX_RETRIES <= 3);
        assert!(rag::RRF_K > 0);
    }

    #[test]
    fn timeouts_are_positive() {
        assert!(timeouts::GENERATOR_REQUEST_MS > 0);
        assert!(timeouts::RERANKER_MS > 0);
    }
}
