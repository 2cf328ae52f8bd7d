//! Pluggable-backend seams. Each external collaborator (embedding service,
//! reranker, vector store, generator) is an `async_trait` so the RAG and
//! workflow crates depend on these traits rather than a concrete HTTP client,
//! mirroring how the teacher's `LlmBackend`/`ConversationFSM` traits decouple
//! the agent loop from a specific model runtime.

use async_trait::async_trait;

use crate::document::{Document, FilterSet};
use crate::error::Result;
use crate::turn_state::ChatMessage;

/// Produces dense embeddings for documents and queries. Implementations are
/// free to batch internally; `embed_documents` takes a slice so callers can
/// hand over a whole ingestion batch in one call.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;
}

/// A single candidate/score pair as scored by a cross-encoder reranker.
#[derive(Debug, Clone)]
pub struct RerankedCandidate {
    pub index: usize,
    pub score: f32,
}

/// Cross-encoder reranking over a (query, candidate) set.
#[async_trait]
pub trait RerankerClient: Send + Sync {
    async fn rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<RerankedCandidate>>;
}

/// The vector store's query surface: dense ANN search, lexical full-text
/// scroll, and the neighbor-window fetch used for parent/child context
/// expansion. One call may run both `query_points` and a filtered `scroll`
/// concurrently internally; `hybrid_search` returns both rank orderings so
/// the caller performs RRF fusion.
#[async_trait]
pub trait VectorStoreClient: Send + Sync {
    async fn dense_search(
        &self,
        vector: &[f32],
        limit: usize,
        filters: Option<&FilterSet>,
    ) -> Result<Vec<(Document, usize)>>;

    async fn lexical_search(
        &self,
        text: &str,
        limit: usize,
        filters: Option<&FilterSet>,
    ) -> Result<Vec<(Document, usize)>>;

    /// Chunks within `window` positions of `chunk_index` for the same
    /// `document_id`, ordered by `chunk_index` ascending.
    async fn surrounding_chunks(
        &self,
        document_id: &str,
        chunk_index: u32,
        window: u32,
    ) -> Result<Vec<Document>>;
}

/// One turn of generated text plus whatever usage accounting the backend
/// reports, mirroring the teacher's `GenerationResult`.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Chat-style text generation. `system_prompt` and `history` are passed
/// separately so backends that support a dedicated system role (Claude,
/// OpenAI) don't need to fold it into the message list themselves.
#[async_trait]
pub trait GeneratorBackend: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<GenerationResult>;

    /// Approximate token count for budget accounting. Default falls back to
    /// a four-characters-per-token heuristic; backends with a real tokenizer
    /// should override it.
    fn estimate_tokens(&self, text: &str) -> usize {
        (text.chars().count() as f32 / 4.0).ceil() as usize
    }

    /// The backend's context window size in tokens, used by the context
    /// packer to compute the documents budget.
    fn context_window(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub;

    #[async_trait]
    impl GeneratorBackend for Stub {
        async fn generate(
            &self,
            _system_prompt: &str,
            _history: &[ChatMessage],
            _user_message: &str,
        ) -> Result<GenerationResult> {
            Ok(GenerationResult { text: "ok".into(), prompt_tokens: 0, completion_tokens: 0 })
        }

        fn context_window(&self) -> usize {
            8000
        }
    }

    #[test]
    fn default_token_estimate_is_four_chars_per_token() {
        let stub = Stub;
        assert_eq!(stub.estimate_tokens("12345678"), 2);
    }
}
