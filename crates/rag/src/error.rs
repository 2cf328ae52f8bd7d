use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("embedding service error: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    VectorStore(String),

    #[error("reranker error: {0}")]
    Reranker(String),

    #[error("guardrail violation: {0}")]
    Guardrail(String),

    #[error("failed to parse generator contract: {0}")]
    Parse(String),
}

impl From<RagError> for hr_rag_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Embedding(m) => hr_rag_core::Error::upstream("embedding", m),
            RagError::VectorStore(m) => hr_rag_core::Error::upstream("vector_store", m),
            RagError::Reranker(m) => hr_rag_core::Error::upstream("reranker", m),
            RagError::Guardrail(m) => hr_rag_core::Error::GuardrailViolation(m),
            RagError::Parse(m) => hr_rag_core::Error::Parse(m),
        }
    }
}
