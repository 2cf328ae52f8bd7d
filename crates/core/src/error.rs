//! Crate-wide error taxonomy.
//!
//! Every other crate declares its own `thiserror` enum scoped to the
//! failures it can produce (`RagError`, `LlmError`, `WorkflowError`) and
//! converts into this one at the boundary, mirroring how the teacher's
//! `rag`/`llm` crates funnel into a single workspace error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Input failed a non-retryable guardrail check (injection, length, empty).
    /// Terminates the turn immediately; no retrieval is performed.
    #[error("guardrail violation: {0}")]
    GuardrailViolation(String),

    /// A JSON contract from the generator (query preparer, grader) could not
    /// be parsed. Non-fatal: callers fall back to an identity transform.
    #[error("parse failure: {0}")]
    Parse(String),

    /// An external service call failed. `service` names which of the four
    /// collaborators (embedding, reranker, vector_store, generator) failed.
    #[error("{service} request failed: {message}")]
    Upstream { service: &'static str, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("workflow error: {0}")]
    Workflow(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Terminal errors stop the turn outright; everything else is either
    /// caught inside a fan-out combinator or routed to a fallback path.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::GuardrailViolation(_) | Error::Upstream { service: "generator", .. })
    }

    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Error::Upstream { service, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guardrail_violation_is_terminal() {
        assert!(Error::GuardrailViolation("injection".into()).is_terminal());
    }

    #[test]
    fn per_call_embedding_failure_is_not_terminal() {
        assert!(!Error::upstream("embedding", "timeout").is_terminal());
    }

    #[test]
    fn generator_failure_is_terminal() {
        assert!(Error::upstream("generator", "connection refused").is_terminal());
    }
}
