//! Core types and traits for the HR policy RAG pipeline.
//!
//! This crate provides the foundational, domain-free vocabulary that every
//! other crate builds on:
//! - [`error`]: the workspace-wide error taxonomy
//! - [`document`]: the candidate-passage type threaded through retrieval,
//!   reranking, grading, and context assembly
//! - [`turn_state`]: the accumulating per-turn state and the partial-state
//!   delta record workflow nodes return
//! - [`traits`]: pluggable-backend seams for the embedding, reranker, vector
//!   store, and generator collaborators

pub mod document;
pub mod error;
pub mod traits;
pub mod turn_state;

pub use document::{Document, DocumentMetadata, FilterSet, FilterValue};
pub use error::{Error, Result};
pub use traits::{
    EmbeddingClient, GenerationResult, GeneratorBackend, RerankedCandidate, RerankerClient,
    VectorStoreClient,
};
pub use turn_state::{
    ChatMessage, ContextMetadata, ExpertiseLevel, Intent, Language, PartialTurnState, Role,
    ResponseStyle, RuntimeContext, TurnState,
};
