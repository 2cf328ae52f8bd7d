//! Generator backends for the HR policy RAG pipeline.
//!
//! Each backend implements [`hr_rag_core::GeneratorBackend`]; [`factory`]
//! picks the one named by [`hr_rag_config::GeneratorConfig::provider`].

pub mod claude;
pub mod error;
pub mod factory;
pub mod ollama;
pub mod openai;

pub use claude::ClaudeGenerator;
pub use error::GeneratorError;
pub use factory::build_generator;
pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;
