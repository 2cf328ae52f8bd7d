//! Configuration management for the HR policy RAG pipeline.
//!
//! Supports loading configuration from:
//! - TOML files (`config/default.toml`, `config/{environment}.toml`)
//! - Environment variables (`APP__` prefix)
//! - Compiled-in defaults for every field

pub mod constants;
pub mod observability;
pub mod settings;

pub use observability::init_tracing;
pub use settings::{
    load_settings, AgentConfig, EmbeddingConfig, GeneratorConfig, GeneratorProvider,
    ObservabilityConfig, RerankerConfig, RetrievalConfig, RuntimeEnvironment, Settings,
    VectorStoreConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
