//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{endpoints, rag, timeouts};
use crate::ConfigError;

/// Runtime environment (development, staging, production).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Which generator backend a turn's generation node talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorProvider {
    Claude,
    OpenAi,
    #[default]
    Ollama,
}

/// Main application settings, loaded once at startup and shared as an
/// immutable `Arc<Settings>` for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub reranker: RerankerConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings; mirrors the teacher's per-section validation
    /// pattern but scoped to what this pipeline actually configures.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_retrieval()?;
        self.validate_agent()?;
        self.validate_vector_store()?;
        Ok(())
    }

    fn validate_retrieval(&self) -> Result<(), ConfigError> {
        let r = &self.retrieval;
        if r.rrf_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.rrf_k".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if r.retrieval_top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.retrieval_top_k".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&r.grader_score_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.grader_score_threshold".to_string(),
                message: format!("must be between 0.0 and 1.0, got {}", r.grader_score_threshold),
            });
        }
        Ok(())
    }

    fn validate_agent(&self) -> Result<(), ConfigError> {
        if self.agent.max_retries > 3 {
            return Err(ConfigError::InvalidValue {
                field: "agent.max_retries".to_string(),
                message: "bounded at 3 by design".to_string(),
            });
        }
        Ok(())
    }

    fn validate_vector_store(&self) -> Result<(), ConfigError> {
        if self.vector_store.qdrant_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "vector_store.qdrant_url".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.embedding.dim == 0 {
            return Err(ConfigError::InvalidValue {
                field: "embedding.dim".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.embedding.dim != self.vector_store.vector_dim && self.environment.is_strict() {
            return Err(ConfigError::InvalidValue {
                field: "embedding.dim".to_string(),
                message: format!(
                    "must match vector_store.vector_dim ({} != {})",
                    self.embedding.dim, self.vector_store.vector_dim
                ),
            });
        }
        Ok(())
    }
}

/// Generator (chat completion) backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub provider: GeneratorProvider,

    #[serde(default = "default_claude_model")]
    pub claude_model: String,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default = "endpoints_anthropic")]
    pub anthropic_base_url: String,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "endpoints_openai")]
    pub openai_base_url: String,

    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    #[serde(default = "endpoints_ollama")]
    pub ollama_base_url: String,

    #[serde(default = "default_reserve_output")]
    pub reserve_output_tokens: usize,
    #[serde(default = "timeouts_generator")]
    pub timeout_ms: u64,
}

fn default_claude_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}
fn default_openai_model() -> String {
    "gpt-4o".to_string()
}
fn default_ollama_model() -> String {
    "llama3.1".to_string()
}
fn default_reserve_output() -> usize {
    rag::CONTEXT_RESERVE_OUTPUT
}
fn endpoints_anthropic() -> String {
    endpoints::ANTHROPIC_DEFAULT.to_string()
}
fn endpoints_openai() -> String {
    endpoints::OPENAI_DEFAULT.to_string()
}
fn endpoints_ollama() -> String {
    endpoints::OLLAMA_DEFAULT.to_string()
}
fn timeouts_generator() -> u64 {
    timeouts::GENERATOR_REQUEST_MS
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: GeneratorProvider::default(),
            claude_model: default_claude_model(),
            anthropic_api_key: None,
            anthropic_base_url: endpoints_anthropic(),
            openai_model: default_openai_model(),
            openai_api_key: None,
            openai_base_url: endpoints_openai(),
            ollama_model: default_ollama_model(),
            ollama_base_url: endpoints_ollama(),
            reserve_output_tokens: default_reserve_output(),
            timeout_ms: timeouts_generator(),
        }
    }
}

/// Embedding service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "endpoints_ollama")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dim")]
    pub dim: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_embedding_model() -> String {
    "nomic-embed-text:latest".to_string()
}
fn default_embedding_dim() -> usize {
    rag::EMBEDDING_DIM
}
fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: endpoints_ollama(),
            model: default_embedding_model(),
            dim: default_embedding_dim(),
            batch_size: default_batch_size(),
        }
    }
}

/// Reranker (cross-encoder) service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    #[serde(default = "default_model_server_url")]
    pub base_url: String,
    #[serde(default = "default_reranker_model")]
    pub model: String,
    #[serde(default = "default_rerank_top_k")]
    pub top_k: usize,
}

fn default_model_server_url() -> String {
    endpoints::MODEL_SERVER_DEFAULT.to_string()
}
fn default_reranker_model() -> String {
    "jinaai/jina-reranker-v2-base-multilingual".to_string()
}
fn default_rerank_top_k() -> usize {
    rag::RERANK_TOP_K
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_server_url(),
            model: default_reranker_model(),
            top_k: default_rerank_top_k(),
        }
    }
}

/// Vector store (Qdrant) connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_qdrant_collection")]
    pub collection: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_dim")]
    pub vector_dim: usize,
}

fn default_qdrant_url() -> String {
    endpoints::QDRANT_DEFAULT.to_string()
}
fn default_qdrant_collection() -> String {
    "documents".to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            qdrant_url: default_qdrant_url(),
            collection: default_qdrant_collection(),
            api_key: None,
            vector_dim: default_embedding_dim(),
        }
    }
}

/// Retrieval shape: fan-out, fusion, and grading tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,
    #[serde(default = "default_retrieval_prefetch_limit")]
    pub retrieval_prefetch_limit: usize,
    #[serde(default = "default_rrf_k")]
    pub rrf_k: usize,
    #[serde(default = "default_grader_threshold")]
    pub grader_score_threshold: f32,
    #[serde(default = "default_grader_min_keep")]
    pub grader_min_keep: usize,
    #[serde(default = "default_language_boost")]
    pub language_affinity_boost: f32,
    #[serde(default = "default_neighbor_window")]
    pub neighbor_window: usize,
    #[serde(default)]
    pub enable_hyde: bool,
    #[serde(default)]
    pub enable_hypothetical_questions: bool,
}

fn default_retrieval_top_k() -> usize {
    rag::RETRIEVAL_TOP_K
}
fn default_retrieval_prefetch_limit() -> usize {
    rag::RETRIEVAL_PREFETCH_LIMIT
}
fn default_rrf_k() -> usize {
    rag::RRF_K
}
fn default_grader_threshold() -> f32 {
    rag::GRADER_SCORE_THRESHOLD
}
fn default_grader_min_keep() -> usize {
    rag::GRADER_MIN_KEEP
}
fn default_language_boost() -> f32 {
    rag::LANGUAGE_AFFINITY_BOOST
}
fn default_neighbor_window() -> usize {
    rag::NEIGHBOR_WINDOW
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            retrieval_top_k: default_retrieval_top_k(),
            retrieval_prefetch_limit: default_retrieval_prefetch_limit(),
            rrf_k: default_rrf_k(),
            grader_score_threshold: default_grader_threshold(),
            grader_min_keep: default_grader_min_keep(),
            language_affinity_boost: default_language_boost(),
            neighbor_window: default_neighbor_window(),
            enable_hyde: true,
            enable_hypothetical_questions: true,
        }
    }
}

/// Agent-level (workflow engine) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_max_input_len")]
    pub max_input_len: usize,
    #[serde(default)]
    pub strict_output_guardrails: bool,
    #[serde(default = "default_org_name")]
    pub org_name: String,
}

fn default_max_retries() -> u32 {
    rag::MAX_RETRIES
}
fn default_max_input_len() -> usize {
    2000
}
fn default_org_name() -> String {
    "the company".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_input_len: default_max_input_len(),
            strict_output_guardrails: false,
            org_name: default_org_name(),
        }
    }
}

/// Observability (logging) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment.
///
/// Priority (highest to lowest):
/// 1. Environment variables (`APP__` prefix, `__` separator)
/// 2. `config/{env}.toml` (if env specified)
/// 3. `config/default.toml`
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rrf_k_zero_rejected() {
        let mut settings = Settings::default();
        settings.retrieval.rrf_k = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn max_retries_bounded_at_three() {
        let mut settings = Settings::default();
        settings.agent.max_retries = 4;
        assert!(settings.validate().is_err());
        settings.agent.max_retries = 3;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn grader_threshold_out_of_range_rejected() {
        let mut settings = Settings::default();
        settings.retrieval.grader_score_threshold = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn mismatched_embedding_dim_rejected_in_strict_mode() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.embedding.dim = 768;
        settings.vector_store.vector_dim = 1024;
        assert!(settings.validate().is_err());
    }
}
