use std::sync::Arc;
use std::time::Duration;

use hr_rag_config::{GeneratorConfig, GeneratorProvider};
use hr_rag_core::{GeneratorBackend, Result};

use crate::claude::ClaudeGenerator;
use crate::ollama::OllamaGenerator;
use crate::openai::OpenAiGenerator;

/// Default sampling knobs; the generator config doesn't expose these
/// per-provider since the original pipeline hardcodes them at the call site.
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Builds the generator backend named by `config.provider`, using whichever
/// sub-config block matches.
pub fn build_generator(config: &GeneratorConfig) -> Result<Arc<dyn GeneratorBackend>> {
    let timeout = Duration::from_millis(config.timeout_ms);
    match config.provider {
        GeneratorProvider::Claude => Ok(Arc::new(ClaudeGenerator::with_base_url(
            config.anthropic_api_key.clone().unwrap_or_default(),
            config.claude_model.clone(),
            config.anthropic_base_url.clone(),
            DEFAULT_MAX_TOKENS,
            DEFAULT_TEMPERATURE,
            timeout,
        ))),
        GeneratorProvider::OpenAi => Ok(Arc::new(OpenAiGenerator::with_base_url(
            config.openai_api_key.clone().unwrap_or_default(),
            config.openai_model.clone(),
            config.openai_base_url.clone(),
            DEFAULT_MAX_TOKENS,
            DEFAULT_TEMPERATURE,
            timeout,
        ))),
        GeneratorProvider::Ollama => Ok(Arc::new(OllamaGenerator::new(
            config.ollama_base_url.clone(),
            config.ollama_model.clone(),
            DEFAULT_TEMPERATURE,
            timeout,
        ))),
    }
}
