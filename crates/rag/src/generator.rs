//! §4.12: system-prompt assembly, the generator call, validation, and
//! output guardrails, bundled into the one node the workflow calls last.

use hr_rag_core::{ChatMessage, Document, ExpertiseLevel, GeneratorBackend, Language, Result, ResponseStyle};

use crate::context_packer::{pack_documents, PackedContext};
use crate::guardrails::validate_output;
use crate::prompt_factory::{create_dynamic_system_prompt, SystemPromptInputs};
use crate::validator::validate_generation;

pub struct GenerationOutcome {
    pub response: String,
    pub packed: PackedContext,
    pub confidence: f32,
    pub warnings: Vec<String>,
}

/// Assembles the system prompt from turn context, packs the graded/expanded
/// documents against the generator's budget, calls the generator once, then
/// runs content validation and output guardrails over the result.
#[allow(clippy::too_many_arguments)]
pub async fn generate(
    generator: &dyn GeneratorBackend,
    org_name: &str,
    query: &str,
    query_language: Language,
    expertise_level: ExpertiseLevel,
    response_style: ResponseStyle,
    history: &[ChatMessage],
    documents: Vec<Document>,
    reserve_output: Option<usize>,
    strict_output_guardrails: bool,
) -> Result<GenerationOutcome> {
    let started = std::time::Instant::now();
    let doc_count = documents.len();
    let query_length = query.len();

    let system_prompt = create_dynamic_system_prompt(&SystemPromptInputs {
        org_name,
        language: query_language,
        query,
        expertise_level,
        response_style,
        documents: &documents,
    });

    let validation_documents = documents.clone();
    let packed = pack_documents(generator, &system_prompt, query, history, documents, reserve_output);

    let user_message = format!("Context:\n{}\n\nQuestion: {}", packed.text, query);
    let result = generator.generate(&system_prompt, history, &user_message).await?;

    let validation = validate_generation(&result.text, &validation_documents);

    // Output guardrail failures (including a strict low-confidence reject) are
    // non-fatal here: the turn still answers, with the raw text and a warning.
    let (response, warnings) =
        match validate_output(&result.text, validation.confidence, Vec::new(), strict_output_guardrails) {
            Ok(output) => (output.response, output.warnings),
            Err(e) => {
                tracing::warn!(error = %e, "output guardrail error, surfacing unmasked response");
                (result.text.clone(), vec![format!("guardrail error: {e}")])
            }
        };

    tracing::info!(
        event = "generation_completed",
        query_length,
        doc_count,
        latency_ms = started.elapsed().as_millis() as u64,
        tokens_used = result.prompt_tokens + result.completion_tokens,
        confidence = validation.confidence,
        warning_count = warnings.len(),
    );

    Ok(GenerationOutcome { response, packed, confidence: validation.confidence, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hr_rag_core::GenerationResult;

    struct StubGenerator;

    #[async_trait]
    impl GeneratorBackend for StubGenerator {
        async fn generate(&self, _: &str, _: &[ChatMessage], _: &str) -> Result<GenerationResult> {
            Ok(GenerationResult {
                text: "Employees receive twenty one days of annual leave per year.".into(),
                prompt_tokens: 10,
                completion_tokens: 10,
            })
        }
        fn context_window(&self) -> usize {
            8000
        }
    }

    #[tokio::test]
    async fn generates_and_validates_a_response() {
        let outcome = generate(
            &StubGenerator,
            "Acme",
            "What is the leave policy?",
            Language::En,
            ExpertiseLevel::General,
            ResponseStyle::Balanced,
            &[],
            vec![Document::new("d1", "leave policy text", 0.9)],
            None,
            false,
        )
        .await
        .unwrap();

        assert!(outcome.response.contains("annual leave"));
    }
}
