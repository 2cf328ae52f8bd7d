//! §4.11 rewrite path: single-shot reformulation of the working query when
//! grading yields no documents and retries remain.

use hr_rag_core::{ChatMessage, GeneratorBackend};

const REWRITE_SYSTEM_PROMPT: &str = "Rewrite the following HR policy question as a single, more specific search query likely to match policy document wording. Respond with the rewritten query only, no commentary.";

/// Falls back to the original query, unmodified, on any generator failure
/// (mirrors the query preparer's identity-fallback policy).
pub async fn rewrite_query(generator: &dyn GeneratorBackend, query: &str) -> String {
    match generator.generate(REWRITE_SYSTEM_PROMPT, &[] as &[ChatMessage], query).await {
        Ok(result) => {
            let rewritten = result.text.trim();
            if rewritten.is_empty() {
                query.to_string()
            } else {
                rewritten.to_string()
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "query rewrite failed, keeping prior query");
            query.to_string()
        }
    }
}
