//! §4.9: token-aware greedy packing of graded/expanded documents against a
//! per-model budget.

use hr_rag_core::{ChatMessage, ContextMetadata, Document, GeneratorBackend};

const DEFAULT_RESERVE_OUTPUT: usize = 4000;
const TEMPLATE_OVERHEAD: usize = 200;
const MIN_DOC_BUDGET: usize = 1000;

pub struct PackedContext {
    pub text: String,
    pub metadata: ContextMetadata,
}

fn format_document(index: usize, doc: &Document) -> String {
    let page = match (doc.metadata.page_number, doc.metadata.page_start, doc.metadata.page_end) {
        (Some(p), _, _) => format!("page {p}"),
        (_, Some(s), Some(e)) if s != e => format!("pages {s}-{e}"),
        (_, Some(s), _) => format!("page {s}"),
        _ => "page ?".to_string(),
    };
    format!("[{}] ({}): {}", index + 1, page, doc.text)
}

/// Greedily includes documents, highest-scoring first, until the next one
/// would exceed the remaining budget. If the very first document alone
/// doesn't fit, it is character-truncated and included alone.
pub fn pack_documents(
    generator: &dyn GeneratorBackend,
    system_prompt: &str,
    query: &str,
    history: &[ChatMessage],
    mut documents: Vec<Document>,
    reserve_output: Option<usize>,
) -> PackedContext {
    documents.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let reserve = reserve_output.unwrap_or(DEFAULT_RESERVE_OUTPUT);
    let window = generator.context_window();
    let budget = window.saturating_sub(reserve);

    let history_tokens: usize = history.iter().map(|m| generator.estimate_tokens(&m.content)).sum();
    let overhead = generator.estimate_tokens(system_prompt)
        + generator.estimate_tokens(query)
        + history_tokens
        + TEMPLATE_OVERHEAD;

    let documents_budget = budget.saturating_sub(overhead).max(MIN_DOC_BUDGET);

    let total_docs = documents.len();
    let mut included_docs = 0usize;
    let mut tokens_used = 0usize;
    let mut pieces = Vec::new();

    for (i, doc) in documents.iter().enumerate() {
        let formatted = format_document(i, doc);
        let formatted_tokens = generator.estimate_tokens(&formatted);

        if i == 0 && formatted_tokens > documents_budget {
            let remaining_chars = documents_budget * 4;
            let truncated: String = formatted.chars().take(remaining_chars).collect();
            tokens_used = generator.estimate_tokens(&truncated);
            pieces.push(truncated);
            included_docs = 1;
            break;
        }

        if tokens_used + formatted_tokens > documents_budget {
            break;
        }

        tokens_used += formatted_tokens;
        pieces.push(formatted);
        included_docs += 1;
    }

    let text = pieces.join("\n");
    let utilization_pct =
        if documents_budget > 0 { (tokens_used as f32 / documents_budget as f32) * 100.0 } else { 0.0 };

    PackedContext {
        text,
        metadata: ContextMetadata {
            total_docs,
            included_docs,
            tokens_used,
            tokens_available: documents_budget,
            tokens_reserved: reserve,
            utilization_pct,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hr_rag_core::{GenerationResult, Result};

    struct StubGenerator {
        window: usize,
    }

    #[async_trait]
    impl GeneratorBackend for StubGenerator {
        async fn generate(&self, _: &str, _: &[ChatMessage], _: &str) -> Result<GenerationResult> {
            unimplemented!()
        }
        fn context_window(&self) -> usize {
            self.window
        }
    }

    fn doc(id: &str, text: &str, score: f32) -> Document {
        Document::new(id, text, score)
    }

    #[test]
    fn includes_all_documents_within_budget() {
        let generator = StubGenerator { window: 8000 };
        let docs = vec![doc("a", "short text", 0.9), doc("b", "other short text", 0.8)];
        let packed = pack_documents(&generator, "sys", "query", &[], docs, None);
        assert_eq!(packed.metadata.included_docs, 2);
        assert_eq!(packed.metadata.total_docs, 2);
    }

    #[test]
    fn oversized_first_document_is_truncated_and_included_alone() {
        let generator = StubGenerator { window: 4200 };
        let huge = "x".repeat(20_000);
        let docs = vec![doc("a", &huge, 0.9), doc("b", "small", 0.8)];
        let packed = pack_documents(&generator, "sys", "q", &[], docs, Some(0));
        assert_eq!(packed.metadata.included_docs, 1);
        assert!(packed.text.len() < huge.len());
    }

    #[test]
    fn documents_budget_floors_at_minimum() {
        let generator = StubGenerator { window: 100 };
        let docs = vec![doc("a", "tiny", 0.9)];
        let packed = pack_documents(&generator, "s", "q", &[], docs, Some(50));
        assert_eq!(packed.metadata.tokens_available, MIN_DOC_BUDGET);
    }
}
