//! Query Preparer: a single generator call producing a rewritten query,
//! alternates, a step-back query, and inferred filters as a strict JSON
//! contract, with an identity fallback on parse failure.

use serde::Deserialize;
use std::collections::HashMap;

use hr_rag_core::{ChatMessage, FilterSet, FilterValue, GeneratorBackend};

use crate::prompt_factory::QUERY_PREPARER_SYSTEM_PROMPT;

#[derive(Debug, Deserialize, Default)]
struct QueryPreparerContract {
    search_query: Option<String>,
    #[serde(default)]
    search_queries: Vec<String>,
    step_back_query: Option<String>,
    filters: Option<HashMap<String, String>>,
}

pub struct PreparedQuery {
    pub search_query: String,
    pub search_queries: Vec<String>,
    pub filters: Option<FilterSet>,
}

fn identity(original: &str) -> PreparedQuery {
    PreparedQuery {
        search_query: original.to_string(),
        search_queries: vec![original.to_string()],
        filters: None,
    }
}

/// Extracts the first JSON object from `text`, tolerating fenced code
/// blocks (```json ... ``` or plain ```).
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0i32;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn to_filter_set(raw: HashMap<String, String>) -> FilterSet {
    raw.into_iter().map(|(k, v)| (k, FilterValue::Keyword(v))).collect()
}

/// Runs the generator once with the query-preparer system prompt and
/// parses its strict JSON contract. On any parse failure, logs and returns
/// the identity transform (non-fatal, per the spec's failure semantics).
pub async fn prepare_query(
    generator: &dyn GeneratorBackend,
    original_query: &str,
) -> PreparedQuery {
    let result = generator
        .generate(QUERY_PREPARER_SYSTEM_PROMPT, &[] as &[ChatMessage], original_query)
        .await;

    let raw_text = match result {
        Ok(r) => r.text,
        Err(e) => {
            tracing::warn!(error = %e, "query preparer generator call failed, using identity rewrite");
            return identity(original_query);
        }
    };

    let Some(json_str) = extract_json_object(&raw_text) else {
        tracing::warn!("query preparer response contained no JSON object, using identity rewrite");
        return identity(original_query);
    };

    let contract: QueryPreparerContract = match serde_json::from_str(json_str) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "query preparer JSON parse failed, using identity rewrite");
            return identity(original_query);
        }
    };

    let search_query = contract.search_query.unwrap_or_else(|| original_query.to_string());

    let mut family = vec![search_query.clone()];
    for alt in contract.search_queries.into_iter().take(3) {
        if !family.contains(&alt) {
            family.push(alt);
        }
    }
    if let Some(step_back) = contract.step_back_query {
        if !family.contains(&step_back) {
            family.push(step_back);
        }
    }
    family.truncate(3);

    PreparedQuery {
        search_query,
        search_queries: family,
        filters: contract.filters.map(to_filter_set),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_from_fenced_block() {
        let text = "Here you go:\n```json\n{\"search_query\": \"leave policy\"}\n```";
        let extracted = extract_json_object(text).unwrap();
        assert_eq!(extracted, "{\"search_query\": \"leave policy\"}");
    }

    #[test]
    fn returns_none_without_braces() {
        assert!(extract_json_object("no json here").is_none());
    }

    #[test]
    fn identity_fallback_preserves_original_query() {
        let prepared = identity("What is the leave policy?");
        assert_eq!(prepared.search_query, "What is the leave policy?");
        assert_eq!(prepared.search_queries, vec!["What is the leave policy?"]);
        assert!(prepared.filters.is_none());
    }
}
