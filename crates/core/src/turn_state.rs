//! The accumulating turn state the workflow engine threads through nodes,
//! and the partial-state delta record nodes return.

use serde::{Deserialize, Serialize};

use crate::document::{Document, FilterSet};

/// One of the three intents the classifier recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Thanks,
    HrQuery,
}

/// Detected language, from the configured closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ru,
    Uz,
    Unknown,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
            Language::Uz => "uz",
            Language::Unknown => "unknown",
        }
    }
}

/// Conversation role for a message in the turn's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// User-specific runtime configuration threaded into prompt assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeContext {
    /// "auto" or an explicit language code override.
    pub language_preference: String,
    pub expertise_level: ExpertiseLevel,
    pub response_style: ResponseStyle,
    pub enable_citations: bool,
    pub max_response_length: Option<usize>,
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self {
            language_preference: "auto".to_string(),
            expertise_level: ExpertiseLevel::General,
            response_style: ResponseStyle::Balanced,
            enable_citations: false,
            max_response_length: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpertiseLevel {
    Expert,
    General,
    Beginner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    Detailed,
    Balanced,
}

/// Packing/validation telemetry emitted by the context packer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContextMetadata {
    pub total_docs: usize,
    pub included_docs: usize,
    pub tokens_used: usize,
    pub tokens_available: usize,
    pub tokens_reserved: usize,
    pub utilization_pct: f32,
}

/// The full, accumulated state of one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnState {
    pub original_query: String,
    pub query: String,
    pub search_query: String,
    pub search_queries: Vec<String>,
    pub inferred_filters: Option<FilterSet>,
    pub intent: Option<Intent>,
    pub query_language: Option<Language>,
    pub documents: Vec<Document>,
    pub retries: u32,
    pub messages: Vec<ChatMessage>,
    pub runtime_context: RuntimeContext,
    pub context_metadata: Option<ContextMetadata>,
    pub generation: Option<String>,
    /// Per-stage counts and latencies, accumulated as nodes run; read by
    /// `run_turn` at turn completion to emit `agent_execution_completed`.
    pub retrieved_count: usize,
    pub reranked_count: usize,
    pub graded_count: usize,
    pub retrieval_latency_ms: u64,
    pub rerank_latency_ms: u64,
    pub grading_latency_ms: u64,
    pub generation_latency_ms: u64,
    pub generation_confidence: f32,
    pub generation_warning_count: usize,
}

impl TurnState {
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            original_query: query.clone(),
            query: query.clone(),
            search_query: query.clone(),
            search_queries: vec![query],
            inferred_filters: None,
            intent: None,
            query_language: None,
            documents: Vec::new(),
            retries: 0,
            messages: Vec::new(),
            runtime_context: RuntimeContext::default(),
            context_metadata: None,
            generation: None,
            retrieved_count: 0,
            reranked_count: 0,
            graded_count: 0,
            retrieval_latency_ms: 0,
            rerank_latency_ms: 0,
            grading_latency_ms: 0,
            generation_latency_ms: 0,
            generation_confidence: 0.0,
            generation_warning_count: 0,
        }
    }

    /// Merge a node's partial return into this state. Fields the partial
    /// leaves `None` keep their prior value (the "monotonic w.r.t. omitted
    /// fields" invariant); `documents` is always re-sorted by `score`
    /// descending after a merge that touches it, and `retries` never
    /// decreases.
    pub fn merge(&mut self, partial: PartialTurnState) {
        if let Some(q) = partial.query {
            self.query = q;
        }
        if let Some(sq) = partial.search_query {
            self.search_query = sq;
        }
        if let Some(sqs) = partial.search_queries {
            self.search_queries = sqs;
        }
        if let Some(f) = partial.inferred_filters {
            self.inferred_filters = Some(f);
        }
        if let Some(i) = partial.intent {
            self.intent = Some(i);
        }
        if let Some(l) = partial.query_language {
            self.query_language = Some(l);
        }
        if let Some(mut docs) = partial.documents {
            docs.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
            self.documents = docs;
        }
        if let Some(r) = partial.retries {
            self.retries = self.retries.max(r);
        }
        if let Some(m) = partial.messages {
            self.messages = m;
        }
        if let Some(rc) = partial.runtime_context {
            self.runtime_context = rc;
        }
        if let Some(cm) = partial.context_metadata {
            self.context_metadata = Some(cm);
        }
        if let Some(g) = partial.generation {
            self.generation = Some(g);
        }
        if let Some(c) = partial.retrieved_count {
            self.retrieved_count = c;
        }
        if let Some(c) = partial.reranked_count {
            self.reranked_count = c;
        }
        if let Some(c) = partial.graded_count {
            self.graded_count = c;
        }
        if let Some(l) = partial.retrieval_latency_ms {
            self.retrieval_latency_ms = l;
        }
        if let Some(l) = partial.rerank_latency_ms {
            self.rerank_latency_ms = l;
        }
        if let Some(l) = partial.grading_latency_ms {
            self.grading_latency_ms = l;
        }
        if let Some(l) = partial.generation_latency_ms {
            self.generation_latency_ms = l;
        }
        if let Some(c) = partial.generation_confidence {
            self.generation_confidence = c;
        }
        if let Some(c) = partial.generation_warning_count {
            self.generation_warning_count = c;
        }
    }
}

/// The delta record a node returns; `None` fields are left untouched by
/// `TurnState::merge`. `original_query` has no field here because it never
/// mutates past the turn's construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialTurnState {
    pub query: Option<String>,
    pub search_query: Option<String>,
    pub search_queries: Option<Vec<String>>,
    pub inferred_filters: Option<FilterSet>,
    pub intent: Option<Intent>,
    pub query_language: Option<Language>,
    pub documents: Option<Vec<Document>>,
    pub retries: Option<u32>,
    pub messages: Option<Vec<ChatMessage>>,
    pub runtime_context: Option<RuntimeContext>,
    pub context_metadata: Option<ContextMetadata>,
    pub generation: Option<String>,
    pub retrieved_count: Option<usize>,
    pub reranked_count: Option<usize>,
    pub graded_count: Option<usize>,
    pub retrieval_latency_ms: Option<u64>,
    pub rerank_latency_ms: Option<u64>,
    pub grading_latency_ms: Option<u64>,
    pub generation_latency_ms: Option<u64>,
    pub generation_confidence: Option<f32>,
    pub generation_warning_count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn merge_leaves_omitted_fields_intact() {
        let mut state = TurnState::new("hello");
        state.retries = 1;
        let partial = PartialTurnState { generation: Some("hi".into()), ..Default::default() };
        state.merge(partial);
        assert_eq!(state.retries, 1);
        assert_eq!(state.generation.as_deref(), Some("hi"));
        assert_eq!(state.original_query, "hello");
    }

    #[test]
    fn merge_resorts_documents_by_score_descending() {
        let mut state = TurnState::new("q");
        let docs = vec![Document::new("a", "t", 0.2), Document::new("b", "t", 0.9)];
        state.merge(PartialTurnState { documents: Some(docs), ..Default::default() });
        assert_eq!(state.documents[0].id, "b");
        assert_eq!(state.documents[1].id, "a");
    }

    #[test]
    fn retries_never_decreases() {
        let mut state = TurnState::new("q");
        state.retries = 2;
        state.merge(PartialTurnState { retries: Some(1), ..Default::default() });
        assert_eq!(state.retries, 2);
    }
}
