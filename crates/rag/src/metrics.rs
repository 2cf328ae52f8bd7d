//! §4.15 (ambient): per-turn metrics accumulated alongside the structured
//! log events and emitted once via `agent_execution_completed`.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievalMetrics {
    pub query_count: usize,
    pub doc_count: usize,
    pub retries: u32,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentMetrics {
    pub intent: String,
    pub query_language: String,
    pub retrieval: RetrievalMetrics,
    pub reranked_count: usize,
    pub rerank_latency_ms: u64,
    pub graded_count: usize,
    pub grading_latency_ms: u64,
    pub generation_confidence: f32,
    pub generation_warning_count: usize,
    pub generation_latency_ms: u64,
    pub total_latency_ms: u64,
}
