//! Candidate passage type shared by retrieval, reranking, grading, and
//! context assembly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single candidate passage carried through the pipeline. Fields are
/// additive as the document passes through stages: `retrieval_score` is set
/// by the hybrid search engine, `score` is whichever value is currently
/// primary for sorting, and `combined_score` is populated by the reranker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub text: String,
    /// Current primary score; the field sorting is performed on.
    pub score: f32,
    /// Fusion score from the hybrid search engine, before reranking.
    pub retrieval_score: f32,
    /// `(retrieval_score + rerank_score) / 2`, set once reranked.
    pub combined_score: Option<f32>,
    /// Set by the retriever when a query language was detected and this
    /// document's metadata language matches it.
    pub language_match: bool,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            score,
            retrieval_score: score,
            combined_score: None,
            language_match: false,
            metadata: DocumentMetadata::default(),
        }
    }
}

/// Payload fields carried alongside the text, matching the vector store's
/// required payload index set.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DocumentMetadata {
    pub document_id: Option<String>,
    pub source: Option<String>,
    pub file_type: Option<String>,
    pub language: Option<String>,
    pub file_hash: Option<String>,
    pub page_number: Option<u32>,
    pub page_start: Option<u32>,
    pub page_end: Option<u32>,
    pub chunk_index: Option<u32>,
    pub parent_chunk_index: Option<u32>,
    pub parent_text: Option<String>,
    pub section_header: Option<String>,
    pub element_types: Vec<String>,
    pub point_type: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Any payload fields the core doesn't model explicitly, preserved for
    /// round-tripping through `upsert`/`scroll`.
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Equality/range filter compiled against the vector store's payload
/// indexes (§6: keyword equality, numeric/date bounds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FilterValue {
    Keyword(String),
    Range { gte: Option<i64>, lte: Option<i64>, gt: Option<i64>, lt: Option<i64> },
}

pub type FilterSet = HashMap<String, FilterValue>;
