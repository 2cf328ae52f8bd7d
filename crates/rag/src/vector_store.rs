//! Qdrant-backed implementation of `VectorStoreClient`: dense ANN search,
//! lexical full-text scroll, and neighbor-window fetch for parent/child
//! context expansion.

use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, FieldCondition, Filter, PointId, QueryPointsBuilder, Range, ScrollPointsBuilder,
    Value as QdrantValue,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;

use hr_rag_core::{Document, DocumentMetadata, FilterSet, FilterValue, Result, VectorStoreClient};

use crate::error::RagError;

pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
}

impl QdrantVectorStore {
    pub fn new(client: Qdrant, collection: impl Into<String>) -> Self {
        Self { client, collection: collection.into() }
    }
}

/// Compiles a `FilterSet` into a Qdrant filter: equality for keyword
/// fields, inclusive/exclusive bounds for numeric/date fields.
fn build_filter(filters: &FilterSet) -> Filter {
    let mut must = Vec::new();
    for (field, value) in filters {
        match value {
            FilterValue::Keyword(v) => {
                must.push(Condition::matches(field.clone(), v.clone()));
            }
            FilterValue::Range { gte, lte, gt, lt } => {
                let range = Range {
                    gte: gte.map(|v| v as f64),
                    lte: lte.map(|v| v as f64),
                    gt: gt.map(|v| v as f64),
                    lt: lt.map(|v| v as f64),
                };
                must.push(Condition {
                    condition_one_of: Some(
                        qdrant_client::qdrant::condition::ConditionOneOf::Field(FieldCondition {
                            key: field.clone(),
                            range: Some(range),
                            ..Default::default()
                        }),
                    ),
                });
            }
        }
    }
    Filter { must, ..Default::default() }
}

fn payload_to_metadata(payload: &HashMap<String, QdrantValue>) -> (String, DocumentMetadata) {
    let text = get_str(payload, "text").unwrap_or_default();
    let metadata = DocumentMetadata {
        document_id: get_str(payload, "document_id"),
        source: get_str(payload, "source"),
        file_type: get_str(payload, "file_type"),
        language: get_str(payload, "language"),
        file_hash: get_str(payload, "file_hash"),
        page_number: get_u32(payload, "page_number"),
        page_start: get_u32(payload, "page_start"),
        page_end: get_u32(payload, "page_end"),
        chunk_index: get_u32(payload, "chunk_index"),
        parent_chunk_index: get_u32(payload, "parent_chunk_index"),
        parent_text: get_str(payload, "parent_text"),
        section_header: get_str(payload, "section_header"),
        element_types: get_str_list(payload, "element_types"),
        point_type: get_str(payload, "point_type"),
        created_at: get_str(payload, "created_at")
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc)),
        extra: HashMap::new(),
    };
    (text, metadata)
}

fn get_str(payload: &HashMap<String, QdrantValue>, key: &str) -> Option<String> {
    payload.get(key).and_then(|v| v.as_str().map(|s| s.to_string()))
}

fn get_u32(payload: &HashMap<String, QdrantValue>, key: &str) -> Option<u32> {
    payload.get(key).and_then(|v| v.as_integer()).map(|i| i as u32)
}

fn get_str_list(payload: &HashMap<String, QdrantValue>, key: &str) -> Vec<String> {
    payload
        .get(key)
        .and_then(|v| v.as_list())
        .map(|items| items.iter().filter_map(|i| i.as_str().map(|s| s.to_string())).collect())
        .unwrap_or_default()
}

fn point_id_string(id: &PointId) -> String {
    match &id.point_id_options {
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u)) => u.clone(),
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl VectorStoreClient for QdrantVectorStore {
    async fn dense_search(
        &self,
        vector: &[f32],
        limit: usize,
        filters: Option<&FilterSet>,
    ) -> Result<Vec<(Document, usize)>> {
        let mut builder = QueryPointsBuilder::new(&self.collection)
            .query(vector.to_vec())
            .limit(limit as u64)
            .with_payload(true);
        if let Some(f) = filters {
            builder = builder.filter(build_filter(f));
        }

        let response = self
            .client
            .query(builder)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        let docs = response
            .result
            .into_iter()
            .enumerate()
            .map(|(rank, point)| {
                let id = point.id.map(|i| point_id_string(&i)).unwrap_or_default();
                let (text, metadata) = payload_to_metadata(&point.payload);
                let mut doc = Document::new(id, text, point.score);
                doc.metadata = metadata;
                (doc, rank)
            })
            .collect();

        Ok(docs)
    }

    async fn lexical_search(
        &self,
        text: &str,
        limit: usize,
        filters: Option<&FilterSet>,
    ) -> Result<Vec<(Document, usize)>> {
        let mut must = vec![Condition::matches_text("text", text.to_string())];
        if let Some(f) = filters {
            must.extend(build_filter(f).must);
        }

        let builder = ScrollPointsBuilder::new(&self.collection)
            .filter(Filter { must, ..Default::default() })
            .limit(limit as u32)
            .with_payload(true);

        let response = self
            .client
            .scroll(builder)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        let docs = response
            .result
            .into_iter()
            .enumerate()
            .map(|(rank, point)| {
                let id = point.id.map(|i| point_id_string(&i)).unwrap_or_default();
                let (text, metadata) = payload_to_metadata(&point.payload);
                let mut doc = Document::new(id, text, 0.0);
                doc.metadata = metadata;
                (doc, rank)
            })
            .collect();

        Ok(docs)
    }

    async fn surrounding_chunks(
        &self,
        document_id: &str,
        chunk_index: u32,
        window: u32,
    ) -> Result<Vec<Document>> {
        let lo = chunk_index.saturating_sub(window);
        let hi = chunk_index + window;

        let filter = Filter {
            must: vec![
                Condition::matches("document_id", document_id.to_string()),
                Condition {
                    condition_one_of: Some(
                        qdrant_client::qdrant::condition::ConditionOneOf::Field(FieldCondition {
                            key: "chunk_index".to_string(),
                            range: Some(Range {
                                gte: Some(lo as f64),
                                lte: Some(hi as f64),
                                gt: None,
                                lt: None,
                            }),
                            ..Default::default()
                        }),
                    ),
                },
            ],
            ..Default::default()
        };

        let builder = ScrollPointsBuilder::new(&self.collection)
            .filter(filter)
            .limit((hi - lo + 1) as u32)
            .with_payload(true);

        let response = self
            .client
            .scroll(builder)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        let mut docs: Vec<Document> = response
            .result
            .into_iter()
            .map(|point| {
                let id = point.id.map(|i| point_id_string(&i)).unwrap_or_default();
                let (text, metadata) = payload_to_metadata(&point.payload);
                let mut doc = Document::new(id, text, 0.0);
                doc.metadata = metadata;
                doc
            })
            .collect();

        docs.sort_by_key(|d| d.metadata.chunk_index.unwrap_or(0));
        Ok(docs)
    }
}
