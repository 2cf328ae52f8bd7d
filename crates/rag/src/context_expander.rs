//! §4.8: merge child chunks into parent passages, or fetch neighboring
//! chunks for legacy documents that carry no parent text.

use std::collections::HashSet;

use futures::future::join_all;

use hr_rag_core::{Document, Result, VectorStoreClient};

/// Preserves input order. Documents with `parent_text` are expanded in
/// place (deduplicated by `(document_id, parent_chunk_index)`); documents
/// without it get a concurrent neighbor-window fetch from the vector
/// store, concatenated by `chunk_index`.
pub async fn expand_context(
    vector_store: &dyn VectorStoreClient,
    documents: Vec<Document>,
    neighbor_window: u32,
) -> Result<Vec<Document>> {
    let mut seen_parents: HashSet<(String, u32)> = HashSet::new();
    let mut with_parent = Vec::new();
    let mut needs_fetch = Vec::new();

    for (index, doc) in documents.into_iter().enumerate() {
        match (&doc.metadata.parent_text, doc.metadata.document_id.clone(), doc.metadata.parent_chunk_index) {
            (Some(parent_text), Some(document_id), Some(parent_idx)) => {
                let key = (document_id, parent_idx);
                if seen_parents.insert(key) {
                    let mut expanded = doc.clone();
                    expanded.text = parent_text.clone();
                    with_parent.push((index, expanded));
                }
            }
            _ => needs_fetch.push((index, doc)),
        }
    }

    let fetches = needs_fetch.iter().map(|(_, doc)| {
        let document_id = doc.metadata.document_id.clone().unwrap_or_default();
        let chunk_index = doc.metadata.chunk_index.unwrap_or(0);
        vector_store.surrounding_chunks(&document_id, chunk_index, neighbor_window)
    });
    let fetched = join_all(fetches).await;

    let mut results: Vec<(usize, Document)> = with_parent;
    for ((index, original), neighbors) in needs_fetch.into_iter().zip(fetched) {
        match neighbors {
            Ok(chunks) if !chunks.is_empty() => {
                let mut expanded = original.clone();
                expanded.text = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join(" ");
                results.push((index, expanded));
            }
            Ok(_) => results.push((index, original)),
            Err(e) => {
                tracing::warn!(error = %e, "neighbor fetch failed, keeping original chunk text");
                results.push((index, original));
            }
        }
    }

    results.sort_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, doc)| doc).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hr_rag_core::{DocumentMetadata, FilterSet};

    struct StubStore {
        neighbors: Vec<Document>,
    }

    #[async_trait]
    impl VectorStoreClient for StubStore {
        async fn dense_search(&self, _: &[f32], _: usize, _: Option<&FilterSet>) -> Result<Vec<(Document, usize)>> {
            Ok(Vec::new())
        }
        async fn lexical_search(&self, _: &str, _: usize, _: Option<&FilterSet>) -> Result<Vec<(Document, usize)>> {
            Ok(Vec::new())
        }
        async fn surrounding_chunks(&self, _: &str, _: u32, _: u32) -> Result<Vec<Document>> {
            Ok(self.neighbors.clone())
        }
    }

    #[tokio::test]
    async fn documents_with_parent_text_expand_in_place() {
        let mut doc = Document::new("c1", "child text", 0.9);
        doc.metadata = DocumentMetadata {
            parent_text: Some("full parent passage".to_string()),
            document_id: Some("doc1".to_string()),
            parent_chunk_index: Some(0),
            ..Default::default()
        };
        let store = StubStore { neighbors: Vec::new() };
        let result = expand_context(&store, vec![doc], 1).await.unwrap();
        assert_eq!(result[0].text, "full parent passage");
    }

    #[tokio::test]
    async fn legacy_documents_fetch_neighbors() {
        let mut doc = Document::new("c1", "middle", 0.9);
        doc.metadata = DocumentMetadata {
            document_id: Some("doc1".to_string()),
            chunk_index: Some(5),
            ..Default::default()
        };
        let mut before = Document::new("c0", "before", 0.0);
        before.metadata.chunk_index = Some(4);
        let mut after = Document::new("c2", "after", 0.0);
        after.metadata.chunk_index = Some(6);

        let store = StubStore { neighbors: vec![before, doc.clone(), after] };
        let result = expand_context(&store, vec![doc], 1).await.unwrap();
        assert_eq!(result[0].text, "before middle after");
    }
}
