//! §4.6: cross-encoder reranking over the retriever's fused candidates.

use hr_rag_core::{Document, RerankerClient, Result};

/// Calls the reranker once over `documents`' text, maps scores back by
/// index, sets `score` to the calibrated rerank score, derives
/// `combined_score = (retrieval_score + rerank_score) / 2`, sorts
/// descending, and truncates to `top_k`.
pub async fn rerank(
    reranker: &dyn RerankerClient,
    query: &str,
    mut documents: Vec<Document>,
    top_k: usize,
) -> Result<Vec<Document>> {
    if documents.is_empty() {
        return Ok(documents);
    }

    let started = std::time::Instant::now();
    let original_count = documents.len();
    let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
    let candidates = reranker.rerank(query, &texts).await?;

    for candidate in candidates {
        if let Some(doc) = documents.get_mut(candidate.index) {
            doc.score = candidate.score;
            doc.combined_score = Some((doc.retrieval_score + candidate.score) / 2.0);
        }
    }

    documents.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    documents.truncate(top_k);

    tracing::info!(
        event = "rerank_completed",
        original_count,
        reranked_count = documents.len(),
        latency_ms = started.elapsed().as_millis() as u64,
    );

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hr_rag_core::RerankedCandidate;

    struct StubReranker;

    #[async_trait]
    impl RerankerClient for StubReranker {
        async fn rerank(&self, _query: &str, candidates: &[String]) -> Result<Vec<RerankedCandidate>> {
            Ok(candidates
                .iter()
                .enumerate()
                .map(|(i, _)| RerankedCandidate { index: i, score: 1.0 - (i as f32 * 0.1) })
                .collect())
        }
    }

    fn doc(id: &str, text: &str) -> Document {
        Document::new(id, text, 0.5)
    }

    #[tokio::test]
    async fn reranked_scores_replace_retrieval_scores_and_set_combined() {
        let docs = vec![doc("a", "first"), doc("b", "second")];
        let reranked = rerank(&StubReranker, "q", docs, 10).await.unwrap();
        assert_eq!(reranked[0].id, "a");
        assert_eq!(reranked[0].score, 1.0);
        assert_eq!(reranked[0].combined_score, Some((0.5 + 1.0) / 2.0));
    }

    #[tokio::test]
    async fn truncates_to_top_k() {
        let docs = vec![doc("a", "x"), doc("b", "y"), doc("c", "z")];
        let reranked = rerank(&StubReranker, "q", docs, 2).await.unwrap();
        assert_eq!(reranked.len(), 2);
    }

    #[tokio::test]
    async fn empty_input_stays_empty() {
        let reranked = rerank(&StubReranker, "q", Vec::new(), 10).await.unwrap();
        assert!(reranked.is_empty());
    }
}
