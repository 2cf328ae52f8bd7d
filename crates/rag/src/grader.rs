//! §4.7: score-threshold grading with a minimum-keep fallback.

use hr_rag_core::Document;

pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.15;
pub const DEFAULT_MIN_KEEP: usize = 3;

/// Keeps documents scoring at or above `threshold`; if none qualify, falls
/// back to the top `min_keep` (or top 1 if fewer candidates exist). Empty
/// input stays empty, propagating to the retry decision.
pub fn grade(mut documents: Vec<Document>, threshold: f32, min_keep: usize) -> Vec<Document> {
    let started = std::time::Instant::now();
    let initial_count = documents.len();
    if documents.is_empty() {
        return documents;
    }

    documents.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let kept: Vec<Document> = documents.iter().filter(|d| d.score >= threshold).cloned().collect();
    let graded = if !kept.is_empty() {
        kept
    } else {
        let take = if documents.len() >= min_keep { min_keep } else { 1 };
        documents.into_iter().take(take).collect()
    };

    tracing::info!(
        event = "grading_completed",
        initial_count,
        graded_count = graded.len(),
        filtered_count = initial_count - graded.len(),
        latency_ms = started.elapsed().as_millis() as u64,
    );

    graded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, score: f32) -> Document {
        Document::new(id, "text", score)
    }

    #[test]
    fn keeps_documents_at_or_above_threshold() {
        let docs = vec![doc("a", 0.82), doc("b", 0.74), doc("c", 0.41), doc("d", 0.22), doc("e", 0.10)];
        let kept = grade(docs, DEFAULT_SCORE_THRESHOLD, DEFAULT_MIN_KEEP);
        assert_eq!(kept.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn falls_back_to_top_three_when_none_clear_threshold() {
        let docs = vec![doc("a", 0.10), doc("b", 0.08), doc("c", 0.05), doc("d", 0.02)];
        let kept = grade(docs, DEFAULT_SCORE_THRESHOLD, DEFAULT_MIN_KEEP);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].id, "a");
    }

    #[test]
    fn falls_back_to_top_one_with_fewer_than_three_candidates() {
        let docs = vec![doc("a", 0.05), doc("b", 0.02)];
        let kept = grade(docs, DEFAULT_SCORE_THRESHOLD, DEFAULT_MIN_KEEP);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "a");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(grade(Vec::new(), DEFAULT_SCORE_THRESHOLD, DEFAULT_MIN_KEEP).is_empty());
    }
}
