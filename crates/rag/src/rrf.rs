//! Reciprocal Rank Fusion: combines ranked lists by position only.

use std::collections::HashMap;

/// `score(p) = sum over lists containing p of 1/(k + rank_in_list(p) + 1)`,
/// rank 0-based. Ties broken by first-seen (insertion) order.
pub fn rrf_fuse<T: Clone + Eq + std::hash::Hash>(
    ranked_lists: &[Vec<T>],
    k: usize,
) -> Vec<(T, f32)> {
    let mut scores: HashMap<T, f32> = HashMap::new();
    let mut order: Vec<T> = Vec::new();

    for list in ranked_lists {
        for (rank, item) in list.iter().enumerate() {
            let entry = scores.entry(item.clone()).or_insert_with(|| {
                order.push(item.clone());
                0.0
            });
            *entry += 1.0 / (k as f32 + rank as f32 + 1.0);
        }
    }

    let mut fused: Vec<(T, f32)> =
        order.into_iter().map(|item| { let s = scores[&item]; (item, s) }).collect();
    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_worked_example() {
        let dense = vec!["A", "B", "C"];
        let lexical = vec!["B", "D", "A"];
        let fused = rrf_fuse(&[dense, lexical], 40);

        let score_of = |id: &str| fused.iter().find(|(p, _)| *p == id).unwrap().1;

        let a = 1.0 / 41.0 + 1.0 / 43.0;
        let b = 1.0 / 42.0 + 1.0 / 41.0;
        let c = 1.0 / 43.0;
        let d = 1.0 / 43.0;

        assert!((score_of("A") - a).abs() < 1e-6);
        assert!((score_of("B") - b).abs() < 1e-6);
        assert!((score_of("C") - c).abs() < 1e-6);
        assert!((score_of("D") - d).abs() < 1e-6);

        assert_eq!(fused[0].0, "B");
        assert_eq!(fused[1].0, "A");
    }

    #[test]
    fn single_list_preserves_rank_order() {
        let fused = rrf_fuse(&[vec!["X", "Y", "Z"]], 40);
        assert_eq!(fused.iter().map(|(p, _)| *p).collect::<Vec<_>>(), vec!["X", "Y", "Z"]);
    }

    #[test]
    fn empty_lists_produce_empty_output() {
        let fused: Vec<(&str, f32)> = rrf_fuse::<&str>(&[], 40);
        assert!(fused.is_empty());
    }
}
