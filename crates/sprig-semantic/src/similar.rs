//! Cosine-similarity matching between one query and a candidate pool.
//!
//! For a fixed provider/model and fixed inputs the output is fully
//! deterministic: cosine similarity is commutative and stable, and ties
//! are broken by candidate text.

use crate::provider::EmbeddingProvider;
use anyhow::{Result, bail};
use serde::Serialize;
use tracing::debug;

/// One candidate that met the similarity threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarMatch {
    pub text: String,
    /// Cosine similarity in `[-1, 1]` (higher = more similar).
    pub score: f32,
}

/// Rank `candidates` by cosine similarity to `query`.
///
/// Embeds the query and every candidate in one provider call, keeps
/// candidates with `score >= threshold`, sorts descending, and truncates
/// to `top_k`. Empty `candidates` (or `top_k == 0`) returns an empty
/// result without invoking the provider. A threshold above the maximum
/// achievable similarity is a valid "no matches" outcome, not an error.
///
/// # Errors
///
/// Propagates provider failures; also fails if the provider returns the
/// wrong number of vectors.
pub fn find_similar(
    provider: &dyn EmbeddingProvider,
    query: &str,
    candidates: &[String],
    top_k: usize,
    threshold: f32,
) -> Result<Vec<SimilarMatch>> {
    if candidates.is_empty() || top_k == 0 {
        return Ok(Vec::new());
    }

    let mut texts: Vec<&str> = Vec::with_capacity(candidates.len() + 1);
    texts.push(query);
    texts.extend(candidates.iter().map(String::as_str));

    let vectors = provider.embed(&texts)?;
    if vectors.len() != texts.len() {
        bail!(
            "embedding batch length mismatch: expected {}, got {}",
            texts.len(),
            vectors.len()
        );
    }

    let query_vector = &vectors[0];
    let mut matches = Vec::new();
    for (candidate, vector) in candidates.iter().zip(&vectors[1..]) {
        let Some(score) = cosine_similarity(query_vector, vector) else {
            debug!(candidate, "skipping candidate with incomparable embedding");
            continue;
        };
        if score >= threshold {
            matches.push(SimilarMatch {
                text: candidate.clone(),
                score,
            });
        }
    }

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.text.cmp(&b.text))
    });
    matches.truncate(top_k);

    Ok(matches)
}

/// Cosine similarity of two vectors; `None` when lengths differ, either
/// vector is empty, or a norm vanishes.
#[must_use]
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Option<f32> {
    if left.len() != right.len() || left.is_empty() {
        return None;
    }

    let mut dot = 0.0_f32;
    let mut left_norm_sq = 0.0_f32;
    let mut right_norm_sq = 0.0_f32;

    for (a, b) in left.iter().zip(right.iter()) {
        dot += a * b;
        left_norm_sq += a * a;
        right_norm_sq += b * b;
    }

    let denom = left_norm_sq.sqrt() * right_norm_sq.sqrt();
    if denom <= f32::EPSILON {
        return None;
    }

    Some((dot / denom).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::{cosine_similarity, find_similar};
    use crate::provider::test_support::StubProvider;

    fn pool(names: &[&str]) -> Vec<String> {
        names.iter().map(|&n| n.to_string()).collect()
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.6, 0.8];
        let score = cosine_similarity(&v, &v).expect("comparable");
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        let score = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).expect("comparable");
        assert!(score.abs() < 1e-6);
    }

    #[test]
    fn cosine_rejects_mismatched_or_zero_vectors() {
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).is_none());
        assert!(cosine_similarity(&[], &[]).is_none());
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_none());
    }

    #[test]
    fn empty_candidates_skip_the_provider_entirely() {
        let provider = StubProvider::new();
        let matches = find_similar(&provider, "buy milk", &[], 5, 0.9).expect("find");
        assert!(matches.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn zero_top_k_skips_the_provider_entirely() {
        let provider = StubProvider::new();
        let matches =
            find_similar(&provider, "buy milk", &pool(&["buy milk"]), 0, 0.5).expect("find");
        assert!(matches.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn exact_match_scores_one_and_unrelated_is_excluded() {
        let provider = StubProvider::new();
        let matches = find_similar(
            &provider,
            "buy milk",
            &pool(&["buy milk", "write report"]),
            5,
            0.9,
        )
        .expect("find");

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "buy milk");
        assert!((matches[0].score - 1.0).abs() < 1e-5);
        // Query and candidates went out in a single batch.
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn results_are_ranked_descending_and_truncated() {
        let provider = StubProvider::new();
        let matches = find_similar(
            &provider,
            "buy milk",
            &pool(&["milk run", "buy milk", "get milk soon"]),
            2,
            0.5,
        )
        .expect("find");

        assert_eq!(matches.len(), 2);
        for pair in matches.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn unreachable_threshold_is_an_empty_result_not_an_error() {
        let provider = StubProvider::new();
        let matches = find_similar(
            &provider,
            "buy milk",
            &pool(&["write report"]),
            5,
            0.99,
        )
        .expect("find");
        assert!(matches.is_empty());
    }

    #[test]
    fn tie_scores_break_by_text_for_determinism() {
        let provider = StubProvider::new();
        // Both candidates share the "milk" axis, so both score 1.0.
        let matches = find_similar(
            &provider,
            "buy milk",
            &pool(&["milk b", "milk a"]),
            5,
            0.9,
        )
        .expect("find");
        let texts: Vec<&str> = matches.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["milk a", "milk b"]);
    }

    mod properties {
        use super::super::cosine_similarity;
        use proptest::prelude::*;

        fn vector() -> impl Strategy<Value = Vec<f32>> {
            proptest::collection::vec(-100.0_f32..100.0, 1..16)
        }

        proptest! {
            #[test]
            fn cosine_is_symmetric_and_bounded(a in vector(), b in vector()) {
                let forward = cosine_similarity(&a, &b);
                let backward = cosine_similarity(&b, &a);
                prop_assert_eq!(forward.is_some(), backward.is_some());
                if let (Some(f), Some(g)) = (forward, backward) {
                    prop_assert!((f - g).abs() < 1e-6);
                    prop_assert!((-1.0..=1.0).contains(&f));
                }
            }

            #[test]
            fn cosine_ignores_positive_scale(a in vector(), scale in 0.1_f32..50.0) {
                let scaled: Vec<f32> = a.iter().map(|x| x * scale).collect();
                if let (Some(plain), Some(rescaled)) =
                    (cosine_similarity(&a, &a), cosine_similarity(&a, &scaled))
                {
                    prop_assert!((plain - rescaled).abs() < 1e-3);
                }
            }
        }
    }
}
