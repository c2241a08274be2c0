//! The deduplication gate.
//!
//! Filters machine-suggested tasks against the names of currently open
//! tasks: a suggestion semantically close to anything already tracked is
//! dropped before it can re-enter the ledger. This is a filter, not a
//! re-rank — survivors keep their input order.

use crate::provider::EmbeddingProvider;
use crate::similar::cosine_similarity;
use anyhow::{Result, bail};
use sprig_core::model::suggestion::SuggestionCandidate;
use tracing::debug;

pub struct DedupeGate<P> {
    provider: P,
    threshold: f32,
}

impl<P: EmbeddingProvider> DedupeGate<P> {
    pub const fn new(provider: P, threshold: f32) -> Self {
        Self {
            provider,
            threshold,
        }
    }

    /// Drop every suggestion whose name matches an open task at or above
    /// the similarity threshold.
    ///
    /// The open-task pool is embedded once and reused across suggestions;
    /// the whole comparison runs off a single provider call. No open
    /// tasks (or no suggestions) means nothing to compare and no call.
    ///
    /// # Errors
    ///
    /// Provider failures propagate; no partial filtering is returned.
    pub fn filter(
        &self,
        suggestions: Vec<SuggestionCandidate>,
        open_names: &[String],
    ) -> Result<Vec<SuggestionCandidate>> {
        if suggestions.is_empty() || open_names.is_empty() {
            return Ok(suggestions);
        }

        let mut texts: Vec<&str> = open_names.iter().map(String::as_str).collect();
        texts.extend(suggestions.iter().map(|s| s.name.as_str()));

        let vectors = self.provider.embed(&texts)?;
        if vectors.len() != texts.len() {
            bail!(
                "embedding batch length mismatch: expected {}, got {}",
                texts.len(),
                vectors.len()
            );
        }
        let (pool, suggestion_vectors) = vectors.split_at(open_names.len());

        let mut kept = Vec::with_capacity(suggestions.len());
        for (suggestion, vector) in suggestions.into_iter().zip(suggestion_vectors) {
            let duplicate_of = open_names.iter().zip(pool).find_map(|(name, existing)| {
                cosine_similarity(vector, existing)
                    .filter(|score| *score >= self.threshold)
                    .map(|score| (name.as_str(), score))
            });

            match duplicate_of {
                Some((name, score)) => {
                    debug!(
                        suggestion = suggestion.name,
                        open_task = name,
                        score,
                        "dropping suggestion as likely duplicate"
                    );
                }
                None => kept.push(suggestion),
            }
        }

        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::DedupeGate;
    use crate::provider::test_support::StubProvider;
    use sprig_core::model::suggestion::SuggestionCandidate;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|&n| n.to_string()).collect()
    }

    fn suggestions(raw: &[&str]) -> Vec<SuggestionCandidate> {
        raw.iter().map(|&n| SuggestionCandidate::named(n)).collect()
    }

    #[test]
    fn duplicate_of_open_task_is_dropped() {
        let gate = DedupeGate::new(StubProvider::new(), 0.9);
        let kept = gate
            .filter(suggestions(&["buy milk"]), &names(&["buy milk"]))
            .expect("filter");
        assert!(kept.is_empty());
    }

    #[test]
    fn unrelated_suggestion_survives_unchanged() {
        let gate = DedupeGate::new(StubProvider::new(), 0.9);
        let input = suggestions(&["buy milk"]);
        let kept = gate
            .filter(input.clone(), &names(&["write report"]))
            .expect("filter");
        assert_eq!(kept, input);
    }

    #[test]
    fn survivors_keep_input_order() {
        let gate = DedupeGate::new(StubProvider::new(), 0.9);
        let kept = gate
            .filter(
                suggestions(&["call dentist", "buy milk", "write report"]),
                &names(&["get milk today"]),
            )
            .expect("filter");
        let kept_names: Vec<&str> = kept.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(kept_names, ["call dentist", "write report"]);
    }

    #[test]
    fn empty_open_pool_means_no_provider_call() {
        let provider = StubProvider::new();
        let gate = DedupeGate::new(provider, 0.9);
        let input = suggestions(&["buy milk"]);
        let kept = gate.filter(input.clone(), &[]).expect("filter");
        assert_eq!(kept, input);
        assert_eq!(gate.provider.call_count(), 0);
    }

    #[test]
    fn no_suggestions_means_no_provider_call() {
        let gate = DedupeGate::new(StubProvider::new(), 0.9);
        let kept = gate.filter(Vec::new(), &names(&["buy milk"])).expect("filter");
        assert!(kept.is_empty());
        assert_eq!(gate.provider.call_count(), 0);
    }

    #[test]
    fn whole_comparison_uses_one_batched_call() {
        let gate = DedupeGate::new(StubProvider::new(), 0.9);
        let _ = gate
            .filter(
                suggestions(&["call dentist", "buy milk"]),
                &names(&["write report", "milk run"]),
            )
            .expect("filter");
        assert_eq!(gate.provider.call_count(), 1);
    }
}
