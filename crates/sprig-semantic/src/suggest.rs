//! Suggestion pipeline: extraction followed by the deduplication gate.

use crate::dedupe::DedupeGate;
use crate::extract::TaskExtractor;
use crate::provider::EmbeddingProvider;
use anyhow::{Context, Result};
use sprig_core::model::suggestion::SuggestionCandidate;
use tracing::info;

/// Turn free-form log text into suggestions ready for user confirmation:
/// extract candidates, then drop any that duplicate an open task.
///
/// # Errors
///
/// Either upstream failure (extraction or embedding) propagates whole;
/// no partial suggestion list is returned and the ledger is untouched.
pub fn suggest_new_tasks<P: EmbeddingProvider>(
    extractor: &dyn TaskExtractor,
    gate: &DedupeGate<P>,
    open_names: &[String],
    free_text: &str,
) -> Result<Vec<SuggestionCandidate>> {
    let candidates = extractor
        .extract_tasks(free_text)
        .context("task extraction failed")?;
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let extracted = candidates.len();
    let kept = gate
        .filter(candidates, open_names)
        .context("suggestion deduplication failed")?;
    info!(
        extracted,
        kept = kept.len(),
        dropped = extracted - kept.len(),
        "filtered suggested tasks"
    );
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::suggest_new_tasks;
    use crate::dedupe::DedupeGate;
    use crate::extract::TaskExtractor;
    use crate::provider::test_support::StubProvider;
    use anyhow::{Result, anyhow};
    use sprig_core::model::suggestion::SuggestionCandidate;

    struct FixedExtractor(Vec<SuggestionCandidate>);

    impl TaskExtractor for FixedExtractor {
        fn extract_tasks(&self, free_text: &str) -> Result<Vec<SuggestionCandidate>> {
            if free_text.trim().is_empty() {
                return Ok(Vec::new());
            }
            Ok(self.0.clone())
        }
    }

    struct FailingExtractor;

    impl TaskExtractor for FailingExtractor {
        fn extract_tasks(&self, _free_text: &str) -> Result<Vec<SuggestionCandidate>> {
            Err(anyhow!("service unreachable"))
        }
    }

    #[test]
    fn pipeline_extracts_then_filters() {
        let extractor = FixedExtractor(vec![
            SuggestionCandidate::named("buy milk"),
            SuggestionCandidate::named("call dentist"),
        ]);
        let gate = DedupeGate::new(StubProvider::new(), 0.9);
        let open = vec!["milk run".to_string()];

        let kept = suggest_new_tasks(&extractor, &gate, &open, "today I should...")
            .expect("suggest");
        let names: Vec<&str> = kept.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["call dentist"]);
    }

    #[test]
    fn empty_text_yields_no_suggestions_and_no_embedding() {
        let extractor = FixedExtractor(vec![SuggestionCandidate::named("buy milk")]);
        let gate = DedupeGate::new(StubProvider::new(), 0.9);

        let kept = suggest_new_tasks(&extractor, &gate, &[], "   ").expect("suggest");
        assert!(kept.is_empty());
    }

    #[test]
    fn extraction_failure_propagates() {
        let gate = DedupeGate::new(StubProvider::new(), 0.9);
        let err = suggest_new_tasks(&FailingExtractor, &gate, &[], "some logs")
            .expect_err("must fail");
        assert!(err.to_string().contains("task extraction failed"));
    }
}
