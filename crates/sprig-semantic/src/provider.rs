//! The embedding provider seam.
//!
//! Providers map text to fixed-length normalized vectors. Calls may block
//! for non-trivial latency (network or model inference); retry and
//! timeout live here, at the transport boundary, so the matching code
//! stays synchronous and transport-free.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sprig_core::config::SemanticConfig;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Maps texts to vectors, one per input, same order.
///
/// Operational caveat: vectors are only comparable when produced by the
/// same provider and model version. A model change invalidates any
/// cross-run comparison; callers should not mix vectors across versions.
pub trait EmbeddingProvider {
    /// Embed a batch of texts.
    ///
    /// # Errors
    ///
    /// Fails when the underlying service is unreachable or returns a
    /// malformed response. Callers treat this as recoverable and retry
    /// the whole unit of work.
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
}

/// HTTP client for an OpenAI-compatible `/embeddings` endpoint.
pub struct RemoteEmbedder {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    retries: u32,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    #[must_use]
    pub fn from_config(config: &SemanticConfig) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: std::env::var(&config.api_key_env).ok(),
            retries: config.retries,
        }
    }

    fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut request = self.agent.post(&self.endpoint);
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {key}"));
        }

        let response: EmbeddingResponse = request
            .send_json(&body)
            .context("embedding request failed")?
            .into_json()
            .context("embedding response was not valid JSON")?;

        Ok(response.data.into_iter().map(|row| row.embedding).collect())
    }
}

impl EmbeddingProvider for RemoteEmbedder {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let attempts = self.retries + 1;
        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.request(texts) {
                Ok(vectors) => {
                    if vectors.len() != texts.len() {
                        bail!(
                            "embedding batch length mismatch: expected {}, got {}",
                            texts.len(),
                            vectors.len()
                        );
                    }
                    return Ok(vectors);
                }
                Err(err) => {
                    warn!(attempt, error = %err, "embedding request attempt failed");
                    last_err = Some(err);
                    if attempt < attempts {
                        std::thread::sleep(Duration::from_millis(250 * u64::from(attempt)));
                    }
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| anyhow::anyhow!("embedding request failed with no attempts made"))
            .context("embedding service unavailable after retries"))
    }
}

/// Memoizing wrapper: vectors are cached by a SHA-256 key of the text so
/// repeated texts within a session (the open-task pool, mostly) cost one
/// upstream call.
pub struct CachedProvider<P> {
    inner: P,
    cache: Mutex<HashMap<String, Vec<f32>>>,
}

impl<P: EmbeddingProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

fn cache_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl<P: EmbeddingProvider> EmbeddingProvider for CachedProvider<P> {
    fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = texts.iter().map(|text| cache_key(text)).collect();
        let mut misses: Vec<&str> = Vec::new();
        {
            let cache = self.cache.lock().expect("embedding cache poisoned");
            let mut seen = std::collections::HashSet::new();
            for (text, key) in texts.iter().zip(&keys) {
                if !cache.contains_key(key) && seen.insert(key.clone()) {
                    misses.push(text);
                }
            }
        }

        if !misses.is_empty() {
            debug!(total = texts.len(), misses = misses.len(), "embedding cache misses");
            let fresh = self.inner.embed(&misses)?;
            if fresh.len() != misses.len() {
                bail!(
                    "embedding batch length mismatch: expected {}, got {}",
                    misses.len(),
                    fresh.len()
                );
            }
            let mut cache = self.cache.lock().expect("embedding cache poisoned");
            for (text, vector) in misses.iter().zip(fresh) {
                cache.insert(cache_key(text), vector);
            }
        }

        let cache = self.cache.lock().expect("embedding cache poisoned");
        keys.iter()
            .map(|key| {
                cache
                    .get(key)
                    .cloned()
                    .context("embedding cache missing a just-computed vector")
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::EmbeddingProvider;
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic offline provider: a text maps to a fixed unit
    /// vector chosen by a tiny keyword table, unknown texts get a
    /// fallback direction. Also counts calls so tests can assert the
    /// no-call contracts.
    pub struct StubProvider {
        pub calls: AtomicUsize,
        pub texts_embedded: AtomicUsize,
    }

    impl StubProvider {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                texts_embedded: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn direction(text: &str) -> Vec<f32> {
            let lower = text.to_ascii_lowercase();
            // Orthogonal axes per topic; "milk" texts share an axis so
            // they are mutually similar and dissimilar to everything else.
            if lower.contains("milk") {
                vec![1.0, 0.0, 0.0, 0.0]
            } else if lower.contains("report") {
                vec![0.0, 1.0, 0.0, 0.0]
            } else if lower.contains("dentist") {
                vec![0.0, 0.0, 1.0, 0.0]
            } else {
                vec![0.0, 0.0, 0.0, 1.0]
            }
        }
    }

    impl EmbeddingProvider for StubProvider {
        fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts.iter().map(|text| Self::direction(text)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::StubProvider;
    use super::{CachedProvider, EmbeddingProvider, cache_key};
    use std::sync::atomic::Ordering;

    #[test]
    fn cache_key_differs_per_text() {
        assert_ne!(cache_key("alpha"), cache_key("beta"));
    }

    #[test]
    fn cached_provider_embeds_each_text_once() {
        let provider = CachedProvider::new(StubProvider::new());

        let first = provider.embed(&["buy milk", "write report"]).expect("embed");
        let second = provider.embed(&["buy milk", "write report"]).expect("embed");

        assert_eq!(first, second);
        assert_eq!(provider.inner.call_count(), 1);
        assert_eq!(provider.inner.texts_embedded.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cached_provider_only_fetches_misses() {
        let provider = CachedProvider::new(StubProvider::new());
        provider.embed(&["buy milk"]).expect("embed");
        provider.embed(&["buy milk", "call dentist"]).expect("embed");

        assert_eq!(provider.inner.call_count(), 2);
        // Second call only carried the one uncached text.
        assert_eq!(provider.inner.texts_embedded.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cached_provider_handles_duplicate_texts_in_one_batch() {
        let provider = CachedProvider::new(StubProvider::new());
        let vectors = provider
            .embed(&["buy milk", "buy milk"])
            .expect("embed");
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], vectors[1]);
        assert_eq!(provider.inner.texts_embedded.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_batch_makes_no_upstream_call() {
        let provider = CachedProvider::new(StubProvider::new());
        let vectors = provider.embed(&[]).expect("embed");
        assert!(vectors.is_empty());
        assert_eq!(provider.inner.call_count(), 0);
    }
}
