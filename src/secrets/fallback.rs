//! Ordered fallback across several backends.
//!
//! A reference whose backend segment does not match any registered backend is
//! treated as a logical alias: every registered backend is tried in
//! registration order and the first one that returns a value wins.
//!
//! # Example
//!
//! ```rust,ignore
//! use envref::secrets::{FallbackChain, NamespacedBackend};
//!
//! let chain = FallbackChain::new(
//!     registry.all().iter().map(|b| NamespacedBackend::new(b.clone(), "myapp")).collect(),
//! );
//!
//! // Tries vault, then keychain, ...
//! let token = chain.get("token").await?;
//! ```

use super::client::SecretBackend;
use super::error::{Result, SecretsError};
use super::namespaced::NamespacedBackend;

/// Ordered list of candidate backends for a single lookup.
#[derive(Debug, Clone)]
pub struct FallbackChain {
    candidates: Vec<NamespacedBackend>,
}

impl FallbackChain {
    pub fn new(candidates: Vec<NamespacedBackend>) -> Self {
        Self { candidates }
    }

    /// A chain with exactly one candidate (direct addressing).
    pub fn single(candidate: NamespacedBackend) -> Self {
        Self { candidates: vec![candidate] }
    }

    pub fn candidates(&self) -> &[NamespacedBackend] {
        &self.candidates
    }

    /// Look `key` up in each candidate in order.
    ///
    /// Returns the first value found together with the name of the backend that
    /// produced it. Later candidates are not contacted once a value is found.
    /// If every candidate fails, the final candidate's error is returned; an
    /// empty chain reports the key as not found.
    pub async fn get(&self, key: &str) -> Result<(String, &str)> {
        let mut last_error = None;

        for candidate in &self.candidates {
            match candidate.get(key).await {
                Ok(value) => return Ok((value, candidate.name())),
                Err(error) => {
                    if error.is_not_found() {
                        tracing::debug!(
                            backend = %candidate.name(),
                            key = %key,
                            "Secret not present in backend, trying next"
                        );
                    } else {
                        tracing::warn!(
                            backend = %candidate.name(),
                            key = %key,
                            error = %error,
                            "Secrets backend failed, attempting fallback"
                        );
                    }
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SecretsError::not_found(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::backends::MemoryBackend;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Backend that always fails and counts how often it was asked.
    #[derive(Debug, Default)]
    struct FailingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SecretBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        async fn get(&self, _key: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SecretsError::connection_failed("Mock backend failure"))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(SecretsError::connection_failed("Mock backend failure"))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(SecretsError::connection_failed("Mock backend failure"))
        }

        async fn list(&self) -> Result<Vec<String>> {
            Err(SecretsError::connection_failed("Mock backend failure"))
        }
    }

    fn scoped(backend: Arc<dyn SecretBackend>) -> NamespacedBackend {
        NamespacedBackend::new(backend, "myapp")
    }

    #[tokio::test]
    async fn test_fallback_on_primary_failure() {
        let secondary = Arc::new(MemoryBackend::new("keychain"));
        secondary.set("myapp/token", "tok-456").await.unwrap();

        let chain = FallbackChain::new(vec![
            scoped(Arc::new(FailingBackend::default())),
            scoped(secondary),
        ]);

        let (value, backend) = chain.get("token").await.unwrap();
        assert_eq!(value, "tok-456");
        assert_eq!(backend, "keychain");
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary = Arc::new(MemoryBackend::new("vault"));
        primary.set("myapp/token", "from-vault").await.unwrap();
        let failing = Arc::new(FailingBackend::default());

        let chain = FallbackChain::new(vec![scoped(primary), scoped(failing.clone())]);

        let (value, backend) = chain.get("token").await.unwrap();
        assert_eq!(value, "from-vault");
        assert_eq!(backend, "vault");
        assert_eq!(failing.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_candidates_fail_returns_last_error() {
        let chain = FallbackChain::new(vec![
            scoped(Arc::new(FailingBackend::default())),
            scoped(Arc::new(MemoryBackend::new("keychain"))),
        ]);

        let err = chain.get("token").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("myapp/token"));
    }

    #[tokio::test]
    async fn test_empty_chain_is_not_found() {
        let chain = FallbackChain::new(vec![]);
        let err = chain.get("token").await.unwrap_err();
        assert_eq!(err.to_string(), "Secret not found: token");
    }
}
