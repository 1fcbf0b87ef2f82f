//! # Reference Resolution
//!
//! Walks an [`EnvDocument`] in order and replaces every `ref://backend/key-path`
//! value with the secret it names.
//!
//! - Plain values are copied through untouched.
//! - If `backend` names a registered backend, only that backend is asked
//!   (direct match).
//! - Otherwise `backend` is a logical alias and every registered backend is
//!   tried in registration order until one returns a value (fallback chain).
//! - All lookups go through [`NamespacedBackend`], so the key presented to a
//!   store is `<project>/<key-path>`.
//!
//! Per-entry failures never abort the run. They are collected in
//! [`ResolveResult::errors`] and the affected entry keeps its original
//! `ref://` text. Only the preconditions in [`ResolveError`] are fatal.
//!
//! ```rust,ignore
//! let doc = EnvDocument::parse("DB_PASS=ref://keychain/db_pass\n")?;
//! let result = resolve(&doc, &registry, "myapp").await?;
//! if !result.is_resolved() {
//!     for err in &result.errors {
//!         eprintln!("{}", err);
//!     }
//! }
//! ```

pub mod reference;

pub use reference::{InvalidRef, SecretRef, REF_SCHEME};

use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;

use crate::envfile::{EnvDocument, EnvEntry};
use crate::secrets::{BackendRegistry, FallbackChain, NamespacedBackend, SecretsError};

/// Fatal precondition failures. No partial result is produced.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("env must not be nil")]
    MissingDocument,

    #[error("registry must not be nil")]
    MissingRegistry,

    #[error("project name must not be empty")]
    EmptyProject,
}

/// Why a single reference could not be resolved.
#[derive(Error, Debug)]
pub enum EntryError {
    #[error(transparent)]
    InvalidUri(#[from] InvalidRef),

    #[error(transparent)]
    Lookup(#[from] SecretsError),
}

// Backend errors wrap io/serde errors that have no equality; compare by message.
impl PartialEq for EntryError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidUri(_), Self::InvalidUri(_)) => true,
            (Self::Lookup(a), Self::Lookup(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// An entry after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub key: String,
    pub value: String,
    pub was_ref: bool,
}

/// One reference that could not be resolved.
#[derive(Error, Debug, PartialEq)]
#[error("{key}: {error} ({reference})")]
pub struct KeyError {
    pub key: String,
    /// The original `ref://` value.
    pub reference: String,
    #[source]
    pub error: EntryError,
}

/// Outcome of resolving a whole document.
#[derive(Debug, Default, PartialEq)]
pub struct ResolveResult {
    /// Every document entry, in document order.
    pub entries: Vec<ResolvedEntry>,
    /// Every failed reference, in document order.
    pub errors: Vec<KeyError>,
}

impl ResolveResult {
    /// True iff no entry failed.
    pub fn is_resolved(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ResolvedEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    /// Number of references that resolved successfully.
    pub fn resolved_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.was_ref).count() - self.errors.len()
    }
}

/// Builder form of [`resolve`] for callers whose inputs may be absent.
///
/// ```rust,ignore
/// let result = ResolveRequest::new("myapp")
///     .document(&doc)
///     .registry(&registry)
///     .resolve()
///     .await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest<'a> {
    document: Option<&'a EnvDocument>,
    registry: Option<&'a BackendRegistry>,
    project: String,
}

impl<'a> ResolveRequest<'a> {
    pub fn new(project: impl Into<String>) -> Self {
        Self { document: None, registry: None, project: project.into() }
    }

    pub fn document(mut self, document: &'a EnvDocument) -> Self {
        self.document = Some(document);
        self
    }

    pub fn registry(mut self, registry: &'a BackendRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Check the preconditions, in order: document, registry, project.
    pub async fn resolve(self) -> Result<ResolveResult, ResolveError> {
        let document = self.document.ok_or(ResolveError::MissingDocument)?;
        let registry = self.registry.ok_or(ResolveError::MissingRegistry)?;
        resolve(document, registry, &self.project).await
    }
}

/// Resolve every reference in `document` against `registry` under `project`.
///
/// Entries are processed sequentially in document order. The registry is only
/// read.
pub async fn resolve(
    document: &EnvDocument,
    registry: &BackendRegistry,
    project: &str,
) -> Result<ResolveResult, ResolveError> {
    if project.is_empty() {
        return Err(ResolveError::EmptyProject);
    }

    let resolver = Resolver { registry, project };
    let mut result = ResolveResult {
        entries: Vec::with_capacity(document.len()),
        errors: Vec::new(),
    };

    for entry in document {
        if !entry.is_ref() {
            result.entries.push(ResolvedEntry {
                key: entry.key.clone(),
                value: entry.value.clone(),
                was_ref: false,
            });
            continue;
        }

        let value = match resolver.resolve_entry(entry).await {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(
                    key = %entry.key,
                    reference = %entry.value,
                    line = entry.line,
                    error = %error,
                    "Failed to resolve secret reference"
                );
                result.errors.push(KeyError {
                    key: entry.key.clone(),
                    reference: entry.value.clone(),
                    error,
                });
                entry.value.clone()
            }
        };

        result.entries.push(ResolvedEntry { key: entry.key.clone(), value, was_ref: true });
    }

    tracing::info!(
        project = %project,
        entries = result.entries.len(),
        resolved = result.resolved_count(),
        failed = result.errors.len(),
        "Resolved env document"
    );

    Ok(result)
}

struct Resolver<'a> {
    registry: &'a BackendRegistry,
    project: &'a str,
}

impl Resolver<'_> {
    async fn resolve_entry(&self, entry: &EnvEntry) -> Result<String, EntryError> {
        let secret_ref = SecretRef::parse(&entry.value)?;
        let chain = self.candidates(&secret_ref);

        let span = crate::lookup_span!(entry.key, secret_ref.backend(), secret_ref.key_path());
        let (value, backend) = chain.get(secret_ref.key_path()).instrument(span).await?;

        tracing::debug!(key = %entry.key, backend = %backend, "Resolved secret reference");
        Ok(value)
    }

    /// Direct match if the backend segment names a registered backend,
    /// otherwise every backend in registration order.
    fn candidates(&self, secret_ref: &SecretRef) -> FallbackChain {
        match self.registry.lookup(secret_ref.backend()) {
            Some(backend) => {
                FallbackChain::single(NamespacedBackend::new(backend.clone(), self.project))
            }
            None => FallbackChain::new(
                self.registry
                    .all()
                    .iter()
                    .map(|backend| NamespacedBackend::new(backend.clone(), self.project))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::backends::MemoryBackend;
    use std::sync::Arc;

    fn registry_with(backends: Vec<MemoryBackend>) -> BackendRegistry {
        let mut registry = BackendRegistry::new();
        for backend in backends {
            registry.register(Arc::new(backend)).unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn test_empty_project_rejected() {
        let doc = EnvDocument::new();
        let registry = BackendRegistry::new();
        assert_eq!(resolve(&doc, &registry, "").await.unwrap_err(), ResolveError::EmptyProject);
    }

    #[tokio::test]
    async fn test_request_precondition_order() {
        let doc = EnvDocument::new();
        let registry = BackendRegistry::new();

        let err = ResolveRequest::new("").resolve().await.unwrap_err();
        assert_eq!(err, ResolveError::MissingDocument);
        assert_eq!(err.to_string(), "env must not be nil");

        let err = ResolveRequest::new("").document(&doc).resolve().await.unwrap_err();
        assert_eq!(err, ResolveError::MissingRegistry);
        assert_eq!(err.to_string(), "registry must not be nil");

        let err =
            ResolveRequest::new("").document(&doc).registry(&registry).resolve().await.unwrap_err();
        assert_eq!(err, ResolveError::EmptyProject);

        let result = ResolveRequest::new("myapp")
            .document(&doc)
            .registry(&registry)
            .resolve()
            .await
            .unwrap();
        assert!(result.is_resolved());
        assert!(result.entries.is_empty());
    }

    #[tokio::test]
    async fn test_direct_match_is_exclusive() {
        let registry = registry_with(vec![
            MemoryBackend::new("keychain"),
            MemoryBackend::with_values("vault", [("myapp/db_pass", "from-vault")]),
        ]);
        let doc = EnvDocument::parse("DB_PASS=ref://keychain/db_pass").unwrap();

        let result = resolve(&doc, &registry, "myapp").await.unwrap();

        assert!(!result.is_resolved());
        assert_eq!(result.entries[0].value, "ref://keychain/db_pass");
        assert!(matches!(result.errors[0].error, EntryError::Lookup(ref e) if e.is_not_found()));
    }

    #[tokio::test]
    async fn test_empty_registry_alias_not_found() {
        let registry = BackendRegistry::new();
        let doc = EnvDocument::parse("TOKEN=ref://secrets/token").unwrap();

        let result = resolve(&doc, &registry, "myapp").await.unwrap();

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].error.to_string(), "Secret not found: token");
    }

    #[tokio::test]
    async fn test_resolved_count() {
        let registry =
            registry_with(vec![MemoryBackend::with_values("keychain", [("myapp/a", "1")])]);
        let doc =
            EnvDocument::parse("PLAIN=x\nA=ref://keychain/a\nB=ref://keychain/b\nC=ref://\n")
                .unwrap();

        let result = resolve(&doc, &registry, "myapp").await.unwrap();

        assert_eq!(result.resolved_count(), 1);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.get("A").unwrap().value, "1");
    }

    #[test]
    fn test_key_error_display() {
        let err = KeyError {
            key: "BROKEN".to_string(),
            reference: "ref://".to_string(),
            error: InvalidRef.into(),
        };
        assert_eq!(err.to_string(), "BROKEN: invalid ref:// URI (ref://)");
    }
}
