//! Secret backend registry
//!
//! Ordered collection of named backends. Registration order is significant: it
//! is the order in which the fallback chain tries backends when a reference
//! names a backend that is not registered.

use super::client::SecretBackend;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Setup-time registry errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Secret backend '{name}' is already registered")]
    DuplicateBackend { name: String },
}

/// Registry of secret backends keyed by name.
///
/// Backends are stored in registration order next to a name -> position index,
/// so lookups are O(1) and iteration order is stable.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn SecretBackend>>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry").field("backends", &self.names()).finish()
    }
}

impl BackendRegistry {
    /// Create a new registry with no backends
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret backend at the end of the fallback order.
    ///
    /// Fails if a backend with the same name is already present; the registry
    /// is left unchanged in that case.
    pub fn register(&mut self, backend: Arc<dyn SecretBackend>) -> Result<(), RegistryError> {
        let name = backend.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateBackend { name });
        }

        info!(backend = %name, position = self.backends.len(), "Registering secret backend");
        self.index.insert(name, self.backends.len());
        self.backends.push(backend);
        Ok(())
    }

    /// Exact-match lookup by name.
    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn SecretBackend>> {
        self.index.get(name).map(|&position| &self.backends[position])
    }

    /// Check if a backend is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All backends in registration (fallback) order.
    pub fn all(&self) -> &[Arc<dyn SecretBackend>] {
        &self.backends
    }

    /// Backend names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|backend| backend.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::backends::MemoryBackend;

    #[test]
    fn test_registry_creation() {
        let registry = BackendRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
        assert!(registry.lookup("keychain").is_none());
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let mut registry = BackendRegistry::new();
        for name in ["vault", "keychain", "ssm"] {
            registry.register(Arc::new(MemoryBackend::new(name))).unwrap();
        }

        assert_eq!(registry.names(), vec!["vault", "keychain", "ssm"]);
        assert_eq!(registry.all()[1].name(), "keychain");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_lookup_is_exact_match() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(MemoryBackend::new("keychain"))).unwrap();

        assert_eq!(registry.lookup("keychain").map(|b| b.name()), Some("keychain"));
        assert!(registry.lookup("Keychain").is_none());
        assert!(registry.lookup("key").is_none());
        assert!(registry.contains("keychain"));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(MemoryBackend::new("vault"))).unwrap();
        registry.register(Arc::new(MemoryBackend::new("keychain"))).unwrap();

        let err = registry.register(Arc::new(MemoryBackend::new("vault"))).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateBackend { name: "vault".to_string() });
        assert_eq!(err.to_string(), "Secret backend 'vault' is already registered");
        assert_eq!(registry.names(), vec!["vault", "keychain"]);
    }

    #[test]
    fn test_registry_debug_lists_names() {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(MemoryBackend::new("vault"))).unwrap();
        assert!(format!("{:?}", registry).contains("vault"));
    }
}
