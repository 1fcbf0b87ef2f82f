//! Core secret backend trait.

use async_trait::async_trait;

use super::error::{Result, SecretsError};

/// Capability set every secret store exposes to the resolver.
///
/// Backends are registered by name in a [`BackendRegistry`](super::BackendRegistry);
/// the name is fixed for the lifetime of the backend and must be unique within a
/// registry.
///
/// # Security Considerations
///
/// - Implementations MUST NOT log secret values
/// - Request timeouts and retries belong to the implementation, not the caller
///
/// # Example Implementation
///
/// ```rust,ignore
/// use envref::secrets::{Result, SecretBackend, SecretsError};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct StaticBackend;
///
/// #[async_trait]
/// impl SecretBackend for StaticBackend {
///     fn name(&self) -> &str {
///         "static"
///     }
///
///     async fn get(&self, key: &str) -> Result<String> {
///         Err(SecretsError::not_found(key))
///     }
///
///     async fn set(&self, key: &str, _value: &str) -> Result<()> {
///         Err(SecretsError::read_only("static", "set", key))
///     }
///
///     async fn delete(&self, key: &str) -> Result<()> {
///         Err(SecretsError::read_only("static", "delete", key))
///     }
///
///     async fn list(&self) -> Result<Vec<String>> {
///         Ok(vec![])
///     }
/// }
/// ```
#[async_trait]
pub trait SecretBackend: Send + Sync + std::fmt::Debug {
    /// Registry name of this backend.
    fn name(&self) -> &str;

    /// Retrieve a secret value by key.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::NotFound`] if the key is absent
    /// - any other variant for backend faults
    async fn get(&self, key: &str) -> Result<String>;

    /// Store or update a secret value.
    ///
    /// The value MUST NOT be logged or exposed in error messages.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a secret.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::NotFound`] if the key is absent
    async fn delete(&self, key: &str) -> Result<()>;

    /// List all keys held by this backend. Values are never returned.
    async fn list(&self) -> Result<Vec<String>>;

    /// Check if a secret exists.
    async fn exists(&self, key: &str) -> Result<bool> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(SecretsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
