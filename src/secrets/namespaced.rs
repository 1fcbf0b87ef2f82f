//! Per-project key namespacing.
//!
//! Several projects may share one secret store. [`NamespacedBackend`] scopes every
//! key a caller passes to `<project>/<key>` before delegating, so `db_pass` for
//! project `myapp` is stored as `myapp/db_pass`.

use async_trait::async_trait;
use std::sync::Arc;

use super::client::SecretBackend;
use super::error::Result;

/// Decorator that rewrites every key to `<project>/<key>`.
///
/// Errors from the wrapped backend are passed through untouched.
#[derive(Debug, Clone)]
pub struct NamespacedBackend {
    inner: Arc<dyn SecretBackend>,
    project: String,
}

impl NamespacedBackend {
    pub fn new(inner: Arc<dyn SecretBackend>, project: impl Into<String>) -> Self {
        Self { inner, project: project.into() }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn inner(&self) -> &Arc<dyn SecretBackend> {
        &self.inner
    }

    /// The key actually presented to the wrapped backend.
    pub fn scoped_key(&self, key: &str) -> String {
        format!("{}/{}", self.project, key)
    }
}

#[async_trait]
impl SecretBackend for NamespacedBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, key: &str) -> Result<String> {
        self.inner.get(&self.scoped_key(key)).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(&self.scoped_key(key), value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(&self.scoped_key(key)).await
    }

    /// Keys under this project's prefix, with the prefix removed.
    async fn list(&self) -> Result<Vec<String>> {
        let prefix = format!("{}/", self.project);
        let keys = self.inner.list().await?;
        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .filter(|key| !key.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::backends::MemoryBackend;
    use crate::secrets::SecretsError;

    #[tokio::test]
    async fn test_keys_are_prefixed_with_project() {
        let memory = Arc::new(MemoryBackend::new("keychain"));
        let scoped = NamespacedBackend::new(memory.clone(), "myapp");

        scoped.set("db_pass", "s3cret").await.unwrap();

        assert_eq!(memory.get("myapp/db_pass").await.unwrap(), "s3cret");
        assert_eq!(scoped.get("db_pass").await.unwrap(), "s3cret");
        assert!(memory.get("db_pass").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_nested_key_paths() {
        let memory = Arc::new(MemoryBackend::new("ssm"));
        memory.set("myapp/prod/db/password", "pw").await.unwrap();

        let scoped = NamespacedBackend::new(memory, "myapp");
        assert_eq!(scoped.get("prod/db/password").await.unwrap(), "pw");
    }

    #[tokio::test]
    async fn test_name_delegates_to_inner() {
        let scoped = NamespacedBackend::new(Arc::new(MemoryBackend::new("vault")), "myapp");
        assert_eq!(scoped.name(), "vault");
        assert_eq!(scoped.project(), "myapp");
    }

    #[tokio::test]
    async fn test_list_only_returns_project_keys() {
        let memory = Arc::new(MemoryBackend::new("keychain"));
        memory.set("myapp/a", "1").await.unwrap();
        memory.set("myapp/nested/b", "2").await.unwrap();
        memory.set("other/c", "3").await.unwrap();
        memory.set("myapplication/d", "4").await.unwrap();

        let scoped = NamespacedBackend::new(memory, "myapp");
        assert_eq!(scoped.list().await.unwrap(), vec!["a", "nested/b"]);
    }

    #[tokio::test]
    async fn test_delete_not_found_passes_through() {
        let scoped = NamespacedBackend::new(Arc::new(MemoryBackend::new("keychain")), "myapp");
        let err = scoped.delete("missing").await.unwrap_err();
        assert!(matches!(err, SecretsError::NotFound { ref key } if key == "myapp/missing"));
    }
}
