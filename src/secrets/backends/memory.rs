//! In-process secret store.
//!
//! Holds values in an ordered map for the lifetime of the process. Used by tests
//! and by `type = "memory"` entries in `envref.toml`, which may seed it with
//! fixed values.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::secrets::client::SecretBackend;
use crate::secrets::error::{Result, SecretsError};

/// In-memory secret store.
#[derive(Debug)]
pub struct MemoryBackend {
    name: String,
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), values: RwLock::new(BTreeMap::new()) }
    }

    /// Create a store pre-populated with `values` (keys as stored, i.e. already namespaced).
    pub fn with_values<I, K, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = values.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { name: name.into(), values: RwLock::new(values) }
    }
}

#[async_trait]
impl SecretBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<String> {
        self.values.read().await.get(key).cloned().ok_or_else(|| SecretsError::not_found(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self.values.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(SecretsError::not_found(key)),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.values.read().await.keys().cloned().collect())
    }
}
