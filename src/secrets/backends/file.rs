//! JSON file secret store.
//!
//! Keeps secrets in a single JSON object on disk:
//!
//! ```json
//! { "myapp/db_pass": "s3cret", "myapp/token": "tok-456" }
//! ```
//!
//! The file is re-read on every call so edits made by other processes are seen
//! immediately. A missing file is an empty store; it is created (with parent
//! directories) on the first write. Values are stored as plain text: protect
//! the file with filesystem permissions.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::secrets::client::SecretBackend;
use crate::secrets::error::{Result, SecretsError};

/// Secret store backed by a JSON file.
#[derive(Debug)]
pub struct FileBackend {
    name: String,
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(values)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

#[async_trait]
impl SecretBackend for FileBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<String> {
        self.load().await?.remove(key).ok_or_else(|| SecretsError::not_found(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        self.store(&values).await?;

        tracing::info!(backend = %self.name, key = %key, "Stored secret in file backend");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        if values.remove(key).is_none() {
            return Err(SecretsError::not_found(key));
        }
        self.store(&values).await?;

        tracing::info!(backend = %self.name, key = %key, "Deleted secret from file backend");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.load().await?.into_keys().collect())
    }
}
