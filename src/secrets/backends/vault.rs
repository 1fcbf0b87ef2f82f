//! HashiCorp Vault secrets backend.
//!
//! Stores each secret in Vault's KV v2 engine as a document with a single
//! `value` field, at the (already namespaced) key path:
//!
//! ```text
//! secret/data/myapp/db_pass   ->   { "value": "s3cret" }
//! ```
//!
//! # Configuration
//!
//! - Vault server address (HTTPS recommended)
//! - Authentication token (from `envref.toml` or `VAULT_TOKEN`)
//! - Optional namespace for multi-tenancy
//! - KV v2 mount path (default: "secret")
//!
//! Request timeouts are those of the underlying `vaultrs` HTTP client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use crate::secrets::client::SecretBackend;
use crate::secrets::error::{Result, SecretsError};
use crate::secrets::types::SecretString;

/// Field under which the secret value is stored in each KV document.
const VALUE_FIELD: &str = "value";

/// Configuration for HashiCorp Vault backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault server address (e.g., "https://vault.example.com:8200")
    pub address: String,

    /// Vault authentication token; falls back to `VAULT_TOKEN` when absent
    #[serde(default)]
    pub token: Option<SecretString>,

    /// Vault namespace (for Enterprise multi-tenancy)
    #[serde(default)]
    pub namespace: Option<String>,

    /// KV v2 mount path (default: "secret")
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
}

fn default_mount_path() -> String {
    "secret".to_string()
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: None,
            namespace: None,
            mount_path: default_mount_path(),
        }
    }
}

/// HashiCorp Vault KV v2 backend.
pub struct VaultBackend {
    name: String,
    client: VaultClient,
    mount_path: String,
}

impl std::fmt::Debug for VaultBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultBackend")
            .field("name", &self.name)
            .field("mount_path", &self.mount_path)
            .finish()
    }
}

impl VaultBackend {
    /// Creates a Vault backend and checks that the server is reachable.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::ConfigError`] if configuration is invalid
    /// - [`SecretsError::ConnectionFailed`] if Vault is unreachable
    pub async fn connect(name: impl Into<String>, config: VaultConfig) -> Result<Self> {
        let name = name.into();
        if config.address.is_empty() {
            return Err(SecretsError::config_error("Vault address cannot be empty"));
        }

        let token = config
            .token
            .clone()
            .or_else(|| std::env::var("VAULT_TOKEN").ok().map(SecretString::new));

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);

        if let Some(ref token) = token {
            settings_builder.token(token.expose_secret());
        }

        if let Some(namespace) = config.namespace {
            settings_builder.namespace(Some(namespace));
        }

        let settings = settings_builder.build().map_err(|e| {
            SecretsError::config_error(format!("Invalid Vault configuration: {}", e))
        })?;

        let client = VaultClient::new(settings).map_err(|e| {
            SecretsError::connection_failed(format!("Failed to create Vault client: {}", e))
        })?;

        match vaultrs::sys::health(&client).await {
            Ok(_) => {
                tracing::info!(backend = %name, address = %config.address, "Connected to Vault");
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    address = %config.address,
                    "Failed to connect to Vault"
                );
                return Err(SecretsError::connection_failed(format!(
                    "Vault health check failed: {}",
                    e
                )));
            }
        }

        Ok(Self { name, client, mount_path: config.mount_path })
    }

    fn map_error(&self, key: &str, operation: &str, error: ClientError) -> SecretsError {
        match error {
            ClientError::APIError { code: 404, .. } => SecretsError::not_found(key),
            ClientError::APIError { code: 401 | 403, .. } => SecretsError::authentication_failed(
                format!("Vault denied {} on '{}'", operation, key),
            ),
            other => {
                tracing::error!(
                    backend = %self.name,
                    error = %other,
                    key = %key,
                    operation,
                    "Vault request failed"
                );
                SecretsError::backend_error(format!(
                    "Failed to {} secret '{}': {}",
                    operation, key, other
                ))
            }
        }
    }
}

#[async_trait]
impl SecretBackend for VaultBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<String> {
        let secret: HashMap<String, String> = kv2::read(&self.client, &self.mount_path, key)
            .await
            .map_err(|e| self.map_error(key, "read", e))?;

        secret.get(VALUE_FIELD).cloned().ok_or_else(|| {
            SecretsError::backend_error(format!("Secret '{}' has no '{}' field", key, VALUE_FIELD))
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut data = HashMap::new();
        data.insert(VALUE_FIELD.to_string(), value.to_string());

        kv2::set(&self.client, &self.mount_path, key, &data)
            .await
            .map_err(|e| self.map_error(key, "store", e))?;

        tracing::info!(key = %key, mount_path = %self.mount_path, "Stored secret in Vault");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // KV v2 metadata deletes succeed for absent paths, so check first.
        kv2::read_metadata(&self.client, &self.mount_path, key)
            .await
            .map_err(|e| self.map_error(key, "delete", e))?;

        kv2::delete_metadata(&self.client, &self.mount_path, key)
            .await
            .map_err(|e| self.map_error(key, "delete", e))?;

        tracing::info!(key = %key, mount_path = %self.mount_path, "Deleted secret from Vault");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut folders = vec![String::new()];

        while let Some(folder) = folders.pop() {
            let entries = match kv2::list(&self.client, &self.mount_path, &folder).await {
                Ok(entries) => entries,
                Err(ClientError::APIError { code: 404, .. }) => continue,
                Err(e) => return Err(self.map_error(&folder, "list", e)),
            };

            for entry in entries {
                let path = format!("{}{}", folder, entry);
                if entry.ends_with('/') {
                    folders.push(path);
                } else {
                    keys.push(path);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
