//! Environment variable secrets backend.
//!
//! Reads secrets from process environment variables. Read-only.
//!
//! # Variable Naming
//!
//! The (already namespaced) key is upper-cased, `/`, `-` and `.` become `_`, and
//! the configured prefix is prepended:
//!
//! ```bash
//! # ref://env/db_pass in project "myapp" reads:
//! export ENVREF_SECRET_MYAPP_DB_PASS="s3cret"
//! ```
//!
//! # Limitations
//!
//! - `set()` and `delete()` fail with [`SecretsError::ReadOnly`]
//! - `list()` cannot invert the name mapping; it returns lower-cased variable
//!   suffixes (`myapp_db_pass`), which is advisory only

use async_trait::async_trait;
use std::env;

use crate::secrets::client::SecretBackend;
use crate::secrets::error::{Result, SecretsError};

/// Default environment variable prefix for secrets.
pub const DEFAULT_PREFIX: &str = "ENVREF_SECRET_";

/// Environment variable secrets backend.
#[derive(Debug, Clone)]
pub struct EnvVarBackend {
    name: String,
    prefix: String,
}

impl EnvVarBackend {
    /// Creates a backend reading `ENVREF_SECRET_*` variables.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_prefix(name, DEFAULT_PREFIX)
    }

    pub fn with_prefix(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self { name: name.into(), prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Converts a secret key to the environment variable name.
    pub fn key_to_env_var(&self, key: &str) -> String {
        let suffix: String = key
            .chars()
            .map(|c| match c {
                '/' | '-' | '.' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{}", self.prefix, suffix)
    }
}

#[async_trait]
impl SecretBackend for EnvVarBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<String> {
        let env_var = self.key_to_env_var(key);

        match env::var(&env_var) {
            Ok(value) => Ok(value),
            Err(env::VarError::NotPresent) => Err(SecretsError::not_found(key)),
            Err(env::VarError::NotUnicode(_)) => {
                tracing::warn!(
                    backend = %self.name,
                    env_var = %env_var,
                    "Environment variable contains invalid UTF-8"
                );
                Err(SecretsError::backend_error(format!("{} is not valid UTF-8", env_var)))
            }
        }
    }

    async fn set(&self, key: &str, _value: &str) -> Result<()> {
        Err(SecretsError::read_only(&self.name, "set", key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        Err(SecretsError::read_only(&self.name, "delete", key))
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = env::vars()
            .filter_map(|(name, _)| {
                name.strip_prefix(&self.prefix).map(|suffix| suffix.to_lowercase())
            })
            .filter(|suffix| !suffix.is_empty())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
