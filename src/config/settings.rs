//! `envref.toml` schema.
//!
//! ```toml
//! project = "myapp"
//! env_file = ".env"
//! profile = "dev"
//!
//! [profiles]
//! dev = ".env.dev"
//! prod = ".env.prod"
//!
//! [[backends]]
//! name = "keychain"
//! type = "file"
//! path = "secrets.json"
//!
//! [[backends]]
//! name = "vault"
//! type = "vault"
//! address = "https://vault.example.com:8200"
//! ```
//!
//! The order of `[[backends]]` is the fallback order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use validator::Validate;

use crate::errors::{Error, Result};
use crate::secrets::backends::{EnvVarBackend, FileBackend, MemoryBackend};
use crate::secrets::{BackendRegistry, SecretBackend};

#[cfg(feature = "vault")]
use crate::secrets::backends::{VaultBackend, VaultConfig};

/// Project configuration loaded from `envref.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProjectConfig {
    /// Namespace applied to every secret key
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub project: String,

    /// Env file resolved when no profile is selected
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    /// Default profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Profile name -> env file
    #[serde(default)]
    pub profiles: BTreeMap<String, PathBuf>,

    /// Backends in fallback order
    #[serde(default)]
    #[validate(nested)]
    pub backends: Vec<BackendConfig>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}

/// One `[[backends]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BackendConfig {
    #[validate(length(min = 1, message = "Backend name cannot be empty"))]
    pub name: String,

    #[serde(flatten)]
    pub kind: BackendKind,
}

/// Backend type and its settings, selected by `type = "..."`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process store, optionally seeded (keys already namespaced)
    Memory {
        #[serde(default)]
        values: BTreeMap<String, String>,
    },

    /// Read-only process environment
    Env {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
    },

    /// JSON file store
    File { path: PathBuf },

    /// HashiCorp Vault KV v2
    #[cfg(feature = "vault")]
    Vault(VaultConfig),
}

impl BackendKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Memory { .. } => "memory",
            Self::Env { .. } => "env",
            Self::File { .. } => "file",
            #[cfg(feature = "vault")]
            Self::Vault(_) => "vault",
        }
    }
}

impl BackendConfig {
    /// Construct the backend. Relative file paths are taken from `base_dir`.
    pub async fn build(&self, base_dir: &Path) -> Result<Arc<dyn SecretBackend>> {
        let backend: Arc<dyn SecretBackend> = match &self.kind {
            BackendKind::Memory { values } => {
                Arc::new(MemoryBackend::with_values(&self.name, values.clone()))
            }
            BackendKind::Env { prefix: Some(prefix) } => {
                Arc::new(EnvVarBackend::with_prefix(&self.name, prefix))
            }
            BackendKind::Env { prefix: None } => Arc::new(EnvVarBackend::new(&self.name)),
            BackendKind::File { path } => {
                Arc::new(FileBackend::new(&self.name, base_dir.join(path)))
            }
            #[cfg(feature = "vault")]
            BackendKind::Vault(config) => {
                Arc::new(VaultBackend::connect(&self.name, config.clone()).await?)
            }
        };
        Ok(backend)
    }
}

impl ProjectConfig {
    /// Configuration with no backends, rooted at `base_dir`.
    pub fn new(project: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            env_file: default_env_file(),
            profile: None,
            profiles: BTreeMap::new(),
            backends: Vec::new(),
            base_dir: base_dir.into(),
        }
    }

    /// Parse configuration text. Relative paths resolve against `base_dir`.
    pub fn from_toml_str(contents: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config: Self = toml::from_str(contents)
            .map_err(|e| Error::config_with_source("Failed to parse envref.toml", e))?;
        config.base_dir = base_dir.into();
        Ok(config)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for backend in &self.backends {
            if !seen.insert(backend.name.as_str()) {
                return Err(Error::validation_field(
                    format!("Backend '{}' is defined more than once", backend.name),
                    "backends",
                ));
            }
        }

        if let Some(profile) = &self.profile {
            if !self.profiles.contains_key(profile) {
                return Err(Error::validation_field(
                    format!("Default profile '{}' is not defined in [profiles]", profile),
                    "profile",
                ));
            }
        }

        Ok(())
    }

    /// Apply explicit overrides for project name and profile.
    pub fn apply_overrides(&mut self, project: Option<String>, profile: Option<String>) {
        if let Some(project) = project {
            self.project = project;
        }
        if let Some(profile) = profile {
            self.profile = Some(profile);
        }
    }

    /// Env file for `profile`, or for the configured default profile, or `env_file`.
    pub fn env_file_path(&self, profile: Option<&str>) -> Result<PathBuf> {
        let relative = match profile.or(self.profile.as_deref()) {
            Some(name) => self.profiles.get(name).ok_or_else(|| {
                Error::validation_field(format!("Unknown profile '{}'", name), "profile")
            })?,
            None => &self.env_file,
        };
        Ok(self.base_dir.join(relative))
    }

    /// Construct every backend in file order and register it.
    pub async fn build_registry(&self) -> Result<BackendRegistry> {
        let mut registry = BackendRegistry::new();
        for backend in &self.backends {
            tracing::debug!(
                backend = %backend.name,
                backend_type = backend.kind.type_name(),
                "Constructing secrets backend"
            );
            registry.register(backend.build(&self.base_dir).await?)?;
        }
        Ok(registry)
    }
}
