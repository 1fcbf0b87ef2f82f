//! # Configuration Management
//!
//! Loads `envref.toml`, applies environment overrides and builds the backend
//! registry.
//!
//! Environment variables:
//! - `ENVREF_PROJECT`: overrides `project`
//! - `ENVREF_PROFILE`: selects a profile

pub mod settings;

pub use settings::{BackendConfig, BackendKind, ProjectConfig};

use std::path::{Path, PathBuf};

use crate::errors::{Error, Result};

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "envref.toml";

/// Closest `envref.toml` in `start` or one of its ancestors.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    start.ancestors().map(|dir| dir.join(CONFIG_FILE_NAME)).find(|path| path.is_file())
}

impl ProjectConfig {
    /// Load, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::io(e, format!("Failed to read config file: {}", path.display())))?;

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut config = Self::from_toml_str(&contents, base_dir)?;
        config.apply_env_overrides();
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            project = %config.project,
            backends = config.backends.len(),
            "Loaded project configuration"
        );
        Ok(config)
    }

    /// Walk up from `start` to the first `envref.toml` and load it.
    pub fn discover(start: &Path) -> Result<Self> {
        let path = find_config_file(start).ok_or_else(|| {
            Error::config(format!(
                "No {} found in {} or any parent directory",
                CONFIG_FILE_NAME,
                start.display()
            ))
        })?;
        Self::load(&path)
    }

    /// Apply `ENVREF_PROJECT` and `ENVREF_PROFILE`.
    pub fn apply_env_overrides(&mut self) {
        let project = std::env::var("ENVREF_PROJECT").ok().filter(|s| !s.is_empty());
        let profile = std::env::var("ENVREF_PROFILE").ok().filter(|s| !s.is_empty());
        self.apply_overrides(project, profile);
    }
}
