//! `envref secret` commands.
//!
//! Keys given on the command line are project-relative: `envref secret set
//! --backend keychain db_pass ...` stores `<project>/db_pass`.

use anyhow::{Context, Result};
use clap::Subcommand;
use owo_colors::OwoColorize;

use crate::secrets::{BackendRegistry, NamespacedBackend, SecretBackend};

#[derive(Subcommand, Debug)]
pub enum SecretCommands {
    /// Print a secret value
    Get {
        /// Backend name
        #[arg(long)]
        backend: String,

        /// Project-relative key
        key: String,
    },

    /// Store a secret value
    Set {
        #[arg(long)]
        backend: String,

        key: String,

        value: String,
    },

    /// Delete a secret
    Delete {
        #[arg(long)]
        backend: String,

        key: String,
    },

    /// List keys stored for this project
    List {
        #[arg(long)]
        backend: String,
    },
}

pub async fn handle_secret_command(
    command: SecretCommands,
    registry: &BackendRegistry,
    project: &str,
) -> Result<()> {
    match command {
        SecretCommands::Get { backend, key } => {
            let value = scoped(registry, &backend, project)?
                .get(&key)
                .await
                .with_context(|| format!("Failed to read '{}' from '{}'", key, backend))?;
            println!("{}", value);
        }
        SecretCommands::Set { backend, key, value } => {
            scoped(registry, &backend, project)?
                .set(&key, &value)
                .await
                .with_context(|| format!("Failed to store '{}' in '{}'", key, backend))?;
            println!("{} {} in {}", "Stored".green(), key, backend);
        }
        SecretCommands::Delete { backend, key } => {
            scoped(registry, &backend, project)?
                .delete(&key)
                .await
                .with_context(|| format!("Failed to delete '{}' from '{}'", key, backend))?;
            println!("{} {} from {}", "Deleted".green(), key, backend);
        }
        SecretCommands::List { backend } => {
            let keys = scoped(registry, &backend, project)?
                .list()
                .await
                .with_context(|| format!("Failed to list secrets in '{}'", backend))?;
            if keys.is_empty() {
                println!("No secrets stored for project '{}' in '{}'", project, backend);
            }
            for key in keys {
                println!("{}", key);
            }
        }
    }

    Ok(())
}

fn scoped(registry: &BackendRegistry, backend: &str, project: &str) -> Result<NamespacedBackend> {
    let inner = registry.lookup(backend).with_context(|| {
        format!("Unknown backend '{}' (configured: {})", backend, registry.names().join(", "))
    })?;
    Ok(NamespacedBackend::new(inner.clone(), project))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::backends::MemoryBackend;
    use std::sync::Arc;

    fn registry() -> (BackendRegistry, Arc<MemoryBackend>) {
        let memory = Arc::new(MemoryBackend::new("scratch"));
        let mut registry = BackendRegistry::new();
        registry.register(memory.clone()).unwrap();
        (registry, memory)
    }

    #[tokio::test]
    async fn test_set_and_delete_are_namespaced() {
        let (registry, memory) = registry();

        handle_secret_command(
            SecretCommands::Set {
                backend: "scratch".to_string(),
                key: "db_pass".to_string(),
                value: "s3cret".to_string(),
            },
            &registry,
            "myapp",
        )
        .await
        .unwrap();
        assert_eq!(memory.get("myapp/db_pass").await.unwrap(), "s3cret");

        handle_secret_command(
            SecretCommands::Delete { backend: "scratch".to_string(), key: "db_pass".to_string() },
            &registry,
            "myapp",
        )
        .await
        .unwrap();
        assert!(memory.get("myapp/db_pass").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        let (registry, _) = registry();
        let err = handle_secret_command(
            SecretCommands::List { backend: "nope".to_string() },
            &registry,
            "myapp",
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Unknown backend 'nope'"));
    }
}
