//! # envref
//!
//! Resolves `ref://backend/key-path` placeholders in env files against one or
//! more pluggable secret stores, keeping document order and reporting every
//! reference that could not be resolved.
//!
//! ## Architecture
//!
//! ```text
//! env-file text → Parser → EnvDocument → Resolver → ResolveResult → renderer
//!                                           ↓
//!                        BackendRegistry (NamespacedBackend per lookup)
//! ```
//!
//! ## Core Components
//!
//! - **Parser** ([`envfile::parser`]): `KEY=VALUE` lines with three quoting styles
//! - **Document** ([`envfile::EnvDocument`]): ordered, key-unique entries
//! - **Backends** ([`secrets`]): the [`SecretBackend`] capability and concrete stores
//! - **Registry** ([`secrets::BackendRegistry`]): named backends in fallback order
//! - **Resolver** ([`resolver`]): direct match or fallback chain per reference
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use envref::{resolve, BackendRegistry, EnvDocument};
//! use envref::secrets::backends::MemoryBackend;
//!
//! #[tokio::main]
//! async fn main() -> envref::Result<()> {
//!     let mut registry = BackendRegistry::new();
//!     registry.register(Arc::new(MemoryBackend::with_values(
//!         "keychain",
//!         [("myapp/db_pass", "s3cret")],
//!     )))?;
//!
//!     let doc = EnvDocument::parse("DB_PASS=ref://keychain/db_pass\n")?;
//!     let result = resolve(&doc, &registry, "myapp").await?;
//!     assert!(result.is_resolved());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod envfile;
pub mod errors;
pub mod observability;
pub mod resolver;
pub mod secrets;

// Re-export commonly used types and traits
pub use config::ProjectConfig;
pub use envfile::{EnvDocument, EnvEntry, ParseError};
pub use errors::{Error, Result};
pub use resolver::{resolve, ResolveRequest, ResolveResult, ResolvedEntry};
pub use secrets::{BackendRegistry, NamespacedBackend, SecretBackend, SecretsError};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
