//! Secret store abstraction.
//!
//! Every secret store implements the [`SecretBackend`] capability set
//! (`get`, `set`, `delete`, `list`). Backends are collected in a
//! [`BackendRegistry`] whose registration order doubles as the fallback order.
//!
//! # Composable Architecture Example
//!
//! ```rust,ignore
//! use envref::secrets::{BackendRegistry, FallbackChain, NamespacedBackend};
//! use envref::secrets::backends::{EnvVarBackend, FileBackend};
//! use std::sync::Arc;
//!
//! let mut registry = BackendRegistry::new();
//! registry.register(Arc::new(FileBackend::new("local", ".envref/secrets.json")))?;
//! registry.register(Arc::new(EnvVarBackend::new("env")))?;
//!
//! // Direct addressing: only "local", keys scoped to "myapp/"
//! let local = NamespacedBackend::new(registry.lookup("local").unwrap().clone(), "myapp");
//! let db_pass = local.get("db_pass").await?;
//!
//! // Alias addressing: local, then env
//! let chain = FallbackChain::new(
//!     registry.all().iter().map(|b| NamespacedBackend::new(b.clone(), "myapp")).collect(),
//! );
//! let (token, found_in) = chain.get("token").await?;
//! ```
//!
//! # Security Considerations
//!
//! - Secret values are never logged or included in error messages
//! - Transport security to each store is the store's responsibility
//! - Nothing is cached: every resolution asks the store again

pub mod backends;
pub mod client;
pub mod error;
pub mod fallback;
pub mod namespaced;
pub mod registry;
pub mod types;

pub use client::SecretBackend;
pub use error::{Result, SecretsError};
pub use fallback::FallbackChain;
pub use namespaced::NamespacedBackend;
pub use registry::{BackendRegistry, RegistryError};
pub use types::SecretString;
