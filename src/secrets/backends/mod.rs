//! Concrete secret stores
//!
//! ## Supported Backends
//!
//! - **Memory**: in-process map, for tests and ephemeral setups
//! - **Env**: read-only, process environment variables
//! - **File**: JSON object file on local disk
//! - **Vault**: HashiCorp Vault KV v2 engine (`vault` feature)

pub mod env;
pub mod file;
pub mod memory;
#[cfg(feature = "vault")]
pub mod vault;

pub use env::EnvVarBackend;
pub use file::FileBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "vault")]
pub use vault::{VaultBackend, VaultConfig};
