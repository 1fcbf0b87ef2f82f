//! # Observability
//!
//! Structured logging for envref. See [`logging`].

pub mod logging;

pub use logging::{init_logging, LogFormat};
