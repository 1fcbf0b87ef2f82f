//! Error types for secret store operations.

use thiserror::Error;

/// Result type for secret store operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors reported by a [`SecretBackend`](super::SecretBackend).
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Secret not found in the backend.
    #[error("Secret not found: {key}")]
    NotFound { key: String },

    /// The backend does not accept writes.
    #[error("Backend '{backend}' is read-only: cannot {operation} '{key}'")]
    ReadOnly { backend: String, operation: String, key: String },

    /// Failed to connect to the secrets backend.
    #[error("Backend connection failed: {message}")]
    ConnectionFailed { message: String },

    /// Authentication with the secrets backend failed.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Backend-specific error.
    #[error("Backend error: {message}")]
    BackendError { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a read-only error.
    pub fn read_only(
        backend: impl Into<String>,
        operation: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self::ReadOnly { backend: backend.into(), operation: operation.into(), key: key.into() }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: message.into() }
    }

    /// Create an authentication failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: message.into() }
    }

    /// Create a backend error.
    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::BackendError { message: message.into() }
    }

    /// Create a config error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    /// True when the error means "the key is absent" rather than a backend fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
