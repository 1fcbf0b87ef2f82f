//! # Error Handling
//!
//! Crate-level error type. Each layer keeps its own error enum
//! ([`ParseError`], [`SecretsError`], [`RegistryError`], [`ResolveError`]) and
//! converts into [`Error`] at the boundary with `?`.

use crate::envfile::ParseError;
use crate::resolver::ResolveError;
use crate::secrets::{RegistryError, SecretsError};

/// Custom result type for envref operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for envref
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Env-file syntax errors
    #[error("Env file parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Secrets(#[from] SecretsError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error wrapping its cause
    pub fn config_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create a validation error for a specific field
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    pub fn io<S: Into<String>>(source: std::io::Error, context: S) -> Self {
        Self::Io { source, context: context.into() }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        // Nested list errors (e.g. one bad backend) do not show up in field_errors.
        let message = if message.is_empty() { errors.to_string() } else { message };

        Self::validation(format!("Validation failed: {}", message))
    }
}
