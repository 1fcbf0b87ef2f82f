//! # Structured Logging
//!
//! Span macros used by the library and the subscriber setup used by the
//! binary. Library code only emits events; installing a subscriber is the
//! binary's job.
//!
//! Secret values are never recorded. Keys, backend names, counts and line
//! numbers are.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Create a tracing span for one secret lookup.
///
/// ```rust,ignore
/// let span = lookup_span!("DB_PASS", "keychain", "db_pass");
/// ```
#[macro_export]
macro_rules! lookup_span {
    ($key:expr, $backend:expr, $key_path:expr) => {
        tracing::debug_span!(
            "secret_lookup",
            key = %$key,
            backend = %$backend,
            key_path = %$key_path
        )
    };
    ($key:expr, $backend:expr, $key_path:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "secret_lookup",
            key = %$key,
            backend = %$backend,
            key_path = %$key_path,
            $($field)*
        )
    };
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}' (expected text or json)", other)),
        }
    }
}

/// Filter from `RUST_LOG`, or `info` / `debug` depending on `verbose`.
pub fn build_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber, writing to stderr.
///
/// Calling this more than once is harmless; later calls leave the first
/// subscriber in place.
pub fn init_logging(verbose: bool, format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(verbose);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    // Subscriber already set elsewhere (e.g. integration tests); ignore.
    let _ = installed;
}
