//! Rendering of resolved env documents.
//!
//! `env` output is written so that the env-file parser reads back exactly the
//! same values; `json` and `yaml` emit `[{key, value, was_ref}]`.

use anyhow::{Context, Result};
use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::resolver::{ResolveResult, ResolvedEntry};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Env,
    Json,
    Yaml,
}

/// Render resolved entries in `format`.
pub fn render(entries: &[ResolvedEntry], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Env => Ok(render_env(entries)),
        OutputFormat::Json => render_json(&entries),
        OutputFormat::Yaml => render_yaml(&entries),
    }
}

/// `KEY=value` lines, one per entry, in order.
pub fn render_env(entries: &[ResolvedEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.key);
        out.push('=');
        out.push_str(&quote_value(&entry.value));
        out.push('\n');
    }
    out
}

pub fn render_json<T: Serialize>(data: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    json.push('\n');
    Ok(json)
}

pub fn render_yaml<T: Serialize>(data: &T) -> Result<String> {
    serde_yaml::to_string(data).context("Failed to serialize to YAML")
}

/// Double-quote `value` unless it is a plain token.
pub fn quote_value(value: &str) -> String {
    if is_plain(value) {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

fn is_plain(value: &str) -> bool {
    value
        .chars()
        .all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '_' | '-' | '.' | '/' | ':' | '@' | ',' | '+' | '%')
        })
}

/// One status line per reference, without values.
pub fn render_check(result: &ResolveResult, color: bool) -> String {
    let mut out = String::new();

    for entry in result.entries.iter().filter(|entry| entry.was_ref) {
        let failure = result.errors.iter().find(|err| err.key == entry.key);
        let line = match (failure, color) {
            (None, true) => format!("{} {}", "ok".green(), entry.key),
            (None, false) => format!("ok {}", entry.key),
            (Some(err), true) => {
                format!("{} {}: {}", "FAIL".red(), entry.key, err.error.to_string().dimmed())
            }
            (Some(err), false) => format!("FAIL {}: {}", entry.key, err.error),
        };
        out.push_str(&line);
        out.push('\n');
    }

    let total = result.entries.iter().filter(|entry| entry.was_ref).count();
    out.push_str(&format!(
        "{} of {} references resolved\n",
        total - result.errors.len(),
        total
    ));
    out
}
