//! Line-oriented env-file parser.
//!
//! Accepted syntax:
//!
//! ```text
//! # comment
//! export HOST=localhost          # `export ` prefix is tolerated
//! PORT=5432 # inline comment     # `#` after a space starts a comment
//! COLOR=blue#not-a-comment
//! LITERAL='no $escapes \n here'  # single quotes: literal, one line only
//! MULTI="first\tline             # double quotes: escapes, may span lines
//! second line"
//! SCRIPT=`echo "raw"             # backticks: literal, may span lines
//! echo done`
//! ```
//!
//! Lines without `=` and lines with an empty key are skipped silently. An
//! unterminated quote aborts the parse.

use std::fmt;

use thiserror::Error;

/// One `KEY=VALUE` assignment as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    /// Variable name, never empty.
    pub key: String,
    /// Value after quote removal, escape processing and comment stripping.
    pub value: String,
    /// Unmodified text after the `=`, including continuation lines.
    pub raw: String,
    /// 1-based line on which the entry starts; 0 for entries not read from a file.
    pub line: usize,
}

impl EnvEntry {
    /// Entry created in code rather than parsed from a file.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self { key: key.into(), raw: value.clone(), value, line: 0 }
    }

    /// True iff the value is a `ref://` secret reference.
    pub fn is_ref(&self) -> bool {
        self.value.starts_with(crate::resolver::reference::REF_SCHEME)
    }
}

/// Why a parse was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnterminatedSingleQuote,
    UnterminatedDoubleQuote,
    UnterminatedBacktick,
    InvalidUtf8,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::UnterminatedSingleQuote => "unterminated single-quoted value",
            Self::UnterminatedDoubleQuote => "unterminated double-quoted value",
            Self::UnterminatedBacktick => "unterminated backtick-quoted value",
            Self::InvalidUtf8 => "env file is not valid UTF-8",
        };
        f.write_str(message)
    }
}

/// Fatal parse failure.
///
/// Carries the entries parsed before the failure for diagnostics; they must not
/// be treated as a usable document.
#[derive(Error, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
    parsed: Vec<EnvEntry>,
}

impl ParseError {
    fn new(line: usize, kind: ParseErrorKind, parsed: Vec<EnvEntry>) -> Self {
        Self { line, kind, parsed }
    }

    /// Entries successfully parsed before the failing line.
    pub fn parsed_entries(&self) -> &[EnvEntry] {
        &self.parsed
    }
}

// Values may be secrets in their own right, so only report the count.
impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseError")
            .field("line", &self.line)
            .field("kind", &self.kind)
            .field("parsed", &self.parsed.len())
            .finish()
    }
}

/// Parse raw env-file bytes. The input must be UTF-8; a leading BOM is ignored.
pub fn parse_bytes(bytes: &[u8]) -> Result<Vec<EnvEntry>, ParseError> {
    match std::str::from_utf8(bytes) {
        Ok(text) => parse(text),
        Err(e) => {
            let valid = &bytes[..e.valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            Err(ParseError::new(line, ParseErrorKind::InvalidUtf8, Vec::new()))
        }
    }
}

/// Parse env-file text into entries in source order.
///
/// Duplicate keys are all returned; deduplication is the job of
/// [`EnvDocument`](super::EnvDocument).
pub fn parse(text: &str) -> Result<Vec<EnvEntry>, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text.lines().collect();
    let mut entries = Vec::new();
    let mut next = 0;

    while next < lines.len() {
        let line_number = next + 1;
        let line = lines[next].trim_start();
        next += 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let body = match line.strip_prefix("export ") {
            Some(rest) => rest.trim_start(),
            None => line,
        };

        let Some(eq) = find_unescaped(body, '=') else {
            continue;
        };

        let key = body[..eq].trim();
        if key.is_empty() {
            continue;
        }

        let raw_value = &body[eq + 1..];
        match parse_value(raw_value, &lines, &mut next) {
            Ok((value, raw)) => {
                entries.push(EnvEntry { key: key.to_string(), value, raw, line: line_number })
            }
            Err(kind) => return Err(ParseError::new(line_number, kind, entries)),
        }
    }

    Ok(entries)
}

/// Returns `(value, raw)`; may consume following lines for multi-line values.
///
/// The quote style comes from the first character after leading whitespace,
/// tabs included, so `KEY=\t'x'` is single-quoted.
fn parse_value(
    raw_value: &str,
    lines: &[&str],
    next: &mut usize,
) -> Result<(String, String), ParseErrorKind> {
    let rest = raw_value.trim_start();

    match rest.chars().next() {
        Some('\'') => {
            let content = &rest[1..];
            match content.find('\'') {
                Some(end) => Ok((content[..end].to_string(), raw_value.to_string())),
                None => Err(ParseErrorKind::UnterminatedSingleQuote),
            }
        }
        Some('"') => {
            let (content, raw) = scan_quoted(raw_value, rest, '"', true, lines, next)
                .ok_or(ParseErrorKind::UnterminatedDoubleQuote)?;
            Ok((unescape(&content), raw))
        }
        Some('`') => scan_quoted(raw_value, rest, '`', false, lines, next)
            .ok_or(ParseErrorKind::UnterminatedBacktick),
        _ => Ok((strip_inline_comment(raw_value).trim().to_string(), raw_value.to_string())),
    }
}

/// Accumulate lines until `quote` closes. Returns the text between the quotes
/// (escapes still in place) and the raw text consumed, or `None` at end of input.
fn scan_quoted(
    raw_value: &str,
    rest: &str,
    quote: char,
    escapes: bool,
    lines: &[&str],
    next: &mut usize,
) -> Option<(String, String)> {
    let mut raw = raw_value.to_string();
    let mut content = rest[quote.len_utf8()..].to_string();

    loop {
        if let Some(end) = find_closing(&content, quote, escapes) {
            content.truncate(end);
            return Some((content, raw));
        }

        let line = lines.get(*next)?;
        *next += 1;
        content.push('\n');
        content.push_str(line);
        raw.push('\n');
        raw.push_str(line);
    }
}

fn find_closing(content: &str, quote: char, escapes: bool) -> Option<usize> {
    let mut chars = content.char_indices();
    while let Some((i, c)) = chars.next() {
        if escapes && c == '\\' {
            chars.next();
        } else if c == quote {
            return Some(i);
        }
    }
    None
}

fn find_unescaped(s: &str, target: char) -> Option<usize> {
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == target {
            return Some(i);
        }
    }
    None
}

fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

/// A `#` starts a comment only when the character right before it is a space.
fn strip_inline_comment(raw_value: &str) -> &str {
    let mut previous = None;
    for (i, c) in raw_value.char_indices() {
        if c == '#' && previous == Some(' ') {
            return &raw_value[..i];
        }
        previous = Some(c);
    }
    raw_value
}
