//! Env-file parsing and the ordered document model.

pub mod document;
pub mod parser;

pub use document::EnvDocument;
pub use parser::{parse, parse_bytes, EnvEntry, ParseError, ParseErrorKind};
