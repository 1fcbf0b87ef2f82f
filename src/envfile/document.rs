use std::collections::HashMap;
use std::path::Path;

use super::parser::{self, EnvEntry, ParseError};

/// Ordered, key-unique collection of env entries.
///
/// Iteration follows first-insertion order. Setting a key that already exists
/// replaces the entry in place, so the last assignment in a file wins while the
/// key keeps the position of its first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDocument {
    entries: Vec<EnvEntry>,
    index: HashMap<String, usize>,
}

impl EnvDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse env-file text into a document.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(parser::parse(text)?.into_iter().collect())
    }

    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        Ok(parser::parse_bytes(bytes)?.into_iter().collect())
    }

    /// Read and parse an env file from disk.
    pub async fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            crate::Error::io(e, format!("Failed to read env file '{}'", path.display()))
        })?;
        Ok(Self::parse_bytes(&bytes)?)
    }

    /// Insert or overwrite an entry. Returns the replaced entry, if any.
    pub fn set(&mut self, entry: EnvEntry) -> Option<EnvEntry> {
        match self.index.get(&entry.key) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position], entry)),
            None => {
                self.index.insert(entry.key.clone(), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&EnvEntry> {
        self.index.get(key).map(|&position| &self.entries[position])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnvEntry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Entries whose value is a `ref://` reference, in document order.
    pub fn references(&self) -> impl Iterator<Item = &EnvEntry> {
        self.entries.iter().filter(|entry| entry.is_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<EnvEntry> for EnvDocument {
    fn from_iter<I: IntoIterator<Item = EnvEntry>>(iter: I) -> Self {
        let mut document = Self::new();
        for entry in iter {
            document.set(entry);
        }
        document
    }
}

impl<'a> IntoIterator for &'a EnvDocument {
    type Item = &'a EnvEntry;
    type IntoIter = std::slice::Iter<'a, EnvEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
