use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Scheme prefix that marks an env value as a secret reference.
pub const REF_SCHEME: &str = "ref://";

/// A malformed `ref://` value.
///
/// The message is fixed; which key carried the bad reference is reported by the
/// caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid ref:// URI")]
pub struct InvalidRef;

/// Parsed `ref://<backend>/<key-path>` reference.
///
/// The backend is everything up to the first `/`; the key path is the rest,
/// verbatim, and may itself contain `/`. Both parts are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRef {
    backend: String,
    key_path: String,
}

impl SecretRef {
    pub fn parse(value: &str) -> Result<Self, InvalidRef> {
        let rest = value.strip_prefix(REF_SCHEME).ok_or(InvalidRef)?;
        let (backend, key_path) = rest.split_once('/').ok_or(InvalidRef)?;

        if backend.is_empty() || key_path.is_empty() {
            return Err(InvalidRef);
        }

        Ok(Self { backend: backend.to_string(), key_path: key_path.to_string() })
    }

    /// Name of the backend to try exclusively, if registered.
    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn key_path(&self) -> &str {
        &self.key_path
    }
}

impl FromStr for SecretRef {
    type Err = InvalidRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", REF_SCHEME, self.backend, self.key_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let r = SecretRef::parse("ref://keychain/db_pass").unwrap();
        assert_eq!(r.backend(), "keychain");
        assert_eq!(r.key_path(), "db_pass");
    }

    #[test]
    fn test_key_path_keeps_slashes() {
        let r: SecretRef = "ref://vault/prod/api/token".parse().unwrap();
        assert_eq!(r.backend(), "vault");
        assert_eq!(r.key_path(), "prod/api/token");
        assert_eq!(r.to_string(), "ref://vault/prod/api/token");
    }

    #[test]
    fn test_invalid_forms() {
        for value in [
            "ref://",
            "ref://keychain",
            "ref://keychain/",
            "ref:///db_pass",
            "ref://nokeypath",
            "https://host/path",
        ] {
            assert_eq!(SecretRef::parse(value), Err(InvalidRef), "{}", value);
        }
        assert_eq!(InvalidRef.to_string(), "invalid ref:// URI");
    }
}
