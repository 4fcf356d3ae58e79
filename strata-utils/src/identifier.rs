//! Namespaced resource identifiers.
//!
//! An [`Identifier`] is the `namespace:path` name used for every resource
//! the engine touches: region labels, slice names, partition ids. Both
//! halves are reference-counted so identifiers clone cheaply on hot
//! sampling paths.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Namespace assumed when parsing an identifier without an explicit one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A namespaced resource name in `namespace:path` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    namespace: Arc<str>,
    path: Arc<str>,
}

/// Error produced when parsing an identifier from its string form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The namespace half contains a character outside `[a-z0-9_.-]`.
    #[error("invalid identifier namespace `{0}`")]
    InvalidNamespace(String),
    /// The path half contains a character outside `[a-z0-9_.\-/]`.
    #[error("invalid identifier path `{0}`")]
    InvalidPath(String),
}

const fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

const fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

impl Identifier {
    /// Create an identifier from an already-validated namespace and path.
    ///
    /// Validity is checked in debug builds only; parse untrusted input
    /// through [`FromStr`] instead.
    #[must_use]
    pub fn new(namespace: &str, path: &str) -> Self {
        debug_assert!(
            !namespace.is_empty() && namespace.chars().all(is_namespace_char),
            "invalid namespace `{namespace}`"
        );
        debug_assert!(
            !path.is_empty() && path.chars().all(is_path_char),
            "invalid path `{path}`"
        );
        Self {
            namespace: Arc::from(namespace),
            path: Arc::from(path),
        }
    }

    /// Create an identifier in the default (`minecraft`) namespace.
    #[must_use]
    pub fn vanilla(path: &str) -> Self {
        Self::new(DEFAULT_NAMESPACE, path)
    }

    /// The namespace half.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The path half.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, path) = match s.split_once(':') {
            Some((ns, path)) => (ns, path),
            None => (DEFAULT_NAMESPACE, s),
        };
        if namespace.is_empty() || !namespace.chars().all(is_namespace_char) {
            return Err(IdentifierError::InvalidNamespace(namespace.to_owned()));
        }
        if path.is_empty() || !path.chars().all(is_path_char) {
            return Err(IdentifierError::InvalidPath(path.to_owned()));
        }
        Ok(Self {
            namespace: Arc::from(namespace),
            path: Arc::from(path),
        })
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_and_without_namespace() {
        let explicit: Identifier = "terra:highlands".parse().expect("valid identifier");
        assert_eq!(explicit.namespace(), "terra");
        assert_eq!(explicit.path(), "highlands");

        let implicit: Identifier = "plains".parse().expect("valid identifier");
        assert_eq!(implicit, Identifier::vanilla("plains"));
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(matches!(
            "Bad:path".parse::<Identifier>(),
            Err(IdentifierError::InvalidNamespace(_))
        ));
        assert!(matches!(
            "ns:Bad Path".parse::<Identifier>(),
            Err(IdentifierError::InvalidPath(_))
        ));
        assert!("ns:".parse::<Identifier>().is_err());
        assert!(":path".parse::<Identifier>().is_err());
    }

    #[test]
    fn path_may_contain_slashes() {
        let id: Identifier = "pack:overlays/deep_forest".parse().expect("valid identifier");
        assert_eq!(id.path(), "overlays/deep_forest");
    }

    #[test]
    fn serde_round_trips_as_string() {
        let id = Identifier::new("terra", "badlands");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"terra:badlands\"");

        let back: Identifier = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn display_matches_parse_input() {
        let id: Identifier = "terra:slices/alpha".parse().expect("valid identifier");
        assert_eq!(id.to_string(), "terra:slices/alpha");
    }
}
