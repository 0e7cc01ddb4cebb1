//! Colon-delimited vocabulary namespaces
//!
//! A namespace addresses one node in the hierarchy:
//!
//! ```text
//! wcrp                              authority
//! wcrp:cmip6                        scope
//! wcrp:cmip6:activity-id            collection
//! wcrp:cmip6:activity-id:fafmip     term
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::names::canonical_segment;

/// Namespace delimiter
pub const DELIMITER: char = ':';

/// Maximum depth: authority, scope, collection, term
pub const MAX_DEPTH: usize = 4;

/// A parsed namespace; segments are always canonical names
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    /// Parse a namespace, canonicalising every segment
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidNamespace {
                namespace: input.to_string(),
                reason: "namespace is empty".to_string(),
            });
        }

        let mut segments = Vec::new();
        for part in trimmed.split(DELIMITER) {
            let segment = canonical_segment(part).map_err(|_| ModelError::InvalidNamespace {
                namespace: input.to_string(),
                reason: format!("segment '{}' is empty or invalid", part),
            })?;
            segments.push(segment);
        }

        if segments.len() > MAX_DEPTH {
            return Err(ModelError::InvalidNamespace {
                namespace: input.to_string(),
                reason: format!("{} segments, at most {} allowed", segments.len(), MAX_DEPTH),
            });
        }

        Ok(Self { segments })
    }

    /// Namespace of an authority
    pub fn authority(name: &str) -> Result<Self, ModelError> {
        Ok(Self {
            segments: vec![canonical_segment(name)?],
        })
    }

    /// Append a child segment (e.g. scope under an authority)
    pub fn child(&self, name: &str) -> Result<Self, ModelError> {
        if self.segments.len() >= MAX_DEPTH {
            return Err(ModelError::InvalidNamespace {
                namespace: format!("{}{}{}", self, DELIMITER, name),
                reason: "term namespaces cannot have children".to_string(),
            });
        }
        let mut segments = self.segments.clone();
        segments.push(canonical_segment(name)?);
        Ok(Self { segments })
    }

    /// Parent namespace, `None` for an authority
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Number of segments (1 = authority ... 4 = term)
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment: the name of the addressed node
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn authority_name(&self) -> &str {
        &self.segments[0]
    }

    pub fn scope_name(&self) -> Option<&str> {
        self.segments.get(1).map(String::as_str)
    }

    pub fn collection_name(&self) -> Option<&str> {
        self.segments.get(2).map(String::as_str)
    }

    pub fn term_name(&self) -> Option<&str> {
        self.segments.get(3).map(String::as_str)
    }

    /// Whether `self` is `other` or one of its descendants
    pub fn starts_with(&self, other: &Namespace) -> bool {
        self.segments.len() >= other.segments.len()
            && self.segments[..other.segments.len()] == other.segments[..]
    }

    /// Strip an ancestor prefix, returning the remaining relative path
    pub fn strip_prefix(&self, prefix: &Namespace) -> Option<String> {
        if !self.starts_with(prefix) {
            return None;
        }
        Some(self.segments[prefix.segments.len()..].join(":"))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(":"))
    }
}

impl FromStr for Namespace {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Namespace {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Namespace> for String {
    fn from(value: Namespace) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_accessors() {
        let ns = Namespace::parse("WCRP:CMIP6:activity_id:FAFMIP").unwrap();
        assert_eq!(ns.to_string(), "wcrp:cmip6:activity-id:fafmip");
        assert_eq!(ns.depth(), 4);
        assert_eq!(ns.authority_name(), "wcrp");
        assert_eq!(ns.scope_name(), Some("cmip6"));
        assert_eq!(ns.collection_name(), Some("activity-id"));
        assert_eq!(ns.term_name(), Some("fafmip"));
        assert_eq!(ns.leaf(), "fafmip");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Namespace::parse("").is_err());
        assert!(Namespace::parse("wcrp::activity-id").is_err());
        assert!(Namespace::parse("a:b:c:d:e").is_err());
    }

    #[test]
    fn test_parent_child_and_prefix() {
        let scope = Namespace::parse("wcrp:cmip6").unwrap();
        let collection = scope.child("source_id").unwrap();
        assert_eq!(collection.to_string(), "wcrp:cmip6:source-id");
        assert_eq!(collection.parent(), Some(scope.clone()));
        assert!(collection.starts_with(&scope));
        assert_eq!(collection.strip_prefix(&scope).as_deref(), Some("source-id"));
        assert_eq!(Namespace::authority("wcrp").unwrap().parent(), None);

        let term = collection.child("ipsl-cm6a-lr").unwrap();
        assert!(term.child("anything").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let ns: Namespace = serde_json::from_str("\"wcrp:cmip6\"").unwrap();
        assert_eq!(ns, Namespace::parse("wcrp:cmip6").unwrap());
        assert_eq!(serde_json::to_string(&ns).unwrap(), "\"wcrp:cmip6\"");
    }
}
