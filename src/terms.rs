//! Terms produced by parsing and consumed by building

use cv_model::{Named, Namespace, Term};
use serde::Serialize;
use std::fmt;

/// A name accepted by a virtual collection's expression.
///
/// Never persisted; it only records which collection accepted which text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VirtualTerm {
    pub collection: Namespace,
    pub name: String,
}

impl VirtualTerm {
    pub fn new(collection: Namespace, name: impl Into<String>) -> Self {
        Self {
            collection,
            name: name.into(),
        }
    }
}

/// Outcome of a collection slot: a vocabulary term or a virtual match
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchedTerm {
    Vocabulary(Term),
    Virtual(VirtualTerm),
}

impl MatchedTerm {
    pub fn collection_namespace(&self) -> Namespace {
        match self {
            MatchedTerm::Vocabulary(term) => term.collection_namespace(),
            MatchedTerm::Virtual(term) => term.collection.clone(),
        }
    }

    /// Canonical name of the owning collection
    pub fn collection_name(&self) -> &str {
        match self {
            MatchedTerm::Vocabulary(term) => term.collection_name(),
            MatchedTerm::Virtual(term) => term.collection.leaf(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MatchedTerm::Vocabulary(term) => term.name(),
            MatchedTerm::Virtual(term) => &term.name,
        }
    }

    /// Form emitted into built identifiers
    pub fn raw_name(&self) -> &str {
        match self {
            MatchedTerm::Vocabulary(term) => term.raw_name(),
            MatchedTerm::Virtual(term) => &term.name,
        }
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, MatchedTerm::Virtual(_))
    }

    pub fn as_term(&self) -> Option<&Term> {
        match self {
            MatchedTerm::Vocabulary(term) => Some(term),
            MatchedTerm::Virtual(_) => None,
        }
    }
}

impl From<Term> for MatchedTerm {
    fn from(term: Term) -> Self {
        MatchedTerm::Vocabulary(term)
    }
}

impl From<VirtualTerm> for MatchedTerm {
    fn from(term: VirtualTerm) -> Self {
        MatchedTerm::Virtual(term)
    }
}

impl fmt::Display for MatchedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchedTerm::Vocabulary(term) => write!(f, "{}", term.namespace()),
            MatchedTerm::Virtual(term) => write!(f, "{}:{} (virtual)", term.collection, term.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_term_accessors() {
        let collection = Namespace::parse("wcrp:cmip6:member-id").unwrap();
        let matched = MatchedTerm::from(VirtualTerm::new(collection.clone(), "r1i1p1f1"));

        assert!(matched.is_virtual());
        assert!(matched.as_term().is_none());
        assert_eq!(matched.collection_namespace(), collection);
        assert_eq!(matched.collection_name(), "member-id");
        assert_eq!(matched.raw_name(), "r1i1p1f1");
        assert_eq!(matched.to_string(), "wcrp:cmip6:member-id:r1i1p1f1 (virtual)");
    }

    #[test]
    fn test_vocabulary_term_accessors() {
        let collection = Namespace::parse("wcrp:cmip6:source-id").unwrap();
        let term = Term::new(&collection, "IPSL-CM6A-LR").unwrap();
        let matched = MatchedTerm::from(term);

        assert!(!matched.is_virtual());
        assert_eq!(matched.name(), "ipsl-cm6a-lr");
        assert_eq!(matched.raw_name(), "IPSL-CM6A-LR");
        assert_eq!(matched.collection_name(), "source-id");
    }

    #[test]
    fn test_serialized_with_kind_tag() {
        let collection = Namespace::parse("wcrp:cmip6:member-id").unwrap();
        let matched = MatchedTerm::from(VirtualTerm::new(collection, "r1i1p1f1"));
        let json = serde_json::to_value(&matched).unwrap();
        assert_eq!(json["kind"], "virtual");
        assert_eq!(json["collection"], "wcrp:cmip6:member-id");
        assert_eq!(json["name"], "r1i1p1f1");
    }
}
