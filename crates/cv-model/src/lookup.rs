//! Namespace resolution seam
//!
//! Parsing code never walks the hierarchy itself; it resolves namespaces
//! through a [`VocabularyLookup`] implementation.

use crate::namespace::Namespace;
use crate::node::{Authority, Collection, Scope, Term};

/// A borrowed reference to any node in the hierarchy
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Authority(&'a Authority),
    Scope(&'a Scope),
    Collection(&'a Collection),
    Term(&'a Term),
}

impl<'a> Node<'a> {
    pub fn namespace(&self) -> &'a Namespace {
        match self {
            Node::Authority(a) => a.namespace(),
            Node::Scope(s) => s.namespace(),
            Node::Collection(c) => c.namespace(),
            Node::Term(t) => t.namespace(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Authority(_) => "authority",
            Node::Scope(_) => "scope",
            Node::Collection(_) => "collection",
            Node::Term(_) => "term",
        }
    }
}

/// Resolves colon-delimited namespaces to vocabulary nodes.
///
/// Each segment may match a node's canonical, raw or alternative name; a
/// case-insensitive comparison is the fallback when no exact match exists.
pub trait VocabularyLookup {
    fn load(&self, namespace: &str) -> Option<Node<'_>>;

    fn load_namespace(&self, namespace: &Namespace) -> Option<Node<'_>> {
        self.load(&namespace.to_string())
    }

    fn authority(&self, namespace: &str) -> Option<&Authority> {
        match self.load(namespace)? {
            Node::Authority(a) => Some(a),
            _ => None,
        }
    }

    fn scope(&self, namespace: &str) -> Option<&Scope> {
        match self.load(namespace)? {
            Node::Scope(s) => Some(s),
            _ => None,
        }
    }

    fn collection(&self, namespace: &str) -> Option<&Collection> {
        match self.load(namespace)? {
            Node::Collection(c) => Some(c),
            _ => None,
        }
    }

    fn term(&self, namespace: &str) -> Option<&Term> {
        match self.load(namespace)? {
            Node::Term(t) => Some(t),
            _ => None,
        }
    }
}

impl<T: VocabularyLookup + ?Sized> VocabularyLookup for &T {
    fn load(&self, namespace: &str) -> Option<Node<'_>> {
        (**self).load(namespace)
    }
}

impl<T: VocabularyLookup + ?Sized> VocabularyLookup for std::sync::Arc<T> {
    fn load(&self, namespace: &str) -> Option<Node<'_>> {
        (**self).load(namespace)
    }
}
