//! Matching primitive: does a collection accept a candidate name?
//!
//! Concrete collections are scanned in canonical-name order and the first
//! matching term wins. Virtual collections test the candidate against their
//! `term_regex`, anchored at both ends; a successful virtual match yields a
//! synthetic name, never a persisted term.

use cv_model::{Collection, Named, Strictness, Term};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Result of matching a candidate against a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    /// A vocabulary term of a concrete collection matched
    Matched(&'a Term),
    /// The candidate satisfied a virtual collection's expression
    MatchedVirtual(String),
    NotMatched,
}

impl MatchOutcome<'_> {
    pub fn is_match(&self) -> bool {
        !matches!(self, MatchOutcome::NotMatched)
    }
}

/// Whether `term` matches `candidate` at the given strictness
pub fn term_matches(term: &Term, candidate: &str, strictness: Strictness) -> bool {
    match strictness {
        Strictness::Canonical => term.name() == candidate,
        Strictness::Raw => term.raw_name() == candidate,
        Strictness::CanonicalOrRaw => term.name() == candidate || term.raw_name() == candidate,
        Strictness::AnyName => term.is_named(candidate),
        Strictness::CaseInsensitive => {
            let candidate = candidate.to_lowercase();
            term.name().to_lowercase() == candidate
                || term.raw_name().to_lowercase() == candidate
                || term
                    .alternative_names()
                    .iter()
                    .any(|n| n.to_lowercase() == candidate)
        }
    }
}

/// Anchor an expression so it must match the whole candidate
pub fn anchored(expression: &str) -> String {
    format!("^(?:{})$", expression)
}

/// Matches candidates against collections, caching compiled virtual
/// collection expressions.
#[derive(Debug, Default)]
pub struct Matcher {
    expressions: RwLock<HashMap<String, Regex>>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_matched<'a>(
        &self,
        collection: &'a Collection,
        candidate: &str,
        strictness: Strictness,
    ) -> MatchOutcome<'a> {
        if collection.is_virtual() {
            return self.match_virtual(collection, candidate, strictness);
        }

        collection
            .terms()
            .iter()
            .find(|term| term_matches(term, candidate, strictness))
            .map(MatchOutcome::Matched)
            .unwrap_or(MatchOutcome::NotMatched)
    }

    fn match_virtual<'a>(
        &self,
        collection: &'a Collection,
        candidate: &str,
        strictness: Strictness,
    ) -> MatchOutcome<'a> {
        let Some(expression) = collection.term_regex() else {
            return MatchOutcome::NotMatched;
        };

        let tested = if strictness.folds_case() {
            candidate.to_lowercase()
        } else {
            candidate.to_string()
        };

        match self.test(expression, &tested) {
            Some(true) => MatchOutcome::MatchedVirtual(candidate.to_string()),
            _ => MatchOutcome::NotMatched,
        }
    }

    /// `None` when the expression does not compile
    fn test(&self, expression: &str, candidate: &str) -> Option<bool> {
        if let Some(regex) = self
            .expressions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(expression)
        {
            return Some(regex.is_match(candidate));
        }

        let regex = Regex::new(&anchored(expression)).ok()?;
        let matched = regex.is_match(candidate);
        self.expressions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(expression.to_string(), regex);
        Some(matched)
    }
}

/// One-off match without a shared expression cache
pub fn is_matched<'a>(
    collection: &'a Collection,
    candidate: &str,
    strictness: Strictness,
) -> MatchOutcome<'a> {
    Matcher::new().is_matched(collection, candidate, strictness)
}
