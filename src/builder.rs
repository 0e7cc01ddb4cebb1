//! Identifier builder
//!
//! Reconstructs an identifier from a set of terms and free-form values for
//! expression slots. The result re-parses against the same configuration at
//! the default strictness.

use cv_model::{to_canonical_name, Named, Namespace, VocabularyLookup};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::{ParsingConfig, SlotKind, SlotSpec};
use crate::error::IdentifierError;
use crate::parser::VERSION_MARKER;
use crate::terms::MatchedTerm;

/// Builds identifiers from one compiled configuration
pub struct IdentifierBuilder<'a, V: ?Sized> {
    config: &'a ParsingConfig,
    vocabulary: &'a V,
}

impl<'a, V: VocabularyLookup + ?Sized> IdentifierBuilder<'a, V> {
    pub fn new(config: &'a ParsingConfig, vocabulary: &'a V) -> Self {
        Self { config, vocabulary }
    }

    /// Build an identifier.
    ///
    /// `regex_values` supplies expression slots, keyed by placeholder name.
    /// Omittable slots are emitted together when every one of them has a
    /// value, and all left out otherwise. An emitted element may not contain
    /// the separator, and the final one may not contain the version marker.
    pub fn build<'t, I>(
        &self,
        terms: I,
        regex_values: &BTreeMap<String, String>,
    ) -> Result<String, IdentifierError>
    where
        I: IntoIterator<Item = &'t MatchedTerm>,
    {
        let terms: Vec<&MatchedTerm> = terms.into_iter().collect();
        let values: BTreeMap<String, &str> = regex_values
            .iter()
            .map(|(key, value)| (to_canonical_name(key), value.as_str()))
            .collect();

        let known = self.known_names(&terms, &values);
        self.check_complete(&known)?;

        let include_omittable = self
            .config
            .body_slots()
            .iter()
            .filter(|slot| slot.is_omittable() && !slot.is_constant())
            .all(|slot| self.has_value(slot, &terms, &values));

        let separator = self.config.separator();
        let mut parts: Vec<&str> = Vec::new();
        for slot in self.config.body_slots() {
            if slot.is_omittable() && !include_omittable {
                continue;
            }
            let index = parts.len() + 1;
            let part = self.emit(slot, index, &terms, &values)?;
            if part.contains(separator) {
                return Err(self.reserved(index, part, separator));
            }
            parts.push(part);
        }
        if let Some(last) = parts.last() {
            if last.contains(VERSION_MARKER) {
                return Err(self.reserved(parts.len(), last, VERSION_MARKER));
            }
        }

        let mut identifier = parts.join(&separator.to_string());
        if let Some(suffix) = self.config.suffix() {
            identifier.push('.');
            identifier.push_str(suffix);
        }

        debug!(
            "Built {} identifier '{}' for scope '{}'",
            self.config.identifier_type(),
            identifier,
            self.config.scope()
        );
        Ok(identifier)
    }

    /// Names of the supplied terms' collections plus the supplied value keys
    fn known_names(&self, terms: &[&MatchedTerm], values: &BTreeMap<String, &str>) -> BTreeSet<String> {
        let mut known: BTreeSet<String> = values.keys().cloned().collect();
        for term in terms {
            let namespace = term.collection_namespace();
            match self.vocabulary.collection(&namespace.to_string()) {
                Some(collection) => known.extend(collection.canonical_names()),
                None => {
                    known.insert(namespace.leaf().to_string());
                }
            }
        }
        known
    }

    /// Every required, non-constant slot must be named by a term or a value
    fn check_complete(&self, known: &BTreeSet<String>) -> Result<(), IdentifierError> {
        for slot in self.config.body_slots() {
            if slot.is_constant() || slot.is_omittable() {
                continue;
            }
            let by_placeholder = slot
                .placeholder
                .as_ref()
                .is_some_and(|p| known.contains(p));
            let by_collection = match &slot.kind {
                SlotKind::Collection(namespace) => known.contains(namespace.leaf()),
                _ => false,
            };
            if !by_placeholder && !by_collection {
                return Err(self.incomplete(slot));
            }
        }
        Ok(())
    }

    fn has_value(&self, slot: &SlotSpec, terms: &[&MatchedTerm], values: &BTreeMap<String, &str>) -> bool {
        match &slot.kind {
            SlotKind::Constant(_) => true,
            SlotKind::Collection(namespace) => self.find_term(namespace, terms).is_some(),
            SlotKind::Regex(_) => slot
                .placeholder
                .as_ref()
                .is_some_and(|p| values.contains_key(p)),
        }
    }

    fn emit<'v>(
        &self,
        slot: &'v SlotSpec,
        index: usize,
        terms: &[&'v MatchedTerm],
        values: &BTreeMap<String, &'v str>,
    ) -> Result<&'v str, IdentifierError> {
        match &slot.kind {
            SlotKind::Constant(value) => Ok(value.as_str()),

            SlotKind::Collection(namespace) => self
                .find_term(namespace, terms)
                .map(|term| term.raw_name())
                .ok_or_else(|| IdentifierError::BuilderCollectionLookup {
                    scope: self.config.scope().to_string(),
                    identifier_type: self.config.identifier_type(),
                    collection: namespace.to_string(),
                }),

            SlotKind::Regex(expression) => {
                let value = slot
                    .placeholder
                    .as_ref()
                    .and_then(|p| values.get(p).copied())
                    .ok_or_else(|| self.incomplete(slot))?;
                if !expression.is_match(value) {
                    return Err(IdentifierError::RegexMismatch {
                        scope: self.config.scope().to_string(),
                        identifier_type: self.config.identifier_type(),
                        identifier: self.config.template().to_string(),
                        index,
                        element: value.to_string(),
                        expression: expression.source().to_string(),
                    });
                }
                Ok(value)
            }
        }
    }

    /// Term owned by `collection`, by namespace and then by the collection
    /// path relative to the scope
    fn find_term<'t>(&self, collection: &Namespace, terms: &[&'t MatchedTerm]) -> Option<&'t MatchedTerm> {
        if let Some(term) = terms.iter().find(|t| t.collection_namespace() == *collection) {
            return Some(*term);
        }
        let relative = collection
            .strip_prefix(self.config.scope())
            .unwrap_or_else(|| collection.leaf().to_string());
        terms
            .iter()
            .find(|t| t.collection_name() == relative)
            .copied()
    }

    fn reserved(&self, index: usize, element: &str, reserved: char) -> IdentifierError {
        IdentifierError::BuilderReservedCharacter {
            scope: self.config.scope().to_string(),
            identifier_type: self.config.identifier_type(),
            index,
            element: element.to_string(),
            reserved,
        }
    }

    fn incomplete(&self, slot: &SlotSpec) -> IdentifierError {
        IdentifierError::BuilderIncomplete {
            scope: self.config.scope().to_string(),
            identifier_type: self.config.identifier_type(),
            field: slot.field_name().unwrap_or_else(|| slot.to_string()),
        }
    }
}
