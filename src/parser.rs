//! Identifier parser
//!
//! Splits an identifier on the configured separator, checks the element
//! count against the slot list, then validates each element in slot order.
//! The first failing element aborts the parse.

use cv_model::{Strictness, VocabularyLookup};
use std::collections::BTreeSet;
use tracing::debug;

use crate::config::{ParsingConfig, SlotKind, SlotSpec};
use crate::error::IdentifierError;
use crate::matcher::{MatchOutcome, Matcher};
use crate::terms::{MatchedTerm, VirtualTerm};

/// Marks a data-version stamp appended to the final element
pub const VERSION_MARKER: char = '#';

/// Parses identifiers against one compiled configuration
pub struct IdentifierParser<'a, V: ?Sized> {
    config: &'a ParsingConfig,
    vocabulary: &'a V,
    matcher: &'a Matcher,
}

impl<'a, V: VocabularyLookup + ?Sized> IdentifierParser<'a, V> {
    pub fn new(config: &'a ParsingConfig, vocabulary: &'a V, matcher: &'a Matcher) -> Self {
        Self {
            config,
            vocabulary,
            matcher,
        }
    }

    /// Validate `identifier` and return the terms bound to its collection slots
    pub fn parse(
        &self,
        identifier: &str,
        strictness: Strictness,
    ) -> Result<BTreeSet<MatchedTerm>, IdentifierError> {
        let elements = self.split(identifier);
        let slots = self.active_slots(identifier, elements.len())?;

        let mut matched = BTreeSet::new();
        for (position, (element, slot)) in elements.iter().zip(slots).enumerate() {
            if let Some(term) = self.check_element(identifier, position + 1, element, slot, strictness)? {
                matched.insert(term);
            }
        }

        debug!(
            "Parsed {} identifier '{}' for scope '{}': {} terms",
            self.config.identifier_type(),
            identifier,
            self.config.scope(),
            matched.len()
        );
        Ok(matched)
    }

    /// Validity check only
    pub fn validate(&self, identifier: &str, strictness: Strictness) -> Result<(), IdentifierError> {
        self.parse(identifier, strictness).map(|_| ())
    }

    /// Split into elements, dropping any version stamp and separating the
    /// filename extension into its own terminal element
    fn split(&self, identifier: &str) -> Vec<String> {
        let mut elements: Vec<String> = identifier
            .split(self.config.separator())
            .map(str::to_string)
            .collect();

        if let Some(last) = elements.last_mut() {
            if let Some(pos) = last.find(VERSION_MARKER) {
                last.truncate(pos);
            }
        }

        if self.config.suffix().is_some() {
            if let Some(last) = elements.pop() {
                match last.rsplit_once('.') {
                    Some((stem, extension)) => {
                        elements.push(stem.to_string());
                        elements.push(extension.to_string());
                    }
                    None => elements.push(last),
                }
            }
        }

        elements
    }

    /// Slots the elements line up with: all of them, or only the
    /// non-omittable ones when every omittable slot was left out
    fn active_slots(
        &self,
        identifier: &str,
        actual: usize,
    ) -> Result<Vec<&'a SlotSpec>, IdentifierError> {
        let slots = self.config.slots();
        let omittable = self.config.omittable_count();

        if actual == slots.len() {
            return Ok(slots.iter().collect());
        }
        if omittable > 0 && actual == slots.len() - omittable {
            return Ok(slots.iter().filter(|s| !s.is_omittable()).collect());
        }

        let expected = if omittable > 0 {
            format!("{} or {}", slots.len() - omittable, slots.len())
        } else {
            slots.len().to_string()
        };
        Err(IdentifierError::StructuralMismatch {
            scope: self.config.scope().to_string(),
            identifier_type: self.config.identifier_type(),
            identifier: identifier.to_string(),
            expected,
            actual,
        })
    }

    fn check_element(
        &self,
        identifier: &str,
        index: usize,
        element: &str,
        slot: &SlotSpec,
        strictness: Strictness,
    ) -> Result<Option<MatchedTerm>, IdentifierError> {
        let scope = || self.config.scope().to_string();

        match &slot.kind {
            SlotKind::Constant(value) => {
                if element != value.as_str() {
                    return Err(IdentifierError::ConstantMismatch {
                        scope: scope(),
                        identifier_type: self.config.identifier_type(),
                        identifier: identifier.to_string(),
                        index,
                        element: element.to_string(),
                        expected: value.clone(),
                    });
                }
                Ok(None)
            }

            SlotKind::Regex(expression) => {
                let candidate = if strictness.folds_case() {
                    element.to_lowercase()
                } else {
                    element.to_string()
                };
                if !expression.is_match(&candidate) {
                    return Err(IdentifierError::RegexMismatch {
                        scope: scope(),
                        identifier_type: self.config.identifier_type(),
                        identifier: identifier.to_string(),
                        index,
                        element: element.to_string(),
                        expression: expression.source().to_string(),
                    });
                }
                Ok(None)
            }

            SlotKind::Collection(namespace) => {
                let collection = self
                    .vocabulary
                    .collection(&namespace.to_string())
                    .ok_or_else(|| IdentifierError::CollectionNotFound {
                        scope: scope(),
                        collection: namespace.to_string(),
                    })?;

                match self.matcher.is_matched(collection, element, strictness) {
                    MatchOutcome::Matched(term) => Ok(Some(MatchedTerm::Vocabulary(term.clone()))),
                    MatchOutcome::MatchedVirtual(name) => Ok(Some(MatchedTerm::Virtual(
                        VirtualTerm::new(collection.namespace().clone(), name),
                    ))),
                    MatchOutcome::NotMatched => Err(IdentifierError::VocabularyMismatch {
                        scope: scope(),
                        identifier_type: self.config.identifier_type(),
                        identifier: identifier.to_string(),
                        index,
                        element: element.to_string(),
                        collection: namespace.to_string(),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Archive;
    use crate::config::RawParserConfig;
    use cv_model::Authority;
    use serde_json::json;

    fn archive() -> Archive {
        let mut authority = Authority::new("wcrp").unwrap();
        let mut scope = authority.new_scope("cmip6").unwrap();

        let mut activity = scope.new_collection("activity_id").unwrap();
        for name in ["CMIP", "FAFMIP"] {
            let term = activity.new_term(name).unwrap();
            activity.insert_term(term).unwrap();
        }
        let mut source = scope.new_collection("source_id").unwrap();
        let term = source
            .new_term("IPSL-CM6A-LR")
            .unwrap()
            .with_alternative_names(["ipsl-lr"]);
        source.insert_term(term).unwrap();
        let member = scope
            .new_collection("member_id")
            .unwrap()
            .with_term_regex("r[0-9]+i[0-9]+p[0-9]+f[0-9]+");

        scope.insert_collection(activity).unwrap();
        scope.insert_collection(source).unwrap();
        scope.insert_collection(member).unwrap();
        authority.insert_scope(scope).unwrap();

        let mut archive = Archive::new();
        archive.insert_authority(authority).unwrap();
        archive
    }

    fn config(value: serde_json::Value) -> ParsingConfig {
        let raw: RawParserConfig = serde_json::from_value(value).unwrap();
        ParsingConfig::from_raw(&raw).unwrap()
    }

    fn dataset() -> ParsingConfig {
        config(json!({
            "identifier_type": "dataset",
            "scope": "wcrp:cmip6",
            "template": "CMIP6.%(activity_id)s.%(source_id)s.%(member_id)s.%(version)s",
            "seperator": ".",
            "specs": [
                {"type": "const", "value": "CMIP6"},
                {"type": "collection", "namespace": "wcrp:cmip6:activity-id"},
                {"type": "collection", "namespace": "wcrp:cmip6:source-id"},
                {"type": "collection", "namespace": "wcrp:cmip6:member-id"},
                {"type": "regex", "expression": "v[0-9]{8}"}
            ]
        }))
    }

    #[test]
    fn test_parse_returns_collection_terms() {
        let archive = archive();
        let config = dataset();
        let matcher = Matcher::new();
        let parser = IdentifierParser::new(&config, &archive, &matcher);

        let terms = parser
            .parse("CMIP6.FAFMIP.IPSL-CM6A-LR.r1i1p1f1.v20190101", Strictness::default())
            .unwrap();

        let names: Vec<&str> = terms.iter().map(MatchedTerm::raw_name).collect();
        assert_eq!(terms.len(), 3);
        assert!(names.contains(&"FAFMIP"));
        assert!(names.contains(&"IPSL-CM6A-LR"));
        assert!(names.contains(&"r1i1p1f1"));
        assert_eq!(terms.iter().filter(|t| t.is_virtual()).count(), 1);
    }

    #[test]
    fn test_version_marker_stripped() {
        let archive = archive();
        let config = dataset();
        let matcher = Matcher::new();
        let parser = IdentifierParser::new(&config, &archive, &matcher);

        parser
            .validate("CMIP6.CMIP.IPSL-CM6A-LR.r1i1p1f1.v20190101#3", Strictness::default())
            .unwrap();
    }

    #[test]
    fn test_structural_mismatch_before_values() {
        let archive = archive();
        let config = dataset();
        let matcher = Matcher::new();
        let parser = IdentifierParser::new(&config, &archive, &matcher);

        let err = parser
            .parse("cmip6.NOPE.IPSL-CM6A-LR.r1i1p1f1", Strictness::default())
            .unwrap_err();
        assert!(err.is_structural());
        assert!(matches!(
            err,
            IdentifierError::StructuralMismatch { ref expected, actual: 4, .. } if expected == "5"
        ));
    }

    #[test]
    fn test_vocabulary_mismatch_reports_position() {
        let archive = archive();
        let config = dataset();
        let matcher = Matcher::new();
        let parser = IdentifierParser::new(&config, &archive, &matcher);

        let err = parser
            .parse("CMIP6.CMIP.ipsl-lr.r1i1p1f1.v20190101", Strictness::default())
            .unwrap_err();
        assert_eq!(err.element_index(), Some(3));
        assert_eq!(err.element(), Some("ipsl-lr"));

        let terms = parser
            .parse("CMIP6.CMIP.ipsl-lr.r1i1p1f1.v20190101", Strictness::AnyName)
            .unwrap();
        assert!(terms.iter().any(|t| t.name() == "ipsl-cm6a-lr"));
    }

    #[test]
    fn test_regex_slot_folds_case_only_at_level_four() {
        let archive = archive();
        let config = dataset();
        let matcher = Matcher::new();
        let parser = IdentifierParser::new(&config, &archive, &matcher);

        let err = parser
            .parse("CMIP6.CMIP.IPSL-CM6A-LR.r1i1p1f1.V20190101", Strictness::AnyName)
            .unwrap_err();
        assert!(matches!(err, IdentifierError::RegexMismatch { index: 5, .. }));

        parser
            .validate(
                "CMIP6.CMIP.IPSL-CM6A-LR.r1i1p1f1.V20190101",
                Strictness::CaseInsensitive,
            )
            .unwrap();
    }

    #[test]
    fn test_missing_collection() {
        let archive = archive();
        let config = config(json!({
            "identifier_type": "dataset",
            "scope": "wcrp:cmip6",
            "template": "CMIP6.%(realm)s",
            "seperator": ".",
            "specs": [
                {"type": "const", "value": "CMIP6"},
                {"type": "collection", "namespace": "wcrp:cmip6:realm"}
            ]
        }));
        let matcher = Matcher::new();
        let parser = IdentifierParser::new(&config, &archive, &matcher);

        let err = parser.parse("CMIP6.atmos", Strictness::default()).unwrap_err();
        assert!(
            matches!(err, IdentifierError::CollectionNotFound { collection, .. } if collection == "wcrp:cmip6:realm")
        );
    }

    #[test]
    fn test_filename_optional_slot_and_extension() {
        let archive = archive();
        let config = config(json!({
            "identifier_type": "filename",
            "scope": "wcrp:cmip6",
            "template": "%(source_id)s_%(member_id)s[_%(time_range)s].nc",
            "seperator": "_",
            "specs": [
                {"type": "collection", "namespace": "wcrp:cmip6:source-id"},
                {"type": "collection", "namespace": "wcrp:cmip6:member-id"},
                {"type": "regex", "expression": "^[0-9]*-[0-9]*$", "is_required": false, "is_optional": true},
                {"type": "const", "value": "nc"}
            ]
        }));
        let matcher = Matcher::new();
        let parser = IdentifierParser::new(&config, &archive, &matcher);

        parser
            .validate("IPSL-CM6A-LR_r1i1p1f1_185001-198912.nc", Strictness::default())
            .unwrap();
        parser
            .validate("IPSL-CM6A-LR_r1i1p1f1.nc", Strictness::default())
            .unwrap();

        let err = parser
            .parse("IPSL-CM6A-LR_r1i1p1f1_185001-198912.nc4", Strictness::default())
            .unwrap_err();
        assert!(matches!(err, IdentifierError::ConstantMismatch { index: 4, .. }));

        let err = parser
            .parse("IPSL-CM6A-LR.nc", Strictness::default())
            .unwrap_err();
        assert!(matches!(
            err,
            IdentifierError::StructuralMismatch { ref expected, actual: 2, .. } if expected == "3 or 4"
        ));
    }
}
