//! Parsing configuration types
//!
//! [`RawParserConfig`] is the on-disk JSON document; [`ParsingConfig`] is the
//! validated, compiled form the parser and builder work from.

use cv_model::{to_canonical_name, IdentifierType, Namespace};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::template::{scan_template, SegmentKind, TemplateSegment};
use crate::error::ConfigError;
use crate::matcher::anchored;

fn default_true() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================================================
// Raw (serialized) configuration
// ============================================================================

/// Per-scope, per-identifier-type parser configuration document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawParserConfig {
    pub identifier_type: IdentifierType,
    /// Owning scope namespace (`authority:scope`)
    pub scope: String,
    /// Template the slot list was generated from
    pub template: String,
    #[serde(rename = "seperator", alias = "separator")]
    pub separator: String,
    /// Fixed filename extension, without the dot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub specs: Vec<RawSlotSpec>,
}

/// One slot of a raw configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawSlotSpec {
    /// Fixed literal
    #[serde(rename = "const")]
    Const {
        value: String,
        #[serde(default = "default_true")]
        is_required: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        is_optional: bool,
    },

    /// Membership of a (possibly virtual) collection
    Collection {
        namespace: String,
        #[serde(default = "default_true")]
        is_required: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        is_optional: bool,
    },

    /// Open-ended value constrained by an expression
    Regex {
        expression: String,
        #[serde(default = "default_true")]
        is_required: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        is_optional: bool,
    },
}

impl RawSlotSpec {
    fn flags(&self) -> (bool, bool) {
        match self {
            RawSlotSpec::Const {
                is_required,
                is_optional,
                ..
            }
            | RawSlotSpec::Collection {
                is_required,
                is_optional,
                ..
            }
            | RawSlotSpec::Regex {
                is_required,
                is_optional,
                ..
            } => (*is_required, *is_optional),
        }
    }
}

// ============================================================================
// Compiled configuration
// ============================================================================

/// A slot expression, compiled anchored at both ends
#[derive(Debug, Clone)]
pub struct SlotExpression {
    source: String,
    regex: Regex,
}

impl SlotExpression {
    pub fn new(source: impl Into<String>) -> Result<Self, ConfigError> {
        let source = source.into();
        let regex = Regex::new(&anchored(&source)).map_err(|e| ConfigError::InvalidExpression {
            expression: source.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { source, regex })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

impl PartialEq for SlotExpression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for SlotExpression {}

/// What a slot validates its element against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotKind {
    Constant(String),
    Regex(SlotExpression),
    Collection(Namespace),
}

/// A compiled slot specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSpec {
    pub kind: SlotKind,
    /// Canonical placeholder name from the template, if any
    pub placeholder: Option<String>,
    pub is_required: bool,
    /// Bracketed in the template, or flagged optional in the document
    pub is_optional: bool,
}

impl SlotSpec {
    /// Optional slots, and slots not marked required, may be left out
    pub fn is_omittable(&self) -> bool {
        self.is_optional || !self.is_required
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, SlotKind::Constant(_))
    }

    /// Name a caller supplies this slot's value under
    pub fn field_name(&self) -> Option<String> {
        match (&self.placeholder, &self.kind) {
            (Some(placeholder), _) => Some(placeholder.clone()),
            (None, SlotKind::Collection(namespace)) => Some(namespace.leaf().to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for SlotSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SlotKind::Constant(value) => write!(f, "const '{}'", value),
            SlotKind::Regex(expression) => write!(f, "regex '{}'", expression.source()),
            SlotKind::Collection(namespace) => write!(f, "collection '{}'", namespace),
        }?;
        if self.is_omittable() {
            write!(f, " (optional)")?;
        }
        Ok(())
    }
}

/// Validated parser configuration for one (scope, identifier type) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingConfig {
    identifier_type: IdentifierType,
    scope: Namespace,
    template: String,
    separator: char,
    suffix: Option<String>,
    slots: Vec<SlotSpec>,
}

impl ParsingConfig {
    /// Validate and compile a raw configuration.
    ///
    /// Fails when the template's element markers and the slot list disagree
    /// in number, when an expression does not compile, or when a filename
    /// suffix is not the final constant slot.
    pub fn from_raw(raw: &RawParserConfig) -> Result<Self, ConfigError> {
        let separator = single_char(&raw.separator)?;
        let scope = Namespace::parse(&raw.scope)?;
        if scope.depth() != 2 {
            return Err(ConfigError::Model(cv_model::ModelError::InvalidNamespace {
                namespace: raw.scope.clone(),
                reason: "parser configurations belong to a scope (authority:scope)".to_string(),
            }));
        }

        let scanned = scan_template(&raw.template, separator, raw.identifier_type)?;
        if scanned.marker_count() != raw.specs.len() {
            return Err(ConfigError::SlotCountMismatch {
                template: raw.template.clone(),
                markers: scanned.marker_count(),
                slots: raw.specs.len(),
            });
        }

        let suffix = raw.suffix.clone().or(scanned.suffix);
        if let Some(suffix) = &suffix {
            match raw.specs.last() {
                Some(RawSlotSpec::Const { value, .. }) if value == suffix => {}
                _ => {
                    return Err(ConfigError::SuffixMismatch {
                        suffix: suffix.clone(),
                    })
                }
            }
        }

        let slots = raw
            .specs
            .iter()
            .enumerate()
            .map(|(i, spec)| compile_slot(spec, scanned.segments.get(i)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            identifier_type: raw.identifier_type,
            scope,
            template: raw.template.clone(),
            separator,
            suffix,
            slots,
        })
    }

    pub fn identifier_type(&self) -> IdentifierType {
        self.identifier_type
    }

    pub fn scope(&self) -> &Namespace {
        &self.scope
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Every slot, including a trailing filename-extension slot
    pub fn slots(&self) -> &[SlotSpec] {
        &self.slots
    }

    /// Slots joined by the separator; excludes the extension slot
    pub fn body_slots(&self) -> &[SlotSpec] {
        match self.suffix {
            Some(_) => &self.slots[..self.slots.len().saturating_sub(1)],
            None => &self.slots,
        }
    }

    pub fn omittable_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_omittable()).count()
    }

    /// Collection namespaces referenced by the slot list
    pub fn collections(&self) -> impl Iterator<Item = &Namespace> {
        self.slots.iter().filter_map(|s| match &s.kind {
            SlotKind::Collection(namespace) => Some(namespace),
            _ => None,
        })
    }

    /// Serialize back into the document form
    pub fn to_raw(&self) -> RawParserConfig {
        RawParserConfig {
            identifier_type: self.identifier_type,
            scope: self.scope.to_string(),
            template: self.template.clone(),
            separator: self.separator.to_string(),
            suffix: self.suffix.clone(),
            specs: self
                .slots
                .iter()
                .map(|slot| match &slot.kind {
                    SlotKind::Constant(value) => RawSlotSpec::Const {
                        value: value.clone(),
                        is_required: slot.is_required,
                        is_optional: slot.is_optional,
                    },
                    SlotKind::Collection(namespace) => RawSlotSpec::Collection {
                        namespace: namespace.to_string(),
                        is_required: slot.is_required,
                        is_optional: slot.is_optional,
                    },
                    SlotKind::Regex(expression) => RawSlotSpec::Regex {
                        expression: expression.source().to_string(),
                        is_required: slot.is_required,
                        is_optional: slot.is_optional,
                    },
                })
                .collect(),
        }
    }
}

fn single_char(separator: &str) -> Result<char, ConfigError> {
    let mut chars = separator.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidSeparator(separator.to_string())),
    }
}

fn compile_slot(
    spec: &RawSlotSpec,
    segment: Option<&TemplateSegment>,
) -> Result<SlotSpec, ConfigError> {
    let (is_required, is_optional) = spec.flags();
    let kind = match spec {
        RawSlotSpec::Const { value, .. } => SlotKind::Constant(value.clone()),
        RawSlotSpec::Collection { namespace, .. } => {
            SlotKind::Collection(Namespace::parse(namespace)?)
        }
        RawSlotSpec::Regex { expression, .. } => SlotKind::Regex(SlotExpression::new(expression)?),
    };

    let placeholder = segment.and_then(|s| match &s.kind {
        SegmentKind::Placeholder(name) => Some(to_canonical_name(name)),
        SegmentKind::Literal(_) => None,
    });

    Ok(SlotSpec {
        kind,
        placeholder,
        is_required,
        is_optional: is_optional || segment.map(|s| s.optional).unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{
        "identifier_type": "dataset",
        "scope": "wcrp:cmip6",
        "template": "CMIP6.%(activity_id)s.%(member_id)s",
        "seperator": ".",
        "specs": [
            {"type": "const", "value": "CMIP6", "is_required": true},
            {"type": "collection", "namespace": "wcrp:cmip6:activity-id", "is_required": true},
            {"type": "regex", "expression": "r[0-9]+i[0-9]+p[0-9]+f[0-9]+"}
        ]
    }"#;

    fn raw(json: &str) -> RawParserConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_from_raw() {
        let config = ParsingConfig::from_raw(&raw(DATASET)).unwrap();
        assert_eq!(config.separator(), '.');
        assert_eq!(config.slots().len(), 3);
        assert_eq!(config.scope().to_string(), "wcrp:cmip6");
        assert_eq!(config.slots()[1].placeholder.as_deref(), Some("activity-id"));
        assert_eq!(config.slots()[0].placeholder, None);
        assert!(config.slots()[2].is_required);
        assert_eq!(config.omittable_count(), 0);
        assert_eq!(config.collections().count(), 1);
    }

    #[test]
    fn test_separator_alias_accepted() {
        let json = DATASET.replace("\"seperator\"", "\"separator\"");
        assert_eq!(raw(&json), raw(DATASET));
    }

    #[test]
    fn test_slot_count_mismatch_fails_at_load() {
        let json = DATASET.replace("CMIP6.%(activity_id)s.%(member_id)s", "CMIP6.%(activity_id)s");
        let err = ParsingConfig::from_raw(&raw(&json)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::SlotCountMismatch {
                markers: 2,
                slots: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_expression_fails_at_load() {
        let json = DATASET.replace("r[0-9]+i", "r[0-9+i");
        let err = ParsingConfig::from_raw(&raw(&json)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidExpression { .. }));
    }

    #[test]
    fn test_invalid_separator() {
        let json = DATASET.replace("\"seperator\": \".\"", "\"seperator\": \"..\"");
        let err = ParsingConfig::from_raw(&raw(&json)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSeparator(_)));
    }

    #[test]
    fn test_filename_suffix_and_optional_slot() {
        let json = r#"{
            "identifier_type": "filename",
            "scope": "wcrp:cmip5",
            "template": "%(variable)s_%(ensemble)s[_%(time_range)s].nc",
            "seperator": "_",
            "specs": [
                {"type": "collection", "namespace": "wcrp:cmip5:variable"},
                {"type": "collection", "namespace": "wcrp:cmip5:ensemble"},
                {"type": "regex", "expression": "^[0-9]*-[0-9]*$", "is_required": false},
                {"type": "const", "value": "nc"}
            ]
        }"#;
        let config = ParsingConfig::from_raw(&raw(json)).unwrap();
        assert_eq!(config.suffix(), Some("nc"));
        assert_eq!(config.body_slots().len(), 3);
        assert!(config.slots()[2].is_optional);
        assert!(config.slots()[2].is_omittable());
        assert_eq!(config.omittable_count(), 1);
    }

    #[test]
    fn test_suffix_must_be_final_constant() {
        let json = r#"{
            "identifier_type": "filename",
            "scope": "wcrp:cmip5",
            "template": "%(variable)s_%(ensemble)s.nc",
            "seperator": "_",
            "specs": [
                {"type": "collection", "namespace": "wcrp:cmip5:variable"},
                {"type": "collection", "namespace": "wcrp:cmip5:ensemble"},
                {"type": "const", "value": "nc4"}
            ]
        }"#;
        let err = ParsingConfig::from_raw(&raw(json)).unwrap_err();
        assert!(matches!(err, ConfigError::SuffixMismatch { .. }));
    }

    #[test]
    fn test_to_raw_round_trip() {
        let config = ParsingConfig::from_raw(&raw(DATASET)).unwrap();
        let again = ParsingConfig::from_raw(&config.to_raw()).unwrap();
        assert_eq!(config, again);
    }
}
