//! Configuration generation from scope templates
//!
//! Scopes carry their legacy identifier templates in auxiliary data:
//!
//! ```json
//! "data": {
//!   "parsers": {
//!     "filename": {
//!       "template": "%(variable)s_%(cmor_table)s_%(model)s_%(experiment)s_%(ensemble)s[_%(period_start)s-%(period_end)s].nc",
//!       "seperator": "_",
//!       "collections": {"cmor_table": "wcrp:cmip5:mip-table"},
//!       "expressions": {}
//!     }
//!   }
//! }
//! ```
//!
//! [`TemplateCompiler`] turns one of these into a [`RawParserConfig`]. The
//! `period_start`/`period_end` pair is collapsed into one `time_range`
//! expression slot here and nowhere else.

use cv_model::{to_canonical_name, IdentifierType, Scope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::template::{scan_template, SegmentKind};
use super::types::{RawParserConfig, RawSlotSpec};
use crate::error::ConfigError;

/// Scope data key holding templates, keyed by identifier type
pub const PARSERS_DATA_KEY: &str = "parsers";

/// Adjacent period placeholders collapsed into one time-range slot
pub const PERIOD_PAIR: &str = "%(period_start)s-%(period_end)s";

pub const TIME_RANGE_PLACEHOLDER: &str = "time_range";

pub const TIME_RANGE_EXPRESSION: &str = "^[0-9]*-[0-9]*$";

/// Legacy template entry stored in scope data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeParserTemplate {
    pub template: String,
    #[serde(rename = "seperator", alias = "separator")]
    pub separator: String,
    /// Placeholder → collection namespace overrides
    #[serde(default)]
    pub collections: BTreeMap<String, String>,
    /// Placeholder → expression bindings for open-ended fields
    #[serde(default)]
    pub expressions: BTreeMap<String, String>,
}

impl ScopeParserTemplate {
    /// Read the template a scope declares for an identifier type
    pub fn from_scope(
        scope: &Scope,
        identifier_type: IdentifierType,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(entry) = scope
            .get_data(PARSERS_DATA_KEY)
            .and_then(|parsers| parsers.get(identifier_type.as_str()))
        else {
            return Ok(None);
        };

        serde_json::from_value(entry.clone())
            .map(Some)
            .map_err(|source| ConfigError::Json {
                origin: format!(
                    "{} template of scope '{}'",
                    identifier_type,
                    scope.namespace()
                ),
                source,
            })
    }
}

/// Compiles legacy scope templates into parser configuration documents
pub struct TemplateCompiler;

impl TemplateCompiler {
    /// Compile the scope's template for `identifier_type`, if it has one
    pub fn compile_scope(
        scope: &Scope,
        identifier_type: IdentifierType,
    ) -> Result<Option<RawParserConfig>, ConfigError> {
        match ScopeParserTemplate::from_scope(scope, identifier_type)? {
            Some(template) => Self::compile(scope, identifier_type, &template).map(Some),
            None => Ok(None),
        }
    }

    pub fn compile(
        scope: &Scope,
        identifier_type: IdentifierType,
        source: &ScopeParserTemplate,
    ) -> Result<RawParserConfig, ConfigError> {
        let mut expressions: BTreeMap<String, String> = source
            .expressions
            .iter()
            .map(|(k, v)| (to_canonical_name(k), v.clone()))
            .collect();
        let collections: BTreeMap<String, String> = source
            .collections
            .iter()
            .map(|(k, v)| (to_canonical_name(k), v.clone()))
            .collect();

        let template = collapse_time_range(&source.template, &mut expressions);

        let separator = {
            let mut chars = source.separator.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(ConfigError::InvalidSeparator(source.separator.clone())),
            }
        };

        let scanned = scan_template(&template, separator, identifier_type)?;
        let mut specs = Vec::with_capacity(scanned.marker_count());

        for segment in &scanned.segments {
            let is_required = !segment.optional;
            let is_optional = segment.optional;
            let spec = match &segment.kind {
                SegmentKind::Literal(value) => RawSlotSpec::Const {
                    value: value.clone(),
                    is_required,
                    is_optional,
                },
                SegmentKind::Placeholder(name) => {
                    let key = to_canonical_name(name);
                    if let Some(expression) = expressions.get(&key) {
                        RawSlotSpec::Regex {
                            expression: expression.clone(),
                            is_required,
                            is_optional,
                        }
                    } else {
                        RawSlotSpec::Collection {
                            namespace: resolve_collection(scope, name, &key, &collections)?,
                            is_required,
                            is_optional,
                        }
                    }
                }
            };
            specs.push(spec);
        }

        if let Some(suffix) = &scanned.suffix {
            specs.push(RawSlotSpec::Const {
                value: suffix.clone(),
                is_required: true,
                is_optional: false,
            });
        }

        debug!(
            "Compiled {} template for scope '{}' into {} slots",
            identifier_type,
            scope.namespace(),
            specs.len()
        );

        Ok(RawParserConfig {
            identifier_type,
            scope: scope.namespace().to_string(),
            template,
            separator: source.separator.clone(),
            suffix: scanned.suffix,
            specs,
        })
    }
}

/// Replace the period pair with a single time-range placeholder
fn collapse_time_range(template: &str, expressions: &mut BTreeMap<String, String>) -> String {
    if !template.contains(PERIOD_PAIR) {
        return template.to_string();
    }
    expressions
        .entry(to_canonical_name(TIME_RANGE_PLACEHOLDER))
        .or_insert_with(|| TIME_RANGE_EXPRESSION.to_string());
    template.replace(PERIOD_PAIR, &format!("%({})s", TIME_RANGE_PLACEHOLDER))
}

fn resolve_collection(
    scope: &Scope,
    placeholder: &str,
    key: &str,
    overrides: &BTreeMap<String, String>,
) -> Result<String, ConfigError> {
    if let Some(namespace) = overrides.get(key) {
        return Ok(namespace.clone());
    }
    scope
        .collection(key)
        .or_else(|| scope.collection(placeholder))
        .map(|c| c.namespace().to_string())
        .ok_or_else(|| ConfigError::UnresolvedPlaceholder {
            scope: scope.namespace().to_string(),
            placeholder: placeholder.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ParsingConfig;
    use cv_model::Authority;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cmip5_scope(parsers: serde_json::Value) -> Scope {
        let authority = Authority::new("wcrp").unwrap();
        let data = json!({ "parsers": parsers });
        let mut scope = authority
            .new_scope("cmip5")
            .unwrap()
            .with_data(data.as_object().cloned().unwrap_or_default());
        for name in ["variable", "cmor_table", "model", "experiment", "ensemble"] {
            let collection = scope.new_collection(name).unwrap();
            scope.insert_collection(collection).unwrap();
        }
        scope
    }

    #[test]
    fn test_filename_period_pair_collapsed() {
        let scope = cmip5_scope(json!({
            "filename": {
                "template": "%(variable)s_%(cmor_table)s_%(model)s_%(experiment)s_%(ensemble)s[_%(period_start)s-%(period_end)s].nc",
                "seperator": "_"
            }
        }));

        let raw = TemplateCompiler::compile_scope(&scope, IdentifierType::Filename)
            .unwrap()
            .unwrap();

        assert_eq!(
            raw.template,
            "%(variable)s_%(cmor_table)s_%(model)s_%(experiment)s_%(ensemble)s[_%(time_range)s].nc"
        );
        assert_eq!(raw.suffix.as_deref(), Some("nc"));
        assert_eq!(raw.specs.len(), 7);
        assert_eq!(
            raw.specs[5],
            RawSlotSpec::Regex {
                expression: TIME_RANGE_EXPRESSION.to_string(),
                is_required: false,
                is_optional: true,
            }
        );
        assert_eq!(
            raw.specs[1],
            RawSlotSpec::Collection {
                namespace: "wcrp:cmip5:cmor-table".to_string(),
                is_required: true,
                is_optional: false,
            }
        );
        assert_eq!(
            raw.specs[6],
            RawSlotSpec::Const {
                value: "nc".to_string(),
                is_required: true,
                is_optional: false,
            }
        );

        ParsingConfig::from_raw(&raw).unwrap();
    }

    #[test]
    fn test_overrides_and_constants() {
        let scope = cmip5_scope(json!({
            "dataset": {
                "template": "cmip5.%(product)s.%(model)s.%(version)s",
                "seperator": ".",
                "collections": {"product": "wcrp:cmip5:experiment"},
                "expressions": {"version": "^v[0-9]{8}$"}
            }
        }));

        let raw = TemplateCompiler::compile_scope(&scope, IdentifierType::Dataset)
            .unwrap()
            .unwrap();

        assert!(matches!(&raw.specs[0], RawSlotSpec::Const { value, .. } if value == "cmip5"));
        assert!(
            matches!(&raw.specs[1], RawSlotSpec::Collection { namespace, .. } if namespace == "wcrp:cmip5:experiment")
        );
        assert!(
            matches!(&raw.specs[2], RawSlotSpec::Collection { namespace, .. } if namespace == "wcrp:cmip5:model")
        );
        assert!(matches!(&raw.specs[3], RawSlotSpec::Regex { expression, .. } if expression == "^v[0-9]{8}$"));
        assert_eq!(raw.suffix, None);
    }

    #[test]
    fn test_unresolved_placeholder() {
        let scope = cmip5_scope(json!({
            "dataset": {"template": "cmip5.%(realm)s", "seperator": "."}
        }));
        let err = TemplateCompiler::compile_scope(&scope, IdentifierType::Dataset).unwrap_err();
        assert!(
            matches!(err, ConfigError::UnresolvedPlaceholder { placeholder, .. } if placeholder == "realm")
        );
    }

    #[test]
    fn test_missing_template_is_not_configured() {
        let scope = cmip5_scope(json!({}));
        assert!(TemplateCompiler::compile_scope(&scope, IdentifierType::Directory)
            .unwrap()
            .is_none());
    }
}
