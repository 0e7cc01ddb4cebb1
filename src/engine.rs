//! Identifier engine
//!
//! Entry point tying a vocabulary, a configuration store and a configuration
//! cache together. All parsing and building goes through here.

use cv_model::{IdentifierType, Scope, Strictness, VocabularyLookup};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::builder::IdentifierBuilder;
use crate::config::{ConfigCache, ConfigStore, ParsingConfig};
use crate::error::{ConfigError, IdentifierError};
use crate::matcher::Matcher;
use crate::parser::IdentifierParser;
use crate::terms::MatchedTerm;

/// Parses and builds identifiers for every scope of a vocabulary
pub struct IdentifierEngine<V, S> {
    vocabulary: V,
    store: S,
    cache: Arc<ConfigCache>,
    matcher: Matcher,
}

impl<V: VocabularyLookup, S: ConfigStore> IdentifierEngine<V, S> {
    pub fn new(vocabulary: V, store: S) -> Self {
        Self {
            vocabulary,
            store,
            cache: Arc::new(ConfigCache::new()),
            matcher: Matcher::new(),
        }
    }

    /// Share a configuration cache with other engines
    pub fn with_cache(mut self, cache: Arc<ConfigCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn vocabulary(&self) -> &V {
        &self.vocabulary
    }

    pub fn cache(&self) -> &Arc<ConfigCache> {
        &self.cache
    }

    /// Compiled configuration for a scope and identifier type, memoized.
    ///
    /// `ConfigurationNotFound` means the scope does not support the type;
    /// callers iterating many scopes should skip it.
    pub fn get_config(
        &self,
        scope: &str,
        identifier_type: IdentifierType,
    ) -> Result<Arc<ParsingConfig>, IdentifierError> {
        let scope = self.resolve_scope(scope)?;
        self.cache
            .get_or_load(scope.namespace(), identifier_type, || {
                self.load_config(scope, identifier_type)
            })
    }

    pub fn parse_identifier(
        &self,
        scope: &str,
        identifier_type: IdentifierType,
        identifier: &str,
        strictness: Strictness,
    ) -> Result<BTreeSet<MatchedTerm>, IdentifierError> {
        let config = self.get_config(scope, identifier_type)?;
        IdentifierParser::new(&config, &self.vocabulary, &self.matcher).parse(identifier, strictness)
    }

    pub fn validate_identifier(
        &self,
        scope: &str,
        identifier_type: IdentifierType,
        identifier: &str,
        strictness: Strictness,
    ) -> Result<(), IdentifierError> {
        let config = self.get_config(scope, identifier_type)?;
        IdentifierParser::new(&config, &self.vocabulary, &self.matcher)
            .validate(identifier, strictness)
    }

    /// Union of the terms of every identifier; the first failure aborts
    pub fn parse_identifier_set<I, T>(
        &self,
        scope: &str,
        identifier_type: IdentifierType,
        identifiers: I,
        strictness: Strictness,
    ) -> Result<BTreeSet<MatchedTerm>, IdentifierError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let config = self.get_config(scope, identifier_type)?;
        let parser = IdentifierParser::new(&config, &self.vocabulary, &self.matcher);

        let mut terms = BTreeSet::new();
        let mut count = 0usize;
        for identifier in identifiers {
            terms.extend(parser.parse(identifier.as_ref(), strictness)?);
            count += 1;
        }
        debug!(
            "Parsed {} {} identifiers for scope '{}': {} distinct terms",
            count,
            identifier_type,
            config.scope(),
            terms.len()
        );
        Ok(terms)
    }

    /// Per-identifier results, in input order
    pub fn parse_identifier_each<I, T>(
        &self,
        scope: &str,
        identifier_type: IdentifierType,
        identifiers: I,
        strictness: Strictness,
    ) -> Vec<Result<BTreeSet<MatchedTerm>, IdentifierError>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        identifiers
            .into_iter()
            .map(|identifier| {
                let config = self.get_config(scope, identifier_type)?;
                IdentifierParser::new(&config, &self.vocabulary, &self.matcher)
                    .parse(identifier.as_ref(), strictness)
            })
            .collect()
    }

    pub fn build_identifier<'t, I>(
        &self,
        scope: &str,
        identifier_type: IdentifierType,
        terms: I,
        regex_values: &BTreeMap<String, String>,
    ) -> Result<String, IdentifierError>
    where
        I: IntoIterator<Item = &'t MatchedTerm>,
    {
        let config = self.get_config(scope, identifier_type)?;
        IdentifierBuilder::new(&config, &self.vocabulary).build(terms, regex_values)
    }

    fn resolve_scope(&self, scope: &str) -> Result<&Scope, IdentifierError> {
        self.vocabulary
            .scope(scope)
            .ok_or_else(|| IdentifierError::UnknownScope(scope.to_string()))
    }

    fn load_config(
        &self,
        scope: &Scope,
        identifier_type: IdentifierType,
    ) -> Result<ParsingConfig, IdentifierError> {
        let namespace = scope.namespace();
        let wrap = |source: ConfigError| IdentifierError::Configuration {
            scope: namespace.to_string(),
            identifier_type,
            source,
        };

        let Some(raw) = self
            .store
            .read_scope_parser_config(namespace, identifier_type)
            .map_err(wrap)?
        else {
            warn!(
                "Scope '{}' has no {} parsing configuration",
                namespace, identifier_type
            );
            return Err(IdentifierError::ConfigurationNotFound {
                scope: namespace.to_string(),
                identifier_type,
            });
        };

        let config = ParsingConfig::from_raw(&raw).map_err(wrap)?;
        if config.scope() != namespace {
            return Err(wrap(ConfigError::ScopeMismatch {
                expected: namespace.to_string(),
                found: config.scope().to_string(),
            }));
        }
        for collection in config.collections() {
            if self.vocabulary.collection(&collection.to_string()).is_none() {
                return Err(wrap(ConfigError::UnknownCollection {
                    scope: namespace.to_string(),
                    identifier_type,
                    collection: collection.to_string(),
                }));
            }
        }

        info!(
            "Loaded {} parsing configuration for scope '{}' ({} slots)",
            identifier_type,
            namespace,
            config.slots().len()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Archive;
    use crate::config::{FileConfigStore, RawParserConfig};
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
        scope.insert_collection(activity).unwrap();
        authority.insert_scope(scope).unwrap();

        let mut archive = Archive::new();
        archive.insert_authority(authority).unwrap();
        archive
    }

    fn write(store: &FileConfigStore, value: serde_json::Value) {
        let raw: RawParserConfig = serde_json::from_value(value).unwrap();
        store.write(&raw).unwrap();
    }

    fn dataset_config() -> serde_json::Value {
        json!({
            "identifier_type": "dataset",
            "scope": "wcrp:cmip6",
            "template": "CMIP6.%(activity_id)s",
            "seperator": ".",
            "specs": [
                {"type": "const", "value": "CMIP6"},
                {"type": "collection", "namespace": "wcrp:cmip6:activity-id"}
            ]
        })
    }

    #[test]
    fn test_get_config_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path());
        write(&store, dataset_config());
        let engine = IdentifierEngine::new(archive(), store);

        let first = engine.get_config("wcrp:cmip6", IdentifierType::Dataset).unwrap();
        let second = engine.get_config("WCRP:CMIP6", IdentifierType::Dataset).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cache().len(), 1);
    }

    #[test]
    fn test_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        let engine = IdentifierEngine::new(archive(), FileConfigStore::new(dir.path()));
        let err = engine
            .get_config("wcrp:cmip6", IdentifierType::Filename)
            .unwrap_err();
        assert!(err.is_not_configured());
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_unknown_scope() {
        let dir = tempfile::tempdir().unwrap();
        let engine = IdentifierEngine::new(archive(), FileConfigStore::new(dir.path()));
        let err = engine
            .parse_identifier("wcrp:cordex", IdentifierType::Dataset, "x", Strictness::default())
            .unwrap_err();
        assert!(matches!(err, IdentifierError::UnknownScope(s) if s == "wcrp:cordex"));
    }

    #[test]
    fn test_unknown_collection_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path());
        write(
            &store,
            json!({
                "identifier_type": "directory",
                "scope": "wcrp:cmip6",
                "template": "CMIP6/%(realm)s",
                "seperator": "/",
                "specs": [
                    {"type": "const", "value": "CMIP6"},
                    {"type": "collection", "namespace": "wcrp:cmip6:realm"}
                ]
            }),
        );
        let engine = IdentifierEngine::new(archive(), store);
        let err = engine
            .get_config("wcrp:cmip6", IdentifierType::Directory)
            .unwrap_err();
        assert!(matches!(
            err,
            IdentifierError::Configuration {
                source: ConfigError::UnknownCollection { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_set_aborts_but_each_reports_per_item() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path());
        write(&store, dataset_config());
        let engine = IdentifierEngine::new(archive(), store);
        let identifiers = ["CMIP6.CMIP", "CMIP6.NOPE", "CMIP6.FAFMIP"];

        let err = engine
            .parse_identifier_set("wcrp:cmip6", IdentifierType::Dataset, identifiers, Strictness::default())
            .unwrap_err();
        assert_eq!(err.element(), Some("NOPE"));

        let results = engine.parse_identifier_each(
            "wcrp:cmip6",
            IdentifierType::Dataset,
            identifiers,
            Strictness::default(),
        );
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());

        let union = engine
            .parse_identifier_set(
                "wcrp:cmip6",
                IdentifierType::Dataset,
                ["CMIP6.CMIP", "CMIP6.FAFMIP", "CMIP6.CMIP"],
                Strictness::default(),
            )
            .unwrap();
        assert_eq!(union.len(), 2);
    }

    #[test]
    fn test_each_with_unconfigured_type() {
        let dir = tempfile::tempdir().unwrap();
        let engine = IdentifierEngine::new(archive(), FileConfigStore::new(dir.path()));
        let results = engine.parse_identifier_each(
            "wcrp:cmip6",
            IdentifierType::Filename,
            ["a", "b"],
            Strictness::default(),
        );
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.as_ref().is_err_and(IdentifierError::is_not_configured)));
    }
}
