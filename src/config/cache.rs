//! Memoization of compiled parsing configurations
//!
//! One entry per (scope namespace, identifier type). Entries are never
//! invalidated; configuration is read-only while identifiers are parsed.

use cv_model::{IdentifierType, Namespace};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use super::types::ParsingConfig;

type CacheKey = (Namespace, IdentifierType);

/// Explicit, shareable configuration cache
#[derive(Debug, Default)]
pub struct ConfigCache {
    entries: RwLock<HashMap<CacheKey, Arc<ParsingConfig>>>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        scope: &Namespace,
        identifier_type: IdentifierType,
    ) -> Option<Arc<ParsingConfig>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(scope.clone(), identifier_type))
            .cloned()
    }

    /// Return the cached entry, or compute and store it.
    ///
    /// The loader runs outside the lock. When two callers race on the same
    /// key the first stored value wins and both receive it.
    pub fn get_or_load<E>(
        &self,
        scope: &Namespace,
        identifier_type: IdentifierType,
        load: impl FnOnce() -> Result<ParsingConfig, E>,
    ) -> Result<Arc<ParsingConfig>, E> {
        if let Some(config) = self.get(scope, identifier_type) {
            debug!("Configuration cache hit for {} {}", scope, identifier_type);
            return Ok(config);
        }

        let config = Arc::new(load()?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .entry((scope.clone(), identifier_type))
            .or_insert(config);
        Ok(Arc::clone(entry))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::RawParserConfig;
    use crate::error::ConfigError;

    fn config() -> ParsingConfig {
        let raw: RawParserConfig = serde_json::from_value(serde_json::json!({
            "identifier_type": "dataset",
            "scope": "wcrp:cmip6",
            "template": "CMIP6.%(activity_id)s",
            "seperator": ".",
            "specs": [
                {"type": "const", "value": "CMIP6"},
                {"type": "collection", "namespace": "wcrp:cmip6:activity-id"}
            ]
        }))
        .unwrap();
        ParsingConfig::from_raw(&raw).unwrap()
    }

    #[test]
    fn test_loader_runs_once() {
        let cache = ConfigCache::new();
        let scope = Namespace::parse("wcrp:cmip6").unwrap();
        let mut calls = 0;

        for _ in 0..3 {
            let loaded = cache
                .get_or_load(&scope, IdentifierType::Dataset, || {
                    calls += 1;
                    Ok::<_, ConfigError>(config())
                })
                .unwrap();
            assert_eq!(loaded.slots().len(), 2);
        }

        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keyed_by_identifier_type() {
        let cache = ConfigCache::new();
        let scope = Namespace::parse("wcrp:cmip6").unwrap();
        cache
            .get_or_load(&scope, IdentifierType::Dataset, || Ok::<_, ConfigError>(config()))
            .unwrap();
        assert!(cache.get(&scope, IdentifierType::Dataset).is_some());
        assert!(cache.get(&scope, IdentifierType::Filename).is_none());
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = ConfigCache::new();
        let scope = Namespace::parse("wcrp:cmip6").unwrap();
        let result = cache.get_or_load(&scope, IdentifierType::Dataset, || {
            Err(ConfigError::InvalidSeparator("..".to_string()))
        });
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
