//! Configuration retrieval
//!
//! A [`ConfigStore`] answers "what is the raw parser configuration for this
//! scope and identifier type?". Absence is `Ok(None)`: a scope that does not
//! define a filename template simply does not support filenames.

use cv_model::{IdentifierType, Namespace, VocabularyLookup};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::compiler::TemplateCompiler;
use super::types::RawParserConfig;
use crate::error::ConfigError;

/// Environment variable naming the parser configuration directory
pub const CONFIG_DIR_ENV: &str = "CV_PARSER_CONFIG_DIR";

/// Source of raw parser configurations
pub trait ConfigStore {
    fn read_scope_parser_config(
        &self,
        scope: &Namespace,
        identifier_type: IdentifierType,
    ) -> Result<Option<RawParserConfig>, ConfigError>;
}

impl<T: ConfigStore + ?Sized> ConfigStore for &T {
    fn read_scope_parser_config(
        &self,
        scope: &Namespace,
        identifier_type: IdentifierType,
    ) -> Result<Option<RawParserConfig>, ConfigError> {
        (**self).read_scope_parser_config(scope, identifier_type)
    }
}

impl<T: ConfigStore + ?Sized> ConfigStore for Box<T> {
    fn read_scope_parser_config(
        &self,
        scope: &Namespace,
        identifier_type: IdentifierType,
    ) -> Result<Option<RawParserConfig>, ConfigError> {
        (**self).read_scope_parser_config(scope, identifier_type)
    }
}

// ============================================================================
// File store
// ============================================================================

/// JSON documents laid out as `<root>/<authority>/<scope>/<identifier_type>.json`
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    root: PathBuf,
}

impl FileConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create store from CV_PARSER_CONFIG_DIR env var or default to "parsers"
    pub fn from_env() -> Self {
        match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => Self::new(dir),
            Err(_) => Self::new("parsers"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the document for a scope and identifier type
    pub fn path_for(&self, scope: &Namespace, identifier_type: IdentifierType) -> PathBuf {
        let mut path = self.root.clone();
        for segment in scope.segments() {
            path.push(segment);
        }
        path.push(format!("{}.json", identifier_type));
        path
    }

    /// Write a generated configuration document, creating directories
    pub fn write(&self, config: &RawParserConfig) -> Result<PathBuf, ConfigError> {
        let scope = Namespace::parse(&config.scope)?;
        let path = self.path_for(&scope, config.identifier_type);
        let io_err = |source| ConfigError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Json {
            origin: path.display().to_string(),
            source,
        })?;
        std::fs::write(&path, json).map_err(io_err)?;

        info!("Wrote {} parser configuration to {}", config.identifier_type, path.display());
        Ok(path)
    }
}

impl ConfigStore for FileConfigStore {
    fn read_scope_parser_config(
        &self,
        scope: &Namespace,
        identifier_type: IdentifierType,
    ) -> Result<Option<RawParserConfig>, ConfigError> {
        let path = self.path_for(scope, identifier_type);
        if !path.exists() {
            debug!("No parser configuration at {}", path.display());
            return Ok(None);
        }

        info!("Loading parser configuration from {}", path.display());
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: RawParserConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                origin: path.display().to_string(),
                source,
            })?;
        Ok(Some(config))
    }
}

// ============================================================================
// Scope template store
// ============================================================================

/// Compiles configurations from the templates stored in scope data
#[derive(Debug, Clone)]
pub struct ScopeTemplateStore<V> {
    vocabulary: V,
}

impl<V: VocabularyLookup> ScopeTemplateStore<V> {
    pub fn new(vocabulary: V) -> Self {
        Self { vocabulary }
    }
}

impl<V: VocabularyLookup> ConfigStore for ScopeTemplateStore<V> {
    fn read_scope_parser_config(
        &self,
        scope: &Namespace,
        identifier_type: IdentifierType,
    ) -> Result<Option<RawParserConfig>, ConfigError> {
        let node = self
            .vocabulary
            .scope(&scope.to_string())
            .ok_or_else(|| ConfigError::UnknownScope(scope.to_string()))?;
        TemplateCompiler::compile_scope(node, identifier_type)
    }
}

// ============================================================================
// Layered store
// ============================================================================

/// Consults `primary` first and falls back to `fallback` when it has no entry
#[derive(Debug, Clone)]
pub struct LayeredStore<A, B> {
    primary: A,
    fallback: B,
}

impl<A: ConfigStore, B: ConfigStore> LayeredStore<A, B> {
    pub fn new(primary: A, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

impl<A: ConfigStore, B: ConfigStore> ConfigStore for LayeredStore<A, B> {
    fn read_scope_parser_config(
        &self,
        scope: &Namespace,
        identifier_type: IdentifierType,
    ) -> Result<Option<RawParserConfig>, ConfigError> {
        match self.primary.read_scope_parser_config(scope, identifier_type)? {
            Some(config) => Ok(Some(config)),
            None => self.fallback.read_scope_parser_config(scope, identifier_type),
        }
    }
}
