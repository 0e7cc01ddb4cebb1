//! Error types for identifier parsing and building
//!
//! This module provides idiomatic Rust error types using thiserror. Every
//! value-level identifier failure carries enough context (scope, identifier
//! type, element position and text, full identifier) to diagnose it without
//! re-running the parse.

use cv_model::{IdentifierType, ModelError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading vocabulary documents into an archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid vocabulary document {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Virtual collection '{collection}' has no term_regex")]
    MissingTermRegex { collection: String },

    #[error("Collection '{collection}' has an invalid term_regex '{expression}': {reason}")]
    InvalidTermRegex {
        collection: String,
        expression: String,
        reason: String,
    },

    #[error("Authority '{0}' is already loaded")]
    DuplicateAuthority(String),
}

/// Errors raised while reading, compiling or validating a parsing configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid parser configuration {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid separator '{0}': expected exactly one character")]
    InvalidSeparator(String),

    #[error("Template syntax error in '{template}': {message}")]
    TemplateSyntax { template: String, message: String },

    #[error(
        "Template '{template}' declares {markers} element markers but {slots} slot specifications were given"
    )]
    SlotCountMismatch {
        template: String,
        markers: usize,
        slots: usize,
    },

    #[error("Invalid expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Placeholder '{placeholder}' in scope '{scope}' resolves to no collection or expression")]
    UnresolvedPlaceholder { scope: String, placeholder: String },

    #[error("Scope '{0}' not found")]
    UnknownScope(String),

    #[error("Collection '{collection}' referenced by the {identifier_type} configuration of scope '{scope}' not found")]
    UnknownCollection {
        scope: String,
        identifier_type: IdentifierType,
        collection: String,
    },

    #[error("Configuration for scope '{expected}' was found under scope '{found}'")]
    ScopeMismatch { expected: String, found: String },

    #[error("Filename suffix '{suffix}' must be the final constant slot")]
    SuffixMismatch { suffix: String },
}

/// The single error kind raised by identifier parsing and building
#[derive(Error, Debug)]
pub enum IdentifierError {
    #[error("Unsupported identifier type '{0}'")]
    UnsupportedIdentifierType(String),

    #[error("Scope '{0}' not found")]
    UnknownScope(String),

    #[error("Model error: {0}")]
    Model(ModelError),

    #[error("No {identifier_type} parsing configuration for scope '{scope}'")]
    ConfigurationNotFound {
        scope: String,
        identifier_type: IdentifierType,
    },

    #[error("Invalid {identifier_type} parsing configuration for scope '{scope}': {source}")]
    Configuration {
        scope: String,
        identifier_type: IdentifierType,
        #[source]
        source: ConfigError,
    },

    #[error(
        "Invalid {identifier_type} identifier '{identifier}' for scope '{scope}': expected {expected} elements, found {actual}"
    )]
    StructuralMismatch {
        scope: String,
        identifier_type: IdentifierType,
        identifier: String,
        expected: String,
        actual: usize,
    },

    #[error(
        "Invalid {identifier_type} identifier '{identifier}' for scope '{scope}': element {index} '{element}' must equal '{expected}'"
    )]
    ConstantMismatch {
        scope: String,
        identifier_type: IdentifierType,
        identifier: String,
        index: usize,
        element: String,
        expected: String,
    },

    #[error(
        "Invalid {identifier_type} identifier '{identifier}' for scope '{scope}': element {index} '{element}' does not match expression '{expression}'"
    )]
    RegexMismatch {
        scope: String,
        identifier_type: IdentifierType,
        identifier: String,
        index: usize,
        element: String,
        expression: String,
    },

    #[error(
        "Invalid {identifier_type} identifier '{identifier}' for scope '{scope}': element {index} '{element}' is not a term of collection '{collection}'"
    )]
    VocabularyMismatch {
        scope: String,
        identifier_type: IdentifierType,
        identifier: String,
        index: usize,
        element: String,
        collection: String,
    },

    #[error("Collection '{collection}' required by scope '{scope}' not found")]
    CollectionNotFound { scope: String, collection: String },

    #[error("Cannot build {identifier_type} identifier for scope '{scope}': missing '{field}'")]
    BuilderIncomplete {
        scope: String,
        identifier_type: IdentifierType,
        field: String,
    },

    #[error(
        "Cannot build {identifier_type} identifier for scope '{scope}': element {index} '{element}' contains reserved character '{reserved}'"
    )]
    BuilderReservedCharacter {
        scope: String,
        identifier_type: IdentifierType,
        index: usize,
        element: String,
        reserved: char,
    },

    #[error(
        "Cannot build {identifier_type} identifier for scope '{scope}': no supplied term belongs to collection '{collection}'"
    )]
    BuilderCollectionLookup {
        scope: String,
        identifier_type: IdentifierType,
        collection: String,
    },
}

impl IdentifierError {
    /// True when the scope simply does not support the identifier type.
    ///
    /// Callers iterating many scopes skip these and continue.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, IdentifierError::ConfigurationNotFound { .. })
    }

    /// True for element-count failures, as opposed to value failures
    pub fn is_structural(&self) -> bool {
        matches!(self, IdentifierError::StructuralMismatch { .. })
    }

    /// 1-based index of the offending element, for value failures
    pub fn element_index(&self) -> Option<usize> {
        match self {
            IdentifierError::ConstantMismatch { index, .. }
            | IdentifierError::RegexMismatch { index, .. }
            | IdentifierError::VocabularyMismatch { index, .. }
            | IdentifierError::BuilderReservedCharacter { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Offending element text, for value failures
    pub fn element(&self) -> Option<&str> {
        match self {
            IdentifierError::ConstantMismatch { element, .. }
            | IdentifierError::RegexMismatch { element, .. }
            | IdentifierError::VocabularyMismatch { element, .. }
            | IdentifierError::BuilderReservedCharacter { element, .. } => Some(element),
            _ => None,
        }
    }
}

impl From<ModelError> for IdentifierError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::UnsupportedIdentifierType(value) => {
                IdentifierError::UnsupportedIdentifierType(value)
            }
            other => IdentifierError::Model(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_is_recoverable() {
        let err = IdentifierError::ConfigurationNotFound {
            scope: "wcrp:cordex".to_string(),
            identifier_type: IdentifierType::Filename,
        };
        assert!(err.is_not_configured());
        assert!(!err.is_structural());
        assert_eq!(
            err.to_string(),
            "No filename parsing configuration for scope 'wcrp:cordex'"
        );
    }

    #[test]
    fn test_value_error_context() {
        let err = IdentifierError::ConstantMismatch {
            scope: "wcrp:cmip6".to_string(),
            identifier_type: IdentifierType::Dataset,
            identifier: "cmip6.CMIP".to_string(),
            index: 1,
            element: "cmip6".to_string(),
            expected: "CMIP6".to_string(),
        };
        assert_eq!(err.element_index(), Some(1));
        assert_eq!(err.element(), Some("cmip6"));
        let message = err.to_string();
        assert!(message.contains("wcrp:cmip6"));
        assert!(message.contains("cmip6.CMIP"));
        assert!(message.contains("'CMIP6'"));
    }

    #[test]
    fn test_model_error_conversion() {
        let err: IdentifierError = ModelError::UnsupportedIdentifierType("ensemble".into()).into();
        assert!(matches!(err, IdentifierError::UnsupportedIdentifierType(t) if t == "ensemble"));

        let err: IdentifierError = ModelError::InvalidStrictness(7).into();
        assert!(matches!(err, IdentifierError::Model(ModelError::InvalidStrictness(7))));
        assert_eq!(err.to_string(), "Model error: Invalid strictness level 7 (expected 0-4)");
    }
}
