use thiserror::Error;

/// Errors raised while constructing vocabulary model values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid namespace '{namespace}': {reason}")]
    InvalidNamespace { namespace: String, reason: String },

    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Unsupported identifier type '{0}' (expected dataset, directory or filename)")]
    UnsupportedIdentifierType(String),

    #[error("Invalid strictness level {0} (expected 0-4)")]
    InvalidStrictness(u8),

    #[error("Duplicate term '{name}' in collection '{collection}'")]
    DuplicateTerm { collection: String, name: String },

    #[error("Term '{term}' does not belong to collection '{collection}'")]
    ForeignTerm { collection: String, term: String },
}
