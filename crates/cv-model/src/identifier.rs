//! Identifier types and name-matching strictness

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

// ============================================================================
// IDENTIFIER TYPES
// ============================================================================

/// Kinds of identifier a scope may define a parsing template for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierType {
    /// Dot-separated dataset identifier (`CMIP6.CMIP.IPSL...`)
    Dataset,
    /// Slash-separated archive directory path
    Directory,
    /// Underscore-separated file name with extension
    Filename,
}

impl IdentifierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::Dataset => "dataset",
            IdentifierType::Directory => "directory",
            IdentifierType::Filename => "filename",
        }
    }

    pub const fn all() -> &'static [Self] {
        &[Self::Dataset, Self::Directory, Self::Filename]
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dataset" => Ok(Self::Dataset),
            "directory" => Ok(Self::Directory),
            "filename" => Ok(Self::Filename),
            _ => Err(ModelError::UnsupportedIdentifierType(s.to_string())),
        }
    }
}

// ============================================================================
// STRICTNESS
// ============================================================================

/// Which name fields of a term may match a candidate string.
///
/// Levels 0 and 1 consult disjoint fields; each accepts a subset of level 2.
/// From level 2 upwards anything accepted at level N is accepted at every
/// level above N.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Strictness {
    /// Level 0: canonical name, case-sensitive
    Canonical = 0,
    /// Level 1: raw name, case-sensitive
    Raw = 1,
    /// Level 2: canonical or raw name, case-sensitive
    #[default]
    CanonicalOrRaw = 2,
    /// Level 3: canonical, raw or alternative names, case-sensitive
    AnyName = 3,
    /// Level 4: any name, case-insensitive
    CaseInsensitive = 4,
}

impl Strictness {
    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// Whether candidates are lower-cased before comparison
    pub fn folds_case(&self) -> bool {
        *self >= Strictness::CaseInsensitive
    }

    pub const fn all() -> &'static [Self] {
        &[
            Self::Canonical,
            Self::Raw,
            Self::CanonicalOrRaw,
            Self::AnyName,
            Self::CaseInsensitive,
        ]
    }
}

impl TryFrom<u8> for Strictness {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Canonical),
            1 => Ok(Self::Raw),
            2 => Ok(Self::CanonicalOrRaw),
            3 => Ok(Self::AnyName),
            4 => Ok(Self::CaseInsensitive),
            other => Err(ModelError::InvalidStrictness(other)),
        }
    }
}

impl From<Strictness> for u8 {
    fn from(value: Strictness) -> Self {
        value.level()
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}
