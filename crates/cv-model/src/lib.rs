//! CV Model - Controlled Vocabulary Foundation Types
//!
//! Pure data structures for the authority → scope → collection → term
//! hierarchy used to validate climate-archive identifiers.
//!
//! ## Architecture Level: Foundation
//!
//! Every other crate in the workspace depends on this one; it depends on no
//! workspace crate. It carries:
//! - Namespaces (`authority:scope:collection:term`)
//! - Canonical name normalisation
//! - Vocabulary nodes with typed auxiliary data access
//! - Identifier types and matching strictness levels
//! - The [`VocabularyLookup`] seam that parsing code resolves nodes through
//!
//! ## Rules
//!
//! 1. **NO PARSING LOGIC** - templates, matching and building live in `cv-parser`
//! 2. **SERIALIZABLE** - all node types support serde
//! 3. **IMMUTABLE IDENTITY** - a node's namespace never changes once created

pub mod error;
pub mod identifier;
pub mod lookup;
pub mod names;
pub mod namespace;
pub mod node;

pub use error::ModelError;
pub use identifier::{IdentifierType, Strictness};
pub use lookup::{Node, VocabularyLookup};
pub use names::{to_canonical_name, Named};
pub use namespace::Namespace;
pub use node::{Authority, Collection, GovernanceStatus, Scope, Term};
