//! CV Parser - Controlled-Vocabulary Identifier Engine
//!
//! Validates, deconstructs and rebuilds structured climate-archive
//! identifiers (dataset ids, directory paths, filenames) against a
//! hierarchical controlled vocabulary.
//!
//! ## Call Chain
//! Scope + identifier type -> ParsingConfig (store, cached) -> split ->
//! count check -> per-slot validation (constant / regex / collection) ->
//! matched terms. Building runs the same configuration in reverse.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cv_parser::{Archive, FileConfigStore, IdentifierEngine, IdentifierType, Strictness};
//!
//! let archive = Archive::from_dir("archive").unwrap();
//! let engine = IdentifierEngine::new(archive, FileConfigStore::from_env());
//! let terms = engine
//!     .parse_identifier(
//!         "wcrp:cmip6",
//!         IdentifierType::Dataset,
//!         "CMIP6.FAFMIP.IPSL.IPSL-CM6A-LR.amip.r1i1p1f1.Amon.abs550aer.gm",
//!         Strictness::default(),
//!     )
//!     .unwrap();
//! assert_eq!(terms.len(), 8);
//! ```

// Core error handling
pub mod error;

// In-memory vocabulary
pub mod archive;

// Matching primitive
pub mod matcher;

// Parsing configuration: documents, templates, generation, stores, cache
pub mod config;

// Parse results
pub mod terms;

// Parser and builder over a compiled configuration
pub mod builder;
pub mod parser;

// Facade over vocabulary, store and cache
pub mod engine;

pub use archive::Archive;
pub use builder::IdentifierBuilder;
pub use config::{
    ConfigCache, ConfigStore, FileConfigStore, LayeredStore, ParsingConfig, RawParserConfig,
    RawSlotSpec, ScopeTemplateStore, SlotKind, SlotSpec, TemplateCompiler,
};
pub use engine::IdentifierEngine;
pub use error::{ArchiveError, ConfigError, IdentifierError};
pub use matcher::{is_matched, MatchOutcome, Matcher};
pub use parser::IdentifierParser;
pub use terms::{MatchedTerm, VirtualTerm};

// Re-export the vocabulary model so callers need a single dependency
pub use cv_model::{
    to_canonical_name, Authority, Collection, GovernanceStatus, IdentifierType, ModelError, Named,
    Namespace, Node, Scope, Strictness, Term, VocabularyLookup,
};
