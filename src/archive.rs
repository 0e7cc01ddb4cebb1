//! In-memory vocabulary archive
//!
//! Holds authorities loaded from JSON authority documents (one document per
//! authority, with scopes, collections and terms nested inside) and resolves
//! namespaces for the parsing engine. The archive is read-only once loaded.
//!
//! ```json
//! {
//!   "name": "WCRP",
//!   "scopes": [{
//!     "name": "CMIP6",
//!     "collections": [
//!       {"name": "activity_id", "terms": [{"name": "FAFMIP"}]},
//!       {"name": "member_id", "term_regex": "^r[0-9]+i[0-9]+p[0-9]+f[0-9]+$"}
//!     ]
//!   }]
//! }
//! ```

use cv_model::{
    Authority, Collection, GovernanceStatus, Named, Namespace, Node, Scope, VocabularyLookup,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

use crate::error::ArchiveError;

// ============================================================================
// Documents
// ============================================================================

#[derive(Debug, Deserialize)]
struct AuthorityDocument {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    alternative_names: Vec<String>,
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    scopes: Vec<ScopeDocument>,
}

#[derive(Debug, Deserialize)]
struct ScopeDocument {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    alternative_names: Vec<String>,
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    collections: Vec<CollectionDocument>,
}

#[derive(Debug, Deserialize)]
struct CollectionDocument {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    alternative_names: Vec<String>,
    #[serde(default)]
    term_regex: Option<String>,
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    terms: Vec<TermDocument>,
}

#[derive(Debug, Deserialize)]
struct TermDocument {
    name: String,
    #[serde(default, alias = "synonyms")]
    alternative_names: Vec<String>,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    associations: Vec<String>,
    #[serde(default)]
    status: GovernanceStatus,
    #[serde(default)]
    data: Map<String, Value>,
}

impl AuthorityDocument {
    fn into_authority(self) -> Result<Authority, ArchiveError> {
        let mut authority = Authority::new(self.name)?
            .with_alternative_names(self.alternative_names)
            .with_data(self.data);
        if let Some(description) = self.description {
            authority = authority.with_description(description);
        }

        for scope_doc in self.scopes {
            let scope = scope_doc.into_scope(&authority)?;
            authority.insert_scope(scope)?;
        }
        Ok(authority)
    }
}

impl ScopeDocument {
    fn into_scope(self, authority: &Authority) -> Result<Scope, ArchiveError> {
        let mut scope = authority
            .new_scope(self.name)?
            .with_alternative_names(self.alternative_names)
            .with_data(self.data);
        if let Some(description) = self.description {
            scope = scope.with_description(description);
        }

        for collection_doc in self.collections {
            let collection = collection_doc.into_collection(&scope)?;
            scope.insert_collection(collection)?;
        }
        Ok(scope)
    }
}

impl CollectionDocument {
    fn into_collection(self, scope: &Scope) -> Result<Collection, ArchiveError> {
        let mut collection = scope
            .new_collection(self.name)?
            .with_alternative_names(self.alternative_names)
            .with_data(self.data);
        if let Some(description) = self.description {
            collection = collection.with_description(description);
        }
        if let Some(term_regex) = self.term_regex {
            collection = collection.with_term_regex(term_regex);
        }

        for term_doc in self.terms {
            let mut term = collection
                .new_term(term_doc.name)?
                .with_alternative_names(term_doc.alternative_names)
                .with_status(term_doc.status)
                .with_data(term_doc.data);
            if let Some(parent) = term_doc.parent {
                term = term.with_parent(Namespace::parse(&parent)?);
            }
            let associations = term_doc
                .associations
                .iter()
                .map(|a| Namespace::parse(a))
                .collect::<Result<Vec<_>, _>>()?;
            term = term.with_associations(associations);
            collection.insert_term(term)?;
        }
        Ok(collection)
    }
}

// ============================================================================
// Archive
// ============================================================================

/// Read-only in-memory vocabulary
#[derive(Debug, Clone, Default)]
pub struct Archive {
    authorities: Vec<Authority>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` authority document in `dir` (non-recursive)
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let mut archive = Self::new();
        archive.load_dir(dir)?;
        Ok(archive)
    }

    /// Add an authority after validating its collections
    pub fn insert_authority(&mut self, authority: Authority) -> Result<(), ArchiveError> {
        if self
            .authorities
            .iter()
            .any(|a| a.name() == authority.name())
        {
            return Err(ArchiveError::DuplicateAuthority(authority.name().to_string()));
        }

        for scope in authority.scopes() {
            for collection in scope.collections() {
                validate_collection(collection)?;
            }
        }

        let position = self
            .authorities
            .binary_search_by(|a| a.name().cmp(authority.name()))
            .unwrap_or_else(|p| p);
        self.authorities.insert(position, authority);
        Ok(())
    }

    /// Load one authority document from a JSON string
    pub fn load_str(&mut self, json: &str, origin: &str) -> Result<&Authority, ArchiveError> {
        let document: AuthorityDocument =
            serde_json::from_str(json).map_err(|source| ArchiveError::Json {
                origin: origin.to_string(),
                source,
            })?;
        let authority = document.into_authority()?;
        let name = authority.name().to_string();

        info!(
            "Loaded authority '{}' ({} scopes) from {}",
            name,
            authority.scopes().len(),
            origin
        );

        self.insert_authority(authority)?;
        self.authorities
            .iter()
            .find(|a| a.name() == name)
            .ok_or(ArchiveError::DuplicateAuthority(name))
    }

    /// Load one authority document from a file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&Authority, ArchiveError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ArchiveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_str(&content, &path.display().to_string())
    }

    /// Load every `*.json` document in a directory, in file-name order
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, ArchiveError> {
        let dir = dir.as_ref();
        let io_err = |source| ArchiveError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false) {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }
        debug!("Loaded {} authority documents from {}", paths.len(), dir.display());
        Ok(paths.len())
    }

    pub fn authorities(&self) -> &[Authority] {
        &self.authorities
    }

    fn find_authority(&self, name: &str) -> Option<&Authority> {
        self.authorities
            .iter()
            .find(|a| a.is_named(name))
            .or_else(|| self.authorities.iter().find(|a| a.is_named_ignore_case(name)))
    }
}

fn validate_collection(collection: &Collection) -> Result<(), ArchiveError> {
    match collection.term_regex() {
        Some(expression) => {
            Regex::new(expression).map_err(|e| ArchiveError::InvalidTermRegex {
                collection: collection.namespace().to_string(),
                expression: expression.to_string(),
                reason: e.to_string(),
            })?;
        }
        None if collection.is_virtual() => {
            return Err(ArchiveError::MissingTermRegex {
                collection: collection.namespace().to_string(),
            });
        }
        None => {}
    }
    Ok(())
}

impl VocabularyLookup for Archive {
    fn load(&self, namespace: &str) -> Option<Node<'_>> {
        let mut segments = namespace.trim().split(':');

        let authority = self.find_authority(segments.next()?)?;
        let Some(scope_name) = segments.next() else {
            return Some(Node::Authority(authority));
        };

        let scope = authority.scope(scope_name)?;
        let Some(collection_name) = segments.next() else {
            return Some(Node::Scope(scope));
        };

        let collection = scope.collection(collection_name)?;
        let Some(term_name) = segments.next() else {
            return Some(Node::Collection(collection));
        };

        let term = collection.term(term_name)?;
        match segments.next() {
            None => Some(Node::Term(term)),
            Some(_) => None,
        }
    }
}
