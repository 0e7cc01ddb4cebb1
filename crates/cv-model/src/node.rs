//! Vocabulary nodes: authority → scope → collection → term
//!
//! Children are owned by their parent and kept sorted by canonical name so
//! that iteration order, and therefore first-match resolution, is
//! deterministic. Cross references (term parents, associations) are stored
//! as namespaces, never as owned nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use crate::error::ModelError;
use crate::names::{canonical_segment, Named};
use crate::namespace::Namespace;

macro_rules! impl_named {
    ($ty:ty) => {
        impl Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }

            fn raw_name(&self) -> &str {
                &self.raw_name
            }

            fn alternative_names(&self) -> &BTreeSet<String> {
                &self.alternative_names
            }
        }
    };
}

/// Insert `item` keeping `items` sorted by canonical name
fn insert_sorted<T: Named>(items: &mut Vec<T>, item: T) -> Result<(), String> {
    match items.binary_search_by(|existing| existing.name().cmp(item.name())) {
        Ok(_) => Err(item.name().to_string()),
        Err(position) => {
            items.insert(position, item);
            Ok(())
        }
    }
}

/// Find a child by name: canonical, raw or alternative, case-sensitive first
fn find_named<'a, T: Named>(items: &'a [T], candidate: &str) -> Option<&'a T> {
    items
        .iter()
        .find(|item| item.is_named(candidate))
        .or_else(|| items.iter().find(|item| item.is_named_ignore_case(candidate)))
}

// ============================================================================
// GOVERNANCE
// ============================================================================

/// Governance status of a term
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GovernanceStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Deprecated,
}

impl GovernanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GovernanceStatus::Pending => "pending",
            GovernanceStatus::Accepted => "accepted",
            GovernanceStatus::Rejected => "rejected",
            GovernanceStatus::Deprecated => "deprecated",
        }
    }
}

impl fmt::Display for GovernanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TERM
// ============================================================================

/// A single controlled-vocabulary value.
///
/// Identity is the namespace: equality, ordering and hashing ignore every
/// other field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
    namespace: Namespace,
    name: String,
    raw_name: String,
    #[serde(default)]
    alternative_names: BTreeSet<String>,
    #[serde(default)]
    parent: Option<Namespace>,
    #[serde(default)]
    associations: Vec<Namespace>,
    #[serde(default)]
    status: GovernanceStatus,
    uid: Uuid,
    create_date: DateTime<Utc>,
    #[serde(default)]
    data: Map<String, Value>,
}

impl Term {
    /// Create a term inside the collection addressed by `collection`
    pub fn new(collection: &Namespace, raw_name: impl Into<String>) -> Result<Self, ModelError> {
        let raw_name = raw_name.into();
        if collection.depth() != 3 {
            return Err(ModelError::InvalidNamespace {
                namespace: collection.to_string(),
                reason: "terms must be created under a collection namespace".to_string(),
            });
        }
        let namespace = collection.child(&raw_name)?;
        Ok(Self {
            name: namespace.leaf().to_string(),
            namespace,
            raw_name: raw_name.trim().to_string(),
            alternative_names: BTreeSet::new(),
            parent: None,
            associations: Vec::new(),
            status: GovernanceStatus::default(),
            uid: Uuid::new_v4(),
            create_date: Utc::now(),
            data: Map::new(),
        })
    }

    pub fn with_alternative_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternative_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_parent(mut self, parent: Namespace) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_associations(mut self, associations: Vec<Namespace>) -> Self {
        self.associations = associations;
        self
    }

    pub fn with_status(mut self, status: GovernanceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Namespace of the owning collection
    pub fn collection_namespace(&self) -> Namespace {
        self.namespace
            .parent()
            .unwrap_or_else(|| self.namespace.clone())
    }

    /// Canonical name of the owning collection
    pub fn collection_name(&self) -> &str {
        self.namespace.collection_name().unwrap_or_default()
    }

    pub fn parent(&self) -> Option<&Namespace> {
        self.parent.as_ref()
    }

    pub fn associations(&self) -> &[Namespace] {
        &self.associations
    }

    pub fn status(&self) -> GovernanceStatus {
        self.status
    }

    /// Governance transitions are the only mutation allowed after creation
    pub fn set_status(&mut self, status: GovernanceStatus) {
        self.status = status;
    }

    pub fn uid(&self) -> Uuid {
        self.uid
    }

    pub fn create_date(&self) -> DateTime<Utc> {
        self.create_date
    }

    /// Typed access to auxiliary data
    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl_named!(Term);

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace
    }
}

impl Eq for Term {}

impl std::hash::Hash for Term {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.namespace.cmp(&other.namespace)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace)
    }
}

// ============================================================================
// COLLECTION
// ============================================================================

/// A set of terms, or a virtual set defined only by `term_regex`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    namespace: Namespace,
    name: String,
    raw_name: String,
    #[serde(default)]
    alternative_names: BTreeSet<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    term_regex: Option<String>,
    #[serde(default)]
    terms: Vec<Term>,
    uid: Uuid,
    create_date: DateTime<Utc>,
    #[serde(default)]
    data: Map<String, Value>,
}

impl Collection {
    pub fn new(scope: &Namespace, raw_name: impl Into<String>) -> Result<Self, ModelError> {
        let raw_name = raw_name.into();
        if scope.depth() != 2 {
            return Err(ModelError::InvalidNamespace {
                namespace: scope.to_string(),
                reason: "collections must be created under a scope namespace".to_string(),
            });
        }
        let namespace = scope.child(&raw_name)?;
        Ok(Self {
            name: namespace.leaf().to_string(),
            namespace,
            raw_name: raw_name.trim().to_string(),
            alternative_names: BTreeSet::new(),
            description: None,
            term_regex: None,
            terms: Vec::new(),
            uid: Uuid::new_v4(),
            create_date: Utc::now(),
            data: Map::new(),
        })
    }

    pub fn with_alternative_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternative_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_term_regex(mut self, term_regex: impl Into<String>) -> Self {
        self.term_regex = Some(term_regex.into());
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Create a term addressed under this collection (not inserted)
    pub fn new_term(&self, raw_name: impl Into<String>) -> Result<Term, ModelError> {
        Term::new(&self.namespace, raw_name)
    }

    /// Insert a term, keeping canonical-name order and uniqueness
    pub fn insert_term(&mut self, term: Term) -> Result<(), ModelError> {
        if term.namespace.parent().as_ref() != Some(&self.namespace) {
            return Err(ModelError::ForeignTerm {
                collection: self.namespace.to_string(),
                term: term.namespace.to_string(),
            });
        }
        insert_sorted(&mut self.terms, term).map_err(|name| ModelError::DuplicateTerm {
            collection: self.namespace.to_string(),
            name,
        })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn term_regex(&self) -> Option<&str> {
        self.term_regex.as_deref()
    }

    /// Terms ordered by canonical name
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Look up a term by any of its names
    pub fn term(&self, name: &str) -> Option<&Term> {
        find_named(&self.terms, name)
    }

    /// A virtual collection enumerates no terms
    pub fn is_virtual(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn uid(&self) -> Uuid {
        self.uid
    }

    pub fn create_date(&self) -> DateTime<Utc> {
        self.create_date
    }

    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl_named!(Collection);

// ============================================================================
// SCOPE
// ============================================================================

/// A named grouping of collections, typically a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    namespace: Namespace,
    name: String,
    raw_name: String,
    #[serde(default)]
    alternative_names: BTreeSet<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    collections: Vec<Collection>,
    uid: Uuid,
    create_date: DateTime<Utc>,
    #[serde(default)]
    data: Map<String, Value>,
}

impl Scope {
    pub fn new(authority: &Namespace, raw_name: impl Into<String>) -> Result<Self, ModelError> {
        let raw_name = raw_name.into();
        if authority.depth() != 1 {
            return Err(ModelError::InvalidNamespace {
                namespace: authority.to_string(),
                reason: "scopes must be created under an authority namespace".to_string(),
            });
        }
        let namespace = authority.child(&raw_name)?;
        Ok(Self {
            name: namespace.leaf().to_string(),
            namespace,
            raw_name: raw_name.trim().to_string(),
            alternative_names: BTreeSet::new(),
            description: None,
            collections: Vec::new(),
            uid: Uuid::new_v4(),
            create_date: Utc::now(),
            data: Map::new(),
        })
    }

    pub fn with_alternative_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternative_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Create a collection addressed under this scope (not inserted)
    pub fn new_collection(&self, raw_name: impl Into<String>) -> Result<Collection, ModelError> {
        Collection::new(&self.namespace, raw_name)
    }

    pub fn insert_collection(&mut self, collection: Collection) -> Result<(), ModelError> {
        if collection.namespace.parent().as_ref() != Some(&self.namespace) {
            return Err(ModelError::InvalidNamespace {
                namespace: collection.namespace.to_string(),
                reason: format!("collection does not belong to scope '{}'", self.namespace),
            });
        }
        insert_sorted(&mut self.collections, collection).map_err(|name| {
            ModelError::InvalidName {
                name,
                reason: format!("duplicate collection in scope '{}'", self.namespace),
            }
        })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        find_named(&self.collections, name)
    }

    pub fn uid(&self) -> Uuid {
        self.uid
    }

    pub fn create_date(&self) -> DateTime<Utc> {
        self.create_date
    }

    /// Typed access to auxiliary data, including raw parser templates
    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl_named!(Scope);

// ============================================================================
// AUTHORITY
// ============================================================================

/// Top-level governance namespace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authority {
    namespace: Namespace,
    name: String,
    raw_name: String,
    #[serde(default)]
    alternative_names: BTreeSet<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    scopes: Vec<Scope>,
    uid: Uuid,
    create_date: DateTime<Utc>,
    #[serde(default)]
    data: Map<String, Value>,
}

impl Authority {
    pub fn new(raw_name: impl Into<String>) -> Result<Self, ModelError> {
        let raw_name = raw_name.into();
        let namespace = Namespace::authority(&raw_name)?;
        Ok(Self {
            name: canonical_segment(&raw_name)?,
            namespace,
            raw_name: raw_name.trim().to_string(),
            alternative_names: BTreeSet::new(),
            description: None,
            scopes: Vec::new(),
            uid: Uuid::new_v4(),
            create_date: Utc::now(),
            data: Map::new(),
        })
    }

    pub fn with_alternative_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternative_names
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Create a scope addressed under this authority (not inserted)
    pub fn new_scope(&self, raw_name: impl Into<String>) -> Result<Scope, ModelError> {
        Scope::new(&self.namespace, raw_name)
    }

    pub fn insert_scope(&mut self, scope: Scope) -> Result<(), ModelError> {
        if scope.namespace.parent().as_ref() != Some(&self.namespace) {
            return Err(ModelError::InvalidNamespace {
                namespace: scope.namespace.to_string(),
                reason: format!("scope does not belong to authority '{}'", self.namespace),
            });
        }
        insert_sorted(&mut self.scopes, scope).map_err(|name| ModelError::InvalidName {
            name,
            reason: format!("duplicate scope in authority '{}'", self.namespace),
        })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn scope(&self, name: &str) -> Option<&Scope> {
        find_named(&self.scopes, name)
    }

    pub fn uid(&self) -> Uuid {
        self.uid
    }

    pub fn create_date(&self) -> DateTime<Utc> {
        self.create_date
    }

    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl_named!(Authority);
