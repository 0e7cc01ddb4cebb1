//! Vocabulary naming rules

use std::collections::BTreeSet;

use crate::error::ModelError;

/// Normalise a raw name into its canonical form.
///
/// Canonical names are trimmed, lower-cased, and use `-` in place of `_`
/// and spaces: `"Activity_ID"` becomes `"activity-id"`.
pub fn to_canonical_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '_' | ' ' => '-',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Canonicalise and validate a name for use as a namespace segment
pub(crate) fn canonical_segment(raw: &str) -> Result<String, ModelError> {
    let name = to_canonical_name(raw);
    if name.is_empty() {
        return Err(ModelError::InvalidName {
            name: raw.to_string(),
            reason: "name is empty".to_string(),
        });
    }
    if name.contains(':') {
        return Err(ModelError::InvalidName {
            name: raw.to_string(),
            reason: "name contains the namespace delimiter ':'".to_string(),
        });
    }
    Ok(name)
}

/// Anything carrying canonical, raw and alternative names
pub trait Named {
    /// Canonical (normalised) name
    fn name(&self) -> &str;

    /// Original-case display name
    fn raw_name(&self) -> &str;

    /// Synonyms
    fn alternative_names(&self) -> &BTreeSet<String>;

    /// Case-sensitive match against canonical, raw or alternative names
    fn is_named(&self, candidate: &str) -> bool {
        self.name() == candidate
            || self.raw_name() == candidate
            || self.alternative_names().iter().any(|n| n == candidate)
    }

    /// Case-insensitive match against canonical, raw or alternative names
    fn is_named_ignore_case(&self, candidate: &str) -> bool {
        self.name().eq_ignore_ascii_case(candidate)
            || self.raw_name().eq_ignore_ascii_case(candidate)
            || self
                .alternative_names()
                .iter()
                .any(|n| n.eq_ignore_ascii_case(candidate))
    }

    /// All names in canonical form, used for loose comparisons
    fn canonical_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        names.insert(self.name().to_string());
        names.insert(to_canonical_name(self.raw_name()));
        names.extend(self.alternative_names().iter().map(|n| to_canonical_name(n)));
        names
    }
}
