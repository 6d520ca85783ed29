//! Tag normalization and registry.

#![allow(missing_docs)]

use std::fmt;

use indexmap::IndexSet;
use smol_str::SmolStr;

/// Normalize a user-entered tag: trimmed and upper-cased.
///
/// Returns `None` when nothing is left after trimming.
#[must_use]
pub fn normalize_tag(raw: &str) -> Option<SmolStr> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(SmolStr::new(trimmed.to_uppercase()))
}

/// Dense handle for a registered tag.
///
/// Ids are stable for the lifetime of the registry that issued them; entries
/// are never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId(u32);

impl TagId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Insertion-ordered set of tag names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRegistry {
    names: IndexSet<SmolStr>,
}

impl TagRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` (normalized), returning the existing id when already known.
    pub fn register_tag(&mut self, name: &str) -> Option<TagId> {
        let name = normalize_tag(name)?;
        let (index, _) = self.names.insert_full(name);
        Some(TagId::from_index(index))
    }

    /// Look up a tag without registering it.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<TagId> {
        let name = normalize_tag(name)?;
        self.names.get_index_of(name.as_str()).map(TagId::from_index)
    }

    #[must_use]
    pub fn name(&self, id: TagId) -> Option<&SmolStr> {
        self.names.get_index(id.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TagId, &SmolStr)> {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (TagId::from_index(index), name))
    }
}
