//! Process image: the boolean signal table shared by the engine and its readers.

#![allow(missing_docs)]

use serde::Serialize;
use smol_str::SmolStr;

use crate::tag::{TagId, TagRegistry};

/// Tag → bool table with an embedded tag registry.
///
/// Every registered tag has a value (default `false`). Entries are never
/// removed; clearing only resets values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessImage {
    registry: TagRegistry,
    values: Vec<bool>,
}

/// One tag whose value differs between two images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagChange {
    pub tag: SmolStr,
    pub before: bool,
    pub after: bool,
}

impl ProcessImage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an image with the given tags pre-registered as `false`.
    pub fn with_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        let mut image = Self::new();
        for tag in tags {
            image.register_tag(tag);
        }
        image
    }

    /// Register a tag, inserting it with `false` when new.
    pub fn register_tag(&mut self, name: &str) -> Option<TagId> {
        let id = self.registry.register_tag(name)?;
        if id.index() >= self.values.len() {
            self.values.resize(id.index() + 1, false);
        }
        Some(id)
    }

    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<TagId> {
        self.registry.resolve(name)
    }

    #[must_use]
    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    #[must_use]
    pub fn name(&self, id: TagId) -> Option<&SmolStr> {
        self.registry.name(id)
    }

    /// Value of a registered tag; ids from another registry read as `false`.
    #[must_use]
    pub fn get(&self, id: TagId) -> bool {
        self.values.get(id.index()).copied().unwrap_or(false)
    }

    pub fn set(&mut self, id: TagId, value: bool) {
        if let Some(slot) = self.values.get_mut(id.index()) {
            *slot = value;
        }
    }

    /// Read by name; unknown or blank tags read as `false`.
    #[must_use]
    pub fn read(&self, name: &str) -> bool {
        self.resolve(name).is_some_and(|id| self.get(id))
    }

    /// Write by name, registering the tag on first use.
    ///
    /// Returns `None` when the name is blank.
    pub fn write(&mut self, name: &str, value: bool) -> Option<TagId> {
        let id = self.register_tag(name)?;
        self.set(id, value);
        Some(id)
    }

    /// Reset every value to `false`, keeping all entries.
    pub fn clear_values(&mut self) {
        self.values.fill(false);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read-all in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, bool)> {
        self.registry
            .iter()
            .map(|(id, name)| (name, self.get(id)))
    }

    /// Tags whose value in `next` differs from `self`, in `next`'s order.
    ///
    /// Tags unknown to `self` compare against `false`.
    #[must_use]
    pub fn diff(&self, next: &ProcessImage) -> Vec<TagChange> {
        next.iter()
            .filter_map(|(name, after)| {
                let before = self.read(name);
                (before != after).then(|| TagChange {
                    tag: name.clone(),
                    before,
                    after,
                })
            })
            .collect()
    }
}
