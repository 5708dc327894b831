//! Built-in tag resolvers.

use std::collections::HashMap;

use serde::Deserialize;

use crate::collector::device::Device;
use crate::collector::traits::Resolver;
use crate::error::CollaboratorError;
use crate::tags::TagSet;

/// Tags every row with its raw table index: `index=<key>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexResolver;

impl Resolver for IndexResolver {
    fn resolve(&self, index: &str, _device: &Device) -> Result<Option<TagSet>, CollaboratorError> {
        let mut tags = TagSet::new();
        tags.insert("index", index);
        Ok(Some(tags))
    }
}

/// Fixed index to tags table, typically loaded from configuration.
///
/// Unknown indices resolve to nothing, leaving the metric's base tags alone.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(transparent)]
pub struct StaticResolver {
    entries: HashMap<String, TagSet>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, index: impl Into<String>, tags: TagSet) -> Self {
        self.entries.insert(index.into(), tags);
        self
    }
}

impl Resolver for StaticResolver {
    fn resolve(&self, index: &str, _device: &Device) -> Result<Option<TagSet>, CollaboratorError> {
        Ok(self.entries.get(index).cloned())
    }
}
