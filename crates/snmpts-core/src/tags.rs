//! Tag sets attached to data points.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reserved key for the device host tag.
pub const HOST_TAG: &str = "host";

/// Ordered tag set.
///
/// Keys iterate lexicographically, so the serialized tag string (and the
/// series identity handed to value modifiers) is stable regardless of the
/// order tags were configured or returned by a resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a tag, returning the previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `self` overlaid with `overlay`; overlay entries win on collision.
    pub fn merged(&self, overlay: &TagSet) -> TagSet {
        let mut out = self.clone();
        for (k, v) in overlay.iter() {
            out.insert(k, v);
        }
        out
    }

    /// Serializes as `host=<host>[ key=value ...]`.
    ///
    /// The host tag always comes first and always reflects `host`; a `host`
    /// entry inside the set is skipped.
    pub fn to_tag_string(&self, host: &str) -> String {
        let mut buf = format!("{}={}", HOST_TAG, host);
        for (k, v) in self.iter().filter(|(k, _)| *k != HOST_TAG) {
            buf.push(' ');
            buf.push_str(k);
            buf.push('=');
            buf.push_str(v);
        }
        buf
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
