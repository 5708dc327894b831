//! Line protocol formatting.
//!
//! One data point per line:
//!
//! ```text
//! put <name> <epoch_seconds> <value> host=<hostname>[ <tag>=<value> ...]
//! ```

use crate::value::Value;

/// Formats a single `put` line.
///
/// `tags` is the already serialized tag string (see [`crate::tags::TagSet::to_tag_string`]).
pub fn format_line(name: &str, epoch_secs: i64, value: &Value, tags: &str) -> String {
    format!("put {} {} {} {}", name, epoch_secs, value, tags)
}
