//! Value validation against configured bounds.

use crate::value::Value;

/// Inclusive `[min, max]` bounds; an unset side is unbounded.
///
/// Stored as `i128` so 64-bit unsigned counters compare without clipping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub min: Option<i128>,
    pub max: Option<i128>,
}

impl Bounds {
    pub fn new(min: Option<i128>, max: Option<i128>) -> Self {
        Self { min, max }
    }

    /// Whether the integer `v` violates either bound.
    pub fn violated_by(&self, v: i128) -> bool {
        self.max.is_some_and(|max| v > max) || self.min.is_some_and(|min| v < min)
    }
}

/// Validates a raw reading.
///
/// Returns `None` for an absent reading. A reading that is non-numeric or
/// whose integer-truncated value falls outside `bounds` is swapped for
/// `replacement`, which may itself be absent. Anything else passes through
/// unchanged.
pub fn clamp(value: Option<Value>, bounds: &Bounds, replacement: Option<&Value>) -> Option<Value> {
    let value = value?;
    match value.as_truncated_int() {
        Some(v) if !bounds.violated_by(v) => Some(value),
        _ => replacement.cloned(),
    }
}
