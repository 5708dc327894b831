//! Raw reading values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single value as returned by a reader, after any modifier or scaling.
///
/// Devices frequently report counters as numeric-looking strings, so `Text`
/// is a first-class variant and is interpreted numerically on demand.
/// `UInt` holds 64-bit counters above `i64::MAX`; untagged deserialization
/// tries it before `Float` so they keep full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Integer-truncated numeric view, used for bound checks.
    ///
    /// `i128` covers the whole `i64` and `u64` range. Returns `None` for
    /// non-finite floats and text that does not look like a number.
    pub fn as_truncated_int(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(i128::from(*v)),
            Value::UInt(v) => Some(i128::from(*v)),
            Value::Float(v) => truncate(*v),
            Value::Text(s) => {
                let s = s.trim();
                s.parse::<i128>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(truncate))
            }
        }
    }

    /// Exact integer view: integers and integer text only, no floats.
    pub fn as_exact_int(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(i128::from(*v)),
            Value::UInt(v) => Some(i128::from(*v)),
            Value::Float(_) => None,
            Value::Text(s) => s.trim().parse::<i128>().ok(),
        }
    }

    /// Floating point view, used for scaling and rate computation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    /// Whether the value can be interpreted numerically at all.
    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }
}

fn truncate(v: f64) -> Option<i128> {
    // Saturates beyond the i128 range, which still orders correctly against bounds.
    v.is_finite().then(|| v.trunc() as i128)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            // Integral floats keep a trailing ".0" so scaled series stay floats.
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Value::UInt(v), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
