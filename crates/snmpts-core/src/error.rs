//! Error types shared across the collector.
//!
//! Absent data is never an error: it is modelled as `Option::None` and simply
//! produces no output line. The enums below cover configuration mistakes and
//! collaborator failures only.

use std::path::PathBuf;

/// Boxed error returned by resolver and modifier implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A reader (transport) failed to fetch data from the device.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("request to {address} timed out")]
    Timeout { address: String },

    #[error("transport error for {address}: {message}")]
    Transport { address: String, message: String },
}

/// A resolver or modifier failed.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct CollaboratorError(#[source] pub BoxError);

impl CollaboratorError {
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self(message.into())
    }
}

/// A metric definition could not be constructed.
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    #[error("metric name is empty")]
    MissingName,

    #[error("metric '{metric}': resolver '{resolver}' not found on device {host}")]
    UnknownResolver {
        metric: String,
        resolver: String,
        host: String,
    },

    #[error("metric '{metric}': value modifier '{modifier}' not found on device {host}")]
    UnknownModifier {
        metric: String,
        modifier: String,
        host: String,
    },

    #[error("metric '{metric}': index range [{start}, {end}) is empty")]
    InvalidRange { metric: String, start: u64, end: u64 },

    #[error("metric '{metric}': min_val {min} exceeds max_val {max}")]
    InvalidBounds { metric: String, min: i128, max: i128 },

    #[error("metric '{metric}': {field} '{value}' is not numeric")]
    NonNumericBound {
        metric: String,
        field: &'static str,
        value: String,
    },
}

/// Processing of one metric failed because a collaborator failed.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("metric '{metric}': read failed: {source}")]
    Read {
        metric: String,
        #[source]
        source: ReadError,
    },

    #[error("metric '{metric}': resolver failed for index {index}: {source}")]
    Resolve {
        metric: String,
        index: String,
        #[source]
        source: CollaboratorError,
    },

    #[error("metric '{metric}': value modifier failed for series {series}: {source}")]
    Modify {
        metric: String,
        series: String,
        #[source]
        source: CollaboratorError,
    },
}

/// Configuration could not be loaded or turned into metrics.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("device {host}: {source}")]
    Metric {
        host: String,
        #[source]
        source: MetricError,
    },
}
