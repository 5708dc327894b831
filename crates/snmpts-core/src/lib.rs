//! snmpts-core — turns device readings into time-series `put` lines.
//!
//! Provides:
//! - `collector` — metric definitions, the per-sample pipeline, collaborator traits
//! - `config` — JSON configuration of devices and metrics
//! - `rates` — built-in per-second rate modifier
//! - `tags` — ordered tag sets
//! - `value` — raw reading values
//! - `fmt` — line protocol formatting
//! - `error` — error types

pub mod collector;
pub mod config;
pub mod error;
pub mod fmt;
pub mod rates;
pub mod tags;
pub mod value;

pub use error::{CollaboratorError, ConfigError, MetricError, ProcessError, ReadError};
pub use tags::TagSet;
pub use value::Value;
