//! In-memory mock reader for testing collectors without a device.
//!
//! `MockReader` stores scalar values and tables in memory and can also be
//! loaded from a JSON fixture, which the daemon uses as a replay source.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::collector::traits::{Reader, WalkRows};
use crate::error::ReadError;
use crate::value::Value;

/// In-memory reader.
///
/// Fixture format:
///
/// ```json
/// {
///   "scalars": { "1.3.6.1.2.1.1.3.0": 12345 },
///   "tables": { "1.3.6.1.2.1.2.2.1.10": [["1", 10], ["2", null]] }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MockReader {
    /// Map from address to scalar value.
    #[serde(default)]
    scalars: HashMap<String, Option<Value>>,
    /// Map from address to table rows, in walk order.
    #[serde(default)]
    tables: HashMap<String, WalkRows>,
    /// Addresses that fail with a transport error.
    #[serde(skip)]
    failing: HashSet<String>,
}

impl MockReader {
    /// Creates a new empty mock reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a scalar value (or explicit absence) at `address`.
    pub fn add_scalar(&mut self, address: impl Into<String>, value: Option<Value>) {
        self.scalars.insert(address.into(), value);
    }

    /// Appends a table row under `address`.
    pub fn add_row(&mut self, address: impl Into<String>, index: impl Into<String>, value: Option<Value>) {
        self.tables
            .entry(address.into())
            .or_default()
            .push((index.into(), value));
    }

    /// Makes every request for `address` fail.
    pub fn fail(&mut self, address: impl Into<String>) {
        self.failing.insert(address.into());
    }

    /// Parses a single-device fixture.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Parses a multi-device fixture: `{ "<hostname>": <fixture>, ... }`.
    pub fn fixtures_from_json(json: &str) -> serde_json::Result<HashMap<String, Self>> {
        serde_json::from_str(json)
    }

    fn check(&self, address: &str) -> Result<(), ReadError> {
        if self.failing.contains(address) {
            return Err(ReadError::Transport {
                address: address.to_string(),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Leading numeric component of a table index ("3" for "3.1").
fn index_number(index: &str) -> Option<u64> {
    index.split('.').next()?.parse().ok()
}

impl Reader for MockReader {
    fn get(&self, address: &str) -> Result<Option<Value>, ReadError> {
        self.check(address)?;
        Ok(self.scalars.get(address).cloned().flatten())
    }

    fn walk(
        &self,
        address: &str,
        start: Option<u64>,
        end: Option<u64>,
    ) -> Result<WalkRows, ReadError> {
        self.check(address)?;
        let Some(rows) = self.tables.get(address) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .iter()
            .filter(|(index, _)| match index_number(index) {
                Some(n) => start.is_none_or(|s| n >= s) && end.is_none_or(|e| n < e),
                None => true,
            })
            .cloned()
            .collect())
    }
}
