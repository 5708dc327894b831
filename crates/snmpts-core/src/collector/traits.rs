//! Collaborator abstractions consumed by the sample processor.
//!
//! The processor never talks to a transport, a tag database or a rate store
//! directly. Everything with I/O or cross-cycle state sits behind one of these
//! traits so that production implementations and in-memory mocks are
//! interchangeable.

use std::io::{self, Write};

use chrono::{DateTime, Utc};

use crate::collector::device::Device;
use crate::error::{CollaboratorError, ReadError};
use crate::tags::TagSet;
use crate::value::Value;

/// Rows returned by a table walk, in the order the reader produced them.
pub type WalkRows = Vec<(String, Option<Value>)>;

/// Transport session to a polled device (SNMP-like).
pub trait Reader {
    /// Fetches a single scalar value.
    ///
    /// # Arguments
    /// * `address` - Opaque source address (e.g. an OID)
    ///
    /// # Returns
    /// The value, `None` if the device has no data for the address, or a
    /// transport error.
    fn get(&self, address: &str) -> Result<Option<Value>, ReadError>;

    /// Walks a table rooted at `address`.
    ///
    /// # Arguments
    /// * `address` - Opaque table address
    /// * `start` - First index to include, if bounded
    /// * `end` - First index to exclude, if bounded
    ///
    /// # Returns
    /// Index to value rows. Individual values may be absent.
    fn walk(
        &self,
        address: &str,
        start: Option<u64>,
        end: Option<u64>,
    ) -> Result<WalkRows, ReadError>;
}

/// Resolves a table index into descriptive tags.
pub trait Resolver: Send + Sync {
    /// Returns extra tags for `index`, or `None` when nothing is known.
    fn resolve(&self, index: &str, device: &Device) -> Result<Option<TagSet>, CollaboratorError>;
}

/// Stateful value transform keyed by series identity (e.g. a rate).
///
/// Implementations keep their own per-series state and must tolerate calls
/// from whatever threads the collector uses. Calls for one series are expected
/// in monotonic timestamp order.
pub trait Modifier: Send + Sync {
    /// Returns the transformed value, or `None` when no value can be produced
    /// yet (for example the first observation of a counter).
    fn modify(
        &self,
        series: &str,
        timestamp: DateTime<Utc>,
        value: &Value,
    ) -> Result<Option<Value>, CollaboratorError>;
}

/// Wall clock used to timestamp samples.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Destination for formatted lines.
pub trait Sink {
    fn send(&mut self, lines: &[String]) -> io::Result<()>;
}

/// Sink writing one line per data point to any `Write`.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn send(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            self.writer.write_all(line.as_bytes())?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()
    }
}

/// Sink that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns and clears the collected lines.
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

impl Sink for MemorySink {
    fn send(&mut self, lines: &[String]) -> io::Result<()> {
        self.lines.extend_from_slice(lines);
        Ok(())
    }
}
