//! In-memory reader for testing without a real device.

mod reader;
pub mod scenarios;

pub use reader::MockReader;
