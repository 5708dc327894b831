//! Pre-built mock device scenarios for testing.

use super::reader::MockReader;
use crate::value::Value;

/// sysUpTime.0
pub const SYS_UPTIME: &str = "1.3.6.1.2.1.1.3.0";
/// ifHCInOctets
pub const IF_HC_IN_OCTETS: &str = "1.3.6.1.2.1.31.1.1.1.6";
/// entPhySensorValue
pub const SENSOR_VALUE: &str = "1.3.6.1.2.1.99.1.1.1.4";

impl MockReader {
    /// A small switch: uptime, four interfaces (one without counters) and a
    /// few temperature sensors, one of which reports garbage.
    pub fn typical_switch() -> Self {
        let mut reader = Self::new();
        reader.add_scalar(SYS_UPTIME, Some(Value::Int(8_640_000)));

        reader.add_row(IF_HC_IN_OCTETS, "1", Some(Value::Int(1_000_000)));
        reader.add_row(IF_HC_IN_OCTETS, "2", None);
        reader.add_row(IF_HC_IN_OCTETS, "3", Some(Value::from("2500000")));
        reader.add_row(IF_HC_IN_OCTETS, "4", Some(Value::Int(0)));

        reader.add_row(SENSOR_VALUE, "1001", Some(Value::Int(41)));
        reader.add_row(SENSOR_VALUE, "1002", Some(Value::Int(38)));
        reader.add_row(SENSOR_VALUE, "1003", Some(Value::Int(-40)));
        reader
    }
}
