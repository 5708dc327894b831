//! JSON configuration for devices and their metrics.
//!
//! ```json
//! {
//!   "devices": [
//!     {
//!       "hostname": "sw1",
//!       "resolvers": { "ifname": { "1": { "ifname": "eth0" } } },
//!       "metrics": [
//!         { "metric": "if.in.octets", "oid": "1.3.6.1.2.1.31.1.1.1.6",
//!           "type": "walk", "resolver": "ifname", "rate": true }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::collector::device::RATE_MODIFIER;
use crate::collector::{Clock, Collector, Device, Metric, MetricSpec, StaticResolver, SystemClock};
use crate::error::ConfigError;
use crate::rates::RateModifier;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// One polled device.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub hostname: String,
    /// Named index to tags tables, registered alongside the built-in resolvers.
    #[serde(default)]
    pub resolvers: BTreeMap<String, StaticResolver>,
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
}

impl Config {
    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    /// Builds one collector per device, polled every `interval`.
    ///
    /// Fails on the first invalid metric definition.
    pub fn build_collectors(&self, interval: Duration) -> Result<Vec<Collector>, ConfigError> {
        self.devices.iter().map(|d| d.build(interval)).collect()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}

impl DeviceConfig {
    /// Builds the device with its resolvers, then every metric against it.
    pub fn build(&self, interval: Duration) -> Result<Collector, ConfigError> {
        self.build_with_clock(interval, SystemClock)
    }

    /// Like [`DeviceConfig::build`] with an explicit clock.
    ///
    /// The rate modifier's max dt is sized for `interval`, so a slow poll
    /// still yields rates.
    pub fn build_with_clock<C: Clock>(
        &self,
        interval: Duration,
        clock: C,
    ) -> Result<Collector<C>, ConfigError> {
        let device = Device::new(&self.hostname)
            .with_modifier(RATE_MODIFIER, RateModifier::for_interval(interval));
        let device = self
            .resolvers
            .iter()
            .fold(device, |device, (name, resolver)| {
                device.with_resolver(name, resolver.clone())
            });
        let device = Arc::new(device);

        let metrics = self
            .metrics
            .iter()
            .map(|spec| Metric::new(spec, device.clone()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ConfigError::Metric {
                host: self.hostname.clone(),
                source,
            })?;

        Ok(Collector::with_clock(device, metrics, clock))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io::Write;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::collector::MockReader;
    use crate::error::MetricError;
    use crate::value::Value;

    const INTERVAL: Duration = Duration::from_secs(10);

    /// Advances by a fixed step on every reading.
    struct SteppingClock {
        next: Cell<i64>,
        step: i64,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let secs = self.next.get();
            self.next.set(secs + self.step);
            Utc.timestamp_opt(secs, 0).unwrap()
        }
    }

    const CONFIG: &str = r#"{
        "devices": [
            {
                "hostname": "sw1",
                "resolvers": { "ifname": { "1": { "ifname": "eth0" } } },
                "metrics": [
                    { "metric": "sys.uptime", "oid": "1.3.6.1.2.1.1.3.0", "tags": { "site": "ams1" } },
                    { "metric": "if.in.octets", "oid": "1.3.6.1.2.1.31.1.1.1.6",
                      "type": "walk", "resolver": "ifname", "rate": true, "multiply": 8 }
                ]
            },
            { "hostname": "sw2" }
        ]
    }"#;

    #[test]
    fn parses_and_builds() {
        let config: Config = CONFIG.parse().unwrap();
        assert_eq!(config.devices.len(), 2);

        let collectors = config.build_collectors(INTERVAL).unwrap();
        assert_eq!(collectors[0].device().hostname(), "sw1");
        assert_eq!(collectors[0].metrics().len(), 2);
        assert!(collectors[0].metrics()[1].is_table());
        assert!(collectors[1].metrics().is_empty());
    }

    #[test]
    fn unknown_resolver_fails_build() {
        let config: Config = r#"{"devices": [{"hostname": "sw1", "metrics": [
            {"metric": "m", "oid": "1", "type": "walk", "resolver": "ifalias"}
        ]}]}"#
            .parse()
            .unwrap();
        let err = config.build_collectors(INTERVAL).err().unwrap();
        assert!(matches!(
            err,
            ConfigError::Metric {
                source: MetricError::UnknownResolver { .. },
                ..
            }
        ));
    }

    #[test]
    fn rates_survive_long_interval() {
        let config: Config = r#"{"devices": [{"hostname": "sw1", "metrics": [
            {"metric": "if.in", "oid": "octets", "rate": true}
        ]}]}"#
            .parse()
            .unwrap();
        let interval = Duration::from_secs(900);
        let clock = SteppingClock {
            next: Cell::new(1_700_000_000),
            step: 900,
        };
        let mut collector = config.devices[0].build_with_clock(interval, clock).unwrap();

        let mut reader = MockReader::new();
        for cycle in 0..5 {
            reader.add_scalar("octets", Some(Value::Int(1000 * cycle)));
            let report = collector.collect_cycle(&reader);
            assert!(report.failures.is_empty());
            if cycle == 0 {
                assert!(report.lines.is_empty());
                continue;
            }
            assert_eq!(report.lines.len(), 1, "cycle {}", cycle);
            let rate: f64 = report.lines[0]
                .split_whitespace()
                .nth(3)
                .unwrap()
                .parse()
                .unwrap();
            assert!((rate - 1000.0 / 900.0).abs() < 1e-9);
        }
    }

    #[test]
    fn invalid_json_is_parse_error() {
        assert!(matches!(
            "{ devices: ".parse::<Config>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.devices[0].metrics.len(), 2);

        assert!(matches!(
            Config::load("/nonexistent/snmpts.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
