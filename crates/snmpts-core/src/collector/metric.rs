//! Metric definitions.
//!
//! A [`MetricSpec`] is the configuration shape; [`Metric::new`] validates it
//! against a [`Device`] and binds the resolver and value modifier it names.
//! Lookups happen exactly once, so a definition that references a missing
//! capability fails before any collection cycle runs.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collector::clamp::Bounds;
use crate::collector::device::{DEFAULT_RESOLVER, Device, RATE_MODIFIER};
use crate::collector::traits::{Modifier, Resolver};
use crate::error::MetricError;
use crate::tags::TagSet;
use crate::value::Value;

/// How a metric is fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Single scalar get.
    #[default]
    Get,
    /// Table walk, one series per index.
    Walk,
}

/// Configuration for one metric, as found in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub metric: String,
    #[serde(default)]
    pub tags: TagSet,
    pub oid: String,
    #[serde(default, rename = "type")]
    pub kind: MetricKind,
    #[serde(default)]
    pub multiply: Option<f64>,
    #[serde(default)]
    pub rate: bool,
    #[serde(default = "default_resolver")]
    pub resolver: String,
    #[serde(default)]
    pub startidx: Option<u64>,
    #[serde(default)]
    pub endidx: Option<u64>,
    // Bounds are truncated to integers like the readings they check.
    #[serde(default)]
    pub min_val: Option<Value>,
    #[serde(default)]
    pub max_val: Option<Value>,
    #[serde(default)]
    pub replacement_val: Option<Value>,
}

fn default_resolver() -> String {
    DEFAULT_RESOLVER.to_string()
}

impl MetricSpec {
    /// Scalar metric with no tags, bounds or transforms.
    pub fn get(metric: impl Into<String>, oid: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            tags: TagSet::new(),
            oid: oid.into(),
            kind: MetricKind::Get,
            multiply: None,
            rate: false,
            resolver: default_resolver(),
            startidx: None,
            endidx: None,
            min_val: None,
            max_val: None,
            replacement_val: None,
        }
    }

    /// Table metric using the default resolver.
    pub fn walk(metric: impl Into<String>, oid: impl Into<String>) -> Self {
        Self {
            kind: MetricKind::Walk,
            ..Self::get(metric, oid)
        }
    }
}

/// Fetch mode, fixed at construction.
pub enum Mode {
    Scalar,
    Table {
        start: Option<u64>,
        end: Option<u64>,
        resolver: Arc<dyn Resolver>,
    },
}

impl fmt::Debug for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Scalar => f.write_str("Scalar"),
            Mode::Table { start, end, .. } => f
                .debug_struct("Table")
                .field("start", start)
                .field("end", end)
                .finish_non_exhaustive(),
        }
    }
}

/// A validated, immutable metric definition bound to its device.
pub struct Metric {
    pub(crate) name: String,
    pub(crate) tags: TagSet,
    pub(crate) address: String,
    pub(crate) device: Arc<Device>,
    pub(crate) mode: Mode,
    pub(crate) multiplier: Option<f64>,
    pub(crate) modifier: Option<Arc<dyn Modifier>>,
    pub(crate) bounds: Bounds,
    pub(crate) replacement: Option<Value>,
}

impl Metric {
    /// Builds a metric from its spec.
    ///
    /// # Errors
    /// * [`MetricError::UnknownResolver`] - walk metric names a resolver the device lacks
    /// * [`MetricError::UnknownModifier`] - `rate` is set but the device has no rate modifier
    /// * [`MetricError::InvalidRange`] / [`MetricError::InvalidBounds`] - inverted range or bounds
    /// * [`MetricError::NonNumericBound`] - `min_val` or `max_val` is not a number
    pub fn new(spec: &MetricSpec, device: Arc<Device>) -> Result<Self, MetricError> {
        if spec.metric.trim().is_empty() {
            return Err(MetricError::MissingName);
        }

        if let (Some(start), Some(end)) = (spec.startidx, spec.endidx)
            && start >= end
        {
            return Err(MetricError::InvalidRange {
                metric: spec.metric.clone(),
                start,
                end,
            });
        }

        let min = bound(&spec.metric, "min_val", spec.min_val.as_ref())?;
        let max = bound(&spec.metric, "max_val", spec.max_val.as_ref())?;
        if let (Some(min), Some(max)) = (min, max)
            && min > max
        {
            return Err(MetricError::InvalidBounds {
                metric: spec.metric.clone(),
                min,
                max,
            });
        }

        let modifier = if spec.rate {
            Some(
                device
                    .modifier(RATE_MODIFIER)
                    .ok_or_else(|| MetricError::UnknownModifier {
                        metric: spec.metric.clone(),
                        modifier: RATE_MODIFIER.to_string(),
                        host: device.hostname().to_string(),
                    })?,
            )
        } else {
            None
        };

        let mode = match spec.kind {
            MetricKind::Get => Mode::Scalar,
            MetricKind::Walk => {
                let resolver =
                    device
                        .resolver(&spec.resolver)
                        .ok_or_else(|| MetricError::UnknownResolver {
                            metric: spec.metric.clone(),
                            resolver: spec.resolver.clone(),
                            host: device.hostname().to_string(),
                        })?;
                Mode::Table {
                    start: spec.startidx,
                    end: spec.endidx,
                    resolver,
                }
            }
        };

        Ok(Self {
            name: spec.metric.clone(),
            tags: spec.tags.clone(),
            address: spec.oid.clone(),
            device,
            mode,
            // A zero multiplier means "not configured".
            multiplier: spec.multiply.filter(|m| *m != 0.0),
            modifier,
            bounds: Bounds::new(min, max),
            replacement: spec.replacement_val.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        self.device.hostname()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_table(&self) -> bool {
        matches!(self.mode, Mode::Table { .. })
    }
}

/// Truncates a configured bound the same way readings are truncated.
fn bound(
    metric: &str,
    field: &'static str,
    value: Option<&Value>,
) -> Result<Option<i128>, MetricError> {
    value
        .map(|v| {
            v.as_truncated_int()
                .ok_or_else(|| MetricError::NonNumericBound {
                    metric: metric.to_string(),
                    field,
                    value: v.to_string(),
                })
        })
        .transpose()
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metric")
            .field("name", &self.name)
            .field("host", &self.host())
            .field("address", &self.address)
            .field("tags", &self.tags)
            .field("mode", &self.mode)
            .field("multiplier", &self.multiplier)
            .field("rate", &self.modifier.is_some())
            .field("bounds", &self.bounds)
            .field("replacement", &self.replacement)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::resolver::StaticResolver;

    fn device() -> Arc<Device> {
        Arc::new(Device::new("sw1").with_resolver("ifname", StaticResolver::new()))
    }

    #[test]
    fn walk_with_unknown_resolver_fails_at_construction() {
        let spec = MetricSpec {
            resolver: "nope".to_string(),
            ..MetricSpec::walk("if.octets", "1.3.6.1.2.1.31.1.1.1.6")
        };
        let err = Metric::new(&spec, device()).unwrap_err();
        assert!(matches!(err, MetricError::UnknownResolver { ref resolver, .. } if resolver == "nope"));
    }

    #[test]
    fn scalar_ignores_resolver_name() {
        let spec = MetricSpec {
            resolver: "nope".to_string(),
            ..MetricSpec::get("sys.uptime", "1.3.6.1.2.1.1.3.0")
        };
        let metric = Metric::new(&spec, device()).unwrap();
        assert!(!metric.is_table());
    }

    #[test]
    fn walk_binds_named_resolver() {
        let spec = MetricSpec {
            resolver: "ifname".to_string(),
            startidx: Some(1),
            endidx: Some(48),
            ..MetricSpec::walk("if.octets", "1.3.6.1.2.1.31.1.1.1.6")
        };
        let metric = Metric::new(&spec, device()).unwrap();
        assert!(matches!(
            metric.mode(),
            Mode::Table {
                start: Some(1),
                end: Some(48),
                ..
            }
        ));
    }

    #[test]
    fn rate_requires_rate_modifier() {
        let spec = MetricSpec {
            rate: true,
            ..MetricSpec::get("sys.uptime", "1.3.6.1.2.1.1.3.0")
        };
        let bare = Arc::new(Device::bare("sw1"));
        assert!(matches!(
            Metric::new(&spec, bare),
            Err(MetricError::UnknownModifier { .. })
        ));
        assert!(Metric::new(&spec, device()).unwrap().modifier.is_some());
    }

    #[test]
    fn rejects_inverted_range_and_bounds() {
        let range = MetricSpec {
            startidx: Some(5),
            endidx: Some(5),
            ..MetricSpec::walk("m", "1")
        };
        assert!(matches!(
            Metric::new(&range, device()),
            Err(MetricError::InvalidRange { .. })
        ));

        let bounds = MetricSpec {
            min_val: Some(Value::Int(10)),
            max_val: Some(Value::Int(1)),
            ..MetricSpec::get("m", "1")
        };
        assert!(matches!(
            Metric::new(&bounds, device()),
            Err(MetricError::InvalidBounds { .. })
        ));

        assert!(matches!(
            Metric::new(&MetricSpec::get(" ", "1"), device()),
            Err(MetricError::MissingName)
        ));
    }

    #[test]
    fn bounds_accept_text_and_float_values() {
        let spec: MetricSpec = serde_json::from_str(
            r#"{"metric": "cpu.load", "oid": "1", "min_val": 99.5, "max_val": "100"}"#,
        )
        .unwrap();
        assert_eq!(spec.min_val, Some(Value::Float(99.5)));
        assert_eq!(spec.max_val, Some(Value::from("100")));

        let metric = Metric::new(&spec, device()).unwrap();
        assert_eq!(metric.bounds, Bounds::new(Some(99), Some(100)));

        let spec = MetricSpec {
            max_val: Some(Value::from("lots")),
            ..MetricSpec::get("m", "1")
        };
        assert!(matches!(
            Metric::new(&spec, device()),
            Err(MetricError::NonNumericBound { field: "max_val", .. })
        ));
    }

    #[test]
    fn counter64_bounds_are_not_inverted() {
        let spec = MetricSpec {
            min_val: Some(Value::Int(0)),
            max_val: Some(Value::UInt(u64::MAX)),
            ..MetricSpec::get("if.octets", "1")
        };
        let metric = Metric::new(&spec, device()).unwrap();
        assert_eq!(metric.bounds.max, Some(i128::from(u64::MAX)));
    }

    #[test]
    fn zero_multiplier_is_unset() {
        let spec = MetricSpec {
            multiply: Some(0.0),
            ..MetricSpec::get("m", "1")
        };
        assert_eq!(Metric::new(&spec, device()).unwrap().multiplier, None);
    }

    #[test]
    fn spec_deserializes_with_defaults() {
        let spec: MetricSpec = serde_json::from_str(
            r#"{"metric": "if.in", "oid": "1.3.6.1.2.1.2.2.1.10", "type": "walk", "rate": true}"#,
        )
        .unwrap();
        assert_eq!(spec.kind, MetricKind::Walk);
        assert_eq!(spec.resolver, DEFAULT_RESOLVER);
        assert!(spec.rate);
        assert!(spec.tags.is_empty());
    }

    #[test]
    fn tags_are_not_shared_between_definitions() {
        let d = device();
        let mut spec = MetricSpec::get("a", "1");
        let first = Metric::new(&spec, d.clone()).unwrap();
        spec.tags.insert("dc", "ams");
        let second = Metric::new(&spec, d).unwrap();
        assert!(first.tags().is_empty());
        assert_eq!(second.tags().get("dc"), Some("ams"));
    }
}
