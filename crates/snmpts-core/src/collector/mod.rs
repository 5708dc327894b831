//! Sample collection: metric definitions, the per-sample pipeline and the
//! collaborator traits it consumes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Collector                           │
//! │   one per device, runs every Metric once per cycle           │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ Metric (Scalar | Table)                                │  │
//! │  │  clamp → resolve → modify → multiply → format_line     │  │
//! │  └───────┬──────────────────┬──────────────────┬──────────┘  │
//! └──────────┼──────────────────┼──────────────────┼─────────────┘
//!            │                  │                  │
//!      ┌─────▼─────┐     ┌──────▼─────┐     ┌──────▼─────┐
//!      │  Reader   │     │  Resolver  │     │  Modifier  │  (traits)
//!      └─────┬─────┘     └──────┬─────┘     └──────┬─────┘
//!            │                  │                  │
//!      MockReader        IndexResolver       RateModifier
//!                        StaticResolver
//! ```
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use snmpts_core::collector::{Collector, Device, Metric, MetricSpec, MockReader};
//! use snmpts_core::collector::mock::scenarios::SYS_UPTIME;
//!
//! let device = Arc::new(Device::new("sw1"));
//! let metric = Metric::new(&MetricSpec::get("sys.uptime", SYS_UPTIME), device.clone()).unwrap();
//! let mut collector = Collector::new(device, vec![metric]);
//! let report = collector.collect_cycle(&MockReader::typical_switch());
//! assert_eq!(report.lines.len(), 1);
//! ```

pub mod clamp;
#[allow(clippy::module_inception)]
mod collector;
pub mod device;
pub mod metric;
pub mod mock;
mod processor;
pub mod resolver;
pub mod traits;

pub use clamp::{Bounds, clamp};
pub use collector::{Collector, CollectorTiming, CycleReport};
pub use device::Device;
pub use metric::{Metric, MetricKind, MetricSpec, Mode};
pub use mock::MockReader;
pub use resolver::{IndexResolver, StaticResolver};
pub use traits::{Clock, MemorySink, Modifier, Reader, Resolver, Sink, SystemClock, WriterSink};
