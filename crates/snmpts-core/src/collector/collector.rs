//! Per-device collector that runs every metric once per cycle.
//!
//! The collector owns the skip-and-continue policy: a metric whose reader,
//! resolver or modifier fails is reported and the remaining metrics still run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::collector::device::Device;
use crate::collector::metric::Metric;
use crate::collector::traits::{Clock, Reader, SystemClock};
use crate::error::ProcessError;

/// Timing and volume information for one cycle.
#[derive(Debug, Clone, Default)]
pub struct CollectorTiming {
    /// Total cycle time.
    pub total: Duration,
    /// Slowest single metric and its name.
    pub slowest: Option<(String, Duration)>,
    /// Metrics processed without error.
    pub metrics_ok: usize,
    /// Metrics that failed.
    pub metrics_failed: usize,
    /// Lines produced.
    pub lines: usize,
}

/// Output of one collection cycle.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub lines: Vec<String>,
    pub failures: Vec<ProcessError>,
}

/// Collects all metrics defined for one device.
pub struct Collector<C: Clock = SystemClock> {
    device: Arc<Device>,
    metrics: Vec<Metric>,
    clock: C,
    /// Timing information from the last collect_cycle call.
    last_timing: Option<CollectorTiming>,
}

impl Collector<SystemClock> {
    /// Creates a collector using the system clock.
    pub fn new(device: Arc<Device>, metrics: Vec<Metric>) -> Self {
        Self::with_clock(device, metrics, SystemClock)
    }
}

impl<C: Clock> Collector<C> {
    pub fn with_clock(device: Arc<Device>, metrics: Vec<Metric>, clock: C) -> Self {
        Self {
            device,
            metrics,
            clock,
            last_timing: None,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Returns timing information from the last collect_cycle call.
    pub fn last_timing(&self) -> Option<&CollectorTiming> {
        self.last_timing.as_ref()
    }

    /// Runs every metric once against `reader`.
    ///
    /// Lines from successful metrics are kept even when others fail.
    pub fn collect_cycle(&mut self, reader: &dyn Reader) -> CycleReport {
        let start = Instant::now();
        let mut report = CycleReport::default();
        let mut timing = CollectorTiming::default();

        for metric in &self.metrics {
            let t = Instant::now();
            match metric.collect(reader, &self.clock) {
                Ok(lines) => {
                    timing.metrics_ok += 1;
                    report.lines.extend(lines);
                }
                Err(e) => {
                    debug!("{}: metric {} failed", self.device.hostname(), metric.name());
                    timing.metrics_failed += 1;
                    report.failures.push(e);
                }
            }
            let elapsed = t.elapsed();
            if timing.slowest.as_ref().is_none_or(|(_, d)| elapsed > *d) {
                timing.slowest = Some((metric.name().to_string(), elapsed));
            }
        }

        timing.total = start.elapsed();
        timing.lines = report.lines.len();
        debug!(
            "{}: {} lines from {} metrics ({} failed) in {:?}",
            self.device.hostname(),
            timing.lines,
            self.metrics.len(),
            timing.metrics_failed,
            timing.total
        );
        self.last_timing = Some(timing);
        report
    }
}
