//! Built-in per-second rate modifier for monotonically increasing counters.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::collector::traits::Modifier;
use crate::error::CollaboratorError;
use crate::value::Value;

/// Maximum dt (seconds) between two observations of a series.
/// Allows up to ~20 missed 30s collection cycles + 5s tolerance.
pub const MAX_RATE_DT_SECS: f64 = 605.0;

/// Max dt for a daemon polling every `interval`.
///
/// Never below [`MAX_RATE_DT_SECS`]; long intervals still tolerate two
/// missed cycles plus 5s of jitter.
pub fn max_dt_for_interval(interval: Duration) -> f64 {
    MAX_RATE_DT_SECS.max(3.0 * interval.as_secs_f64() + 5.0)
}

/// Compute f64 delta, returning `None` on counter regression (wrap or reset).
pub fn df64(curr: f64, prev: f64) -> Option<f64> {
    (curr >= prev).then_some(curr - prev)
}

/// Compute exact integer delta, returning `None` on counter regression.
pub fn di128(curr: i128, prev: i128) -> Option<i128> {
    (curr >= prev).then_some(curr - prev)
}

/// A counter reading. Integers stay exact so 64-bit counters near `u64::MAX`
/// do not lose their low digits before subtraction.
#[derive(Debug, Clone, Copy)]
enum Counter {
    Exact(i128),
    Approx(f64),
}

impl Counter {
    fn of(value: &Value) -> Option<Self> {
        value
            .as_exact_int()
            .map(Counter::Exact)
            .or_else(|| value.as_f64().map(Counter::Approx))
    }

    fn as_f64(self) -> f64 {
        match self {
            Counter::Exact(v) => v as f64,
            Counter::Approx(v) => v,
        }
    }

    fn delta(self, prev: Counter) -> Option<f64> {
        match (self, prev) {
            (Counter::Exact(curr), Counter::Exact(prev)) => di128(curr, prev).map(|d| d as f64),
            _ => df64(self.as_f64(), prev.as_f64()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    ts: DateTime<Utc>,
    value: Counter,
}

#[derive(Debug, Default)]
struct RateState {
    series: HashMap<String, Observation>,
    /// When stale series were last swept.
    last_sweep: Option<DateTime<Utc>>,
}

/// Converts successive counter readings into a per-second rate.
///
/// State is keyed by series identity (metric name + tag string). The first
/// observation of a series is a baseline and yields no value. Any observation
/// that cannot produce a trustworthy rate (counter regression, time not
/// advancing, gap over the max dt) also yields no value and becomes the new
/// baseline.
///
/// Series unseen for longer than the max dt are evicted by a sweep that runs
/// at most once per max dt window, so per-call cost stays constant.
#[derive(Debug)]
pub struct RateModifier {
    max_dt_secs: f64,
    state: Mutex<RateState>,
}

impl Default for RateModifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RateModifier {
    pub fn new() -> Self {
        Self::with_max_dt(MAX_RATE_DT_SECS)
    }

    /// Rate modifier whose max dt fits a collection `interval`.
    pub fn for_interval(interval: Duration) -> Self {
        Self::with_max_dt(max_dt_for_interval(interval))
    }

    pub fn with_max_dt(max_dt_secs: f64) -> Self {
        Self {
            max_dt_secs,
            state: Mutex::new(RateState::default()),
        }
    }

    pub fn max_dt_secs(&self) -> f64 {
        self.max_dt_secs
    }

    /// Number of series with a stored baseline.
    pub fn tracked_series(&self) -> usize {
        self.state.lock().map(|s| s.series.len()).unwrap_or(0)
    }
}

impl Modifier for RateModifier {
    fn modify(
        &self,
        series: &str,
        timestamp: DateTime<Utc>,
        value: &Value,
    ) -> Result<Option<Value>, CollaboratorError> {
        let Some(curr) = Counter::of(value) else {
            return Err(CollaboratorError::msg(format!(
                "rate: non-numeric value '{}' for series {}",
                value, series
            )));
        };

        let mut state = self
            .state
            .lock()
            .map_err(|_| CollaboratorError::msg("rate: state lock poisoned"))?;

        let last = state.series.insert(
            series.to_string(),
            Observation {
                ts: timestamp,
                value: curr,
            },
        );

        // Evict series not seen within the max dt window
        let max_dt = self.max_dt_secs;
        if state
            .last_sweep
            .is_none_or(|swept| secs_between(swept, timestamp) >= max_dt)
        {
            state
                .series
                .retain(|_, o| secs_between(o.ts, timestamp) <= max_dt);
            state.last_sweep = Some(timestamp);
        }

        let Some(last) = last else {
            return Ok(None);
        };

        let dt = secs_between(last.ts, timestamp);
        if dt <= 0.0 || dt > max_dt {
            return Ok(None);
        }

        Ok(curr.delta(last.value).map(|d| Value::Float(d / dt)))
    }
}

fn secs_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn first_sample_is_baseline() {
        let rate = RateModifier::new();
        assert_eq!(rate.modify("if.octets host=a", at(100), &Value::Int(10)).unwrap(), None);
        assert_eq!(rate.tracked_series(), 1);
    }

    #[test]
    fn rate_computed_on_second_sample() {
        let rate = RateModifier::new();
        rate.modify("s", at(100), &Value::Int(1000)).unwrap();
        let r = rate.modify("s", at(110), &Value::from("1500")).unwrap();
        assert_eq!(r, Some(Value::Float(50.0)));
    }

    #[test]
    fn counter_regression_yields_none_and_rebaselines() {
        let rate = RateModifier::new();
        rate.modify("s", at(100), &Value::Int(1000)).unwrap();
        assert_eq!(rate.modify("s", at(110), &Value::Int(10)).unwrap(), None);
        assert_eq!(
            rate.modify("s", at(120), &Value::Int(110)).unwrap(),
            Some(Value::Float(10.0))
        );
    }

    #[test]
    fn same_timestamp_yields_none() {
        let rate = RateModifier::new();
        rate.modify("s", at(100), &Value::Int(1)).unwrap();
        assert_eq!(rate.modify("s", at(100), &Value::Int(2)).unwrap(), None);
    }

    #[test]
    fn max_dt_cap_resets() {
        let rate = RateModifier::with_max_dt(60.0);
        rate.modify("s", at(100), &Value::Int(1)).unwrap();
        assert_eq!(rate.modify("s", at(200), &Value::Int(2)).unwrap(), None);
        assert_eq!(
            rate.modify("s", at(210), &Value::Int(12)).unwrap(),
            Some(Value::Float(1.0))
        );
    }

    #[test]
    fn series_are_independent() {
        let rate = RateModifier::new();
        rate.modify("a", at(100), &Value::Int(0)).unwrap();
        assert_eq!(rate.modify("b", at(110), &Value::Int(100)).unwrap(), None);
        assert_eq!(
            rate.modify("a", at(110), &Value::Int(100)).unwrap(),
            Some(Value::Float(10.0))
        );
    }

    #[test]
    fn stale_series_are_evicted() {
        let rate = RateModifier::with_max_dt(60.0);
        rate.modify("old", at(100), &Value::Int(1)).unwrap();
        rate.modify("new", at(150), &Value::Int(1)).unwrap();
        assert_eq!(rate.tracked_series(), 2);
        rate.modify("new", at(170), &Value::Int(2)).unwrap();
        assert_eq!(rate.tracked_series(), 1);
    }

    #[test]
    fn eviction_sweeps_once_per_window() {
        let rate = RateModifier::with_max_dt(60.0);
        rate.modify("a", at(0), &Value::Int(1)).unwrap();
        rate.modify("c", at(10), &Value::Int(1)).unwrap();
        // Sweep: "a" is 65s old
        rate.modify("b", at(65), &Value::Int(1)).unwrap();
        assert_eq!(rate.tracked_series(), 2);
        // "c" is stale but the next sweep is not due yet
        rate.modify("b", at(80), &Value::Int(2)).unwrap();
        assert_eq!(rate.tracked_series(), 2);
        rate.modify("b", at(125), &Value::Int(3)).unwrap();
        assert_eq!(rate.tracked_series(), 1);
    }

    #[test]
    fn max_dt_follows_interval() {
        assert_eq!(max_dt_for_interval(Duration::from_secs(10)), MAX_RATE_DT_SECS);
        assert_eq!(max_dt_for_interval(Duration::from_secs(900)), 2705.0);

        let rate = RateModifier::for_interval(Duration::from_secs(900));
        rate.modify("s", at(0), &Value::Int(0)).unwrap();
        assert_eq!(
            rate.modify("s", at(900), &Value::Int(1800)).unwrap(),
            Some(Value::Float(2.0))
        );
        // One missed cycle is still within the window
        assert_eq!(
            rate.modify("s", at(2700), &Value::Int(5400)).unwrap(),
            Some(Value::Float(2.0))
        );
    }

    #[test]
    fn counter64_delta_is_exact() {
        let rate = RateModifier::new();
        let base = u64::MAX - 10_000;
        rate.modify("s", at(0), &Value::UInt(base)).unwrap();
        assert_eq!(
            rate.modify("s", at(10), &Value::UInt(base + 1_000)).unwrap(),
            Some(Value::Float(100.0))
        );
        assert_eq!(
            rate.modify("s", at(20), &Value::from("18446744073709543615")).unwrap(),
            Some(Value::Float(100.0))
        );
    }

    #[test]
    fn non_numeric_value_is_error() {
        let rate = RateModifier::new();
        assert!(rate.modify("s", at(100), &Value::from("up")).is_err());
    }
}
