//! Per-sample processing pipeline.
//!
//! Every raw reading goes through the same fixed stages:
//!
//! ```text
//! clamp -> resolve tags (table only) -> tag string -> timestamp
//!       -> value modifier (optional) -> multiply (optional) -> format
//! ```
//!
//! A stage that yields no value drops the sample silently. A collaborator
//! that fails aborts the whole `collect` call for the metric, including any
//! table rows not yet processed.

use std::borrow::Cow;

use tracing::{debug, trace, warn};

use crate::collector::clamp::clamp;
use crate::collector::metric::{Metric, Mode};
use crate::collector::traits::{Clock, Reader, Resolver};
use crate::error::ProcessError;
use crate::fmt::format_line;
use crate::value::Value;

impl Metric {
    /// Fetches this metric through `reader` and formats every valid sample.
    ///
    /// Scalar metrics produce zero or one line, table metrics zero or more.
    pub fn collect(
        &self,
        reader: &dyn Reader,
        clock: &dyn Clock,
    ) -> Result<Vec<String>, ProcessError> {
        debug!("getting metric {} from {}", self.name, self.host());

        match &self.mode {
            Mode::Scalar => {
                let raw = reader
                    .get(&self.address)
                    .map_err(|source| ProcessError::Read {
                        metric: self.name.clone(),
                        source,
                    })?;
                Ok(self.process_sample(raw, None, clock)?.into_iter().collect())
            }
            Mode::Table {
                start,
                end,
                resolver,
            } => {
                let rows = reader
                    .walk(&self.address, *start, *end)
                    .map_err(|source| ProcessError::Read {
                        metric: self.name.clone(),
                        source,
                    })?;

                let mut lines = Vec::with_capacity(rows.len());
                for (index, raw) in rows {
                    if raw.is_none() {
                        trace!("{}: no value at index {}", self.name, index);
                        continue;
                    }
                    if let Some(line) =
                        self.process_sample(raw, Some((index.as_str(), resolver.as_ref())), clock)?
                    {
                        lines.push(line);
                    }
                }
                Ok(lines)
            }
        }
    }

    /// Runs one reading through the pipeline.
    ///
    /// `row` carries the table index and the bound resolver for table metrics.
    fn process_sample(
        &self,
        raw: Option<Value>,
        row: Option<(&str, &dyn Resolver)>,
        clock: &dyn Clock,
    ) -> Result<Option<String>, ProcessError> {
        let Some(value) = clamp(raw, &self.bounds, self.replacement.as_ref()) else {
            trace!("{}: sample dropped by validation", self.name);
            return Ok(None);
        };

        let tags = match row {
            Some((index, resolver)) => {
                let resolved =
                    resolver
                        .resolve(index, &self.device)
                        .map_err(|source| ProcessError::Resolve {
                            metric: self.name.clone(),
                            index: index.to_string(),
                            source,
                        })?;
                match resolved {
                    Some(extra) => Cow::Owned(self.tags.merged(&extra)),
                    None => Cow::Borrowed(&self.tags),
                }
            }
            None => Cow::Borrowed(&self.tags),
        };
        let tag_string = tags.to_tag_string(self.device.hostname());

        let ts = clock.now();

        let value = match &self.modifier {
            Some(modifier) => {
                // Series identity: metric name immediately followed by the tag string.
                let series = format!("{}{}", self.name, tag_string);
                let modified =
                    modifier
                        .modify(&series, ts, &value)
                        .map_err(|source| ProcessError::Modify {
                            metric: self.name.clone(),
                            series: series.clone(),
                            source,
                        })?;
                match modified {
                    Some(v) => v,
                    None => {
                        trace!("{}: modifier produced no value for {}", self.name, series);
                        return Ok(None);
                    }
                }
            }
            None => value,
        };

        let value = match self.multiplier {
            Some(factor) => match value.as_f64() {
                Some(v) => Value::Float(v * factor),
                None => {
                    warn!("{}: cannot scale non-numeric value '{}'", self.name, value);
                    return Ok(None);
                }
            },
            None => value,
        };

        Ok(Some(format_line(
            &self.name,
            ts.timestamp(),
            &value,
            &tag_string,
        )))
    }
}
