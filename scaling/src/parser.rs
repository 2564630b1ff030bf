//! Line-oriented parser for the integrator's report.
//!
//! Each field sits on its own line behind a fixed prefix. Lines may come in any order and
//! unknown lines are skipped. A field whose line is missing, or whose value is a
//! sentinel such as `(unknown)` or `(n/a)`, stays `None`.

use std::time::Duration;

use tracing::debug;

use crate::{Configuration, Error, RunRecord};

pub const FUNCTION: &str = "Function:";
pub const THREADS: &str = "Threads:";
pub const SCHEDULE: &str = "OMP_SCHEDULE:";
pub const POINTS: &str = "Points N:";
pub const RESULT: &str = "Result:";
pub const EXACT: &str = "Exact:";
pub const ERROR: &str = "Error:";
pub const TIME: &str = "Time (s):";

const SENTINELS: [&str; 5] = ["unknown", "n/a", "na", "nan", "not set"];

fn is_sentinel(value: &str) -> bool {
    let inner = value
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim()
        .to_ascii_lowercase();
    inner.is_empty() || SENTINELS.contains(&inner.as_str())
}

fn text(value: &str) -> Option<String> {
    if is_sentinel(value) {
        None
    } else {
        Some(value.trim().to_string())
    }
}

/// Lenient numeric field: unparseable values are treated as absent.
fn number<T: std::str::FromStr>(value: &str) -> Option<T> {
    if is_sentinel(value) {
        return None;
    }
    value.trim().parse().ok()
}

/// A mandatory field that was present but unreadable.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("malformed `{field}` line in program output: {value:?}")]
pub struct MalformedField {
    pub field: &'static str,
    pub value: String,
}

impl MalformedField {
    /// Attaches the configuration whose run printed the bad line.
    pub fn for_config(self, config: &Configuration) -> Error {
        Error::MalformedOutput {
            field: self.field,
            value: self.value,
            config: config.clone(),
        }
    }
}

/// A reported duration must be a finite, non-negative number of seconds.
fn seconds(value: &str) -> Option<f64> {
    number::<f64>(value).filter(|t| t.is_finite() && *t >= 0.0)
}

/// Parses one run's stdout. `measured` replaces the elapsed time when the program did
/// not print one.
pub fn parse_output(stdout: &str, measured: Duration) -> Result<RunRecord, MalformedField> {
    let mut record = RunRecord::default();
    let mut elapsed = None;

    for line in stdout.lines() {
        let line = line.trim();
        if let Some(v) = line.strip_prefix(FUNCTION) {
            record.reported_function = text(v);
        } else if let Some(v) = line.strip_prefix(THREADS) {
            record.reported_threads = number(v);
        } else if let Some(v) = line.strip_prefix(SCHEDULE) {
            record.reported_schedule = text(v);
        } else if let Some(v) = line.strip_prefix(POINTS) {
            record.reported_point_count = number(v);
        } else if let Some(v) = line.strip_prefix(RESULT) {
            record.result_value = if is_sentinel(v) {
                None
            } else {
                Some(v.trim().parse().map_err(|_| MalformedField {
                    field: RESULT,
                    value: v.trim().to_string(),
                })?)
            };
        } else if let Some(v) = line.strip_prefix(EXACT) {
            record.exact_value = number(v);
        } else if let Some(v) = line.strip_prefix(ERROR) {
            record.error_value = number(v);
        } else if let Some(v) = line.strip_prefix(TIME) {
            elapsed = seconds(v);
        }
    }

    // An error figure is meaningless without the exact value it was measured against.
    if record.exact_value.is_none() {
        record.error_value = None;
    }

    record.elapsed_seconds = match elapsed {
        Some(t) => t,
        None => {
            debug!(
                measured_s = measured.as_secs_f64(),
                "no reported time, using wall clock"
            );
            measured.as_secs_f64()
        }
    };

    Ok(record)
}
