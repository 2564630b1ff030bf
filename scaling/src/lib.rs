use std::path::PathBuf;
use std::time::Duration;

pub use scaling_types::{
    AggregateStat, Configuration, EfficiencyPoint, EnvNames, Integrand, IntegrandSeries,
    RunRecord, Schedule, ScheduleKind, SweepResult, SweepSettings,
};

pub mod aggregate;
pub mod executor;
pub mod parser;
pub mod plot;
pub mod store;
pub mod sweep;
mod validation;

pub use crate::aggregate::{aggregate, sample};
pub use crate::executor::{check_executable, Executor, ProcessExecutor, RawOutput, RunEnvironment};
pub use crate::parser::{parse_output, MalformedField};
pub use crate::sweep::{efficiency_point, CellProgress, Sweep};
pub use crate::validation::validate;

/// Every failure aborts the sweep; nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("command failed ({status}) for [{config}]: {command}\n{stderr}")]
    ExecutionFailure {
        config: Configuration,
        command: String,
        status: String,
        stderr: String,
    },
    #[error("malformed `{field}` line in program output for [{config}]: {value:?}")]
    MalformedOutput {
        field: &'static str,
        value: String,
        config: Configuration,
    },
    #[error("no run reported a `{field}` value for [{config}]")]
    InsufficientData {
        field: &'static str,
        config: Configuration,
    },
    #[error("scaled mean elapsed time is zero for [{config}]")]
    DivisionByZero { config: Configuration },
    #[error("baseline must be measured at 1 thread, got {thread_count} for [{config}]")]
    MissingBaseline {
        thread_count: usize,
        config: Configuration,
    },
    #[error("executable not found: {}: {reason}", path.display())]
    MissingExecutable { path: PathBuf, reason: String },
    #[error("run timed out after {after:?} for [{config}]")]
    Timeout {
        config: Configuration,
        after: Duration,
    },
    #[error("invalid sweep settings: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("result store: {0}")]
    Store(#[from] serde_json::Error),
    #[error("plot rendering failed: {0}")]
    Plot(String),
}
