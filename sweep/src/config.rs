use std::path::PathBuf;
use std::str::FromStr;

use scaling_types::{EnvNames, Integrand, ScheduleKind, SweepSettings};

pub const EXECUTABLE: &str = "./monte_carlo_omp";
pub const OUT_DIR: &str = ".";
pub const FUNCTIONS: [Integrand; 4] = Integrand::ALL;
pub const N_POINTS: u64 = 10_000_000;
pub const SEED: u64 = 42;
pub const THREAD_COUNTS: [usize; 8] = [1, 2, 4, 8, 12, 16, 20, 24];
pub const SCHEDULE_KINDS: [ScheduleKind; 2] = [ScheduleKind::Dynamic, ScheduleKind::Static];
pub const CHUNK_SIZES: [usize; 3] = [256, 1024, 4096];
pub const REPEAT: usize = 3;
/// Integrand drawn on the aggregate efficiency chart.
pub const REFERENCE_FUNCTION: Integrand = Integrand::X;

#[derive(Clone, Debug)]
pub struct Options {
    pub executable: PathBuf,
    pub out_dir: PathBuf,
    pub settings: SweepSettings,
    pub reference: Integrand,
    /// Re-render plots from a saved result file instead of sweeping.
    pub replot: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(EXECUTABLE),
            out_dir: PathBuf::from(OUT_DIR),
            settings: SweepSettings {
                integrands: FUNCTIONS.to_vec(),
                point_count: N_POINTS,
                seed: SEED,
                thread_counts: THREAD_COUNTS.to_vec(),
                schedule_kinds: SCHEDULE_KINDS.to_vec(),
                chunk_sizes: CHUNK_SIZES.to_vec(),
                repeat: REPEAT,
                timeout_ms: None,
                env: EnvNames::default(),
            },
            reference: REFERENCE_FUNCTION,
            replot: None,
        }
    }
}

#[derive(Debug)]
pub enum Parsed {
    Run(Options),
    Help,
}

pub fn print_usage() {
    eprintln!("Usage: scaling-sweep [OPTIONS]");
    eprintln!();
    eprintln!("  --exe <path>         Integrator executable (default: {})", EXECUTABLE);
    eprintln!("  --out <dir>          Output directory for results and plots (default: {})", OUT_DIR);
    eprintln!("  --functions <list>   Comma-separated integrands (default: x,x3,cos100x,inv_sqrt)");
    eprintln!("  --threads <list>     Comma-separated thread counts (default: 1,2,4,8,12,16,20,24)");
    eprintln!("  --kinds <list>       Comma-separated schedule kinds (default: dynamic,static)");
    eprintln!("  --chunks <list>      Comma-separated chunk sizes (default: 256,1024,4096)");
    eprintln!("  --points <n>         Random points per run (default: {})", N_POINTS);
    eprintln!("  --seed <n>           Base seed (default: {})", SEED);
    eprintln!("  --repeat <n>         Runs per configuration (default: {})", REPEAT);
    eprintln!("  --timeout-ms <n>     Kill a run after this many milliseconds (default: none)");
    eprintln!("  --reference <name>   Integrand for the aggregate chart (default: x)");
    eprintln!("  --replot <json>      Re-render plots from a saved result file and exit");
    eprintln!("  --help               Show this help");
}

fn list<T: FromStr>(flag: &str, value: &str) -> Result<Vec<T>, String>
where
    T::Err: std::fmt::Display,
{
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|e| format!("{}: bad value '{}': {}", flag, s, e))
        })
        .collect()
}

fn scalar<T: FromStr>(flag: &str, value: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| format!("{}: bad value '{}': {}", flag, value, e))
}

/// Parses the arguments after the program name.
pub fn parse_args(args: &[String]) -> Result<Parsed, String> {
    let mut options = Options::default();
    let s = &mut options.settings;

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "--help" || flag == "-h" {
            return Ok(Parsed::Help);
        }
        i += 1;
        let value = args
            .get(i)
            .map(String::as_str)
            .ok_or_else(|| format!("Unknown flag or missing value: {}", flag))?;
        match flag {
            "--exe" => options.executable = PathBuf::from(value),
            "--out" => options.out_dir = PathBuf::from(value),
            "--functions" => s.integrands = list(flag, value)?,
            "--threads" => s.thread_counts = list(flag, value)?,
            "--kinds" => s.schedule_kinds = list(flag, value)?,
            "--chunks" => s.chunk_sizes = list(flag, value)?,
            "--points" => s.point_count = scalar(flag, value)?,
            "--seed" => s.seed = scalar(flag, value)?,
            "--repeat" => s.repeat = scalar(flag, value)?,
            "--timeout-ms" => s.timeout_ms = Some(scalar(flag, value)?),
            "--reference" => options.reference = scalar(flag, value)?,
            "--replot" => options.replot = Some(PathBuf::from(value)),
            other => return Err(format!("Unknown flag: {}", other)),
        }
        i += 1;
    }

    Ok(Parsed::Run(options))
}
