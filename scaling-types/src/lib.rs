use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    Static,
    Dynamic,
}

impl ScheduleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleKind::Static => "static",
            ScheduleKind::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "static" => Ok(ScheduleKind::Static),
            "dynamic" => Ok(ScheduleKind::Dynamic),
            other => Err(format!("unknown schedule kind '{}'", other)),
        }
    }
}

/// A scheduling policy plus chunk size, rendered as `"kind,chunk"`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Schedule {
    pub kind: ScheduleKind,
    pub chunk_size: usize,
}

impl Schedule {
    pub fn new(kind: ScheduleKind, chunk_size: usize) -> Self {
        Self { kind, chunk_size }
    }

    pub fn descriptor(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.kind, self.chunk_size)
    }
}

impl FromStr for Schedule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, chunk) = s
            .split_once(',')
            .ok_or_else(|| format!("schedule '{}' is not of the form kind,chunk", s))?;
        let kind = kind.parse()?;
        let chunk_size = chunk
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("bad chunk size in '{}': {}", s, e))?;
        Ok(Schedule { kind, chunk_size })
    }
}

/// Integrands understood by the external integrator, by their command-line name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Integrand {
    #[serde(rename = "x")]
    X,
    #[serde(rename = "x3")]
    X3,
    #[serde(rename = "cos100x")]
    Cos100x,
    #[serde(rename = "inv_sqrt")]
    InvSqrt,
}

impl Integrand {
    pub const ALL: [Integrand; 4] = [
        Integrand::X,
        Integrand::X3,
        Integrand::Cos100x,
        Integrand::InvSqrt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Integrand::X => "x",
            Integrand::X3 => "x3",
            Integrand::Cos100x => "cos100x",
            Integrand::InvSqrt => "inv_sqrt",
        }
    }
}

impl fmt::Display for Integrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Integrand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Integrand::ALL
            .iter()
            .copied()
            .find(|i| i.name() == s.trim())
            .ok_or_else(|| format!("unknown integrand '{}'", s))
    }
}

/// One benchmark cell. Never mutated; use `with_threads` to derive a sibling cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Configuration {
    pub thread_count: usize,
    pub schedule: Schedule,
    pub integrand: Integrand,
    pub point_count: u64,
    pub seed: u64,
}

impl Configuration {
    pub fn new(
        thread_count: usize,
        schedule: Schedule,
        integrand: Integrand,
        point_count: u64,
        seed: u64,
    ) -> Self {
        Self {
            thread_count,
            schedule,
            integrand,
            point_count,
            seed,
        }
    }

    pub fn with_threads(&self, thread_count: usize) -> Self {
        Self {
            thread_count,
            ..self.clone()
        }
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "threads={} schedule={} function={} points={} seed={}",
            self.thread_count, self.schedule, self.integrand, self.point_count, self.seed
        )
    }
}

/// Parsed outcome of one execution. `None` means the program did not report the field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub reported_function: Option<String>,
    pub reported_threads: Option<usize>,
    pub reported_schedule: Option<String>,
    pub reported_point_count: Option<u64>,
    pub result_value: Option<f64>,
    pub exact_value: Option<f64>,
    /// Always `None` when `exact_value` is `None`.
    pub error_value: Option<f64>,
    pub elapsed_seconds: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateStat {
    pub thread_count: usize,
    pub mean_elapsed: f64,
    pub stddev_elapsed: f64,
    pub mean_result: Option<f64>,
    pub mean_error: Option<f64>,
    pub exact_value: Option<f64>,
    pub sample_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyPoint {
    pub thread_count: usize,
    pub mean_elapsed: f64,
    pub stddev_elapsed: f64,
    pub speedup: f64,
    pub efficiency: f64,
    pub mean_result: Option<f64>,
    pub mean_error: Option<f64>,
    pub exact_value: Option<f64>,
}

pub const BASELINE_KEY: &str = "baseline";

/// Baseline plus the scaled points of one (schedule, integrand) pair, in configured
/// thread order.
///
/// On disk this is a single object: `"baseline"` maps to the baseline stats and every
/// scaled point is keyed by its thread count written as a string.
#[derive(Clone, Debug, PartialEq)]
pub struct IntegrandSeries {
    pub baseline: AggregateStat,
    pub points: Vec<EfficiencyPoint>,
}

impl IntegrandSeries {
    pub fn new(baseline: AggregateStat) -> Self {
        Self {
            baseline,
            points: Vec::new(),
        }
    }

    pub fn point(&self, thread_count: usize) -> Option<&EfficiencyPoint> {
        self.points.iter().find(|p| p.thread_count == thread_count)
    }
}

impl Serialize for IntegrandSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.points.len() + 1))?;
        map.serialize_entry(BASELINE_KEY, &self.baseline)?;
        for point in &self.points {
            map.serialize_entry(&point.thread_count.to_string(), point)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IntegrandSeries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeriesVisitor;

        impl<'de> Visitor<'de> for SeriesVisitor {
            type Value = IntegrandSeries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map with a \"baseline\" entry and thread-count keyed points")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut baseline = None;
                let mut points = Vec::new();
                while let Some(key) = access.next_key::<String>()? {
                    if key == BASELINE_KEY {
                        if baseline.is_some() {
                            return Err(de::Error::duplicate_field(BASELINE_KEY));
                        }
                        baseline = Some(access.next_value::<AggregateStat>()?);
                        continue;
                    }
                    let threads: usize = key.parse().map_err(|_| {
                        de::Error::invalid_value(de::Unexpected::Str(&key), &"a thread count")
                    })?;
                    let point: EfficiencyPoint = access.next_value()?;
                    if point.thread_count != threads {
                        return Err(de::Error::custom(format!(
                            "point keyed \"{}\" reports thread_count {}",
                            key, point.thread_count
                        )));
                    }
                    points.push(point);
                }
                let baseline = baseline.ok_or_else(|| de::Error::missing_field(BASELINE_KEY))?;
                Ok(IntegrandSeries { baseline, points })
            }
        }

        deserializer.deserialize_map(SeriesVisitor)
    }
}

/// Schedule descriptor -> integrand name -> series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SweepResult {
    pub schedules: BTreeMap<String, BTreeMap<String, IntegrandSeries>>,
}

impl SweepResult {
    pub fn insert(&mut self, schedule: &Schedule, integrand: Integrand, series: IntegrandSeries) {
        self.schedules
            .entry(schedule.descriptor())
            .or_default()
            .insert(integrand.name().to_string(), series);
    }

    pub fn series(&self, descriptor: &str, integrand: &str) -> Option<&IntegrandSeries> {
        self.schedules.get(descriptor)?.get(integrand)
    }

    pub fn integrand_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .schedules
            .values()
            .flat_map(|by_fn| by_fn.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

/// Names of the environment variables that carry the thread count and the schedule to
/// the external program.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvNames {
    pub threads: String,
    pub schedule: String,
}

impl Default for EnvNames {
    fn default() -> Self {
        Self {
            threads: "OMP_NUM_THREADS".to_string(),
            schedule: "OMP_SCHEDULE".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepSettings {
    pub integrands: Vec<Integrand>,
    pub point_count: u64,
    pub seed: u64,
    pub thread_counts: Vec<usize>,
    pub schedule_kinds: Vec<ScheduleKind>,
    pub chunk_sizes: Vec<usize>,
    pub repeat: usize,
    pub timeout_ms: Option<u64>,
    pub env: EnvNames,
}

impl SweepSettings {
    /// Schedules in traversal order: kind first, then chunk size.
    pub fn schedules(&self) -> Vec<Schedule> {
        self.schedule_kinds
            .iter()
            .flat_map(|&kind| self.chunk_sizes.iter().map(move |&c| Schedule::new(kind, c)))
            .collect()
    }

    /// Number of sampled cells, baselines included.
    pub fn cell_count(&self) -> usize {
        self.schedule_kinds.len()
            * self.chunk_sizes.len()
            * self.integrands.len()
            * (self.thread_counts.len() + 1)
    }
}
