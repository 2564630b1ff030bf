//! JSON persistence of a finished sweep.
//!
//! Layout: `{ "<kind>,<chunk>": { "<integrand>": { "baseline": {..}, "<p>": {..} } } }`.
//! Thread counts are object keys and therefore strings; loading parses them back.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::{Error, SweepResult};

pub const RESULTS_FILE: &str = "efficiency_results.json";

pub fn to_json_string(result: &SweepResult) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(result)?)
}

pub fn from_json_str(text: &str) -> Result<SweepResult, Error> {
    Ok(serde_json::from_str(text)?)
}

pub fn save(result: &SweepResult, path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, to_json_string(result)?)?;
    info!(path = %path.display(), "saved results");
    Ok(())
}

pub fn load(path: &Path) -> Result<SweepResult, Error> {
    let text = fs::read_to_string(path)?;
    from_json_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AggregateStat, EfficiencyPoint, Integrand, IntegrandSeries, Schedule, ScheduleKind};

    fn sample_result() -> SweepResult {
        let baseline = AggregateStat {
            thread_count: 1,
            mean_elapsed: 1.0,
            stddev_elapsed: 0.016329931618554,
            mean_result: Some(0.49998),
            mean_error: Some(2.0e-5),
            exact_value: Some(0.5),
            sample_count: 3,
        };
        let mut series = IntegrandSeries::new(baseline);
        for (p, t) in [(1usize, 1.01), (2, 0.52), (16, 0.09)] {
            series.points.push(EfficiencyPoint {
                thread_count: p,
                mean_elapsed: t,
                stddev_elapsed: 0.001,
                speedup: 1.0 / t,
                efficiency: 1.0 / t / p as f64,
                mean_result: Some(0.5),
                mean_error: None,
                exact_value: None,
            });
        }
        let mut result = SweepResult::default();
        result.insert(&Schedule::new(ScheduleKind::Static, 1024), Integrand::X, series.clone());
        result.insert(&Schedule::new(ScheduleKind::Dynamic, 256), Integrand::Cos100x, series);
        result
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(RESULTS_FILE);
        let result = sample_result();
        save(&result, &path).unwrap();
        let back = load(&path).unwrap();
        assert_eq!(back, result);
        let series = back.series("static,1024", "x").unwrap();
        assert_eq!(series.point(16).unwrap().efficiency, 1.0 / 0.09 / 16.0);
    }

    #[test]
    fn document_shape() {
        let text = to_json_string(&sample_result()).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        let cell = &doc["dynamic,256"]["cos100x"];
        assert_eq!(cell["baseline"]["thread_count"], 1);
        assert_eq!(cell["16"]["thread_count"], 16);
        assert!(cell.get("baseline").is_some());
        assert!(cell["2"]["exact_value"].is_null());
    }

    #[test]
    fn non_numeric_thread_key_fails_to_load() {
        let text = r#"{"static,1": {"x": {"baseline": {"thread_count": 1, "mean_elapsed": 1.0,
            "stddev_elapsed": 0.0, "mean_result": null, "mean_error": null,
            "exact_value": null, "sample_count": 1}, "eight": {}}}}"#;
        assert!(matches!(from_json_str(text), Err(Error::Store(_))));
    }

    #[test]
    fn infinite_reported_time_still_round_trips() {
        use crate::{aggregate, efficiency_point, parse_output, Configuration};
        use std::time::Duration;

        let schedule = Schedule::new(ScheduleKind::Static, 256);
        let base_cfg = Configuration::new(1, schedule, Integrand::X, 1000, 42);
        let record = parse_output("Result: 0.5\nTime (s): inf\n", Duration::from_secs(2)).unwrap();
        let baseline = aggregate(&base_cfg, &[record]).unwrap();
        assert_eq!(baseline.mean_elapsed, 2.0);

        let scaled_cfg = base_cfg.with_threads(2);
        let record = parse_output("Result: 0.5\nTime (s): 1.0\n", Duration::ZERO).unwrap();
        let scaled = aggregate(&scaled_cfg, &[record]).unwrap();
        let point = efficiency_point(&scaled_cfg, &baseline, &scaled).unwrap();
        assert!(point.speedup.is_finite() && point.efficiency.is_finite());

        let mut series = IntegrandSeries::new(baseline);
        series.points.push(point);
        let mut result = SweepResult::default();
        result.insert(&schedule, Integrand::X, series);

        let back = from_json_str(&to_json_string(&result).unwrap()).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load(&dir.path().join("absent.json")), Err(Error::Io(_))));
    }
}
