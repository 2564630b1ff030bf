use tracing::debug;

use crate::executor::Executor;
use crate::parser::parse_output;
use crate::{AggregateStat, Configuration, Error, RunRecord};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation; 0 for fewer than two samples.
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Runs `config` `repeat` times and reduces the parsed records.
pub fn sample<E: Executor + ?Sized>(
    executor: &mut E,
    config: &Configuration,
    repeat: usize,
) -> Result<AggregateStat, Error> {
    let mut records = Vec::with_capacity(repeat);
    for run in 0..repeat {
        let raw = executor.execute(config)?;
        let record = parse_output(&raw.stdout, raw.elapsed).map_err(|e| e.for_config(config))?;
        debug!(
            run,
            threads = config.thread_count,
            schedule = %config.schedule,
            function = %config.integrand,
            elapsed_s = record.elapsed_seconds,
            "sample"
        );
        records.push(record);
    }
    aggregate(config, &records)
}

/// Reduces the records of one configuration.
///
/// The exact value is copied from the last record; runs of one configuration are assumed
/// to agree on it and this is not checked. A mean error is only demanded when that exact
/// value is known, since the integrator prints no error figure otherwise.
pub fn aggregate(config: &Configuration, records: &[RunRecord]) -> Result<AggregateStat, Error> {
    let insufficient = |field| Error::InsufficientData {
        field,
        config: config.clone(),
    };
    let last = records.last().ok_or_else(|| insufficient("runs"))?;

    let times: Vec<f64> = records.iter().map(|r| r.elapsed_seconds).collect();
    let mean_elapsed = mean(&times).ok_or_else(|| insufficient("time"))?;

    let results: Vec<f64> = records.iter().filter_map(|r| r.result_value).collect();
    let mean_result = mean(&results).ok_or_else(|| insufficient("result"))?;

    let exact_value = last.exact_value;
    let mean_error = match exact_value {
        Some(_) => {
            let errors: Vec<f64> = records.iter().filter_map(|r| r.error_value).collect();
            Some(mean(&errors).ok_or_else(|| insufficient("error"))?)
        }
        None => None,
    };

    Ok(AggregateStat {
        thread_count: config.thread_count,
        mean_elapsed,
        stddev_elapsed: population_stddev(&times),
        mean_result: Some(mean_result),
        mean_error,
        exact_value,
        sample_count: records.len(),
    })
}
