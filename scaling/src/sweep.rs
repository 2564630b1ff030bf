use tracing::{error, info};

use crate::aggregate::sample;
use crate::executor::Executor;
use crate::validation::validate;
use crate::{
    AggregateStat, Configuration, EfficiencyPoint, Error, Integrand, IntegrandSeries, Schedule,
    SweepResult, SweepSettings,
};

/// Derives speedup and parallel efficiency of `scaled` against a single-thread baseline.
/// `config` is the cell `scaled` was measured on; failures carry it.
pub fn efficiency_point(
    config: &Configuration,
    baseline: &AggregateStat,
    scaled: &AggregateStat,
) -> Result<EfficiencyPoint, Error> {
    if baseline.thread_count != 1 {
        return Err(Error::MissingBaseline {
            thread_count: baseline.thread_count,
            config: config.clone(),
        });
    }
    if scaled.mean_elapsed == 0.0 {
        return Err(Error::DivisionByZero {
            config: config.clone(),
        });
    }
    let speedup = baseline.mean_elapsed / scaled.mean_elapsed;
    Ok(EfficiencyPoint {
        thread_count: scaled.thread_count,
        mean_elapsed: scaled.mean_elapsed,
        stddev_elapsed: scaled.stddev_elapsed,
        speedup,
        efficiency: speedup / scaled.thread_count as f64,
        mean_result: scaled.mean_result,
        mean_error: scaled.mean_error,
        exact_value: scaled.exact_value,
    })
}

/// One finished scaling point, handed to the progress callback.
pub struct CellProgress<'a> {
    pub schedule: &'a Schedule,
    pub integrand: Integrand,
    pub baseline: &'a AggregateStat,
    pub point: &'a EfficiencyPoint,
    /// Cells sampled so far, baselines included.
    pub done: usize,
    pub total: usize,
}

pub struct Sweep<'a> {
    settings: &'a SweepSettings,
}

impl<'a> Sweep<'a> {
    pub fn new(settings: &'a SweepSettings) -> Result<Self, Error> {
        validate(settings)?;
        Ok(Self { settings })
    }

    pub fn run<E: Executor + ?Sized>(&self, executor: &mut E) -> Result<SweepResult, Error> {
        self.run_with(executor, |_| {})
    }

    /// Walks schedule kind, chunk size, integrand, then thread count. The first failure
    /// aborts the whole sweep.
    pub fn run_with<E, F>(&self, executor: &mut E, mut on_point: F) -> Result<SweepResult, Error>
    where
        E: Executor + ?Sized,
        F: FnMut(&CellProgress<'_>),
    {
        let s = self.settings;
        let total = s.cell_count();
        let mut done = 0;
        let mut result = SweepResult::default();

        for schedule in s.schedules() {
            for &integrand in &s.integrands {
                let base_cfg = Configuration::new(1, schedule, integrand, s.point_count, s.seed);
                let baseline = self.measure(executor, &base_cfg)?;
                done += 1;
                let mut series = IntegrandSeries::new(baseline);

                for &p in &s.thread_counts {
                    // p = 1 is sampled again rather than reusing the baseline runs.
                    let cfg = base_cfg.with_threads(p);
                    let scaled = self.measure(executor, &cfg)?;
                    let point = efficiency_point(&cfg, &series.baseline, &scaled).map_err(|e| {
                        error!(config = %cfg, "sweep aborted: {}", e);
                        e
                    })?;
                    done += 1;

                    info!(
                        schedule = %schedule,
                        function = %integrand,
                        p,
                        t1 = series.baseline.mean_elapsed,
                        tp = point.mean_elapsed,
                        eff = point.efficiency,
                        time_std = point.stddev_elapsed,
                        error_mean = ?point.mean_error,
                        "scaling point"
                    );
                    on_point(&CellProgress {
                        schedule: &schedule,
                        integrand,
                        baseline: &series.baseline,
                        point: &point,
                        done,
                        total,
                    });
                    series.points.push(point);
                }

                result.insert(&schedule, integrand, series);
            }
        }

        Ok(result)
    }

    fn measure<E: Executor + ?Sized>(
        &self,
        executor: &mut E,
        config: &Configuration,
    ) -> Result<AggregateStat, Error> {
        sample(executor, config, self.settings.repeat).map_err(|e| {
            error!(config = %config, "sweep aborted: {}", e);
            e
        })
    }
}
