use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{info, warn};

use crate::{Error, SweepResult};

pub const X_LABEL: &str = "Threads (p)";
pub const Y_LABEL: &str = "Parallel Efficiency (T1/(p·Tp))";
pub const AGGREGATE_PLOT: &str = "efficiency_plot.svg";

/// One line of a chart: a schedule descriptor and its (p, efficiency) points.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// Efficiency lines for `integrand`, one per schedule that measured it.
pub fn efficiency_series(result: &SweepResult, integrand: &str) -> Vec<Series> {
    result
        .schedules
        .iter()
        .filter_map(|(descriptor, by_fn)| {
            let series = by_fn.get(integrand)?;
            let mut points: Vec<(f64, f64)> = series
                .points
                .iter()
                .map(|p| (p.thread_count as f64, p.efficiency))
                .collect();
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            Some(Series {
                label: descriptor.clone(),
                points,
            })
        })
        .collect()
}

pub fn integrand_plot_name(integrand: &str) -> String {
    format!("efficiency_{}.svg", integrand)
}

pub fn render_chart(path: &Path, title: &str, series: &[Series]) -> Result<(), Error> {
    draw_chart(path, title, series)
        .map_err(|e| Error::Plot(format!("{}: {}", path.display(), e)))?;
    info!(path = %path.display(), "saved plot");
    Ok(())
}

/// Writes the aggregate chart for `reference` plus one chart per integrand into `out_dir`.
pub fn render_all(
    result: &SweepResult,
    out_dir: &Path,
    reference: &str,
) -> Result<Vec<PathBuf>, Error> {
    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();

    let path = out_dir.join(AGGREGATE_PLOT);
    let title = format!("Parallel Efficiency vs Threads by Schedule (f = {})", reference);
    let lines = efficiency_series(result, reference);
    if lines.is_empty() && !result.is_empty() {
        warn!(reference, "reference integrand was not measured, aggregate chart is empty");
    }
    render_chart(&path, &title, &lines)?;
    written.push(path);

    for name in result.integrand_names() {
        let path = out_dir.join(integrand_plot_name(&name));
        let title = format!("Parallel Efficiency vs Threads (f = {})", name);
        render_chart(&path, &title, &efficiency_series(result, &name))?;
        written.push(path);
    }
    Ok(written)
}

fn draw_chart(path: &Path, title: &str, series: &[Series]) -> Result<(), Box<dyn std::error::Error>> {
    let all = || series.iter().flat_map(|s| s.points.iter().copied());
    let x_max = all().map(|(x, _)| x).fold(1.0, f64::max);
    let y_max = all()
        .map(|(_, y)| y)
        .filter(|y| y.is_finite())
        .fold(1.0, f64::max);

    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max + 1.0, 0.0..y_max * 1.1)?;

    chart
        .configure_mesh()
        .x_desc(X_LABEL)
        .y_desc(Y_LABEL)
        .light_line_style(BLACK.mix(0.05))
        .draw()?;

    for (idx, s) in series.iter().enumerate() {
        let color = Palette99::pick(idx).mix(1.0);
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
            .label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(
            s.points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
        )?;
    }

    if !series.is_empty() {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AggregateStat, EfficiencyPoint, Integrand, IntegrandSeries, Schedule, ScheduleKind};

    fn result() -> SweepResult {
        let baseline = AggregateStat {
            thread_count: 1,
            mean_elapsed: 8.0,
            stddev_elapsed: 0.0,
            mean_result: Some(0.5),
            mean_error: None,
            exact_value: None,
            sample_count: 1,
        };
        let mut result = SweepResult::default();
        for (kind, integrand) in [
            (ScheduleKind::Static, Integrand::X),
            (ScheduleKind::Dynamic, Integrand::X),
            (ScheduleKind::Dynamic, Integrand::X3),
        ] {
            let mut series = IntegrandSeries::new(baseline.clone());
            for p in [4usize, 1, 2] {
                series.points.push(EfficiencyPoint {
                    thread_count: p,
                    mean_elapsed: 8.0 / p as f64,
                    stddev_elapsed: 0.0,
                    speedup: p as f64,
                    efficiency: 1.0 - 0.05 * p as f64,
                    mean_result: Some(0.5),
                    mean_error: None,
                    exact_value: None,
                });
            }
            result.insert(&Schedule::new(kind, 1024), integrand, series);
        }
        result
    }

    #[test]
    fn series_per_schedule_sorted_by_threads() {
        let lines = efficiency_series(&result(), "x");
        let labels: Vec<&str> = lines.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["dynamic,1024", "static,1024"]);
        let xs: Vec<f64> = lines[0].points.iter().map(|p| p.0).collect();
        assert_eq!(xs, [1.0, 2.0, 4.0]);
        assert!((lines[0].points[2].1 - 0.8).abs() < 1e-12);

        assert_eq!(efficiency_series(&result(), "x3").len(), 1);
        assert!(efficiency_series(&result(), "inv_sqrt").is_empty());
    }

    #[test]
    fn renders_aggregate_and_per_integrand_charts() {
        let dir = tempfile::tempdir().unwrap();
        let written = render_all(&result(), dir.path(), "x").unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, [AGGREGATE_PLOT, "efficiency_x.svg", "efficiency_x3.svg"]);

        let svg = std::fs::read_to_string(dir.path().join(AGGREGATE_PLOT)).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains(X_LABEL));
        assert!(svg.contains("static,1024"));
    }

    #[test]
    fn empty_result_still_renders_axes() {
        let dir = tempfile::tempdir().unwrap();
        let written = render_all(&SweepResult::default(), dir.path(), "x").unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].exists());
    }
}
