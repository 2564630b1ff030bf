use scaling::{CellProgress, SweepResult};

fn opt_sci(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{:.3e}", v),
        None => "n/a".to_string(),
    }
}

/// One line per finished scaling point.
pub fn progress_line(p: &CellProgress<'_>) -> String {
    format!(
        "[{}/{}] Schedule={} f={} p={} T1={:.6} Tp={:.6} Eff={:.3} Time_std={:.6} Error_mean={}",
        p.done,
        p.total,
        p.schedule,
        p.integrand,
        p.point.thread_count,
        p.baseline.mean_elapsed,
        p.point.mean_elapsed,
        p.point.efficiency,
        p.point.stddev_elapsed,
        opt_sci(p.point.mean_error),
    )
}

/// Print a summary table of the whole sweep to stdout.
pub fn print_table(result: &SweepResult) {
    let sched_w = 14;
    let fn_w = 10;
    let col_w = 11;

    println!();
    println!(
        "{:<sched_w$} {:<fn_w$} {:>4} {:>col_w$} {:>col_w$} {:>col_w$} {:>8} {:>col_w$}",
        "Schedule", "Function", "p", "T1 (s)", "Tp (s)", "Speedup", "Eff", "Err mean",
        sched_w = sched_w, fn_w = fn_w, col_w = col_w
    );
    println!("{}", "-".repeat(sched_w + fn_w + 4 + col_w * 4 + 8 + 7));

    for (schedule, by_fn) in &result.schedules {
        for (function, series) in by_fn {
            for point in &series.points {
                println!(
                    "{:<sched_w$} {:<fn_w$} {:>4} {:>col_w$.6} {:>col_w$.6} {:>col_w$.3} {:>8.3} {:>col_w$}",
                    schedule,
                    function,
                    point.thread_count,
                    series.baseline.mean_elapsed,
                    point.mean_elapsed,
                    point.speedup,
                    point.efficiency,
                    opt_sci(point.mean_error),
                    sched_w = sched_w, fn_w = fn_w, col_w = col_w
                );
            }
        }
    }
    println!();
}
