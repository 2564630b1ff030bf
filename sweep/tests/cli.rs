use std::process::Command;

use tempfile::TempDir;

fn sweep_binary() -> &'static str {
    env!("CARGO_BIN_EXE_scaling-sweep")
}

#[test]
fn missing_executable_exits_non_zero_before_any_run() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("monte_carlo_omp");
    let output = Command::new(sweep_binary())
        .args(["--exe", missing.to_str().unwrap(), "--out"])
        .arg(dir.path())
        .output()
        .expect("failed to run scaling-sweep");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("executable not found"), "stderr: {}", stderr);
    assert!(!dir.path().join("efficiency_results.json").exists());
}

#[test]
fn help_succeeds() {
    let output = Command::new(sweep_binary()).arg("--help").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage: scaling-sweep"));
}

#[test]
fn unknown_flag_fails() {
    let output = Command::new(sweep_binary())
        .args(["--frobnicate", "1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn invalid_grid_fails() {
    let output = Command::new(sweep_binary())
        .args(["--exe", sweep_binary(), "--repeat", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("repeat count"));
}

#[test]
fn reference_outside_the_swept_functions_fails_up_front() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(sweep_binary())
        .args(["--exe", sweep_binary(), "--functions", "x3", "--out"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("reference integrand 'x'"), "stderr: {}", stderr);
    assert!(!dir.path().join("efficiency_plot.svg").exists());
}

#[cfg(unix)]
mod with_integrator {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    const SCRIPT: &str = r#"#!/bin/sh
if [ "$OMP_NUM_THREADS" = "1" ]; then t=2.0; else t=1.0; fi
echo "Function: $1"
echo "Threads: $OMP_NUM_THREADS"
echo "OMP_SCHEDULE: $OMP_SCHEDULE"
echo "Points N: $2"
echo "Result: 0.5"
echo "Exact:    0.5"
echo "Error:    0.0"
echo "Time (s): $t"
"#;

    fn integrator(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("mc.sh");
        fs::write(&path, body).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn small_sweep(exe: &PathBuf, out: &std::path::Path) -> std::process::Output {
        Command::new(sweep_binary())
            .arg("--exe")
            .arg(exe)
            .arg("--out")
            .arg(out)
            .args(["--threads", "1,2", "--chunks", "256", "--repeat", "1", "--points", "100"])
            .output()
            .unwrap()
    }

    #[test]
    fn small_sweep_writes_results_and_plots() {
        let dir = TempDir::new().unwrap();
        let exe = integrator(&dir, SCRIPT);
        let out = dir.path().join("out");
        let output = small_sweep(&exe, &out);
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Schedule=dynamic,256 f=x p=2"));
        assert!(stdout.contains("Saved results to"));

        let text = fs::read_to_string(out.join("efficiency_results.json")).unwrap();
        let result: scaling::SweepResult = serde_json::from_str(&text).unwrap();
        let keys: Vec<&String> = result.schedules.keys().collect();
        assert_eq!(keys, ["dynamic,256", "static,256"]);
        let series = result.series("static,256", "inv_sqrt").unwrap();
        assert_eq!(series.baseline.mean_elapsed, 2.0);
        assert_eq!(series.point(2).unwrap().efficiency, 1.0);
        assert_eq!(series.point(1).unwrap().efficiency, 1.0);

        assert!(out.join("efficiency_plot.svg").exists());
        for name in ["x", "x3", "cos100x", "inv_sqrt"] {
            assert!(out.join(format!("efficiency_{}.svg", name)).exists());
        }
    }

    #[test]
    fn crash_reports_configuration_and_stderr() {
        let dir = TempDir::new().unwrap();
        let exe = integrator(&dir, "#!/bin/sh\necho 'segmentation fault' >&2\nexit 1\n");
        let out = dir.path().join("out");
        let output = small_sweep(&exe, &out);
        assert_eq!(output.status.code(), Some(1));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("segmentation fault"));
        assert!(stderr.contains("schedule=dynamic,256"));
        assert!(!out.join("efficiency_results.json").exists());
    }

    #[test]
    fn replot_from_saved_results() {
        let dir = TempDir::new().unwrap();
        let exe = integrator(&dir, SCRIPT);
        let first = dir.path().join("first");
        assert!(small_sweep(&exe, &first).status.success());

        let second = dir.path().join("second");
        let output = Command::new(sweep_binary())
            .arg("--replot")
            .arg(first.join("efficiency_results.json"))
            .arg("--out")
            .arg(&second)
            .args(["--reference", "x3"])
            .output()
            .unwrap();
        assert!(output.status.success());
        assert!(second.join("efficiency_plot.svg").exists());
        assert!(second.join("efficiency_cos100x.svg").exists());
    }
}
