use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::{Configuration, EnvNames, Error};

/// Raw result of one successful invocation.
#[derive(Clone, Debug)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
    /// Wall-clock time measured around the call.
    pub elapsed: Duration,
}

/// Runs one benchmark cell. The aggregator only talks to this trait.
pub trait Executor {
    fn execute(&mut self, config: &Configuration) -> Result<RawOutput, Error>;
}

/// Per-call environment for the child process. Built fresh for every run and applied
/// to the child only; the parent environment is never touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunEnvironment {
    vars: Vec<(String, String)>,
}

impl RunEnvironment {
    pub fn for_config(names: &EnvNames, config: &Configuration) -> Self {
        Self {
            vars: vec![
                (names.threads.clone(), config.thread_count.to_string()),
                (names.schedule.clone(), config.schedule.descriptor()),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Positional arguments: `<integrand> <points> <seed>`.
pub fn invocation_args(config: &Configuration) -> [String; 3] {
    [
        config.integrand.name().to_string(),
        config.point_count.to_string(),
        config.seed.to_string(),
    ]
}

/// Spawns the external integrator once per call.
pub struct ProcessExecutor {
    program: PathBuf,
    env_names: EnvNames,
    timeout: Option<Duration>,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<PathBuf>, env_names: EnvNames) -> Self {
        Self {
            program: program.into(),
            env_names,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn describe(&self, env: &RunEnvironment, config: &Configuration) -> String {
        let mut parts: Vec<String> = env.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        parts.push(self.program.display().to_string());
        parts.extend(invocation_args(config));
        parts.join(" ")
    }
}

impl Executor for ProcessExecutor {
    fn execute(&mut self, config: &Configuration) -> Result<RawOutput, Error> {
        let env = RunEnvironment::for_config(&self.env_names, config);
        let mut command = Command::new(&self.program);
        command
            .args(invocation_args(config))
            .envs(env.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(command = %self.describe(&env, config), "spawning");
        let start = Instant::now();
        let output = match self.timeout {
            None => command.output()?,
            Some(limit) => match output_with_timeout(&mut command, limit)? {
                Some(output) => output,
                None => {
                    return Err(Error::Timeout {
                        config: config.clone(),
                        after: limit,
                    })
                }
            },
        };
        let elapsed = start.elapsed();

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(Error::ExecutionFailure {
                config: config.clone(),
                command: self.describe(&env, config),
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(RawOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
            elapsed,
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Polls the child until it exits or `limit` passes. Returns `None` after killing and
/// reaping a child that overran.
fn output_with_timeout(command: &mut Command, limit: Duration) -> Result<Option<Output>, Error> {
    let mut child = command.spawn()?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let start = Instant::now();
    let poll_interval = Duration::from_millis(10);
    let status = loop {
        let polled = match child.try_wait() {
            Ok(polled) => polled,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        };
        if let Some(status) = polled {
            break status;
        }
        if start.elapsed() >= limit {
            let _ = child.kill();
            let _ = child.wait();
            // A grandchild may still hold the pipes open; the reader threads are left
            // detached rather than joined.
            return Ok(None);
        }
        thread::sleep(poll_interval);
    };

    Ok(Some(Output {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    }))
}

/// Pre-flight check run once before the sweep starts.
pub fn check_executable(path: &Path) -> Result<(), Error> {
    let missing = |reason: &str| Error::MissingExecutable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    let meta = std::fs::metadata(path).map_err(|e| missing(&e.to_string()))?;
    if !meta.is_file() {
        return Err(missing("not a regular file"));
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            return Err(missing("not executable"));
        }
    }
    Ok(())
}
