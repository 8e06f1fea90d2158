//! Docker container enumeration through the `docker` command line client.
//!
//! The client is only used to learn which containers exist and how they are named; all
//! resource figures come from the cgroup filesystem (see [`crate::cgroup`]).
mod error;
mod pidmap;
mod runner;

pub use error::{Error, Result};
pub use pidmap::container_stats_by_pid;
pub use runner::{CommandRunner, SystemRunner};

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Program name looked up when no other is configured.
pub const DEFAULT_DOCKER_PROGRAM: &str = "docker";

const PS_FORMAT: &str = "{{.ID}}|{{.Image}}|{{.Names}}|{{.Status}}";

/// A container as listed by `docker ps -a`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DockerContainerStat {
    pub container_id: String,
    /// First of the container's names.
    pub name: String,
    pub image: String,
    /// Raw status column, e.g. `Up 3 hours` or `Exited (0) 2 days ago`.
    pub status: String,
    /// Whether `status` reports the container as up.
    pub running: bool,
}

impl fmt::Display for DockerContainerStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Parses a `{{.ID}}|{{.Image}}|{{.Names}}|{{.Status}}` line.
///
/// Returns `None` for lines that do not have exactly four columns.
pub fn parse_ps_line(line: &str) -> Option<DockerContainerStat> {
    let columns: Vec<&str> = line.split('|').collect();
    let [id, image, names, status] = columns.as_slice() else {
        return None;
    };

    let name = names.split(',').next().unwrap_or_default();
    Some(DockerContainerStat {
        container_id: (*id).to_owned(),
        name: name.to_owned(),
        image: (*image).to_owned(),
        status: (*status).to_owned(),
        running: status.contains("Up"),
    })
}

/// Thin client for the `docker` executable.
#[derive(Debug, Clone)]
pub struct DockerCli<R = SystemRunner> {
    runner: R,
    program: String,
    timeout: Option<Duration>,
}

impl Default for DockerCli<SystemRunner> {
    fn default() -> Self {
        Self::new(SystemRunner)
    }
}

impl<R: CommandRunner> DockerCli<R> {
    pub fn new(runner: R) -> Self {
        Self::with_program(runner, DEFAULT_DOCKER_PROGRAM)
    }

    /// Uses `program` (a name looked up in `PATH`, or a path) instead of `docker`.
    pub fn with_program(runner: R, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            timeout: None,
        }
    }

    /// Kills any docker invocation still running after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Lists all containers, running or not (`docker ps -a --no-trunc`).
    ///
    /// Lines that do not have the expected four columns are skipped.
    ///
    /// # Errors
    ///
    /// - [`Error::DockerNotAvailable`] if the executable cannot be found.
    /// - [`Error::Timeout`] if it outlives the configured timeout.
    /// - [`Error::Spawn`] or [`Error::ExitStatus`] if running it fails.
    pub fn list_containers(&self) -> Result<Vec<DockerContainerStat>> {
        let out = self.run(&["ps", "-a", "--no-trunc", "--format", PS_FORMAT])?;
        Ok(out
            .lines()
            .filter(|line| !line.is_empty())
            .filter_map(|line| {
                let stat = parse_ps_line(line);
                if stat.is_none() {
                    log::debug!("skipping malformed `docker ps` line `{line}`");
                }
                stat
            })
            .collect())
    }

    /// Lists the full ids of running containers (`docker ps -q --no-trunc`).
    ///
    /// # Errors
    ///
    /// Same as [`Self::list_containers`].
    pub fn list_container_ids(&self) -> Result<Vec<String>> {
        let out = self.run(&["ps", "-q", "--no-trunc"])?;
        Ok(out
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let program: PathBuf = self
            .runner
            .lookup(&self.program)
            .ok_or(Error::DockerNotAvailable)?;
        log::trace!("running `{}` {:?}", program.display(), args);

        let output = self
            .runner
            .output(&program, args, self.timeout)
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::TimedOut => Error::Timeout {
                    program: program.clone(),
                    timeout: self.timeout.unwrap_or_default(),
                },
                _ => Error::Spawn {
                    program: program.clone(),
                    source,
                },
            })?;
        if !output.status.success() {
            return Err(Error::ExitStatus {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::os::unix::process::ExitStatusExt;
    use std::path::{Path, PathBuf};
    use std::process::{ExitStatus, Output};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::CommandRunner;

    /// Returns canned output and records every invocation.
    #[derive(Debug, Default)]
    pub struct FakeRunner {
        pub available: bool,
        pub exit_code: i32,
        /// Fails every invocation as if it outlived its deadline.
        pub hangs: bool,
        pub stdout: String,
        pub calls: Mutex<Vec<Vec<String>>>,
        pub timeouts: Mutex<Vec<Option<Duration>>>,
    }

    impl FakeRunner {
        pub fn with_stdout(stdout: &str) -> Self {
            Self {
                available: true,
                stdout: stdout.to_owned(),
                ..Default::default()
            }
        }

        pub fn missing() -> Self {
            Self::default()
        }
    }

    impl CommandRunner for FakeRunner {
        fn lookup(&self, program: &str) -> Option<PathBuf> {
            self.available
                .then(|| PathBuf::from("/usr/bin").join(program))
        }

        fn output(
            &self,
            _program: &Path,
            args: &[&str],
            timeout: Option<Duration>,
        ) -> std::io::Result<Output> {
            self.calls
                .lock()
                .unwrap()
                .push(args.iter().map(|arg| arg.to_string()).collect());
            self.timeouts.lock().unwrap().push(timeout);
            if self.hangs {
                return Err(std::io::ErrorKind::TimedOut.into());
            }
            Ok(Output {
                status: ExitStatus::from_raw(self.exit_code << 8),
                stdout: self.stdout.clone().into_bytes(),
                stderr: b"boom\n".to_vec(),
            })
        }
    }
}
