use std::ffi::OsStr;
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Interval between exit checks of a child running under a deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs external programs on behalf of [`super::DockerCli`].
///
/// Tests substitute an implementation returning canned output, so no docker daemon is needed.
pub trait CommandRunner {
    /// Resolves `program` to an executable path, or `None` if it cannot be found.
    fn lookup(&self, program: &str) -> Option<PathBuf>;

    /// Runs `program` with `args` to completion and captures its output.
    ///
    /// With a `timeout`, a child still running at the deadline is killed and reaped, and an
    /// error of kind [`std::io::ErrorKind::TimedOut`] is returned.
    fn output(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> std::io::Result<Output>;
}

/// Spawns real processes, looking programs up in `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn lookup(&self, program: &str) -> Option<PathBuf> {
        if program.contains('/') {
            let path = PathBuf::from(program);
            return is_executable(&path).then_some(path);
        }

        let paths = std::env::var_os("PATH")?;
        find_in_paths(program, &paths)
    }

    fn output(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> std::io::Result<Output> {
        let mut command = Command::new(program);
        command.args(args);
        let Some(timeout) = timeout else {
            return command.output();
        };

        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                kill(&mut child, program);
                return Err(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("killed after {timeout:?}"),
                ));
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(Output {
            status,
            stdout: join_drain(stdout)?,
            stderr: join_drain(stderr)?,
        })
    }
}

/// Reads a child pipe to its end on a separate thread so the child never blocks on a full pipe.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join_drain(handle: JoinHandle<std::io::Result<Vec<u8>>>) -> std::io::Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| std::io::Error::other("pipe reader panicked"))?
}

fn kill(child: &mut Child, program: &Path) {
    log::warn!(
        "`{}` (pid {}) exceeded its deadline, killing it",
        program.display(),
        child.id()
    );
    if let Err(err) = child.kill() {
        log::debug!("failed to kill pid {}: {err}", child.id());
    }
    if let Err(err) = child.wait() {
        log::debug!("failed to reap pid {}: {err}", child.id());
    }
}

fn find_in_paths(program: &str, paths: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(paths)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SH: &str = "/bin/sh";

    #[test]
    fn test_find_in_paths() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();

        let not_executable = first.path().join("docker");
        std::fs::write(&not_executable, "").unwrap();

        let executable = second.path().join("docker");
        std::fs::write(&executable, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&executable, std::fs::Permissions::from_mode(0o755)).unwrap();

        let paths = std::env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(find_in_paths("docker", &paths), Some(executable));
        assert_eq!(find_in_paths("podman", &paths), None);
    }

    #[test]
    fn test_lookup_absolute_path() {
        let runner = SystemRunner;
        assert_eq!(runner.lookup("/definitely/not/docker"), None);
    }

    #[test]
    fn test_output_within_deadline() {
        let output = SystemRunner
            .output(
                Path::new(SH),
                &["-c", "echo out; echo err >&2; exit 3"],
                Some(Duration::from_secs(10)),
            )
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stdout, b"out\n");
        assert_eq!(output.stderr, b"err\n");
    }

    #[test]
    fn test_output_kills_child_after_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("sleep 1; touch '{}'", marker.display());

        let started = Instant::now();
        let err = SystemRunner
            .output(
                Path::new(SH),
                &["-c", &script],
                Some(Duration::from_millis(200)),
            )
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(1));

        // The shell was killed before it could run the second command.
        thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }
}
