use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use crate::{cgroup, fsutil};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The docker executable is not on `PATH`; callers usually treat this as "no containers".
    #[error("docker not available")]
    DockerNotAvailable,
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` did not finish within {timeout:?}")]
    Timeout { program: PathBuf, timeout: Duration },
    #[error("`{program}` exited with {status}: {stderr}")]
    ExitStatus {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[error(transparent)]
    Cgroup(#[from] cgroup::Error),
    #[error(transparent)]
    ListDirectory(#[from] fsutil::ListDirectoryError),
}

pub type Result<T> = std::result::Result<T, Error>;
