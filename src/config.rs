//! Command line and environment configuration of the `dockstat` binary.
use std::path::PathBuf;

use crate::cgroup::CgroupFs;
use crate::cgroup::stats::MemoryScalarFiles;
use crate::docker::{DEFAULT_DOCKER_PROGRAM, DockerCli, SystemRunner};

/// Per-container CPU and memory usage of docker containers, read from cgroup v1.
#[derive(Debug, clap::Parser)]
#[command(name = "dockstat", version)]
pub struct Cli {
    /// Directory the host root filesystem is mounted at, when running inside a container.
    #[arg(long, env = "ROOTFS_MOUNT_PATH", default_value = "/")]
    pub rootfs: PathBuf,

    /// Mount table to scan for cgroup hierarchies [default: /proc/mounts, or
    /// <rootfs>/proc/1/mounts when --rootfs is set].
    #[arg(long, env = "DOCKSTAT_MOUNTS_FILE")]
    pub mounts_file: Option<PathBuf>,

    /// Read memory limit and fail count from the historical, non-existent file names,
    /// which always yields zero for both.
    #[arg(long, env = "DOCKSTAT_LEGACY_MEMORY_FILES")]
    pub legacy_memory_files: bool,

    /// Docker executable, looked up in PATH unless it contains a `/`.
    #[arg(long, env = "DOCKSTAT_DOCKER_BIN", default_value = DEFAULT_DOCKER_PROGRAM)]
    pub docker_bin: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Print the mount point of a cgroup subsystem.
    Mount { subsystem: String },
    /// Print `cpuacct.stat` of a container, or of all containers when no id is given.
    Cpu(StatArgs),
    /// Print memory accounting of a container, or of all containers when no id is given.
    Mem(StatArgs),
    /// Print the PIDs in a container's cgroup.
    Pids(StatArgs),
    /// List all containers known to docker.
    Containers,
    /// List the ids of running containers.
    Ids,
    /// Print the mapping of host PIDs to running containers.
    PidMap,
    /// Periodically print a snapshot of all running containers.
    Watch {
        /// Seconds between snapshots.
        #[arg(long, default_value_t = 1)]
        interval: u64,
        /// Seconds a single snapshot may take before it is abandoned; a docker invocation
        /// still running by then is killed.
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

#[derive(Debug, clap::Args)]
pub struct StatArgs {
    /// Container id; empty for the parent cgroup.
    pub container_id: Option<String>,
    /// Parent cgroup directory [default: <subsystem mount>/docker].
    #[arg(long)]
    pub base: Option<PathBuf>,
}

impl Cli {
    pub fn cgroups(&self) -> CgroupFs {
        let mut builder = CgroupFs::builder();
        builder.set_rootfs(&self.rootfs);
        if let Some(mounts_file) = &self.mounts_file {
            builder.set_mounts_file(mounts_file);
        }
        if self.legacy_memory_files {
            builder.set_memory_scalar_files(MemoryScalarFiles::LEGACY);
        }
        builder.build()
    }

    pub fn docker(&self) -> DockerCli<SystemRunner> {
        DockerCli::with_program(SystemRunner, &self.docker_bin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_stat_command() {
        let cli = Cli::try_parse_from(["dockstat", "--legacy-memory-files", "mem", "abc"]).unwrap();
        assert!(cli.legacy_memory_files);
        assert_eq!(cli.rootfs, PathBuf::from("/"));
        assert_eq!(
            cli.cgroups().memory_scalar_files(),
            &MemoryScalarFiles::LEGACY
        );
        match cli.command {
            Command::Mem(args) => {
                assert_eq!(args.container_id.as_deref(), Some("abc"));
                assert!(args.base.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_watch_defaults() {
        let cli = Cli::try_parse_from(["dockstat", "watch"]).unwrap();
        match cli.command {
            Command::Watch { interval, timeout } => {
                assert_eq!(interval, 1);
                assert_eq!(timeout, 10);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(Cli::try_parse_from(["dockstat"]).is_err());
    }
}
