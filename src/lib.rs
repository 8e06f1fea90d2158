//! Dockstat: per-container CPU and memory telemetry for docker hosts using cgroup v1.
//!
//! This library locates cgroup v1 hierarchies through the mount table, resolves each docker
//! container's cgroup directory (classic `docker/<id>` or systemd `docker-<id>.scope` layout),
//! decodes the kernel's accounting files and maps host PIDs to the containers owning them.
use std::sync::Arc;
use std::time::Duration;

use cgroup::CgroupFs;
use config::{Cli, Command, StatArgs};
use container::ContainerID;
use docker::{DockerCli, SystemRunner};

pub mod cgroup;
pub mod config;
pub mod container;
pub mod docker;
pub mod error;
pub mod fsutil;
pub mod mountinfo;
pub mod snapshot;

/// Runs the `dockstat` command described by `cli`, printing one JSON document per line.
///
/// # Errors
///
/// Possible errors include:
/// - A missing cgroup mount for the requested subsystem.
/// - Unreadable cgroup files of the requested container.
/// - The `docker` executable being unavailable or failing.
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cgroups = cli.cgroups();
    let docker = cli.docker();

    match cli.command {
        Command::Mount { subsystem } => {
            println!("{}", cgroups.mount_point(&subsystem)?.display());
        }
        Command::Cpu(args) => {
            let (container_id, base) = stat_target(args)?;
            let decoded = cgroups.cpu(&container_id, base.as_deref())?;
            println!("{}", decoded.stat);
        }
        Command::Mem(args) => {
            let (container_id, base) = stat_target(args)?;
            let decoded = cgroups.memory(&container_id, base.as_deref())?;
            println!("{}", decoded.stat);
        }
        Command::Pids(args) => {
            let (container_id, base) = stat_target(args)?;
            let pids = cgroups.pids(&container_id, base.as_deref())?;
            println!("{}", serde_json::to_string(&pids)?);
        }
        Command::Containers => {
            for container in docker.list_containers()? {
                println!("{container}");
            }
        }
        Command::Ids => {
            println!("{}", serde_json::to_string(&docker.list_container_ids()?)?);
        }
        Command::PidMap => {
            let map = docker::container_stats_by_pid(&cgroups, &docker)?;
            println!("{}", serde_json::to_string(&map)?);
        }
        Command::Watch { interval, timeout } => {
            let timeout = Duration::from_secs(timeout);
            watch(
                cgroups,
                docker.with_timeout(timeout),
                Duration::from_secs(interval),
                timeout,
            )
            .await?;
        }
    }

    Ok(())
}

fn stat_target(args: StatArgs) -> container::Result<(ContainerID, Option<std::path::PathBuf>)> {
    let container_id = match args.container_id {
        Some(raw) => ContainerID::new(raw)?,
        None => ContainerID::all(),
    };
    Ok((container_id, args.base))
}

async fn watch(
    cgroups: CgroupFs,
    docker: DockerCli<SystemRunner>,
    period: Duration,
    timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let cgroups = Arc::new(cgroups);
    let docker = Arc::new(docker);

    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)?
            .as_secs();
        log::trace!("Collecting snapshot@{timestamp}");

        let cgroups = Arc::clone(&cgroups);
        let docker = Arc::clone(&docker);
        let task = tokio::task::spawn_blocking(move || {
            let before = std::time::Instant::now();
            let snapshot = snapshot::collect(&cgroups, &docker, timestamp);
            log::trace!("collect() took {} nanoseconds", before.elapsed().as_nanos());
            snapshot
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(snapshot))) => println!("{snapshot}"),
            Ok(Ok(Err(err))) => log::error!("failed to collect snapshot: {err}"),
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => log::warn!("snapshot@{timestamp} not ready after {timeout:?}, skipping"),
        }
    }
}
