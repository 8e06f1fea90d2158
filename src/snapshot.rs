use std::fmt;

use crate::cgroup::CgroupFs;
use crate::cgroup::stats::{CgroupCpuStat, CgroupMemStat};
use crate::container::ContainerID;
use crate::docker::{self, CommandRunner, DockerContainerStat, DockerCli};

/// Resource usage of one running container at one point in time.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ContainerSample {
    pub container: DockerContainerStat,
    pub cpu: Option<CgroupCpuStat>,
    pub memory: Option<CgroupMemStat>,
    pub pids: Vec<i32>,
    /// Reads that failed for this container, e.g. because it stopped mid-collection.
    pub errors: Vec<String>,
}

/// Samples of all running containers taken in one pass.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Snapshot {
    /// Timestamp (in UNIX epoch seconds)
    pub timestamp: u64,
    pub containers: Vec<ContainerSample>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Lists running containers and reads CPU, memory and PIDs of each from the cgroup tree.
///
/// Failed reads are recorded on the affected [`ContainerSample`] and never abort the pass.
///
/// # Errors
///
/// Returns an error only if the container list itself cannot be obtained.
pub fn collect<R: CommandRunner>(
    cgroups: &CgroupFs,
    docker: &DockerCli<R>,
    timestamp: u64,
) -> docker::Result<Snapshot> {
    let containers = docker
        .list_containers()?
        .into_iter()
        .filter(|container| container.running)
        .map(|container| sample(cgroups, container))
        .collect();

    Ok(Snapshot {
        timestamp,
        containers,
    })
}

fn sample(cgroups: &CgroupFs, container: DockerContainerStat) -> ContainerSample {
    let mut sample = ContainerSample {
        container,
        cpu: None,
        memory: None,
        pids: Vec::new(),
        errors: Vec::new(),
    };

    let container_id = match ContainerID::new(&sample.container.container_id) {
        Ok(container_id) => container_id,
        Err(err) => {
            sample.errors.push(err.to_string());
            return sample;
        }
    };

    match cgroups.cpu(&container_id, None) {
        Ok(decoded) => sample.cpu = Some(decoded.into_stat()),
        Err(err) => sample.errors.push(err.to_string()),
    }
    match cgroups.memory(&container_id, None) {
        Ok(decoded) => {
            sample
                .errors
                .extend(decoded.scalar_errors.iter().map(ToString::to_string));
            sample.memory = Some(decoded.stat);
        }
        Err(err) => sample.errors.push(err.to_string()),
    }
    match cgroups.pids(&container_id, None) {
        Ok(pids) => sample.pids = pids,
        Err(err) => sample.errors.push(err.to_string()),
    }

    if !sample.errors.is_empty() {
        log::debug!(
            "container {}: {} failed reads",
            sample.container.container_id,
            sample.errors.len()
        );
    }
    sample
}
