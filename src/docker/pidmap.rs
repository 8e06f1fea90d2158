use std::collections::HashMap;

use crate::cgroup::{CgroupFs, DOCKER_DIR};
use crate::container::{ContainerID, ContainerStat, ContainerType};
use crate::error::ResultOkLogExt;
use crate::fsutil;

use super::{CommandRunner, DockerCli, Result};

/// Maps every PID of every running docker container to a summary of that container.
///
/// Enumeration is best effort: if docker cannot be queried the map is empty, and a container
/// whose `cgroup.procs` cannot be read is left out. The map is rebuilt on every call.
///
/// # Errors
///
/// - [`super::Error::Cgroup`] if the `cpuacct` subsystem has no mount.
/// - [`super::Error::ListDirectory`] if the mount directory cannot be listed.
pub fn container_stats_by_pid<R: CommandRunner>(
    cgroups: &CgroupFs,
    docker: &DockerCli<R>,
) -> Result<HashMap<i32, ContainerStat>> {
    let mut container_map = HashMap::new();

    let mount = cgroups.mount_point("cpuacct")?;
    if !mount.exists() {
        log::debug!("cpuacct mount `{}` does not exist", mount.display());
        return Ok(container_map);
    }
    if !fsutil::list_directory(&mount)?
        .iter()
        .any(|name| name == DOCKER_DIR)
    {
        log::debug!("no `{}` cgroup below `{}`", DOCKER_DIR, mount.display());
        return Ok(container_map);
    }

    let Some(containers) = docker.list_containers().ok_log(log::Level::Debug) else {
        return Ok(container_map);
    };
    let base = mount.join(DOCKER_DIR);

    for container in containers.into_iter().filter(|c| c.running) {
        let Some(container_id) = ContainerID::new(&container.container_id).ok_log(log::Level::Warn)
        else {
            continue;
        };
        let Some(pids) = cgroups
            .pids(&container_id, Some(&base))
            .ok_log(log::Level::Warn)
        else {
            continue;
        };

        let stat = ContainerStat {
            container_type: ContainerType::Docker,
            name: container.name,
            id: container.container_id,
            image: container.image,
        };
        for pid in pids {
            container_map.insert(pid, stat.clone());
        }
    }

    Ok(container_map)
}
