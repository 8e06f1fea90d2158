use std::io::BufRead;
use std::path::Path;

use crate::container::ContainerID;
use crate::fsutil;

use super::stats::{
    CgroupCpuStat, CgroupMemStat, Decoded, KeyValueStat, ScalarFileError, read_single_value,
};
use super::{CgroupFs, Error, Result};

const CPUACCT: &str = "cpuacct";
const MEMORY: &str = "memory";

impl CgroupFs {
    /// Reads `cpuacct.stat` of a container.
    ///
    /// `base` is the parent cgroup directory and defaults to `<cpuacct mount>/docker`; see
    /// [`CgroupFs::file_path`]. An empty `container_id` reads the parent itself and labels the
    /// result `all`.
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be resolved or the file cannot be opened or read. Lines that
    /// do not decode are reported in [`Decoded::skipped`].
    pub fn cpu(
        &self,
        container_id: &ContainerID,
        base: Option<&Path>,
    ) -> Result<Decoded<CgroupCpuStat>> {
        let path = self.file_path(container_id, base, CPUACCT, "cpuacct.stat")?;
        let mut decoded = read_key_value::<CgroupCpuStat>(&path)?;
        decoded.stat.container_id = container_id.label().to_owned();
        Ok(decoded)
    }

    /// Reads `memory.stat` and the single-value memory files of a container.
    ///
    /// The single-value files are read independently: a missing or malformed one leaves its
    /// field at zero and is reported in [`Decoded::scalar_errors`].
    ///
    /// # Errors
    ///
    /// Fails if `memory.stat` cannot be resolved, opened or read.
    pub fn memory(
        &self,
        container_id: &ContainerID,
        base: Option<&Path>,
    ) -> Result<Decoded<CgroupMemStat>> {
        let path = self.file_path(container_id, base, MEMORY, "memory.stat")?;
        let mut decoded = read_key_value::<CgroupMemStat>(&path)?;
        decoded.stat.container_id = container_id.label().to_owned();

        for (file, setter) in self.memory_scalar_files().entries() {
            match self.read_memory_scalar(container_id, base, file) {
                Ok(value) => setter(&mut decoded.stat, value),
                Err(err) => {
                    log::warn!("container {}: {}", container_id, err);
                    decoded.scalar_errors.push(err);
                }
            }
        }

        Ok(decoded)
    }

    /// Returns the PIDs attached to a container's `cpuacct` cgroup.
    ///
    /// Lines of `cgroup.procs` that are not decimal integers are skipped.
    ///
    /// # Errors
    ///
    /// Fails if `cgroup.procs` cannot be resolved, opened or read.
    pub fn pids(&self, container_id: &ContainerID, base: Option<&Path>) -> Result<Vec<i32>> {
        let path = self.file_path(container_id, base, CPUACCT, "cgroup.procs")?;
        let mut reader = fsutil::open_file_reader(&path)?;
        parse_pids(&mut reader).map_err(|source| Error::ReadLine { path, source })
    }

    fn read_memory_scalar(
        &self,
        container_id: &ContainerID,
        base: Option<&Path>,
        file: &str,
    ) -> std::result::Result<u64, ScalarFileError> {
        let path = self
            .file_path(container_id, base, MEMORY, file)
            .map_err(|source| ScalarFileError::Resolve {
                file: file.to_owned(),
                source,
            })?;
        let mut reader = fsutil::open_file_reader(&path)?;
        read_single_value(&mut reader, &path)
    }
}

fn read_key_value<T: KeyValueStat>(path: &Path) -> Result<Decoded<T>> {
    let mut reader = fsutil::open_file_reader(path)?;
    T::from_reader(&mut reader).map_err(|source| Error::ReadLine {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses `cgroup.procs` content, one PID per line.
fn parse_pids<R: BufRead>(reader: &mut R) -> std::io::Result<Vec<i32>> {
    let mut pids = Vec::new();
    for line in reader.lines() {
        let line = line?;
        match line.trim().parse::<i32>() {
            Ok(pid) => pids.push(pid),
            Err(err) => log::trace!("skipping `cgroup.procs` line `{line}`: {err}"),
        }
    }

    Ok(pids)
}
