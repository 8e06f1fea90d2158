use crate::fsutil;

use super::parser::parse_mount_line;
use super::{Error, Result};
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Mount table consulted when no other file is configured.
pub const DEFAULT_MOUNTS_FILE: &str = "/proc/mounts";

/// Device name the kernel reports for every cgroup v1 hierarchy.
const CGROUP_DEVICE: &str = "cgroup";

/// Detects the mount point of a cgroup v1 subsystem by parsing a mount table file.
///
/// Only entries whose device column is exactly `cgroup` are considered. Entries such as
/// `cgroup2` (the unified hierarchy) are ignored.
///
/// - With exactly one such entry (old single-hierarchy systems that mount all subsystems
///   together), its mount point is returned for every `subsystem`, even when the path does
///   not mention it.
/// - Otherwise the **last** entry whose mount point contains `subsystem` as a substring wins.
///   On a table listing `/sys/fs/cgroup/cpu` and later `/sys/fs/cgroup/cpuacct`, asking for
///   `cpu` yields `/sys/fs/cgroup/cpuacct`.
///
/// # Arguments
///
/// * `path` - Path to a mount table in `/proc/mounts` format.
/// * `subsystem` - Subsystem name, e.g. `memory` or `cpuacct`.
///
/// # Errors
///
/// - [`Error::FileOpen`] if the file can't be opened.
/// - [`Error::ReadLine`] if reading from the file fails.
/// - [`Error::Parse`] if a `cgroup` line lacks one of the six mount table columns. Other
///   unparsable lines are skipped.
/// - [`Error::MountNotFound`] if no cgroup entry matches.
///
/// # Example
///
/// ```no_run
/// use dockstat::mountinfo::detect_cgroup_mount_point;
///
/// let root = detect_cgroup_mount_point("/proc/mounts", "memory").unwrap();
/// println!("memory cgroup root: {}", root.display());
/// ```
pub fn detect_cgroup_mount_point(path: impl AsRef<Path>, subsystem: &str) -> Result<PathBuf> {
    let path = path.as_ref();
    let buf = fsutil::open_file_reader(path)?;

    detect_cgroup_mount_point_from_reader(buf, path, subsystem)
}

/// Internal implementation for detecting a cgroup mount point from a reader.
///
/// `origin` is the logical origin of the data, used in error messages.
fn detect_cgroup_mount_point_from_reader<R: BufRead>(
    mut reader: R,
    origin: &Path,
    subsystem: &str,
) -> Result<PathBuf> {
    let mut line = String::with_capacity(256);
    let mut cgroup_mounts = Vec::new();

    while reader
        .read_line(&mut line)
        .map_err(|source| Error::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?
        != 0
    {
        match parse_mount_line(line.as_str()) {
            Ok(entry) if entry.device == CGROUP_DEVICE => {
                cgroup_mounts.push(entry.mount_point.into_owned());
            }
            Ok(_) => {}
            Err(source) if line.split_whitespace().next() == Some(CGROUP_DEVICE) => {
                return Err(Error::Parse {
                    path: origin.to_path_buf(),
                    source,
                });
            }
            Err(err) if !line.trim().is_empty() => {
                log::trace!("ignoring unparsable non-cgroup mount: {err}");
            }
            Err(_) => {}
        }

        line.clear();
    }

    if let [single] = cgroup_mounts.as_slice() {
        log::debug!(
            "Single cgroup hierarchy at `{}`, using it for `{}`",
            single,
            subsystem
        );
        return Ok(PathBuf::from(single));
    }

    match cgroup_mounts
        .iter()
        .rev()
        .find(|mount_point| mount_point.contains(subsystem))
    {
        Some(mount_point) => {
            log::debug!("Found `{}` cgroup mount point: {}", subsystem, mount_point);
            Ok(PathBuf::from(mount_point))
        }
        None => Err(Error::MountNotFound {
            subsystem: subsystem.to_owned(),
            path: origin.to_path_buf(),
        }),
    }
}
