//! Per-container resource accounting read from the Linux cgroup v1 filesystem.
//!
//! Each cgroup v1 subsystem (`cpuacct`, `memory`, ...) is its own hierarchy mounted somewhere
//! below `/sys/fs/cgroup`. Docker places a container either at
//!
//! - `<mount>/docker/<id>/` (cgroupfs driver), or
//! - `<mount>/system.slice/docker-<id>.scope/` (systemd driver).
//!
//! [`CgroupFs`] discovers the mounts at call time and resolves files in either layout.
//!
//! # Supported Stats
//!
//! - `cpuacct.stat` ([`CgroupFs::cpu`])
//! - `memory.stat` and the single-value memory files ([`CgroupFs::memory`])
//! - `cgroup.procs` ([`CgroupFs::pids`])
//!
//! # Platform Requirements
//!
//! - Linux with cgroup v1 hierarchies mounted.
//! - Read access to the mount table and the cgroup tree.
mod accounting;
mod error;
mod fs;
pub mod stats;

pub use error::{Error, Result};
pub use fs::{CgroupFs, CgroupFsBuilder, DOCKER_DIR, SYSTEMD_SLICE};

#[cfg(test)]
pub(crate) use fs::testutil;
