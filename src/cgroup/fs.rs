use std::path::{Path, PathBuf};

use crate::container::ContainerID;
use crate::mountinfo;

use super::Result;
use super::stats::MemoryScalarFiles;

/// Directory docker creates below each subsystem mount in the classic layout.
pub const DOCKER_DIR: &str = "docker";

/// Parent of the per-container scopes when systemd manages the cgroup tree.
pub const SYSTEMD_SLICE: &str = "system.slice";

/// Read-only view of the host's cgroup v1 hierarchies.
///
/// Holds configuration only; every call re-reads the mount table and the requested files,
/// so results always reflect the live kernel state.
#[derive(Debug, Clone)]
pub struct CgroupFs {
    rootfs: PathBuf,
    mounts_file: PathBuf,
    memory_scalar_files: MemoryScalarFiles,
}

impl Default for CgroupFs {
    fn default() -> Self {
        CgroupFsBuilder::default().build()
    }
}

impl CgroupFs {
    pub fn builder() -> CgroupFsBuilder {
        CgroupFsBuilder::default()
    }

    pub fn memory_scalar_files(&self) -> &MemoryScalarFiles {
        &self.memory_scalar_files
    }

    /// Returns the directory where `subsystem` (e.g. `memory`, `cpuacct`) is mounted.
    ///
    /// Mount points are taken from the configured mount table and re-rooted below the
    /// configured root filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`super::Error::Mount`] if the mount table cannot be read or has no entry
    /// for `subsystem`.
    pub fn mount_point(&self, subsystem: &str) -> Result<PathBuf> {
        let mount_point = mountinfo::detect_cgroup_mount_point(&self.mounts_file, subsystem)?;
        Ok(self.rootfs.join(
            mount_point
                .strip_prefix("/")
                .unwrap_or(mount_point.as_path()),
        ))
    }

    /// Returns `<mount of subsystem>/docker`, the default base for [`Self::file_path`].
    pub fn docker_base(&self, subsystem: &str) -> Result<PathBuf> {
        Ok(self.mount_point(subsystem)?.join(DOCKER_DIR))
    }

    /// Resolves the path of `file` in the cgroup of `container_id`.
    ///
    /// The classic layout `<base>/<container_id>/<file>` is tried first. `base` defaults to
    /// [`Self::docker_base`]. If that path does not exist the systemd layout
    /// `<mount>/system.slice/docker-<container_id>.scope/<file>` is returned instead,
    /// without checking that it exists; a bogus id then fails when the file is read.
    ///
    /// # Errors
    ///
    /// Returns [`super::Error::Mount`] if the subsystem mount is needed but cannot be found.
    pub fn file_path(
        &self,
        container_id: &ContainerID,
        base: Option<&Path>,
        subsystem: &str,
        file: &str,
    ) -> Result<PathBuf> {
        let base = match base {
            Some(base) => base.to_path_buf(),
            None => self.docker_base(subsystem)?,
        };

        let classic = if container_id.is_all() {
            base.join(file)
        } else {
            base.join(container_id.as_ref()).join(file)
        };
        if classic.exists() {
            log::trace!("resolved `{}`", classic.display());
            return Ok(classic);
        }

        let fallback = self
            .mount_point(subsystem)?
            .join(SYSTEMD_SLICE)
            .join(format!("docker-{}.scope", container_id.as_ref()))
            .join(file);
        log::trace!(
            "`{}` does not exist, falling back to `{}`",
            classic.display(),
            fallback.display()
        );
        Ok(fallback)
    }
}

#[derive(Debug, Clone)]
pub struct CgroupFsBuilder {
    rootfs: PathBuf,
    mounts_file: Option<PathBuf>,
    memory_scalar_files: MemoryScalarFiles,
}

impl Default for CgroupFsBuilder {
    fn default() -> Self {
        Self {
            rootfs: PathBuf::from("/"),
            mounts_file: None,
            memory_scalar_files: MemoryScalarFiles::default(),
        }
    }
}

impl CgroupFsBuilder {
    /// Sets the directory the host root filesystem is visible at.
    ///
    /// Mount points are re-rooted below it. Unless a mount table is set explicitly, the one
    /// of the host's init process (`<rootfs>/proc/1/mounts`) is used when `rootfs` is not `/`.
    pub fn set_rootfs(&mut self, rootfs: impl Into<PathBuf>) -> &mut Self {
        self.rootfs = rootfs.into();
        self
    }

    /// Sets the mount table file to scan, overriding the default derived from the rootfs.
    pub fn set_mounts_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.mounts_file = Some(path.into());
        self
    }

    /// Sets the names of the single-value files read next to `memory.stat`.
    pub fn set_memory_scalar_files(&mut self, files: MemoryScalarFiles) -> &mut Self {
        self.memory_scalar_files = files;
        self
    }

    pub fn build(&self) -> CgroupFs {
        let mounts_file = match &self.mounts_file {
            Some(path) => path.clone(),
            None if self.rootfs == Path::new("/") => PathBuf::from(mountinfo::DEFAULT_MOUNTS_FILE),
            None => self.rootfs.join("proc/1/mounts"),
        };
        log::debug!(
            "cgroup view: rootfs=`{}`, mounts=`{}`",
            self.rootfs.display(),
            mounts_file.display()
        );

        CgroupFs {
            rootfs: self.rootfs.clone(),
            mounts_file,
            memory_scalar_files: self.memory_scalar_files,
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use super::CgroupFs;

    /// A temporary split cgroup hierarchy with `cpuacct` and `memory` mounts and a mount
    /// table pointing at them.
    pub struct FakeHierarchy {
        pub dir: tempfile::TempDir,
        pub cgroups: CgroupFs,
    }

    impl FakeHierarchy {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut mounts = std::fs::File::create(dir.path().join("mounts")).unwrap();
            writeln!(mounts, "proc /proc proc rw,relatime 0 0").unwrap();
            for subsystem in ["cpu,cpuacct", "memory"] {
                let mount = dir.path().join(subsystem);
                std::fs::create_dir_all(&mount).unwrap();
                writeln!(
                    mounts,
                    "cgroup {} cgroup rw,nosuid,nodev,noexec,relatime,{} 0 0",
                    mount.display(),
                    subsystem
                )
                .unwrap();
            }

            let cgroups = CgroupFs::builder()
                .set_mounts_file(dir.path().join("mounts"))
                .build();
            Self { dir, cgroups }
        }

        pub fn mount(&self, subsystem: &str) -> PathBuf {
            match subsystem {
                "cpuacct" => self.dir.path().join("cpu,cpuacct"),
                other => self.dir.path().join(other),
            }
        }

        /// Writes `contents` to `<mount>/<relative>`, creating parents.
        pub fn write(&self, subsystem: &str, relative: impl AsRef<Path>, contents: &str) {
            let path = self.mount(subsystem).join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
    }
}
