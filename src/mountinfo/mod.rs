//! Discovery of cgroup v1 subsystem mount points from the host mount table.
mod detect;
mod error;
mod parser;

pub use detect::{DEFAULT_MOUNTS_FILE, detect_cgroup_mount_point};
pub use error::{Error, Result};
pub use parser::{MountEntry, MountField, ParseError, parse_mount_line};
