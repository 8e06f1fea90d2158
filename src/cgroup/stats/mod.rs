//! Typed records decoded from cgroup v1 accounting files.
//!
//! # Main types
//!
//! - [`CgroupCpuStat`]: user and system ticks from `cpuacct.stat`.
//! - [`CgroupMemStat`]: counters from `memory.stat` plus four single-value memory files.
//! - [`Decoded`]: wraps a record with the lines and files that could not be used.

mod cpu;
mod error;
mod memory;
mod parser;

pub use cpu::{CgroupCpuStat, InvalidTicks, Ticks};
pub use error::ScalarFileError;
pub use memory::{CgroupMemStat, MemoryScalarFiles};
pub use parser::{Decoded, KeyValueStat, SkipReason, SkippedLine, read_single_value};
