//! Decoding of cgroup v1 memory accounting.
//!
//! Two kinds of files make up a [`CgroupMemStat`]:
//!
//! - **`memory.stat`**, whitespace-separated key-value pairs, one per line. Keys are matched
//!   by their kernel names (`rss_huge`, `total_inactive_file`, ...). The camelCase spellings
//!   (`rssHuge`, `totalInactiveFile`, ...) are accepted as aliases for the same fields.
//! - **Single-value files** such as `memory.usage_in_bytes`, named by [`MemoryScalarFiles`].
//!
//! # Examples
//!
//! ```rust
//! use dockstat::cgroup::stats::{CgroupMemStat, KeyValueStat};
//!
//! let decoded = CgroupMemStat::from_reader(&mut "cache 4096\nrss 8192\n".as_bytes()).unwrap();
//! assert_eq!(decoded.stat.cache, 4096);
//! assert_eq!(decoded.stat.rss, 8192);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use super::KeyValueStat;

/// Memory usage of a cgroup. Every counter is zero unless its key or file was found.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct CgroupMemStat {
    /// Container label; `"all"` for the aggregate of every container.
    pub container_id: String,
    pub cache: u64,
    pub rss: u64,
    pub rss_huge: u64,
    pub mapped_file: u64,
    pub pgpgin: u64,
    pub pgpgout: u64,
    pub pgfault: u64,
    pub pgmajfault: u64,
    pub inactive_anon: u64,
    pub active_anon: u64,
    pub inactive_file: u64,
    pub active_file: u64,
    pub unevictable: u64,
    pub hierarchical_memory_limit: u64,
    pub total_cache: u64,
    pub total_rss: u64,
    pub total_rss_huge: u64,
    pub total_mapped_file: u64,
    pub total_pgpgin: u64,
    pub total_pgpgout: u64,
    pub total_pgfault: u64,
    pub total_pgmajfault: u64,
    pub total_inactive_anon: u64,
    pub total_active_anon: u64,
    pub total_inactive_file: u64,
    pub total_active_file: u64,
    pub total_unevictable: u64,
    /// From the `usage` file of [`MemoryScalarFiles`].
    pub mem_usage_in_bytes: u64,
    /// From the `max_usage` file of [`MemoryScalarFiles`].
    pub mem_max_usage_in_bytes: u64,
    /// From the `limit` file of [`MemoryScalarFiles`].
    pub mem_limit_in_bytes: u64,
    /// From the `fail_count` file of [`MemoryScalarFiles`].
    pub mem_fail_cnt: u64,
}

type Setter = fn(&mut CgroupMemStat, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    // (kernel name, camelCase alias, setter)
    let fields: [(&'static str, &'static str, Setter); 27] = [
        ("cache", "cache", |s, v| s.cache = v),
        ("rss", "rss", |s, v| s.rss = v),
        ("rss_huge", "rssHuge", |s, v| s.rss_huge = v),
        ("mapped_file", "mappedFile", |s, v| s.mapped_file = v),
        ("pgpgin", "pgpgin", |s, v| s.pgpgin = v),
        ("pgpgout", "pgpgout", |s, v| s.pgpgout = v),
        ("pgfault", "pgfault", |s, v| s.pgfault = v),
        ("pgmajfault", "pgmajfault", |s, v| s.pgmajfault = v),
        ("inactive_anon", "inactiveAnon", |s, v| s.inactive_anon = v),
        ("active_anon", "activeAnon", |s, v| s.active_anon = v),
        ("inactive_file", "inactiveFile", |s, v| s.inactive_file = v),
        ("active_file", "activeFile", |s, v| s.active_file = v),
        ("unevictable", "unevictable", |s, v| s.unevictable = v),
        (
            "hierarchical_memory_limit",
            "hierarchicalMemoryLimit",
            |s, v| s.hierarchical_memory_limit = v,
        ),
        ("total_cache", "totalCache", |s, v| s.total_cache = v),
        ("total_rss", "totalRss", |s, v| s.total_rss = v),
        ("total_rss_huge", "totalRssHuge", |s, v| s.total_rss_huge = v),
        ("total_mapped_file", "totalMappedFile", |s, v| {
            s.total_mapped_file = v
        }),
        ("total_pgpgin", "totalPgpgin", |s, v| s.total_pgpgin = v),
        ("total_pgpgout", "totalPgpgout", |s, v| s.total_pgpgout = v),
        ("total_pgfault", "totalPgfault", |s, v| s.total_pgfault = v),
        ("total_pgmajfault", "totalPgmajfault", |s, v| {
            s.total_pgmajfault = v
        }),
        ("total_inactive_anon", "totalInactiveAnon", |s, v| {
            s.total_inactive_anon = v
        }),
        ("total_active_anon", "totalActiveAnon", |s, v| {
            s.total_active_anon = v
        }),
        ("total_inactive_file", "totalInactiveFile", |s, v| {
            s.total_inactive_file = v
        }),
        ("total_active_file", "totalActiveFile", |s, v| {
            s.total_active_file = v
        }),
        ("total_unevictable", "totalUnevictable", |s, v| {
            s.total_unevictable = v
        }),
    ];

    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(fields.len() * 2);
    for (name, alias, setter) in fields {
        m.insert(name, setter);
        m.insert(alias, setter);
    }

    m
});

impl KeyValueStat for CgroupMemStat {
    type Value = u64;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}

impl fmt::Display for CgroupMemStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Names of the single-value files read next to `memory.stat`.
///
/// [`MemoryScalarFiles::KERNEL`] is the default and uses the file names cgroup v1 actually
/// exposes. [`MemoryScalarFiles::LEGACY`] reproduces an older lookup in which `limit` and
/// `fail_count` point at names no kernel creates: those two fields then always stay zero
/// and show up as [`ScalarFileError`](super::ScalarFileError)s. Consumers that relied on the
/// zeroes can opt back into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryScalarFiles {
    pub usage: &'static str,
    pub max_usage: &'static str,
    pub limit: &'static str,
    pub fail_count: &'static str,
}

impl MemoryScalarFiles {
    pub const KERNEL: Self = Self {
        usage: "memory.usage_in_bytes",
        max_usage: "memory.max_usage_in_bytes",
        limit: "memory.limit_in_bytes",
        fail_count: "memory.failcnt",
    };

    pub const LEGACY: Self = Self {
        usage: "memory.usage_in_bytes",
        max_usage: "memory.max_usage_in_bytes",
        limit: "memoryLimitInBbytes",
        fail_count: "memoryFailcnt",
    };

    /// Pairs each file name with the field it fills.
    pub(crate) fn entries(&self) -> [(&'static str, Setter); 4] {
        [
            (self.usage, |s, v| s.mem_usage_in_bytes = v),
            (self.max_usage, |s, v| s.mem_max_usage_in_bytes = v),
            (self.limit, |s, v| s.mem_limit_in_bytes = v),
            (self.fail_count, |s, v| s.mem_fail_cnt = v),
        ]
    }
}

impl Default for MemoryScalarFiles {
    fn default() -> Self {
        Self::KERNEL
    }
}
