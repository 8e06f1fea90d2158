//! Decoding of the cgroup v1 `cpuacct.stat` file.
//!
//! The file reports CPU time consumed by all tasks of a cgroup in scheduler ticks
//! (`USER_HZ`, usually 100 per second), one `<key> <value>` pair per line:
//!
//! ```text
//! user 4214
//! system 2027
//! ```
//!
//! # Examples
//!
//! ```rust
//! use dockstat::cgroup::stats::{CgroupCpuStat, KeyValueStat};
//!
//! let decoded = CgroupCpuStat::from_reader(&mut "user 100\nsystem 50\n".as_bytes()).unwrap();
//! assert_eq!(decoded.stat.user, 100.0);
//! assert_eq!(decoded.stat.system, 50.0);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::num::ParseFloatError;
use std::str::FromStr;
use std::sync::LazyLock;

use super::KeyValueStat;

/// CPU usage of a cgroup as read from `cpuacct.stat`.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct CgroupCpuStat {
    /// Container label; `"all"` for the aggregate of every container.
    #[serde(rename = "cpu")]
    pub container_id: String,
    /// Ticks spent in user mode.
    pub user: f64,
    /// Ticks spent in kernel mode.
    pub system: f64,
}

/// A finite, non-negative tick count as found in `cpuacct.stat`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ticks(pub f64);

#[derive(Debug, thiserror::Error)]
pub enum InvalidTicks {
    #[error(transparent)]
    Parse(#[from] ParseFloatError),
    #[error("{0} is not a finite non-negative tick count")]
    OutOfRange(f64),
}

impl FromStr for Ticks {
    type Err = InvalidTicks;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ticks: f64 = s.parse()?;
        if !ticks.is_finite() || ticks < 0.0 {
            return Err(InvalidTicks::OutOfRange(ticks));
        }
        Ok(Self(ticks))
    }
}

impl CgroupCpuStat {
    fn set_user(&mut self, Ticks(user): Ticks) {
        self.user = user;
    }

    fn set_system(&mut self, Ticks(system): Ticks) {
        self.system = system;
    }
}

type Setter = fn(&mut CgroupCpuStat, Ticks);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(2);

    m.insert("user", CgroupCpuStat::set_user);
    m.insert("system", CgroupCpuStat::set_system);

    m
});

impl KeyValueStat for CgroupCpuStat {
    type Value = Ticks;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, Ticks)> {
        &SETTERS
    }
}

impl fmt::Display for CgroupCpuStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cgroup::stats::SkipReason;

    #[test]
    fn test_parse_empty_cpu_stat() {
        let decoded = CgroupCpuStat::from_reader(&mut "".as_bytes()).unwrap();
        assert_eq!(decoded.stat, CgroupCpuStat::default());
        assert!(decoded.skipped.is_empty());
    }

    #[test]
    fn test_parse_complete_cpu_stat() {
        let data = "\
user 100
system 50
";
        let decoded = CgroupCpuStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(decoded.stat.user, 100.0);
        assert_eq!(decoded.stat.system, 50.0);
        assert!(decoded.skipped.is_empty());
    }

    #[test]
    fn test_parse_cpu_stat_with_garbage() {
        let data = "\
user 100
foo bar
system abc
system 50
";
        let decoded = CgroupCpuStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(decoded.stat.user, 100.0);
        assert_eq!(decoded.stat.system, 50.0);

        assert_eq!(decoded.skipped.len(), 2);
        assert_eq!(decoded.skipped[0].reason, SkipReason::UnknownKey);
        assert_eq!(decoded.skipped[1].line, 3);
        assert!(matches!(
            decoded.skipped[1].reason,
            SkipReason::InvalidValue(_)
        ));
    }

    #[test]
    fn test_parse_cpu_stat_rejects_out_of_range_ticks() {
        let data = "\
user -5
system inf
user NaN
system 7
";
        let decoded = CgroupCpuStat::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(decoded.stat.user, 0.0);
        assert_eq!(decoded.stat.system, 7.0);

        assert_eq!(decoded.skipped.len(), 3);
        for skipped in &decoded.skipped {
            assert!(matches!(skipped.reason, SkipReason::InvalidValue(_)));
        }
        assert_eq!(
            decoded.skipped[0].reason,
            SkipReason::InvalidValue("-5 is not a finite non-negative tick count".to_owned())
        );
    }

    #[test]
    fn test_cpu_stat_display() {
        let stat = CgroupCpuStat {
            container_id: "abc".to_owned(),
            user: 1.5,
            system: 2.0,
        };
        assert_eq!(stat.to_string(), r#"{"cpu":"abc","user":1.5,"system":2.0}"#);
    }
}
