//! Tolerant decoding of Linux cgroup v1 statistics files into structured types.
//!
//! Kernels add keys to files such as `memory.stat` over time, so decoding never fails on
//! content: every line that cannot be applied is kept as a [`SkippedLine`] diagnostic next to
//! the best-effort record in [`Decoded`]. Only I/O failures abort a read.
//!
//! # Traits
//!
//! - [`KeyValueStat`]: multi-line `<key> <value>` files (`cpuacct.stat`, `memory.stat`).
//!
//! # Functions
//!
//! - [`read_single_value`]: files holding exactly one unsigned integer (`memory.usage_in_bytes`).
//!
//! # Example: Implementing `KeyValueStat`
//!
//! ```rust
//! use std::collections::HashMap;
//! use std::sync::LazyLock;
//! use dockstat::cgroup::stats::KeyValueStat;
//!
//! #[derive(Default)]
//! struct MyStat {
//!     foo: u64,
//! }
//!
//! fn set_foo(stat: &mut MyStat, foo: u64) {
//!     stat.foo = foo;
//! }
//!
//! static HANDLERS: LazyLock<HashMap<&'static str, fn(&mut MyStat, u64)>> = LazyLock::new(|| {
//!     let mut map: HashMap<&'static str, fn(&mut MyStat, u64)> = HashMap::new();
//!     map.insert("foo", set_foo);
//!     map
//! });
//!
//! impl KeyValueStat for MyStat {
//!     type Value = u64;
//!
//!     fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
//!         &HANDLERS
//!     }
//! }
//!
//! let decoded = MyStat::from_reader(&mut "foo 1\nbar 2\n".as_bytes()).unwrap();
//! assert_eq!(decoded.stat.foo, 1);
//! assert_eq!(decoded.skipped.len(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

use super::ScalarFileError;

/// Why a line did not contribute to a decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The key is not one the record knows about.
    UnknownKey,
    /// The line holds a known key but no value.
    MissingValue,
    /// The value could not be parsed; carries the parser's message.
    InvalidValue(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownKey => f.write_str("unknown key"),
            SkipReason::MissingValue => f.write_str("missing value"),
            SkipReason::InvalidValue(reason) => write!(f, "invalid value: {reason}"),
        }
    }
}

/// A line that was ignored while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    /// Line content without the trailing newline.
    pub content: String,
    pub reason: SkipReason,
}

/// A best-effort record together with everything that was dropped on the way.
#[derive(Debug)]
pub struct Decoded<T> {
    pub stat: T,
    /// Lines of the main stat file that were ignored.
    pub skipped: Vec<SkippedLine>,
    /// Auxiliary single-value files that could not be read; their fields are left at zero.
    pub scalar_errors: Vec<ScalarFileError>,
}

impl<T> Decoded<T> {
    pub fn new(stat: T) -> Self {
        Self {
            stat,
            skipped: Vec::new(),
            scalar_errors: Vec::new(),
        }
    }

    /// Returns the record, dropping all diagnostics.
    pub fn into_stat(self) -> T {
        self.stat
    }
}

/// A trait for decoding `<key> <value>` per line files such as `cpuacct.stat` and
/// `memory.stat`.
///
/// Implementors define the set of known keys and how to apply a value for each.
/// Duplicate keys overwrite earlier values. Blank lines are ignored without a diagnostic.
pub trait KeyValueStat: Default
where
    Self: 'static,
{
    /// Numeric type every value in the file is parsed as.
    type Value: FromStr<Err: fmt::Display>;

    /// Returns a map of known field names and the handler that stores a parsed value.
    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, Self::Value)>;

    /// Decodes a key-value formatted buffer.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` only if reading from `buf` fails.
    fn from_reader<R: BufRead>(buf: &mut R) -> std::io::Result<Decoded<Self>> {
        let mut decoded = Decoded::new(Self::default());
        let handlers = Self::field_handlers();

        let mut line = String::new();
        let mut lineno = 0;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            if let Err(reason) = Self::parse_line(&mut decoded.stat, &line, handlers) {
                let content = line.trim_end().to_owned();
                log::trace!("skipping line {lineno} `{content}`: {reason}");
                decoded.skipped.push(SkippedLine {
                    line: lineno,
                    content,
                    reason,
                });
            }

            line.clear();
        }

        Ok(decoded)
    }

    /// Applies a single line to `stat`.
    ///
    /// # Errors
    ///
    /// Returns the [`SkipReason`] when the line does not contribute to the record.
    fn parse_line(
        stat: &mut Self,
        line: &str,
        handlers: &HashMap<&'static str, fn(&mut Self, Self::Value)>,
    ) -> Result<(), SkipReason> {
        let mut parts = line.split_whitespace();
        let Some(key) = parts.next() else {
            return Ok(());
        };

        let handler = handlers.get(key).ok_or(SkipReason::UnknownKey)?;
        let value = parts.next().ok_or(SkipReason::MissingValue)?;
        let parsed = value
            .parse::<Self::Value>()
            .map_err(|err| SkipReason::InvalidValue(err.to_string()))?;

        handler(stat, parsed);
        Ok(())
    }
}

/// Parses a file that must consist of exactly one line holding an unsigned integer.
///
/// `origin` names the file in errors.
///
/// # Errors
///
/// - [`ScalarFileError::ReadLine`] if reading fails.
/// - [`ScalarFileError::WrongLineCount`] if the input has zero or several lines.
/// - [`ScalarFileError::InvalidValue`] if the line is not a `u64`.
pub fn read_single_value<R: BufRead>(buf: &mut R, origin: &Path) -> Result<u64, ScalarFileError> {
    let lines = buf
        .lines()
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|source| ScalarFileError::ReadLine {
            path: origin.to_path_buf(),
            source,
        })?;

    let [line] = lines.as_slice() else {
        return Err(ScalarFileError::WrongLineCount {
            path: origin.to_path_buf(),
            lines: lines.len(),
        });
    };

    let value = line.trim();
    value
        .parse::<u64>()
        .map_err(|source| ScalarFileError::InvalidValue {
            path: origin.to_path_buf(),
            value: value.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        a: u64,
        b: u64,
    }

    static HANDLERS: LazyLock<HashMap<&'static str, fn(&mut Pair, u64)>> = LazyLock::new(|| {
        let mut m: HashMap<&'static str, fn(&mut Pair, u64)> = HashMap::new();
        m.insert("a", |s, v| s.a = v);
        m.insert("b", |s, v| s.b = v);
        m
    });

    impl KeyValueStat for Pair {
        type Value = u64;

        fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
            &HANDLERS
        }
    }

    #[test]
    fn test_decode_reports_each_skip_reason() {
        let data = "\
a 1
foo bar
b
a x
b 2
";
        let decoded = Pair::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(decoded.stat, Pair { a: 1, b: 2 });

        let reasons: Vec<_> = decoded
            .skipped
            .iter()
            .map(|s| (s.line, s.content.as_str(), s.reason.clone()))
            .collect();
        assert_eq!(reasons[0], (2, "foo bar", SkipReason::UnknownKey));
        assert_eq!(reasons[1], (3, "b", SkipReason::MissingValue));
        assert_eq!(reasons[2].0, 4);
        assert!(matches!(reasons[2].2, SkipReason::InvalidValue(_)));
        assert_eq!(reasons.len(), 3);
    }

    #[test]
    fn test_decode_blank_lines_and_duplicates() {
        let data = "a 1\n\n   \na 5\n";
        let decoded = Pair::from_reader(&mut data.as_bytes()).unwrap();
        assert_eq!(decoded.stat.a, 5);
        assert!(decoded.skipped.is_empty());
    }

    #[test]
    fn test_read_single_value() {
        let origin = Path::new("/dummy");
        assert_eq!(read_single_value(&mut "8192\n".as_bytes(), origin).unwrap(), 8192);
        assert_eq!(read_single_value(&mut " 42 \n".as_bytes(), origin).unwrap(), 42);
    }

    #[test]
    fn test_read_single_value_line_count() {
        let origin = Path::new("/dummy");
        let err = read_single_value(&mut "".as_bytes(), origin).unwrap_err();
        assert!(matches!(err, ScalarFileError::WrongLineCount { lines: 0, .. }));

        let err = read_single_value(&mut "1\n2\n".as_bytes(), origin).unwrap_err();
        match err {
            ScalarFileError::WrongLineCount { path, lines } => {
                assert_eq!(path, origin);
                assert_eq!(lines, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_single_value_invalid() {
        let err = read_single_value(&mut "max\n".as_bytes(), Path::new("/dummy")).unwrap_err();
        match err {
            ScalarFileError::InvalidValue { value, .. } => assert_eq!(value, "max"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
