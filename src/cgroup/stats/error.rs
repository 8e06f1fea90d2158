//! Errors raised while reading the single-value cgroup files next to `memory.stat`.
//!
//! These never abort a stat read. They are collected in
//! [`Decoded::scalar_errors`](super::Decoded::scalar_errors) and the affected field stays zero.

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

use crate::fsutil;

#[derive(Debug, Error)]
pub enum ScalarFileError {
    #[error("failed to resolve path of `{file}`: {source}")]
    Resolve {
        file: String,
        #[source]
        source: crate::cgroup::Error,
    },

    #[error(transparent)]
    FileOpen(#[from] fsutil::FileOpenError),

    #[error("failed to read line for file `{path}`: {source}")]
    ReadLine {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("wrong format file `{path}`: expected exactly one line, found {lines}")]
    WrongLineCount { path: PathBuf, lines: usize },

    #[error("invalid value in file `{path}`: '{value}': {source}")]
    InvalidValue {
        path: PathBuf,
        value: String,
        #[source]
        source: ParseIntError,
    },
}
