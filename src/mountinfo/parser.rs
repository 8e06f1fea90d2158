//! Mount table line parser for Linux systems.
//!
//! Parses lines in `/proc/mounts` format (the `fstab(5)` layout). See
//! [`proc_mounts(5)`](https://man7.org/linux/man-pages/man5/proc_mounts.5.html)
//! for details on the structure.

use std::borrow::Cow;

/// Represents a parsed mount table line.
#[derive(Debug, PartialEq, Eq)]
pub struct MountEntry<'a> {
    /// Mounted device or pseudo filesystem name (`cgroup` for cgroup v1 hierarchies).
    pub device: &'a str,
    /// Mount point, with octal escapes (`\040` and friends) decoded.
    pub mount_point: Cow<'a, str>,
    /// Filesystem type (e.g., `ext4`, `cgroup`).
    pub fs_type: &'a str,
    /// Comma-separated mount options. For cgroup v1 these include the attached subsystems.
    pub options: &'a str,
    pub dump: &'a str,
    pub pass: &'a str,
}

/// Named fields in a mount table line.
#[derive(Debug)]
pub enum MountField {
    Device,
    MountPoint,
    FsType,
    Options,
    Dump,
    Pass,
}

impl std::fmt::Display for MountField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MountField::Device => "device",
            MountField::MountPoint => "mount_point",
            MountField::FsType => "fs_type",
            MountField::Options => "options",
            MountField::Dump => "dump",
            MountField::Pass => "pass",
        };
        write!(f, "{name}")
    }
}

/// Errors that may occur when parsing a mount table line.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing `{field}` in line: `{line}`")]
    MissingField { field: MountField, line: String },
}

/// Parses a single line of mount table data.
///
/// # Errors
///
/// Returns [`ParseError::MissingField`] naming the first of the six columns that is absent.
pub fn parse_mount_line(line: &str) -> Result<MountEntry<'_>, ParseError> {
    let mut fields = line.split_whitespace();
    let mut next = |field: MountField| {
        fields.next().ok_or_else(|| ParseError::MissingField {
            field,
            line: line.trim_end().to_owned(),
        })
    };

    let device = next(MountField::Device)?;
    let mount_point = unescape_octal(next(MountField::MountPoint)?);
    let fs_type = next(MountField::FsType)?;
    let options = next(MountField::Options)?;
    let dump = next(MountField::Dump)?;
    let pass = next(MountField::Pass)?;

    Ok(MountEntry {
        device,
        mount_point,
        fs_type,
        options,
        dump,
        pass,
    })
}

/// Decodes the `\ooo` escapes the kernel uses for space, tab, newline and backslash.
fn unescape_octal(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }

    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}
