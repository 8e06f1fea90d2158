use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

mod error;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerID`], i.e. the longest directory name.
const CONTAINER_ID_MAX_LEN: usize = 255;

/// Label reported in place of an empty [`ContainerID`].
pub const AGGREGATE_LABEL: &str = "all";

/// A validated container identifier.
///
/// The empty id is valid and addresses the parent cgroup itself, i.e. the aggregate of all
/// containers below it.
///
/// # Examples
///
/// ```
/// # use dockstat::container::ContainerID;
/// let container_id = ContainerID::new("abc123").unwrap();
/// assert_eq!(container_id.as_ref(), "abc123");
/// assert_eq!(ContainerID::all().label(), "all");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is longer than
    /// [`CONTAINER_ID_MAX_LEN`] or contains a `/`, since it could then not name a single
    /// cgroup directory.
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.len() > CONTAINER_ID_MAX_LEN || src.contains('/') {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    /// The empty id, addressing every container under the parent cgroup at once.
    pub fn all() -> Self {
        Self("".into())
    }

    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the id for display purposes, substituting [`AGGREGATE_LABEL`] for the empty id.
    pub fn label(&self) -> &str {
        if self.is_all() { AGGREGATE_LABEL } else { &self.0 }
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Runtime that owns a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ContainerType {
    Docker,
}

/// Summary of the container a process belongs to.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ContainerStat {
    #[serde(rename = "type")]
    pub container_type: ContainerType,
    pub name: String,
    pub id: String,
    pub image: String,
}

impl fmt::Display for ContainerStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_validation() {
        assert!(ContainerID::new("0123456789abcdef").is_ok());
        assert!(ContainerID::new("").unwrap().is_all());
        assert!(ContainerID::new("../../etc").is_err());
        assert!(ContainerID::new("a".repeat(CONTAINER_ID_MAX_LEN)).is_ok());
        assert!(ContainerID::new("a".repeat(CONTAINER_ID_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn test_container_id_label() {
        assert_eq!(ContainerID::all().label(), "all");
        assert_eq!(ContainerID::all().as_ref(), "");
        assert_eq!(ContainerID::new("abc").unwrap().label(), "abc");
        assert_eq!(ContainerID::all().to_string(), "all");
    }

    #[test]
    fn test_container_stat_display() {
        let stat = ContainerStat {
            container_type: ContainerType::Docker,
            name: "web1".to_owned(),
            id: "abc123".to_owned(),
            image: "nginx:latest".to_owned(),
        };
        assert_eq!(
            stat.to_string(),
            r#"{"type":"Docker","name":"web1","id":"abc123","image":"nginx:latest"}"#
        );
    }
}
