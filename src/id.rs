use std::borrow::Cow;

use compact_str::CompactString;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct JobId {
    value: u64,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct ProjectId {
    value: u64,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct PipelineId {
    value: u64,
}

impl ProjectId {
    pub fn new(id: u64) -> Self { Self { value: id } }
}

impl PipelineId {
    pub fn new(id: u64) -> Self { Self { value: id } }
}

impl JobId {
    pub fn new(id: u64) -> Self { Self { value: id } }

    pub fn value(&self) -> u64 { self.value }
}

impl<'de> Deserialize<'de> for ProjectId {
    fn deserialize<D>(deserializer: D) -> Result<ProjectId, D::Error>
        where D: Deserializer<'de>,
    {
        let id = u64::deserialize(deserializer)?;
        Ok(ProjectId::new(id))
    }
}

impl<'de> Deserialize<'de> for PipelineId {
    fn deserialize<D>(deserializer: D) -> Result<PipelineId, D::Error>
        where D: Deserializer<'de>,
    {
        let id = u64::deserialize(deserializer)?;
        Ok(PipelineId::new(id))
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<JobId, D::Error>
        where D: Deserializer<'de>,
    {
        let id = u64::deserialize(deserializer)?;
        Ok(JobId::new(id))
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for PipelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A project addressed either by its numeric id or by its full
/// namespace path (`group/subgroup/project`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectRef {
    Id(ProjectId),
    Path(CompactString),
}

impl ProjectRef {
    pub fn path(path: impl Into<CompactString>) -> Self {
        Self::Path(path.into())
    }

    /// The project as it appears in an API path. Paths are percent-encoded,
    /// so `group/project` becomes `group%2Fproject`.
    pub fn path_segment(&self) -> Cow<'_, str> {
        match self {
            ProjectRef::Id(id) => Cow::Owned(id.to_string()),
            ProjectRef::Path(path) => urlencoding::encode(path.as_str()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ProjectRef::Id(_) => false,
            ProjectRef::Path(path) => path.trim().is_empty(),
        }
    }
}

impl From<ProjectId> for ProjectRef {
    fn from(id: ProjectId) -> Self {
        Self::Id(id)
    }
}

impl From<u64> for ProjectRef {
    fn from(id: u64) -> Self {
        Self::Id(ProjectId::new(id))
    }
}

impl From<&str> for ProjectRef {
    fn from(path: &str) -> Self {
        Self::Path(path.into())
    }
}

impl From<CompactString> for ProjectRef {
    fn from(path: CompactString) -> Self {
        Self::Path(path)
    }
}

impl std::str::FromStr for ProjectRef {
    type Err = std::convert::Infallible;

    /// Numeric input is taken as a project id, anything else as a path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<u64>() {
            Ok(id) => Self::Id(ProjectId::new(id)),
            Err(_) => Self::Path(s.into()),
        })
    }
}

impl std::fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ProjectRef::Id(id) => write!(f, "{id}"),
            ProjectRef::Path(path) => write!(f, "{path}"),
        }
    }
}
