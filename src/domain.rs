// GitLab API Documentation: https://docs.gitlab.com/ee/api/jobs.html
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::Deserialize;

use crate::id::{JobId, PipelineId, ProjectId};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: CompactString,
    pub stage: CompactString,
    pub status: JobStatus,
    #[serde(rename = "ref")]
    pub branch: CompactString,
    #[serde(default)]
    pub tag: bool,
    pub coverage: Option<f64>,
    #[serde(default)]
    pub allow_failure: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub erased_at: Option<DateTime<Utc>>,
    pub artifacts_expire_at: Option<DateTime<Utc>>,
    /// Seconds
    pub duration: Option<f64>,
    pub queued_duration: Option<f64>,
    pub web_url: CompactString,
    pub failure_reason: Option<CompactString>,
    pub user: Option<UserDto>,
    pub commit: Option<CommitDto>,
    pub pipeline: Option<PipelineRefDto>,
    pub runner: Option<RunnerDto>,
    pub artifacts_file: Option<ArtifactsFile>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDto {
    pub id: u64,
    pub name: CompactString,
    pub username: CompactString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitDto {
    pub id: CompactString,
    pub short_id: CompactString,
    pub title: CompactString,
    pub author_name: CompactString,
}

/// The pipeline a job belongs to, as embedded in the job record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineRefDto {
    pub id: PipelineId,
    pub project_id: ProjectId,
    #[serde(rename = "ref")]
    pub branch: CompactString,
    pub sha: CompactString,
    pub status: JobStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerDto {
    pub id: u64,
    pub description: Option<CompactString>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub is_shared: bool,
}

/// A named file inside a job's artifact archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArtifactsFile {
    pub filename: CompactString,
    #[serde(default)]
    pub size: u64,
}

impl ArtifactsFile {
    pub fn new(filename: impl Into<CompactString>, size: u64) -> Self {
        Self { filename: filename.into(), size }
    }
}

/// One entry of the `artifacts` list (archive, metadata, trace, reports).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtifactDto {
    pub file_type: CompactString,
    #[serde(default)]
    pub size: u64,
    pub filename: CompactString,
    pub file_format: Option<CompactString>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Created,
    WaitingForResource,
    Preparing,
    Pending,
    Running,
    Success,
    Failed,
    Canceling,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        self < &JobStatus::Success
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Created => "created",
            JobStatus::WaitingForResource => "waiting_for_resource",
            JobStatus::Preparing => "preparing",
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Canceling => "canceling",
            JobStatus::Canceled => "canceled",
            JobStatus::Skipped => "skipped",
            JobStatus::Manual => "manual",
            JobStatus::Scheduled => "scheduled",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side status filter for job listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobScope {
    Created,
    Pending,
    Running,
    Failed,
    Success,
    Canceled,
    Skipped,
    Manual,
}

impl JobScope {
    pub const ALL: [JobScope; 8] = [
        JobScope::Created,
        JobScope::Pending,
        JobScope::Running,
        JobScope::Failed,
        JobScope::Success,
        JobScope::Canceled,
        JobScope::Skipped,
        JobScope::Manual,
    ];

    /// The value sent as the `scope` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobScope::Created => "created",
            JobScope::Pending => "pending",
            JobScope::Running => "running",
            JobScope::Failed => "failed",
            JobScope::Success => "success",
            JobScope::Canceled => "canceled",
            JobScope::Skipped => "skipped",
            JobScope::Manual => "manual",
        }
    }
}

impl std::fmt::Display for JobScope {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        JobScope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| format!("unknown job scope: {s}"))
    }
}

impl Job {
    /// Wall-clock duration, falling back to the timestamps when GitLab
    /// omits `duration`.
    pub fn elapsed(&self) -> chrono::Duration {
        if let Some(seconds) = self.duration {
            return chrono::Duration::milliseconds((seconds * 1000.0) as i64);
        }

        match (&self.started_at, &self.finished_at) {
            (Some(begin), Some(end)) => end.signed_duration_since(begin),
            (Some(begin), None) => Utc::now().signed_duration_since(begin),
            _ => chrono::Duration::zero(),
        }
    }
}
