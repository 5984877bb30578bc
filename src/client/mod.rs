//! GitLab Jobs API client
//!
//! [`GitlabApi`] owns the HTTP plumbing; the Jobs endpoints are methods on it,
//! with pagination in [`pager`] and artifact downloads in [`artifacts`].

pub mod api;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod jobs;
pub mod pager;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use api::GitlabApi;
pub use artifacts::{ArtifactDownload, ArtifactOutput, ArtifactSelector, ArtifactStream};
pub use config::{ClientConfig, JobQuery};
pub use error::{ClientError, Result};
pub use jobs::{JobAction, JobLookup};
pub use pager::{PageInfo, Pager};
