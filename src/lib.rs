//! Typed client for the GitLab CI/CD Jobs API.
//!
//! ```no_run
//! # async fn run() -> glim_jobs::client::Result<()> {
//! use glim_jobs::{
//!     client::{ClientConfig, GitlabApi, JobQuery},
//!     domain::JobScope,
//!     id::ProjectRef,
//! };
//!
//! let api = GitlabApi::new(ClientConfig::new("https://gitlab.com/api/v4", "glpat-..."))?;
//! let project = ProjectRef::path("group/project");
//! let failed = api
//!     .list_jobs(&project, &JobQuery::new().with_scope(Some(JobScope::Failed)))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod domain;
pub mod id;
pub mod logging;
pub mod result;
