//! Test utilities and common test fixtures for client modules

use serde_json::json;

use crate::{
    client::{api::GitlabApi, config::ClientConfig},
    id::JobId,
};


/// Create JSON representation of a job
pub fn sample_job_json(id: u64, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "test-job",
        "stage": "test",
        "status": status,
        "ref": "main",
        "tag": false,
        "coverage": null,
        "allow_failure": false,
        "created_at": "2023-01-01T00:00:00Z",
        "started_at": "2023-01-01T00:01:00Z",
        "finished_at": "2023-01-01T00:05:00Z",
        "erased_at": null,
        "duration": 240.5,
        "queued_duration": 1.2,
        "web_url": format!("https://gitlab.example.com/group/project/-/jobs/{id}"),
        "user": {
            "id": 1,
            "name": "Test Author",
            "username": "author"
        },
        "commit": {
            "id": "0ff3ae198f8601a285adcf5c0fff204ee6fba5fd",
            "short_id": "0ff3ae19",
            "title": "Test commit",
            "author_name": "Test Author"
        },
        "pipeline": {
            "id": 456,
            "project_id": 123,
            "ref": "main",
            "sha": "0ff3ae198f8601a285adcf5c0fff204ee6fba5fd",
            "status": "success"
        },
        "artifacts_file": {
            "filename": "artifacts.zip",
            "size": 1000
        },
        "artifacts": [
            { "file_type": "archive", "size": 1000, "filename": "artifacts.zip", "file_format": "zip" },
            { "file_type": "trace", "size": 1500, "filename": "job.log", "file_format": null }
        ],
        "runner": {
            "id": 32,
            "description": "shared-runner",
            "active": true,
            "is_shared": true
        }
    })
}

/// A JSON array of jobs with consecutive ids starting at `first`
pub fn jobs_json(first: u64, count: u64) -> serde_json::Value {
    json!((first..first + count)
        .map(|id| sample_job_json(id, "success"))
        .collect::<Vec<_>>())
}

pub fn job_ids(jobs: &[crate::domain::Job]) -> Vec<JobId> {
    jobs.iter().map(|j| j.id).collect()
}

/// Create GitLab API error response
pub fn gitlab_error_response(error: &str, description: Option<&str>) -> serde_json::Value {
    let mut json = json!({
        "error": error
    });

    if let Some(desc) = description {
        json["error_description"] = json!(desc);
    }

    json
}

/// Create GitLab API error response (format 2)
pub fn gitlab_error_response_2(message: &str) -> serde_json::Value {
    json!({
        "message": message
    })
}

/// Mock HTTP server for testing
pub struct MockServer {
    pub server: wiremock::MockServer,
}

impl MockServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        let server = wiremock::MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Create a test config pointing to this mock server
    pub fn test_config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url(), "test-token")
    }

    pub fn api(&self) -> GitlabApi {
        GitlabApi::new(self.test_config()).unwrap()
    }
}

#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use super::*;
    use crate::domain::{Job, JobStatus};

    #[test]
    fn test_sample_job_decodes() {
        let job: Job = serde_json::from_value(sample_job_json(789, "failed")).unwrap();

        assert_eq!(job.id, JobId::new(789));
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.artifacts.len(), 2);
        assert_eq!(job.artifacts_file.as_ref().unwrap().filename, "artifacts.zip");
        assert_eq!(job.pipeline.as_ref().unwrap().branch, "main");
        assert_eq!(job.elapsed(), chrono::Duration::milliseconds(240_500));
    }

    #[test]
    fn test_jobs_json() {
        let jobs = jobs_json(10, 3);
        assert_eq!(jobs.as_array().unwrap().len(), 3);
        assert_eq!(jobs[2]["id"], 12);
    }

    #[test]
    fn test_error_responses() {
        let error1 = gitlab_error_response("invalid_token", Some("Token is invalid"));
        assert_eq!(error1["error"], "invalid_token");
        assert_eq!(error1["error_description"], "Token is invalid");

        let error2 = gitlab_error_response_2("404 Job Not Found");
        assert_eq!(error2["message"], "404 Job Not Found");
    }
}
