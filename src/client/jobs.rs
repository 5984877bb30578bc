//! GitLab Jobs API operations
//!
//! See https://docs.gitlab.com/ee/api/jobs.html

use compact_str::{format_compact, CompactString};
use tracing::{debug, info, instrument};

use super::{
    api::GitlabApi,
    artifacts::{self, ArtifactDownload, ArtifactOutput, ArtifactSelector, ArtifactStream},
    config::JobQuery,
    error::{ClientError, Result},
    pager::{page_url, Pager},
};
use crate::{
    domain::Job,
    id::{JobId, PipelineId, ProjectRef},
};

/// Outcome of looking up a job that may not exist.
#[derive(Debug)]
pub enum JobLookup {
    Found(Job),
    NotFound,
    Failed(ClientError),
}

impl JobLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, JobLookup::Found(_))
    }

    pub fn found(self) -> Option<Job> {
        match self {
            JobLookup::Found(job) => Some(job),
            _ => None,
        }
    }

    /// `Ok(None)` for a missing job, `Err` for any other failure.
    pub fn into_result(self) -> Result<Option<Job>> {
        match self {
            JobLookup::Found(job) => Ok(Some(job)),
            JobLookup::NotFound => Ok(None),
            JobLookup::Failed(e) => Err(e),
        }
    }
}

/// State-changing actions on a single job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Cancel,
    Retry,
    Erase,
    Play,
}

impl JobAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobAction::Cancel => "cancel",
            JobAction::Retry => "retry",
            JobAction::Erase => "erase",
            JobAction::Play => "play",
        }
    }
}

impl std::fmt::Display for JobAction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GitlabApi {
    /// List jobs of a project. Without an explicit page, all pages are
    /// fetched and concatenated in server order.
    #[instrument(skip(self), fields(project = %project, scope = ?query.scope))]
    pub async fn list_jobs(&self, project: &ProjectRef, query: &JobQuery) -> Result<Vec<Job>> {
        let url = self.build_jobs_url(project, None, query)?;
        self.list(url, query).await
    }

    /// List jobs of a single pipeline
    #[instrument(skip(self), fields(project = %project, pipeline_id = %pipeline_id, scope = ?query.scope))]
    pub async fn list_pipeline_jobs(
        &self,
        project: &ProjectRef,
        pipeline_id: PipelineId,
        query: &JobQuery,
    ) -> Result<Vec<Job>> {
        let url = self.build_jobs_url(project, Some(pipeline_id), query)?;
        self.list(url, query).await
    }

    /// Lazy cursor over the jobs of a project, starting at page 1.
    pub fn jobs_pager(&self, project: &ProjectRef, query: &JobQuery) -> Result<Pager<Job>> {
        let url = self.build_jobs_url(project, None, query)?;
        Ok(Pager::new(self.clone(), url, self.per_page(query)))
    }

    /// Lazy cursor over the jobs of a pipeline, starting at page 1.
    pub fn pipeline_jobs_pager(
        &self,
        project: &ProjectRef,
        pipeline_id: PipelineId,
        query: &JobQuery,
    ) -> Result<Pager<Job>> {
        let url = self.build_jobs_url(project, Some(pipeline_id), query)?;
        Ok(Pager::new(self.clone(), url, self.per_page(query)))
    }

    /// Get a single job
    #[instrument(skip(self), fields(project = %project, job_id = %job_id))]
    pub async fn get_job(&self, project: &ProjectRef, job_id: JobId) -> Result<Job> {
        let url = self.job_url(project, job_id, "")?;
        self.get_json(&url).await
    }

    /// Get a single job, reporting a 404 as [`JobLookup::NotFound`]
    pub async fn find_job(&self, project: &ProjectRef, job_id: JobId) -> JobLookup {
        match self.get_job(project, job_id).await {
            Ok(job) => JobLookup::Found(job),
            Err(e) if e.is_not_found() => {
                debug!(project = %project, job_id = %job_id, "Job not found");
                JobLookup::NotFound
            },
            Err(e) => JobLookup::Failed(e),
        }
    }

    /// Get the log (trace) of a job.
    ///
    /// The body is decoded as UTF-8 lossily: invalid byte sequences, as left
    /// by binary output in a job log, become U+FFFD.
    #[instrument(skip(self), fields(project = %project, job_id = %job_id))]
    pub async fn get_trace(&self, project: &ProjectRef, job_id: JobId) -> Result<String> {
        let url = self.job_url(project, job_id, "/trace")?;
        let trace = self.get_text(&url).await?;

        debug!(bytes = trace.len(), "Fetched job trace");
        Ok(trace)
    }

    /// Download a job artifact, either into a file or as a byte stream
    #[instrument(skip(self), fields(project = %project))]
    pub async fn download_artifacts(
        &self,
        project: &ProjectRef,
        selector: &ArtifactSelector,
        output: ArtifactOutput,
    ) -> Result<ArtifactDownload> {
        // resolve the file name before any bytes are requested
        let target = match &output {
            ArtifactOutput::ToFile(dir) => {
                Some(artifacts::target_path(dir.as_deref(), &selector.file_name()?))
            },
            ArtifactOutput::ToStream => None,
        };

        let url = self.url(&format_compact!(
            "{}{}",
            self.project_path(project)?,
            selector.endpoint()?
        ));

        info!(url = %url, "Downloading artifacts");
        let stream = ArtifactStream::new(self.get_raw(&url).await?);

        match target {
            Some(path) => artifacts::save(stream, path).await,
            None => Ok(ArtifactDownload::Stream(stream)),
        }
    }

    /// Apply an action to a job, returning the updated job
    #[instrument(skip(self), fields(project = %project, job_id = %job_id, action = %action))]
    pub async fn job_action(
        &self,
        project: &ProjectRef,
        job_id: JobId,
        action: JobAction,
    ) -> Result<Job> {
        let url = self.job_url(project, job_id, &format_compact!("/{action}"))?;
        let job: Job = self.post_json(&url).await?;

        info!(status = %job.status, "Job {action} requested");
        Ok(job)
    }

    pub async fn cancel_job(&self, project: &ProjectRef, job_id: JobId) -> Result<Job> {
        self.job_action(project, job_id, JobAction::Cancel).await
    }

    pub async fn retry_job(&self, project: &ProjectRef, job_id: JobId) -> Result<Job> {
        self.job_action(project, job_id, JobAction::Retry).await
    }

    pub async fn erase_job(&self, project: &ProjectRef, job_id: JobId) -> Result<Job> {
        self.job_action(project, job_id, JobAction::Erase).await
    }

    pub async fn play_job(&self, project: &ProjectRef, job_id: JobId) -> Result<Job> {
        self.job_action(project, job_id, JobAction::Play).await
    }

    // Private helper methods

    async fn list(&self, url: CompactString, query: &JobQuery) -> Result<Vec<Job>> {
        let per_page = self.per_page(query);

        let jobs: Vec<Job> = match query.page {
            Some(page) => self.get_json(&page_url(&url, page, per_page)).await?,
            None => Pager::new(self.clone(), url, per_page).all().await?,
        };

        debug!(job_count = jobs.len(), "Successfully fetched jobs");
        Ok(jobs)
    }

    fn per_page(&self, query: &JobQuery) -> u32 {
        query.per_page.unwrap_or(self.config().request.per_page)
    }

    fn project_path(&self, project: &ProjectRef) -> Result<CompactString> {
        if project.is_empty() {
            return Err(ClientError::invalid_argument("project path cannot be empty"));
        }

        Ok(format_compact!("/projects/{}", project.path_segment()))
    }

    fn job_url(&self, project: &ProjectRef, job_id: JobId, suffix: &str) -> Result<CompactString> {
        Ok(self.url(&format_compact!(
            "{}/jobs/{job_id}{suffix}",
            self.project_path(project)?
        )))
    }

    /// Build URL for the jobs endpoints, without pagination parameters
    fn build_jobs_url(
        &self,
        project: &ProjectRef,
        pipeline_id: Option<PipelineId>,
        query: &JobQuery,
    ) -> Result<CompactString> {
        let mut url = self.url(&self.project_path(project)?);

        if let Some(pipeline_id) = pipeline_id {
            url.push_str(&format_compact!("/pipelines/{pipeline_id}"));
        }
        url.push_str("/jobs");

        if let Some(scope) = query.scope {
            url.push_str(&format_compact!("?scope={scope}"));
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{client::config::ClientConfig, domain::JobScope};

    fn api() -> GitlabApi {
        GitlabApi::new(ClientConfig::new("https://gitlab.example.com/api/v4", "test-token")).unwrap()
    }

    #[test]
    fn test_build_jobs_url() {
        let url = api()
            .build_jobs_url(&ProjectRef::from(123), None, &JobQuery::new())
            .unwrap();

        assert_eq!(url, "https://gitlab.example.com/api/v4/projects/123/jobs");
        assert!(!url.contains("scope"));
    }

    #[test]
    fn test_build_jobs_url_with_scope() {
        let query = JobQuery::new().with_scope(Some(JobScope::Failed));
        let url = api()
            .build_jobs_url(&ProjectRef::path("group/project"), Some(PipelineId::new(456)), &query)
            .unwrap();

        assert_eq!(
            url,
            "https://gitlab.example.com/api/v4/projects/group%2Fproject/pipelines/456/jobs?scope=failed"
        );
    }

    #[test]
    fn test_job_url() {
        let url = api()
            .job_url(&ProjectRef::from(1), JobId::new(42), "/retry")
            .unwrap();

        assert_eq!(url, "https://gitlab.example.com/api/v4/projects/1/jobs/42/retry");
    }

    #[test]
    fn test_empty_project_path_is_rejected() {
        let result = api().job_url(&ProjectRef::path(""), JobId::new(1), "");
        assert!(matches!(result, Err(ClientError::InvalidArgument(_))));
    }

    #[test]
    fn test_per_page_defaults_to_config() {
        let api = api();
        assert_eq!(api.per_page(&JobQuery::new()), 96);
        assert_eq!(api.per_page(&JobQuery::new().with_per_page(5)), 5);
    }

    #[test]
    fn test_job_lookup_into_result() {
        assert!(JobLookup::NotFound.into_result().unwrap().is_none());
        assert!(JobLookup::Found(Job::default()).is_found());
        assert!(JobLookup::Failed(ClientError::Authentication).into_result().is_err());
    }

    #[test]
    fn test_action_names() {
        let names: Vec<_> = [JobAction::Cancel, JobAction::Retry, JobAction::Erase, JobAction::Play]
            .iter()
            .map(JobAction::as_str)
            .collect();

        assert_eq!(names, ["cancel", "retry", "erase", "play"]);
    }
}
