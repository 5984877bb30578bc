use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use compact_str::CompactString;
use glim_jobs::{
    client::{ArtifactOutput, ArtifactSelector, JobAction, JobQuery},
    domain::{ArtifactsFile, JobScope},
    id::{JobId, PipelineId, ProjectRef},
};

/// Inspect and control GitLab CI/CD jobs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Alternate path to the configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Print the path to the configuration file and exit.
    #[arg(short, long)]
    pub print_config_path: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the jobs of a project or pipeline
    List {
        /// Project id or path
        project: ProjectRef,
        /// Only jobs of this pipeline
        #[arg(long)]
        pipeline: Option<u64>,
        /// created, pending, running, failed, success, canceled, skipped or manual
        #[arg(long)]
        scope: Option<JobScope>,
        /// Fetch a single page instead of all of them
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
    },
    /// Show a single job
    Get(JobArgs),
    /// Print the log of a job
    Trace(JobArgs),
    /// Download job artifacts
    Artifacts(ArtifactArgs),
    /// Cancel a job
    Cancel(JobArgs),
    /// Retry a job
    Retry(JobArgs),
    /// Erase a job's artifacts and log
    Erase(JobArgs),
    /// Start a manual job
    Play(JobArgs),
}

#[derive(ClapArgs, Debug)]
pub struct JobArgs {
    /// Project id or path
    pub project: ProjectRef,
    pub job: u64,
}

#[derive(ClapArgs, Debug)]
pub struct ArtifactArgs {
    /// Project id or path
    pub project: ProjectRef,
    /// Job id
    #[arg(long, conflicts_with_all = ["ref_name", "name"])]
    pub job: Option<u64>,
    /// Single file in the archive, as named in the job's artifacts_file
    #[arg(long, requires = "job", conflicts_with = "path")]
    pub file: Option<String>,
    /// Single file in the archive, by path
    #[arg(long, requires = "job")]
    pub path: Option<String>,
    /// Branch or tag, used with --name
    #[arg(long = "ref", requires = "name")]
    pub ref_name: Option<String>,
    /// Job name, used with --ref
    #[arg(long, requires = "ref_name")]
    pub name: Option<String>,
    /// Target directory (defaults to the system temp directory)
    #[arg(long, conflicts_with = "stdout")]
    pub dir: Option<PathBuf>,
    /// Write the artifact to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

impl Command {
    /// Lifecycle action for the action subcommands
    pub fn action(&self) -> Option<(JobAction, &JobArgs)> {
        match self {
            Command::Cancel(args) => Some((JobAction::Cancel, args)),
            Command::Retry(args) => Some((JobAction::Retry, args)),
            Command::Erase(args) => Some((JobAction::Erase, args)),
            Command::Play(args) => Some((JobAction::Play, args)),
            _ => None,
        }
    }
}

pub fn list_query(scope: Option<JobScope>, page: Option<u32>, per_page: Option<u32>) -> JobQuery {
    JobQuery { scope, page, per_page }
}

pub fn pipeline_id(pipeline: Option<u64>) -> Option<PipelineId> {
    pipeline.map(PipelineId::new)
}

impl JobArgs {
    pub fn job_id(&self) -> JobId {
        JobId::new(self.job)
    }
}

impl ArtifactArgs {
    pub fn selector(&self) -> Option<ArtifactSelector> {
        match (self.job, &self.ref_name, &self.name) {
            (Some(job), _, _) => {
                let job_id = JobId::new(job);
                Some(match (&self.file, &self.path) {
                    (Some(file), _) => ArtifactSelector::ByJobIdAndFile {
                        job_id,
                        file: ArtifactsFile::new(CompactString::from(file.as_str()), 0),
                    },
                    (None, Some(path)) => ArtifactSelector::by_path(job_id, path.as_str()),
                    (None, None) => ArtifactSelector::ByJobId(job_id),
                })
            },
            (None, Some(ref_name), Some(name)) => {
                Some(ArtifactSelector::by_ref(ref_name.as_str(), name.as_str()))
            },
            _ => None,
        }
    }

    pub fn output(&self) -> ArtifactOutput {
        if self.stdout {
            ArtifactOutput::ToStream
        } else {
            ArtifactOutput::ToFile(self.dir.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let args = Args::parse_from([
            "glim-jobs", "list", "group/project", "--scope", "failed", "--per-page", "20",
        ]);

        match args.command {
            Some(Command::List { project, scope, per_page, pipeline, page }) => {
                assert_eq!(project, ProjectRef::path("group/project"));
                assert_eq!(scope, Some(JobScope::Failed));
                assert_eq!(per_page, Some(20));
                assert_eq!(pipeline, None);
                assert_eq!(page, None);
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_action() {
        let args = Args::parse_from(["glim-jobs", "retry", "123", "42"]);
        let command = args.command.unwrap();
        let (action, job) = command.action().unwrap();

        assert_eq!(action, JobAction::Retry);
        assert_eq!(job.project, ProjectRef::from(123));
        assert_eq!(job.job_id(), JobId::new(42));
    }

    #[test]
    fn test_parse_large_job_id() {
        let args = Args::parse_from(["glim-jobs", "get", "group/project", "8123456789"]);
        let Some(Command::Get(job)) = args.command else {
            panic!("expected get command");
        };
        assert_eq!(job.job_id(), JobId::new(8_123_456_789));

        let args = Args::parse_from(["glim-jobs", "list", "1", "--pipeline", "5123456789"]);
        let Some(Command::List { pipeline, .. }) = args.command else {
            panic!("expected list command");
        };
        assert_eq!(pipeline_id(pipeline), Some(PipelineId::new(5_123_456_789)));
    }

    #[test]
    fn test_artifact_selectors() {
        let args = Args::parse_from([
            "glim-jobs", "artifacts", "1", "--job", "42", "--path", "reports/out.xml",
        ]);
        let Some(Command::Artifacts(artifacts)) = args.command else {
            panic!("expected artifacts command");
        };
        assert_eq!(
            artifacts.selector(),
            Some(ArtifactSelector::by_path(JobId::new(42), "reports/out.xml"))
        );
        assert_eq!(artifacts.output(), ArtifactOutput::ToFile(None));

        let args = Args::parse_from([
            "glim-jobs", "artifacts", "1", "--ref", "main", "--name", "build", "--stdout",
        ]);
        let Some(Command::Artifacts(artifacts)) = args.command else {
            panic!("expected artifacts command");
        };
        assert_eq!(artifacts.selector(), Some(ArtifactSelector::by_ref("main", "build")));
        assert_eq!(artifacts.output(), ArtifactOutput::ToStream);
    }

    #[test]
    fn test_artifacts_require_a_selector() {
        let result = Args::try_parse_from(["glim-jobs", "artifacts", "1", "--file", "a.txt"]);
        assert!(result.is_err());
    }
}
