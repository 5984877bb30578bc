use std::process::exit;

use clap::Parser;
use glim_jobs::{
    client::{ArtifactDownload, ClientConfig, GitlabApi},
    config::{default_config_path, load_config},
    domain::Job,
    logging::{init_logging, LoggingConfig},
    result::{AppError, Result},
};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, Level};

use crate::cli::{list_query, pipeline_id, Args, Command};

mod cli;

fn main() -> Result<()> {
    color_eyre::install().map_err(|e| AppError::GeneralError(e.to_string()))?;

    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(default_config_path);

    if args.print_config_path {
        println!("{}", config_path.display());
        exit(0);
    }

    let Some(command) = args.command else {
        eprintln!("no command given, see --help");
        exit(2);
    };

    let config = load_config(&config_path)?;
    config.validate().map_err(|e| {
        AppError::IncompleteConfig(format!("{e} (in {})", config_path.display()))
    })?;

    let mut logging_config = LoggingConfig::from_env();
    if let Some(level) = config.log_level.as_deref().and_then(|l| l.parse::<Level>().ok()) {
        logging_config = logging_config.with_level(level);
    }
    let _log_guard = init_logging(logging_config)?;
    info!(version = env!("CARGO_PKG_VERSION"), command = ?command, "glim-jobs starting");

    let debug = std::env::var("GLIM_JOBS_DEBUG").is_ok();
    let client_config = ClientConfig::from(config).with_debug_logging(debug);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| AppError::GeneralError(format!("Failed to create runtime: {e}")))?;

    rt.block_on(run(GitlabApi::new(client_config)?, command))
        .inspect_err(|e| error!(error = %e, "Command failed"))
}

async fn run(api: GitlabApi, command: Command) -> Result<()> {
    match &command {
        Command::List { project, pipeline, scope, page, per_page } => {
            let query = list_query(*scope, *page, *per_page);
            let jobs = match pipeline_id(*pipeline) {
                Some(pipeline_id) => api.list_pipeline_jobs(project, pipeline_id, &query).await?,
                None => api.list_jobs(project, &query).await?,
            };
            jobs.iter().for_each(print_job);
        },
        Command::Get(args) => {
            let job = api.get_job(&args.project, args.job_id()).await?;
            print_job(&job);
        },
        Command::Trace(args) => {
            let trace = api.get_trace(&args.project, args.job_id()).await?;
            print!("{trace}");
        },
        Command::Artifacts(args) => {
            let selector = args.selector().ok_or_else(|| {
                AppError::GeneralError("either --job or --ref with --name is required".into())
            })?;

            match api.download_artifacts(&args.project, &selector, args.output()).await? {
                ArtifactDownload::Saved(path) => println!("{}", path.display()),
                ArtifactDownload::Stream(mut stream) => {
                    let mut stdout = tokio::io::stdout();
                    while let Some(chunk) = stream.chunk().await? {
                        stdout.write_all(&chunk).await?;
                    }
                    stdout.flush().await?;
                },
            }
        },
        Command::Cancel(_) | Command::Retry(_) | Command::Erase(_) | Command::Play(_) => {
            if let Some((action, args)) = command.action() {
                let job = api.job_action(&args.project, args.job_id(), action).await?;
                print_job(&job);
            }
        },
    }

    Ok(())
}

fn print_job(job: &Job) {
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        job.id,
        job.status,
        job.stage,
        job.name,
        job.branch,
        job.web_url
    );
}
