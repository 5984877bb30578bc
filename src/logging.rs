use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::result::{AppError, Result};

/// Where diagnostics go. File output is on by default, stderr only on request.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub console_level: Level,
    pub file_level: Level,
    /// `None` disables the rolling log file
    pub log_dir: Option<PathBuf>,
    /// One JSON object per line in the log file
    pub json_format: bool,
    /// Whether to also log to stderr
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: Level::WARN,
            file_level: Level::DEBUG,
            log_dir: Some(Self::default_log_dir()),
            json_format: false,
            console: false,
        }
    }
}

impl LoggingConfig {
    /// The platform cache directory for `glim-jobs`
    pub fn default_log_dir() -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "glim-jobs") {
            proj_dirs.cache_dir().to_path_buf()
        } else {
            PathBuf::from("glim-jobs-logs")
        }
    }

    pub fn from_env() -> Self {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Applies `GLIM_JOBS_*` overrides looked up through `var`
    fn with_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(level) = var("GLIM_JOBS_LOG_LEVEL").and_then(|l| l.parse::<Level>().ok()) {
            self = self.with_level(level);
        }

        if let Some(log_dir) = var("GLIM_JOBS_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(log_dir));
        }

        if var("GLIM_JOBS_NO_FILE_LOGS").is_some() {
            self.log_dir = None;
        }

        if var("GLIM_JOBS_JSON_LOGS").is_some() {
            self.json_format = true;
        }

        if var("GLIM_JOBS_CONSOLE_LOGS").is_some() {
            self.console = true;
        }

        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.console_level = level;
        self.file_level = level;
        self
    }
}

/// Installs the global subscriber. Keep the returned guard alive for as long
/// as file output should be flushed.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let mut layers = vec![];
    let mut guard = None;

    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)
            .map_err(|e| AppError::Logging(format!("{}: {e}", log_dir.display())))?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "glim-jobs.log");
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let file_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(
                    EnvFilter::builder()
                        .with_default_directive(config.file_level.into())
                        .from_env_lossy(),
                )
                .boxed()
        } else {
            fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(
                    EnvFilter::builder()
                        .with_default_directive(config.file_level.into())
                        .from_env_lossy(),
                )
                .boxed()
        };

        layers.push(file_layer);
    }

    if config.console {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_filter(
                EnvFilter::builder()
                    .with_default_directive(config.console_level.into())
                    .from_env_lossy(),
            )
            .boxed();

        layers.push(console_layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(guard)
}
