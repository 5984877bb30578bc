use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::result::{AppError, Result};

/// Settings persisted in `glim-jobs.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsConfig {
    /// The API URL of the GitLab instance, e.g. `https://gitlab.com/api/v4`
    pub gitlab_url: String,
    /// The Personal Access Token to authenticate with GitLab
    pub gitlab_token: String,
    /// Page size for job listings
    pub per_page: Option<u32>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

impl JobsConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.gitlab_url.trim().is_empty() {
            return Err("gitlab_url is required".to_string());
        }
        if self.gitlab_token.trim().is_empty() {
            return Err("gitlab_token is required".to_string());
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join("glim-jobs.toml")
    } else {
        PathBuf::from("glim-jobs.toml")
    }
}

/// Loads the config file, or defaults when it does not exist yet
pub fn load_config(config_file: &Path) -> Result<JobsConfig> {
    if !config_file.exists() {
        return Ok(JobsConfig::default());
    }

    confy::load_path(config_file).map_err(AppError::ConfigError)
}

pub fn save_config(config_file: &Path, config: &JobsConfig) -> Result<()> {
    confy::store_path(config_file, config).map_err(AppError::ConfigError)?;

    Ok(())
}
