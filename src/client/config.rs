//! Connection settings for [`GitlabApi`](super::GitlabApi) and per-call job queries

use std::{path::PathBuf, time::Duration};

use compact_str::CompactString;

use super::error::{ClientError, Result};
use crate::{config::JobsConfig, domain::JobScope};

/// Everything needed to reach a GitLab instance
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GitLab API base URL, e.g. `https://gitlab.com/api/v4`
    pub base_url: CompactString,
    /// Private access token
    pub private_token: CompactString,
    pub request: RequestConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Default page size for list endpoints, 1..=100
    pub per_page: u32,
    /// Request timeout
    pub timeout: Duration,
}

/// Raw response dumps, for diagnosing decoding failures
#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub log_responses: bool,
    /// Relative paths resolve against the working directory
    pub log_directory: Option<PathBuf>,
}

/// Query parameters for job listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQuery {
    /// Only list jobs in this scope
    pub scope: Option<JobScope>,
    /// Fetch only this page; all pages are fetched when unset
    pub page: Option<u32>,
    /// Number of results per page; the configured default when unset
    pub per_page: Option<u32>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            per_page: 96,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_responses: false,
            log_directory: Some(PathBuf::from("glim-jobs-logs")),
        }
    }
}

impl ClientConfig {
    /// Trailing slashes are dropped from `base_url`.
    pub fn new(
        base_url: impl Into<CompactString>,
        private_token: impl Into<CompactString>,
    ) -> Self {
        let base_url: CompactString = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').into(),
            private_token: private_token.into(),
            request: RequestConfig::default(),
            debug: DebugConfig::default(),
        }
    }

    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Checks the settings every request depends on, reporting the first
    /// offending field under its config file name.
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.as_str();
        if url.is_empty() {
            return Err(ClientError::config_validation("gitlab_url", "is empty"));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ClientError::config_validation(
                "gitlab_url",
                format!("'{url}' is not an http(s) URL"),
            ));
        }

        if self.private_token.trim().is_empty() {
            return Err(ClientError::config_validation("gitlab_token", "is empty"));
        }

        let per_page = self.request.per_page;
        if !(1..=100).contains(&per_page) {
            return Err(ClientError::config_validation(
                "per_page",
                format!("{per_page} is outside 1..=100"),
            ));
        }

        if self.request.timeout.is_zero() {
            return Err(ClientError::config_validation("timeout_secs", "must be at least 1"));
        }

        Ok(())
    }

    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.debug = debug;
        self
    }

    /// Dump every JSON response body to the debug log directory
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug.log_responses = enabled;
        self
    }
}

impl From<JobsConfig> for ClientConfig {
    fn from(config: JobsConfig) -> Self {
        let mut request = RequestConfig::default();
        if let Some(per_page) = config.per_page {
            request.per_page = per_page;
        }
        if let Some(secs) = config.timeout_secs {
            request.timeout = Duration::from_secs(secs);
        }

        Self::new(config.gitlab_url, config.gitlab_token).with_request(request)
    }
}

/// Fluent construction of a [`ClientConfig`]; nothing is checked until
/// [`build`](Self::build).
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<CompactString>,
    private_token: Option<CompactString>,
    request: RequestConfig,
    debug: DebugConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<CompactString>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn private_token(mut self, token: impl Into<CompactString>) -> Self {
        self.private_token = Some(token.into());
        self
    }

    pub fn request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    pub fn debug(mut self, debug: DebugConfig) -> Self {
        self.debug = debug;
        self
    }

    pub fn debug_logging(mut self, enabled: bool) -> Self {
        self.debug.log_responses = enabled;
        self
    }

    /// Where response dumps go; `None` disables them even when enabled
    pub fn log_directory(mut self, dir: Option<PathBuf>) -> Self {
        self.debug.log_directory = dir;
        self
    }

    /// Page size used when a query does not name one
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.request.per_page = per_page;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let (Some(base_url), Some(private_token)) = (self.base_url, self.private_token) else {
            return Err(ClientError::config("both a GitLab URL and a private token are required"));
        };

        let config = ClientConfig::new(base_url, private_token)
            .with_request(self.request)
            .with_debug(self.debug);

        config.validate()?;
        Ok(config)
    }
}

impl JobQuery {
    /// Create a new job query
    pub fn new() -> Self {
        Self::default()
    }

    /// Set scope filter
    pub fn with_scope(mut self, scope: Option<JobScope>) -> Self {
        self.scope = scope;
        self
    }

    /// Request a single page
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set per page limit
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }
}
