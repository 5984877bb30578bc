//! Authenticated transport shared by every Jobs endpoint

use std::time::Duration;

use chrono::Local;
use compact_str::{format_compact, CompactString};
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{
    config::ClientConfig,
    error::{ClientError, Result},
    pager::PageInfo,
};

/// HTTP gateway to the GitLab API: auth, status mapping and decoding.
#[derive(Debug, Clone)]
pub struct GitlabApi {
    client: Client,
    config: ClientConfig,
}

/// `{"error": .., "error_description": ..}`, used by the OAuth layer
#[derive(Debug, Deserialize)]
struct GitlabApiError {
    error: CompactString,
    error_description: Option<CompactString>,
}

/// `{"message": ..}`, where the message may be a string or a field map
#[derive(Debug, Deserialize)]
struct GitlabApiError2 {
    message: serde_json::Value,
}

impl GitlabApi {
    /// Fails if `config` does not validate.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request.timeout)
            .user_agent(concat!("glim-jobs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for an API path starting with `/`
    pub(crate) fn url(&self, path: &str) -> CompactString {
        format_compact!("{}{}", self.config.base_url, path)
    }

    /// GET a JSON resource
    pub(crate) async fn get_json<T>(&self, url: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self.authenticated_request(Method::GET, url).send().await?;
        self.handle_response(response).await
    }

    /// GET one page of a list endpoint along with its pagination headers
    pub(crate) async fn get_page<T>(&self, url: &str) -> Result<(Vec<T>, PageInfo)>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self.authenticated_request(Method::GET, url).send().await?;
        let page_info = PageInfo::from_headers(response.headers());
        let items = self.handle_response(response).await?;

        Ok((items, page_info))
    }

    /// Perform authenticated POST with an empty body and deserialize JSON response
    pub(crate) async fn post_json<T>(&self, url: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self.authenticated_request(Method::POST, url).send().await?;
        self.handle_response(response).await
    }

    /// GET a non-JSON body as text, replacing invalid UTF-8 with U+FFFD
    pub(crate) async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.get_raw(url).await?;
        Ok(response.text().await?)
    }

    /// GET a non-JSON body, returning the live response once the status is
    /// known to be successful
    pub(crate) async fn get_raw(&self, url: &str) -> Result<Response> {
        let response = self
            .authenticated_request(Method::GET, url)
            .header(header::ACCEPT, "*/*")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let retry_after = retry_after(&response);
            let body = response.text().await.unwrap_or_default();
            self.handle_error_response(status, &body, retry_after)
        }
    }

    fn authenticated_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("PRIVATE-TOKEN", self.config.private_token.as_str())
    }

    /// Maps non-success statuses to errors, otherwise decodes the body as `T`
    async fn handle_response<T>(&self, response: Response) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url_path = response.url().path().to_string();
        let status = response.status();
        let retry_after = retry_after(&response);
        let body = response.text().await?;

        if self.config.debug.log_responses {
            self.log_response_to_file(&url_path, &body);
        }

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                ClientError::json_parse(url_path.as_str(), format!("Failed to parse response from {url_path}"), e)
            })
        } else {
            debug!(status = status.as_u16(), path = %url_path, "GitLab returned an error");
            self.handle_error_response(status, &body, retry_after)
        }
    }

    /// 401, 404 and 429 get their own variants
    fn handle_error_response<T>(
        &self,
        status: StatusCode,
        body: &str,
        retry_after: Option<Duration>,
    ) -> Result<T> {
        match status.as_u16() {
            401 => Err(ClientError::Authentication),
            404 => Err(ClientError::not_found(error_message(body).unwrap_or_else(|| "Resource".into()))),
            429 => Err(ClientError::rate_limit(retry_after)),
            code => match error_message(body) {
                Some(message) => Err(ClientError::gitlab_api(code, message)),
                None => Err(ClientError::gitlab_api(code, body)),
            },
        }
    }

    /// Dumps a response body to the debug directory, one file per response
    fn log_response_to_file(&self, path: &str, body: &str) {
        if let Some(log_dir) = &self.config.debug.log_directory {
            if !log_dir.exists() {
                if let Err(e) = std::fs::create_dir_all(log_dir) {
                    warn!("Failed to create log directory: {}", e);
                    return;
                }
            }

            let filename = format!(
                "{}_{}.json",
                Local::now().format("%Y-%m-%d_%H-%M-%S"),
                path.replace('/', "_")
            );

            let log_path = log_dir.join(filename);

            if let Err(e) = std::fs::write(&log_path, body) {
                warn!("Failed to write response log to {:?}: {}", log_path, e);
            } else {
                debug!("Response logged to {:?}", log_path);
            }
        }
    }
}

/// Extracts a message from either of GitLab's error body formats
fn error_message(body: &str) -> Option<CompactString> {
    if let Ok(api_error) = serde_json::from_str::<GitlabApiError>(body) {
        Some(format_compact!(
            "{} {}",
            api_error.error,
            api_error.error_description.unwrap_or_default()
        ).trim_end().into())
    } else if let Ok(api_error2) = serde_json::from_str::<GitlabApiError2>(body) {
        match api_error2.message {
            serde_json::Value::String(s) => Some(s.into()),
            other => Some(other.to_string().into()),
        }
    } else {
        None
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ClientConfig {
        ClientConfig::new("https://gitlab.example.com/api/v4", "test-token")
    }

    #[test]
    fn test_api_creation() {
        let config = test_config();
        let api = GitlabApi::new(config);
        assert!(api.is_ok());
    }

    #[test]
    fn test_api_creation_invalid_config() {
        let config = ClientConfig::new("", "test-token");
        let api = GitlabApi::new(config);
        assert!(api.is_err());
    }

    #[test]
    fn test_url() {
        let api = GitlabApi::new(test_config()).unwrap();
        assert_eq!(
            api.url("/projects/1/jobs"),
            "https://gitlab.example.com/api/v4/projects/1/jobs"
        );
    }

    #[test]
    fn test_error_handling() {
        let api = GitlabApi::new(test_config()).unwrap();

        // Test authentication error
        let error = api.handle_error_response::<()>(StatusCode::UNAUTHORIZED, "", None);
        assert!(matches!(error, Err(ClientError::Authentication)));

        // Test not found error
        let error = api.handle_error_response::<()>(
            StatusCode::NOT_FOUND,
            r#"{"message":"404 Job Not Found"}"#,
            None,
        );
        assert!(matches!(error, Err(ClientError::NotFound { resource }) if resource == "404 Job Not Found"));

        // Test rate limit error
        let error = api.handle_error_response::<()>(
            StatusCode::TOO_MANY_REQUESTS,
            "",
            Some(Duration::from_secs(5)),
        );
        assert!(matches!(
            error,
            Err(ClientError::RateLimit { retry_after: Some(d) }) if d == Duration::from_secs(5)
        ));
    }

    #[test]
    fn test_error_body_formats() {
        let api = GitlabApi::new(test_config()).unwrap();

        let error = api.handle_error_response::<()>(
            StatusCode::FORBIDDEN,
            r#"{"error":"insufficient_scope","error_description":"needs api scope"}"#,
            None,
        );
        assert!(matches!(
            error,
            Err(ClientError::GitlabApi { status: 403, message }) if message == "insufficient_scope needs api scope"
        ));

        let error = api.handle_error_response::<()>(
            StatusCode::BAD_REQUEST,
            r#"{"message":{"scope":["does not have a valid value"]}}"#,
            None,
        );
        assert!(matches!(
            error,
            Err(ClientError::GitlabApi { status: 400, message }) if message.contains("does not have a valid value")
        ));

        let error = api.handle_error_response::<()>(StatusCode::BAD_GATEWAY, "Bad Gateway", None);
        assert!(matches!(
            error,
            Err(ClientError::GitlabApi { status: 502, message }) if message == "Bad Gateway"
        ));
    }
}
