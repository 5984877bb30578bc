use confy::ConfyError;
use thiserror::Error;

use crate::client::ClientError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("The provided Gitlab token is invalid.")]
    InvalidGitlabToken,
    #[error("Failure reading configuration file.")]
    ConfigError(#[source] ConfyError),
    #[error("Incomplete configuration: {0}")]
    IncompleteConfig(String),
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
    #[error(transparent)]
    Client(ClientError),
    #[error("{0}")]
    GeneralError(String),
}

impl From<ClientError> for AppError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Authentication => AppError::InvalidGitlabToken,
            e => AppError::Client(e),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::GeneralError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_maps_to_invalid_token() {
        let err = AppError::from(ClientError::Authentication);
        assert!(matches!(err, AppError::InvalidGitlabToken));
    }

    #[test]
    fn test_client_error_is_transparent() {
        let err = AppError::from(ClientError::not_found("Job 7"));
        assert_eq!(err.to_string(), "Resource not found: Job 7");
    }
}
