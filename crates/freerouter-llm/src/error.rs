use std::time::Duration;

use freerouter_core::HttpError;
use http::StatusCode;
use thiserror::Error;

/// Errors that can occur while proxying a chat completion
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Client sent a malformed or invalid request
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// Unknown route
    #[error("not found")]
    NotFound,

    /// Upstream did not respond (or stalled) within the deadline
    #[error("upstream timed out after {0:?}")]
    UpstreamTimeout(Duration),

    /// Upstream returned non-2xx, refused the connection, or sent an
    /// unreadable body
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ProxyError {
    /// Whether this failure counts toward the timeout statistic
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::UpstreamTimeout(_))
    }
}

impl HttpError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::UpstreamTimeout(_) | Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::BadRequest(_) => "invalid_request_error",
            Self::NotFound => "not_found",
            Self::UpstreamTimeout(_) => "upstream_timeout",
            Self::Upstream(_) => "upstream_error",
            Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "an internal error occurred".to_owned(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_error_kinds() {
        assert_eq!(
            ProxyError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ProxyError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ProxyError::Upstream("boom".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ProxyError::UpstreamTimeout(Duration::from_secs(30)).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn internal_errors_are_not_leaked() {
        let err = ProxyError::Internal(anyhow::anyhow!("secret database path"));
        assert!(!err.client_message().contains("database"));
    }
}
