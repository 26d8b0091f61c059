//! Resolver Error Types
//!
//! This module provides resolver-specific error variants that integrate
//! with the shared `kernel::error::AppError` response type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use std::time::Duration;
use thiserror::Error;

/// Resolver-specific result type alias
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Resolver-specific error variants
///
/// Client-side variants are answered directly with a JSON error body.
/// Browser-side variants are folded into a failed resolution result by the
/// use case; `Teardown` is only ever logged.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// `url` query parameter missing or empty
    #[error("url parameter is required")]
    MissingUrl,

    /// `url` is not a well-formed absolute URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// `url` uses a scheme other than http(s)
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// Proxy parameters present but unusable
    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(String),

    /// API token missing or wrong while a secret is configured
    #[error("Unauthorized access")]
    Unauthorized,

    /// Caller exceeded its request budget for the window
    #[error("Too many requests, wait a minute")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// Browser process could not be started
    #[error("Failed to launch browser: {0}")]
    SessionLaunch(String),

    /// Engine reported a navigation fault
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Navigation did not settle in time
    #[error("Navigation timeout of {} ms exceeded", .0.as_millis())]
    NavigationTimeout(Duration),

    /// Any other engine command failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// Browser session could not be closed
    #[error("Failed to close browser: {0}")]
    Teardown(String),
}

impl ResolveError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::MissingUrl
            | ResolveError::InvalidUrl(_)
            | ResolveError::UnsupportedScheme(_)
            | ResolveError::InvalidProxy(_) => ErrorKind::BadRequest,
            ResolveError::Unauthorized => ErrorKind::Unauthorized,
            ResolveError::RateLimitExceeded { .. } => ErrorKind::TooManyRequests,
            ResolveError::SessionLaunch(_)
            | ResolveError::Navigation(_)
            | ResolveError::NavigationTimeout(_)
            | ResolveError::Browser(_)
            | ResolveError::Teardown(_) => ErrorKind::InternalServerError,
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            ResolveError::SessionLaunch(msg) => {
                tracing::error!(message = %msg, "Browser launch failed");
            }
            ResolveError::Navigation(_) | ResolveError::NavigationTimeout(_) => {
                tracing::error!(error = %self, "Navigation failed");
            }
            ResolveError::Browser(msg) => {
                tracing::error!(message = %msg, "Resolver internal error");
            }
            ResolveError::Teardown(msg) => {
                tracing::warn!(message = %msg, "Browser teardown failed");
            }
            ResolveError::Unauthorized => {
                tracing::warn!("Rejected request with invalid API token");
            }
            ResolveError::RateLimitExceeded { .. } => {
                tracing::warn!("Resolver rate limit exceeded");
            }
            _ => {
                tracing::debug!(error = %self, "Rejected resolve request");
            }
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        let app_err = AppError::new(err.kind(), err.to_string());
        match err {
            ResolveError::MissingUrl | ResolveError::InvalidUrl(_) => {
                app_err.with_action("Pass an absolute http(s) URL as ?url=")
            }
            ResolveError::Unauthorized => {
                app_err.with_action("Send the API token as ?token= or the x-api-token header")
            }
            ResolveError::RateLimitExceeded { retry_after_secs } => {
                app_err.with_retry_after(retry_after_secs)
            }
            _ => app_err,
        }
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(ResolveError::MissingUrl.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ResolveError::InvalidUrl("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ResolveError::InvalidProxy("port".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ResolveError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ResolveError::RateLimitExceeded { retry_after_secs: 3 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_browser_errors_map_to_500() {
        for err in [
            ResolveError::SessionLaunch("no chrome".into()),
            ResolveError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()),
            ResolveError::NavigationTimeout(Duration::from_secs(45)),
            ResolveError::Browser("closed".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err.kind(), ErrorKind::InternalServerError);
        }
    }

    #[test]
    fn test_timeout_message() {
        let err = ResolveError::NavigationTimeout(Duration::from_millis(45_000));
        assert_eq!(err.to_string(), "Navigation timeout of 45000 ms exceeded");
    }

    #[test]
    fn test_rate_limit_carries_retry_after() {
        let app_err: AppError = ResolveError::RateLimitExceeded { retry_after_secs: 9 }.into();
        assert_eq!(app_err.status_code(), 429);
        assert_eq!(app_err.retry_after_secs(), Some(9));
    }
}
