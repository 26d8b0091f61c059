//! Application Error
//!
//! [`AppError`] is the value every rejected HTTP request is rendered from:
//! a status class, a client-facing message, and optional hints.

use std::borrow::Cow;
use std::fmt;

use super::kind::ErrorKind;

/// クライアントへ返すエラー
///
/// `action` は次に何をすべきかのヒント、`retry_after_secs` はレート制限時の
/// `Retry-After` ヘッダー値です。
///
/// ## Examples
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::TooManyRequests, "Too many requests")
///     .with_retry_after(12);
/// assert_eq!(err.status_code(), 429);
/// assert_eq!(err.retry_after_secs(), Some(12));
/// ```
#[derive(Debug, Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    action: Option<Cow<'static, str>>,
    retry_after_secs: Option<u64>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            action: None,
            retry_after_secs: None,
        }
    }

    /// Unknown route
    pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn with_action(mut self, action: impl Into<Cow<'static, str>>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// 最古のリクエストがウィンドウから抜けるまでの秒数
    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after_secs
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status_code(), self.kind, self.message)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_error_has_no_hints() {
        let err = AppError::new(ErrorKind::BadRequest, "url parameter is required");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.message(), "url parameter is required");
        assert!(err.action().is_none());
        assert!(err.retry_after_secs().is_none());
    }

    #[test]
    fn test_hints_are_kept() {
        let err = AppError::new(ErrorKind::Unauthorized, "Unauthorized access")
            .with_action("Send the API token");
        assert_eq!(err.action(), Some("Send the API token"));
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_display() {
        let err = AppError::not_found("Route not found");
        assert_eq!(err.to_string(), "404 Not Found: Route not found");
    }
}
