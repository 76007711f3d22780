//! Browser error types.

use thiserror::Error;

/// Errors that can occur during browser operations.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser not available: Chrome/Chromium not found\n\n{0}")]
    BrowserNotAvailable(String),

    #[error("browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    #[error("timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("JavaScript evaluation failed: {0}")]
    JsEvalFailed(String),

    #[error("screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("session state error: {0}")]
    Storage(String),

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BrowserError {
    pub fn timeout(what: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            timeout_ms,
        }
    }

    /// Whether a bounded wait ran out, as opposed to any other failure.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Cdp(err.to_string())
    }
}

impl From<serde_json::Error> for BrowserError {
    fn from(err: serde_json::Error) -> Self {
        BrowserError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BrowserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_distinguished() {
        let err = BrowserError::timeout("div.chat", 5000);
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "timed out after 5000ms waiting for div.chat"
        );
        assert!(!BrowserError::ElementNotFound("x".into()).is_timeout());
    }
}
