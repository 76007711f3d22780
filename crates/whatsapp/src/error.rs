use {thiserror::Error, whatsend_browser::BrowserError};

/// Why linking a session failed.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("the QR code did not appear within {timeout_ms}ms, please try again")]
    QrNotShown { timeout_ms: u64 },

    #[error("time is up: the QR code was not scanned within {timeout_ms}ms, please try again")]
    QrTimeout { timeout_ms: u64 },

    #[error("unexpected error during login: {0}")]
    Unexpected(BrowserError),
}

impl LoginError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::QrNotShown { .. } | Self::QrTimeout { .. })
    }
}

/// Why a send attempt failed. The display text is shown to the user as-is.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("could not start the browser: {0}")]
    Launch(BrowserError),

    #[error(transparent)]
    Login(#[from] LoginError),

    #[error("could not find the contact '{0}', check that the name is correct")]
    ContactNotFound(String),

    #[error("the message box did not appear in the chat")]
    MessageBoxNotFound,

    #[error("the send button did not appear in the chat")]
    SendButtonNotFound,

    #[error("timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("could not save the session: {0}")]
    SaveSession(BrowserError),

    #[error("unexpected error while sending the message: {0}")]
    Unexpected(BrowserError),
}

impl SendError {
    /// Whether a bounded wait ran out somewhere in the attempt.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Login(e) => e.is_timeout(),
            Self::ContactNotFound(_)
            | Self::MessageBoxNotFound
            | Self::SendButtonNotFound
            | Self::Timeout { .. } => true,
            Self::Launch(_) | Self::SaveSession(_) | Self::Unexpected(_) => false,
        }
    }
}

impl From<BrowserError> for SendError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::Timeout { what, timeout_ms } => Self::Timeout { what, timeout_ms },
            other => Self::Unexpected(other),
        }
    }
}
