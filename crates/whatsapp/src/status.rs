//! Progress reporting for a send attempt.

use std::{
    sync::Mutex,
    time::{SystemTime, UNIX_EPOCH},
};

use {
    serde::{Deserialize, Serialize},
    tokio::sync::mpsc::UnboundedSender,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One line of user-facing progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub level: StatusLevel,
    pub message: String,
    /// Unix milliseconds.
    pub at_ms: u64,
}

impl StatusEvent {
    pub fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        let at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            level,
            message: message.into(),
            at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Status(StatusEvent),
    /// A `data:image/png;base64,…` login QR to display, or `None` once it is
    /// no longer valid.
    QrCode(Option<String>),
}

/// Receives progress from the login and send flows.
pub trait StatusSink: Send + Sync {
    fn publish(&self, update: StatusUpdate);

    fn info(&self, message: &str) {
        self.publish(StatusUpdate::Status(StatusEvent::new(StatusLevel::Info, message)));
    }

    fn success(&self, message: &str) {
        self.publish(StatusUpdate::Status(StatusEvent::new(
            StatusLevel::Success,
            message,
        )));
    }

    fn warning(&self, message: &str) {
        self.publish(StatusUpdate::Status(StatusEvent::new(
            StatusLevel::Warning,
            message,
        )));
    }

    fn error(&self, message: &str) {
        self.publish(StatusUpdate::Status(StatusEvent::new(StatusLevel::Error, message)));
    }

    fn qr_code(&self, data_uri: Option<String>) {
        self.publish(StatusUpdate::QrCode(data_uri));
    }
}

impl StatusSink for UnboundedSender<StatusUpdate> {
    fn publish(&self, update: StatusUpdate) {
        // Receiver gone means nobody is watching; the attempt carries on.
        let _ = self.send(update);
    }
}

/// Collects every update in order.
#[derive(Debug, Default)]
pub struct StatusRecorder {
    updates: Mutex<Vec<StatusUpdate>>,
}

impl StatusRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.updates()
            .into_iter()
            .filter_map(|u| match u {
                StatusUpdate::Status(event) => Some(event),
                StatusUpdate::QrCode(_) => None,
            })
            .collect()
    }

    /// Messages at `level`, oldest first.
    pub fn messages(&self, level: StatusLevel) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    /// Every QR publication, including clears.
    pub fn qr_codes(&self) -> Vec<Option<String>> {
        self.updates()
            .into_iter()
            .filter_map(|u| match u {
                StatusUpdate::QrCode(qr) => Some(qr),
                StatusUpdate::Status(_) => None,
            })
            .collect()
    }
}

impl StatusSink for StatusRecorder {
    fn publish(&self, update: StatusUpdate) {
        self.updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(update);
    }
}
