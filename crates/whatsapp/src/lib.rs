//! WhatsApp Web automation: login detection, QR linking, and sending one
//! message to a named contact or group.
//!
//! [`Sender`] runs the whole attempt against a [`SessionLauncher`] and
//! reports progress through a [`StatusSink`].
//!
//! [`SessionLauncher`]: whatsend_browser::SessionLauncher

pub mod error;
pub mod login;
pub mod selectors;
pub mod send;
pub mod sender;
pub mod status;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod testing;

pub use {
    error::{LoginError, SendError},
    login::{LoginOutcome, ensure_logged_in},
    send::{SendRequest, send_message},
    sender::{SendReport, Sender, forget_session},
    status::{StatusEvent, StatusLevel, StatusRecorder, StatusSink, StatusUpdate},
};
