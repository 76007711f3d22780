//! Finding a chat and sending a message into it.

use std::time::Duration;

use {
    serde::{Deserialize, Serialize},
    tracing::{debug, info},
    whatsend_browser::{BrowserError, PageDriver},
    whatsend_config::WhatsAppConfig,
};

use crate::{error::SendError, selectors, status::StatusSink};

/// A message for one contact or group, addressed by its exact display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub contact: String,
    pub message: String,
}

impl SendRequest {
    pub fn new(contact: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            contact: contact.into(),
            message: message.into(),
        }
    }

    /// Both fields carry something other than whitespace.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.contact.trim().is_empty() && !self.message.trim().is_empty()
    }
}

/// Open a new chat with `request.contact` and send `request.message`.
///
/// The page must already be logged in.
pub async fn send_message(
    page: &dyn PageDriver,
    config: &WhatsAppConfig,
    request: &SendRequest,
    sink: &dyn StatusSink,
) -> Result<(), SendError> {
    let selectors = &config.selectors;
    let timeouts = &config.timeouts;
    let contact = request.contact.as_str();

    sink.info(&format!("sending message to \"{contact}\""));

    page.click(&selectors.new_chat, timeouts.contact_ms).await?;
    page.fill(&selectors.search_box, contact, timeouts.contact_ms)
        .await?;
    settle(timeouts.search_settle_ms).await;

    let row = selectors::contact_row(&selectors.contact_row, contact);
    debug!(selector = %row, "looking for contact row");
    page.click(&row, timeouts.contact_ms)
        .await
        .map_err(|e| not_found_or(e, || SendError::ContactNotFound(contact.to_string())))?;

    page.fill(&selectors.compose_box, &request.message, timeouts.compose_ms)
        .await
        .map_err(|e| not_found_or(e, || SendError::MessageBoxNotFound))?;

    page.click(&selectors.send_button, timeouts.compose_ms)
        .await
        .map_err(|e| not_found_or(e, || SendError::SendButtonNotFound))?;

    info!(contact, chars = request.message.chars().count(), "message sent");
    sink.success(&format!("message sent to \"{contact}\""));

    // Give the client time to push the message out before teardown.
    settle(timeouts.linger_ms).await;
    Ok(())
}

/// Timeouts and missing elements become `missing`; anything else is passed on.
fn not_found_or(err: BrowserError, missing: impl FnOnce() -> SendError) -> SendError {
    match err {
        BrowserError::Timeout { .. } | BrowserError::ElementNotFound(_) => missing(),
        other => SendError::Unexpected(other),
    }
}

async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
