//! Logged-in detection and QR code linking.

use std::path::Path;

use {
    base64::{Engine as _, engine::general_purpose::STANDARD},
    serde::{Deserialize, Serialize},
    tracing::{info, warn},
    whatsend_browser::{BrowserError, PageDriver, WaitState},
    whatsend_config::WhatsAppConfig,
};

use crate::{error::LoginError, status::StatusSink};

/// How the page ended up logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginOutcome {
    /// The restored session was still valid.
    AlreadyLoggedIn,
    /// A QR code was scanned during this attempt.
    Linked,
}

/// Make sure the page is logged in, walking the user through a QR scan when
/// it is not.
pub async fn ensure_logged_in(
    page: &dyn PageDriver,
    config: &WhatsAppConfig,
    sink: &dyn StatusSink,
) -> Result<LoginOutcome, LoginError> {
    let selectors = &config.selectors;
    let timeouts = &config.timeouts;

    sink.info("checking login status");
    match page
        .wait_for(&selectors.logged_in, WaitState::Attached, timeouts.login_check_ms)
        .await
    {
        Ok(()) => {
            info!("session still valid");
            sink.success("already logged in, ready to send the message");
            return Ok(LoginOutcome::AlreadyLoggedIn);
        },
        Err(e) if e.is_timeout() => {
            sink.warning("session not found, scan the QR code below");
        },
        Err(e) => return Err(LoginError::Unexpected(e)),
    }

    page.wait_for(&selectors.qr_code, WaitState::Visible, timeouts.qr_visible_ms)
        .await
        .map_err(|e| match e {
            BrowserError::Timeout { timeout_ms, .. } => LoginError::QrNotShown { timeout_ms },
            other => LoginError::Unexpected(other),
        })?;

    let png = page
        .screenshot(&selectors.qr_code)
        .await
        .map_err(LoginError::Unexpected)?;
    if let Some(ref path) = config.qr_image_path {
        write_qr_image(Path::new(path), &png);
    }
    sink.qr_code(Some(png_data_uri(&png)));
    info!(bytes = png.len(), "login QR code published");

    sink.info("waiting for the QR code to be scanned");
    let scanned = page
        .wait_for(&selectors.qr_code, WaitState::Hidden, timeouts.qr_scan_ms)
        .await;
    // Whatever happened, the code shown so far is no longer useful.
    sink.qr_code(None);
    scanned.map_err(|e| match e {
        BrowserError::Timeout { timeout_ms, .. } => LoginError::QrTimeout { timeout_ms },
        other => LoginError::Unexpected(other),
    })?;

    info!("QR code scanned");
    sink.success("QR code scanned, saving session");
    Ok(LoginOutcome::Linked)
}

pub(crate) fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

fn write_qr_image(path: &Path, png: &[u8]) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!(path = %path.display(), error = %e, "failed to create QR image directory");
        return;
    }
    match std::fs::write(path, png) {
        Ok(()) => info!(path = %path.display(), "wrote QR code image"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to write QR code image"),
    }
}
