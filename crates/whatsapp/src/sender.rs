//! One complete send attempt: restore the session, log in, send, persist,
//! tear down.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use {
    serde::{Deserialize, Serialize},
    tracing::{error, info, warn},
    whatsend_browser::{PageDriver, SessionLauncher, StorageState},
    whatsend_config::WhatsAppConfig,
};

use crate::{
    error::SendError,
    login::{LoginOutcome, ensure_logged_in},
    send::{SendRequest, send_message},
    status::StatusSink,
};

/// What a successful attempt did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReport {
    pub contact: String,
    pub login: LoginOutcome,
    pub duration_ms: u64,
}

/// Runs attempts with a fresh browser each time.
pub struct Sender {
    config: WhatsAppConfig,
    launcher: Arc<dyn SessionLauncher>,
}

impl Sender {
    pub fn new(config: WhatsAppConfig, launcher: Arc<dyn SessionLauncher>) -> Self {
        Self { config, launcher }
    }

    pub fn state_path(&self) -> PathBuf {
        PathBuf::from(&self.config.state_path)
    }

    /// Send `request.message` to `request.contact`.
    ///
    /// Errors are reported to `sink` as well as returned. The browser is
    /// closed on every path once it has started.
    pub async fn run(
        &self,
        request: &SendRequest,
        sink: &dyn StatusSink,
    ) -> Result<SendReport, SendError> {
        let started = Instant::now();
        let login = self.attempt(Some(request), sink).await?;

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(contact = %request.contact, ?login, duration_ms, "send attempt finished");
        Ok(SendReport {
            contact: request.contact.clone(),
            login,
            duration_ms,
        })
    }

    /// Link and save a session without sending anything.
    pub async fn login_only(&self, sink: &dyn StatusSink) -> Result<LoginOutcome, SendError> {
        self.attempt(None, sink).await
    }

    /// Launch with the saved session, drive the page, and always close.
    async fn attempt(
        &self,
        request: Option<&SendRequest>,
        sink: &dyn StatusSink,
    ) -> Result<LoginOutcome, SendError> {
        let state = self.load_state(sink);
        let mut page = match self.launcher.launch(state.as_ref()).await {
            Ok(page) => page,
            Err(e) => {
                let err = SendError::Launch(e);
                report(&err, sink);
                return Err(err);
            },
        };

        let result = self.drive(page.as_ref(), request, sink).await;
        if let Err(ref e) = result {
            report(e, sink);
        }

        if let Err(e) = page.close().await {
            warn!(error = %e, "failed to close browser");
        }
        sink.info("automation finished, browser closed");
        result
    }

    async fn drive(
        &self,
        page: &dyn PageDriver,
        request: Option<&SendRequest>,
        sink: &dyn StatusSink,
    ) -> Result<LoginOutcome, SendError> {
        page.goto(&self.config.url, self.config.timeouts.page_load_ms)
            .await?;
        let login = self.log_in(page, sink).await?;
        if let Some(request) = request {
            send_message(page, &self.config, request, sink).await?;
        }
        Ok(login)
    }

    async fn log_in(
        &self,
        page: &dyn PageDriver,
        sink: &dyn StatusSink,
    ) -> Result<LoginOutcome, SendError> {
        let outcome = ensure_logged_in(page, &self.config, sink).await?;
        if outcome == LoginOutcome::Linked {
            let state = page
                .storage_state()
                .await
                .map_err(SendError::SaveSession)?;
            let path = self.state_path();
            state.save(&path).map_err(SendError::SaveSession)?;
            info!(path = %path.display(), cookies = state.cookies.len(), "session saved");
            sink.info("session saved, future logins will not need the QR code");
        }
        Ok(outcome)
    }

    /// The saved session, if there is a usable one.
    fn load_state(&self, sink: &dyn StatusSink) -> Option<StorageState> {
        let path = self.state_path();
        if !path.exists() {
            info!(path = %path.display(), "no saved session");
            return None;
        }
        match StorageState::load(&path) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
                sink.warning("the saved session could not be read, a new QR scan is needed");
                None
            },
        }
    }
}

fn report(err: &SendError, sink: &dyn StatusSink) {
    if err.is_timeout() {
        warn!(error = %err, "send attempt timed out");
    } else {
        error!(error = %err, "send attempt failed");
    }
    sink.error(&err.to_string());
}

/// Delete the saved session. Returns whether a file was removed.
pub fn forget_session(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "session removed");
            Ok(true)
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
