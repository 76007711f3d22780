//! `serve`, `send`, `login`, and `logout`.

use std::{path::Path, sync::Arc};

use {
    anyhow::{Result, bail},
    tokio::sync::mpsc,
    tracing::{info, warn},
    whatsend_browser::CdpLauncher,
    whatsend_config::{WhatsAppConfig, WhatsendConfig},
    whatsend_web::AppState,
    whatsend_whatsapp::{
        LoginOutcome, SendRequest, Sender, StatusLevel, StatusUpdate, forget_session,
    },
};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Where the CLI drops the login QR when the config names no path.
const DEFAULT_QR_IMAGE: &str = "qrcode.png";

pub async fn handle_serve(bind: Option<String>, port: Option<u16>) -> Result<()> {
    let config = whatsend_config::discover_and_load();
    report_validation(&config);
    whatsend_browser::check_and_warn(config.browser.chrome_path.as_deref());

    // CLI args override config values
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let port = port.unwrap_or(config.server.port);

    let sender = build_sender(config.clone(), config.whatsapp.clone());
    let state = AppState::new(sender, config.ui, config.server.job_history);
    eprintln!("Open http://{bind}:{port}/ to send a message");
    whatsend_web::serve(&bind, port, state).await
}

pub async fn handle_send(to: String, message: String) -> Result<()> {
    let request = SendRequest::new(to.trim(), message);
    if !request.is_complete() {
        bail!("fill in the contact name and the message");
    }

    let config = whatsend_config::discover_and_load();
    let whatsapp = cli_whatsapp_config(&config);
    let qr_path = whatsapp.qr_image_path.clone();
    let sender = build_sender(config, whatsapp);

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_updates(rx, qr_path));
    let result = sender.run(&request, &tx).await;
    drop(tx);
    let _ = printer.await;

    let report = result?;
    info!(contact = %report.contact, duration_ms = report.duration_ms, "done");
    Ok(())
}

pub async fn handle_login() -> Result<()> {
    let config = whatsend_config::discover_and_load();
    let whatsapp = cli_whatsapp_config(&config);
    let qr_path = whatsapp.qr_image_path.clone();
    let sender = build_sender(config, whatsapp);

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_updates(rx, qr_path));
    let result = sender.login_only(&tx).await;
    drop(tx);
    let _ = printer.await;

    match result? {
        LoginOutcome::AlreadyLoggedIn => eprintln!("Session is already linked."),
        LoginOutcome::Linked => eprintln!(
            "Session linked and saved to {}.",
            sender.state_path().display()
        ),
    }
    Ok(())
}

pub fn handle_logout() -> Result<()> {
    let config = whatsend_config::discover_and_load();
    let path = Path::new(&config.whatsapp.state_path);
    if forget_session(path)? {
        eprintln!("Removed {}.", path.display());
    } else {
        eprintln!("No saved session at {}.", path.display());
    }
    Ok(())
}

fn build_sender(config: WhatsendConfig, whatsapp: WhatsAppConfig) -> Sender {
    let launcher = Arc::new(CdpLauncher::new(config.browser));
    Sender::new(whatsapp, launcher)
}

/// A terminal has nowhere to render the QR, so always write it to a file.
fn cli_whatsapp_config(config: &WhatsendConfig) -> WhatsAppConfig {
    let mut whatsapp = config.whatsapp.clone();
    if whatsapp.qr_image_path.is_none() {
        whatsapp.qr_image_path = Some(DEFAULT_QR_IMAGE.into());
    }
    whatsapp
}

fn report_validation(config: &WhatsendConfig) {
    let result = whatsend_config::validate(config);
    for d in &result.diagnostics {
        warn!(path = %d.path, severity = ?d.severity, "{}", d.message);
    }
}

async fn print_updates(mut rx: mpsc::UnboundedReceiver<StatusUpdate>, qr_path: Option<String>) {
    while let Some(update) = rx.recv().await {
        match update {
            StatusUpdate::Status(event) => {
                let color = match event.level {
                    StatusLevel::Info => CYAN,
                    StatusLevel::Success => GREEN,
                    StatusLevel::Warning => YELLOW,
                    StatusLevel::Error => RED,
                };
                eprintln!("  [{color}{}{RESET}]  {}", event.level, event.message);
            },
            StatusUpdate::QrCode(Some(_)) => {
                if let Some(ref path) = qr_path {
                    eprintln!("  QR code saved to {path}, open it and scan it with your phone");
                }
            },
            StatusUpdate::QrCode(None) => {},
        }
    }
}
