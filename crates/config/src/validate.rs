//! Semantic checks on a loaded configuration.

use crate::schema::{SelectorsConfig, TimeoutsConfig, WhatsendConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "whatsapp.selectors.send_button"
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &WhatsendConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_url(&config.whatsapp.url, &mut result);
    check_selectors(&config.whatsapp.selectors, &mut result);
    check_timeouts(&config.whatsapp.timeouts, &mut result);

    if config.whatsapp.state_path.trim().is_empty() {
        result.push(
            Severity::Error,
            "whatsapp.state_path",
            "session state path must not be empty",
        );
    }

    if config.server.port == 0 {
        result.push(
            Severity::Warning,
            "server.port",
            "port 0 binds a random port on every start",
        );
    }

    if !config.browser.headless && std::env::var_os("DISPLAY").is_none() && cfg!(target_os = "linux")
    {
        result.push(
            Severity::Warning,
            "browser.headless",
            "headed mode requested but no DISPLAY is set",
        );
    }

    result
}

fn check_url(url: &str, result: &mut ValidationResult) {
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {},
        Ok(parsed) => result.push(
            Severity::Error,
            "whatsapp.url",
            format!("unsupported URL scheme '{}'", parsed.scheme()),
        ),
        Err(e) => result.push(Severity::Error, "whatsapp.url", format!("invalid URL: {e}")),
    }
}

fn check_selectors(selectors: &SelectorsConfig, result: &mut ValidationResult) {
    let fields = [
        ("logged_in", &selectors.logged_in),
        ("qr_code", &selectors.qr_code),
        ("new_chat", &selectors.new_chat),
        ("search_box", &selectors.search_box),
        ("contact_row", &selectors.contact_row),
        ("compose_box", &selectors.compose_box),
        ("send_button", &selectors.send_button),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            result.push(
                Severity::Error,
                format!("whatsapp.selectors.{name}"),
                "selector must not be empty",
            );
        }
    }

    if !selectors.contact_row.contains("{name}") {
        result.push(
            Severity::Error,
            "whatsapp.selectors.contact_row",
            "selector must contain the {name} placeholder",
        );
    }
}

fn check_timeouts(timeouts: &TimeoutsConfig, result: &mut ValidationResult) {
    let bounded = [
        ("page_load_ms", timeouts.page_load_ms),
        ("login_check_ms", timeouts.login_check_ms),
        ("qr_visible_ms", timeouts.qr_visible_ms),
        ("qr_scan_ms", timeouts.qr_scan_ms),
        ("contact_ms", timeouts.contact_ms),
        ("compose_ms", timeouts.compose_ms),
    ];
    for (name, value) in bounded {
        if value == 0 {
            result.push(
                Severity::Error,
                format!("whatsapp.timeouts.{name}"),
                "timeout must be greater than zero",
            );
        }
    }

    if timeouts.qr_scan_ms > 0 && timeouts.qr_scan_ms < 15_000 {
        result.push(
            Severity::Warning,
            "whatsapp.timeouts.qr_scan_ms",
            "less than 15s is rarely enough to scan a QR code",
        );
    }
}
