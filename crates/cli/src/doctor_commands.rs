//! `whatsend doctor`: browser, config, and session checks.
//!
//! Prints a report with `[ok]`, `[warn]`, `[fail]`, or `[info]` per item.

use std::path::Path;

use {
    anyhow::Result,
    whatsend_browser::StorageState,
    whatsend_config::{Severity, WhatsendConfig},
};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }
}

fn print_report(sections: &[Section]) -> (usize, usize) {
    let mut errors = 0usize;
    let mut warnings = 0usize;

    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
            match item.status {
                Status::Fail => errors += 1,
                Status::Warn => warnings += 1,
                _ => {},
            }
        }
        eprintln!();
    }

    (errors, warnings)
}

pub fn handle_doctor() -> Result<()> {
    eprintln!("{BOLD}whatsend doctor{RESET}");
    eprintln!("{BOLD}==============={RESET}\n");

    let config = whatsend_config::discover_and_load();
    let sections = vec![
        check_config(&config),
        check_browser(&config),
        check_session(Path::new(&config.whatsapp.state_path)),
    ];

    let (errors, warnings) = print_report(&sections);
    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn check_config(config: &WhatsendConfig) -> Section {
    let mut section = Section::new("Config");
    match whatsend_config::find_config_file() {
        Some(path) => section.push(Status::Ok, format!("using {}", path.display())),
        None => section.push(
            Status::Info,
            format!(
                "no config file, using defaults (would be created at {})",
                whatsend_config::find_or_default_config_path().display()
            ),
        ),
    }

    for d in whatsend_config::validate(config).diagnostics {
        let status = match d.severity {
            Severity::Error => Status::Fail,
            Severity::Warning => Status::Warn,
        };
        section.push(status, format!("{}: {}", d.path, d.message));
    }
    section
}

fn check_browser(config: &WhatsendConfig) -> Section {
    let mut section = Section::new("Browser");
    match whatsend_browser::detect_browser(config.browser.chrome_path.as_deref()) {
        Some(found) => section.push(
            Status::Ok,
            format!("{} (from {})", found.path.display(), found.source),
        ),
        None => {
            section.push(Status::Fail, "no Chromium-based browser found");
            for line in whatsend_browser::install_instructions().lines() {
                section.push(Status::Info, line.trim_end());
            }
        },
    }
    section.push(
        Status::Info,
        if config.browser.headless {
            "runs headless"
        } else {
            "runs with a visible window"
        },
    );
    section
}

fn check_session(path: &Path) -> Section {
    let mut section = Section::new("Session");
    if !path.exists() {
        section.push(
            Status::Info,
            format!(
                "no saved session at {}, the first send will ask for a QR scan",
                path.display()
            ),
        );
        return section;
    }

    match StorageState::load(path) {
        Ok(state) if state.is_empty() => section.push(
            Status::Warn,
            format!("{} holds no cookies or storage", path.display()),
        ),
        Ok(state) => section.push(
            Status::Ok,
            format!(
                "{}: {} cookie(s), {} origin(s)",
                path.display(),
                state.cookies.len(),
                state.origins.len()
            ),
        ),
        Err(e) => section.push(
            Status::Warn,
            format!("{e}; it will be ignored and a new QR scan requested"),
        ),
    }
    section
}
