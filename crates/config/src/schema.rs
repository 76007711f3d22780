/// Config schema types (server, browser, whatsapp, ui).
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsendConfig {
    pub server: ServerConfig,
    pub browser: BrowserConfig,
    pub whatsapp: WhatsAppConfig,
    pub ui: UiConfig,
}

/// Web form server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Number of finished jobs kept around for status polling.
    pub job_history: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8501,
            job_history: 16,
        }
    }
}

/// Browser launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Path to Chrome/Chromium binary (auto-detected if not set).
    pub chrome_path: Option<String>,
    /// Whether to run in headless mode.
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// CDP request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// User agent string (uses default if not set).
    pub user_agent: Option<String>,
    /// Additional Chrome arguments.
    pub chrome_args: Vec<String>,
    /// Persistent Chrome profile directory. A fresh temporary profile is used
    /// when unset.
    pub user_data_dir: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            viewport_width: 1280,
            viewport_height: 900,
            request_timeout_ms: 30_000,
            user_agent: None,
            chrome_args: Vec::new(),
            user_data_dir: None,
        }
    }
}

/// WhatsApp Web automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    pub url: String,
    /// Session state file (cookies + local storage).
    pub state_path: String,
    /// Where to also write the login QR code as PNG. Not written when unset.
    pub qr_image_path: Option<String>,
    pub timeouts: TimeoutsConfig,
    pub selectors: SelectorsConfig,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            url: "https://web.whatsapp.com/".into(),
            state_path: "whatsapp_state.json".into(),
            qr_image_path: None,
            timeouts: TimeoutsConfig::default(),
            selectors: SelectorsConfig::default(),
        }
    }
}

/// Fixed waits, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub page_load_ms: u64,
    pub login_check_ms: u64,
    pub qr_visible_ms: u64,
    pub qr_scan_ms: u64,
    pub contact_ms: u64,
    pub compose_ms: u64,
    /// Pause after typing the contact name so the result list can render.
    pub search_settle_ms: u64,
    /// Pause after clicking send so the message leaves before teardown.
    pub linger_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            page_load_ms: 30_000,
            login_check_ms: 5_000,
            qr_visible_ms: 30_000,
            qr_scan_ms: 120_000,
            contact_ms: 30_000,
            compose_ms: 30_000,
            search_settle_ms: 2_000,
            linger_ms: 5_000,
        }
    }
}

/// Site-owned DOM selectors. These change whenever WhatsApp Web ships a new
/// markup, so they're all overridable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SelectorsConfig {
    /// Present only once the chat list is loaded for a linked session.
    pub logged_in: String,
    pub qr_code: String,
    pub new_chat: String,
    pub search_box: String,
    /// Contact row; `{name}` is replaced with the escaped contact name.
    pub contact_row: String,
    pub compose_box: String,
    pub send_button: String,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            logged_in: r#"div[data-testid="chat-list-search"]"#.into(),
            qr_code: r#"canvas[aria-label*="Scan this QR code to link a" i], [role="img"][aria-label*="Scan this QR code to link a" i]"#.into(),
            new_chat: r#"span[data-testid="chat"]"#.into(),
            search_box: r#"div[data-testid="chat-list-search"]"#.into(),
            contact_row: r#"span[title="{name}"]"#.into(),
            compose_box: r#"div[data-testid="conversation-compose-box-input"]"#.into(),
            send_button: r#"span[data-testid="send"]"#.into(),
        }
    }
}

/// Form defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
    pub default_contact: String,
    pub default_message: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "WhatsApp auto sender".into(),
            default_contact: String::new(),
            default_message: "Automated message sent with whatsend!".into(),
        }
    }
}
