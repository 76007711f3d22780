//! Persisted session state: cookies plus per-origin local storage.
//!
//! The file layout mirrors the storage-state JSON that browser automation
//! tools commonly use, so a state captured elsewhere can be reused:
//!
//! ```json
//! {
//!   "cookies": [{ "name": "wa_ul", "value": "…", "domain": ".web.whatsapp.com", "path": "/",
//!                 "expires": -1, "httpOnly": false, "secure": true, "sameSite": "Lax" }],
//!   "origins": [{ "origin": "https://web.whatsapp.com",
//!                 "localStorage": [{ "name": "WABrowserId", "value": "…" }] }]
//! }
//! ```

use std::path::Path;

use {
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::error::{BrowserError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageState {
    pub cookies: Vec<StoredCookie>,
    pub origins: Vec<OriginState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    /// Unix seconds; `-1` for session cookies.
    #[serde(default = "session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

fn default_cookie_path() -> String {
    "/".into()
}

fn session_expiry() -> f64 {
    -1.0
}

impl StoredCookie {
    #[must_use]
    pub fn is_session(&self) -> bool {
        self.expires < 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
    pub origin: String,
    #[serde(default)]
    pub local_storage: Vec<StorageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    pub value: String,
}

impl StorageState {
    /// Read a state file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let state: Self = serde_json::from_str(&raw).map_err(|e| {
            BrowserError::Storage(format!("invalid state file {}: {e}", path.display()))
        })?;
        debug!(
            path = %path.display(),
            cookies = state.cookies.len(),
            origins = state.origins.len(),
            "loaded session state"
        );
        Ok(state)
    }

    /// Write the state file, replacing any previous one atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = std::path::PathBuf::from(tmp);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;

        debug!(
            path = %path.display(),
            cookies = self.cookies.len(),
            origins = self.origins.len(),
            "saved session state"
        );
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.origins.iter().all(|o| o.local_storage.is_empty())
    }
}
