//! Scripted browser doubles for the flow tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use {
    async_trait::async_trait,
    whatsend_browser::{
        BrowserError, PageDriver, Result, SessionLauncher, StorageState, StoredCookie, WaitState,
    },
    whatsend_config::{SelectorsConfig, TimeoutsConfig, WhatsAppConfig},
};

use crate::selectors;

/// How the fake WhatsApp page behaves.
#[derive(Debug, Clone)]
pub struct Script {
    pub logged_in: bool,
    pub qr_shown: bool,
    pub qr_scanned: bool,
    pub new_chat: bool,
    pub compose_box: bool,
    pub send_button: bool,
    pub contacts: Vec<String>,
}

impl Script {
    pub fn logged_in() -> Self {
        Self {
            logged_in: true,
            qr_shown: false,
            qr_scanned: false,
            new_chat: true,
            compose_box: true,
            send_button: true,
            contacts: vec!["Guilherme".into()],
        }
    }

    pub fn needs_qr() -> Self {
        Self {
            logged_in: false,
            qr_shown: true,
            qr_scanned: true,
            ..Self::logged_in()
        }
    }
}

pub fn fast_config() -> WhatsAppConfig {
    WhatsAppConfig {
        timeouts: TimeoutsConfig {
            page_load_ms: 10,
            login_check_ms: 10,
            qr_visible_ms: 10,
            qr_scan_ms: 10,
            contact_ms: 10,
            compose_ms: 10,
            search_settle_ms: 0,
            linger_ms: 0,
        },
        ..WhatsAppConfig::default()
    }
}

pub fn linked_state() -> StorageState {
    StorageState {
        cookies: vec![StoredCookie {
            name: "wa_session".into(),
            value: "linked".into(),
            domain: ".web.whatsapp.com".into(),
            path: "/".into(),
            expires: -1.0,
            http_only: true,
            secure: true,
            same_site: None,
        }],
        origins: Vec::new(),
    }
}

pub struct ScriptedPage {
    script: Script,
    selectors: SelectorsConfig,
    calls: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedPage {
    pub const QR_PNG: &'static [u8] = &[0x89, b'P', b'N', b'G'];

    pub fn new(script: Script) -> Self {
        Self {
            script,
            selectors: SelectorsConfig::default(),
            calls: Arc::default(),
            closes: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn expect(present: bool, what: &str, timeout_ms: u64) -> Result<()> {
        if present {
            Ok(())
        } else {
            Err(BrowserError::timeout(what, timeout_ms))
        }
    }
}

#[async_trait]
impl PageDriver for ScriptedPage {
    async fn goto(&self, url: &str, _timeout_ms: u64) -> Result<()> {
        self.record(format!("goto {url}"));
        Ok(())
    }

    async fn wait_for(&self, selector: &str, state: WaitState, timeout_ms: u64) -> Result<()> {
        let s = &self.script;
        match state {
            WaitState::Attached if selector == self.selectors.logged_in => {
                Self::expect(s.logged_in, selector, timeout_ms)
            },
            WaitState::Visible if selector == self.selectors.qr_code => {
                Self::expect(s.qr_shown, selector, timeout_ms)
            },
            WaitState::Hidden if selector == self.selectors.qr_code => {
                Self::expect(s.qr_scanned, selector, timeout_ms)
            },
            _ => Ok(()),
        }
    }

    async fn click(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        self.record(format!("click {selector}"));
        let s = &self.script;
        if selector == self.selectors.new_chat {
            return Self::expect(s.new_chat, selector, timeout_ms);
        }
        if selector == self.selectors.send_button {
            return Self::expect(s.send_button, selector, timeout_ms);
        }
        if selector.starts_with("span[title=") {
            let known = s
                .contacts
                .iter()
                .any(|c| selectors::contact_row(&self.selectors.contact_row, c) == selector);
            return Self::expect(known, selector, timeout_ms);
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str, timeout_ms: u64) -> Result<()> {
        self.record(format!("fill {selector} {text}"));
        if selector == self.selectors.compose_box {
            return Self::expect(self.script.compose_box, selector, timeout_ms);
        }
        Ok(())
    }

    async fn screenshot(&self, selector: &str) -> Result<Vec<u8>> {
        self.record(format!("screenshot {selector}"));
        Ok(Self::QR_PNG.to_vec())
    }

    async fn storage_state(&self) -> Result<StorageState> {
        Ok(linked_state())
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out [`ScriptedPage`]s and remembers what it was asked to restore.
#[derive(Default)]
pub struct FakeLauncher {
    pub script: Option<Script>,
    pub fail_launch: bool,
    pub restored: Arc<Mutex<Vec<Option<StorageState>>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub closes: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn new(script: Script) -> Self {
        Self {
            script: Some(script),
            ..Self::default()
        }
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn restored(&self) -> Vec<Option<StorageState>> {
        self.restored.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self, state: Option<&StorageState>) -> Result<Box<dyn PageDriver>> {
        self.restored.lock().unwrap().push(state.cloned());
        if self.fail_launch {
            return Err(BrowserError::BrowserNotAvailable("no browser here".into()));
        }
        Ok(Box::new(ScriptedPage {
            script: self.script.clone().unwrap_or_else(Script::logged_in),
            selectors: SelectorsConfig::default(),
            calls: Arc::clone(&self.calls),
            closes: Arc::clone(&self.closes),
        }))
    }
}
