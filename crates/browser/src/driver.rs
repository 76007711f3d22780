//! The page-level operations the automation flows are written against.

use async_trait::async_trait;

use crate::{error::Result, state::StorageState};

/// Element condition awaited by [`PageDriver::wait_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// Present in the DOM, visible or not.
    Attached,
    /// Present with a non-empty box and not hidden by style.
    Visible,
    /// Absent, or present but not visible.
    Hidden,
}

impl std::fmt::Display for WaitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attached => write!(f, "attached"),
            Self::Visible => write!(f, "visible"),
            Self::Hidden => write!(f, "hidden"),
        }
    }
}

/// What a single DOM probe saw for a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementProbe {
    Absent,
    Hidden,
    Visible,
}

impl ElementProbe {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "absent" => Some(Self::Absent),
            "hidden" => Some(Self::Hidden),
            "visible" => Some(Self::Visible),
            _ => None,
        }
    }
}

impl WaitState {
    #[must_use]
    pub fn is_satisfied_by(self, probe: ElementProbe) -> bool {
        match self {
            Self::Attached => probe != ElementProbe::Absent,
            Self::Visible => probe == ElementProbe::Visible,
            Self::Hidden => probe != ElementProbe::Visible,
        }
    }
}

/// One open page in a launched browser.
///
/// A bounded wait that runs out returns [`crate::BrowserError::Timeout`];
/// everything else is reported with the other variants.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate and wait for the load event.
    async fn goto(&self, url: &str, timeout_ms: u64) -> Result<()>;

    /// Poll until the first element matching `selector` reaches `state`.
    async fn wait_for(&self, selector: &str, state: WaitState, timeout_ms: u64) -> Result<()>;

    /// Wait for the element to be visible, then click its center.
    async fn click(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Wait for the element to be visible, replace its content with `text`.
    async fn fill(&self, selector: &str, text: &str, timeout_ms: u64) -> Result<()>;

    /// PNG screenshot of the first element matching `selector`.
    async fn screenshot(&self, selector: &str) -> Result<Vec<u8>>;

    /// Capture cookies and local storage of the current origin.
    async fn storage_state(&self) -> Result<StorageState>;

    /// Close the page and the browser, and wait for the process to exit.
    /// Calling it twice is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Launches a browser with an optional restored session.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, state: Option<&StorageState>) -> Result<Box<dyn PageDriver>>;
}
