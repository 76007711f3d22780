//! Host Chrome/Chromium driven over CDP, reduced to the handful of page
//! operations the WhatsApp flows need.
//!
//! # Features
//!
//! - **goto**: navigate and wait for the load event
//! - **wait_for**: poll an element until it is attached, visible, or hidden
//! - **click** / **fill**: input events at the element, text insertion
//! - **screenshot**: PNG capture of a single element
//! - **storage_state**: cookies and local storage, saved to and restored from JSON
//!
//! Flows are written against [`PageDriver`] and [`SessionLauncher`];
//! [`CdpLauncher`] is the real implementation.
//!
//! # Example
//!
//! ```ignore
//! use whatsend_browser::{CdpLauncher, SessionLauncher, WaitState};
//!
//! let launcher = CdpLauncher::new(config.browser.clone());
//! let mut page = launcher.launch(None).await?;
//! page.goto("https://web.whatsapp.com/", 30_000).await?;
//! page.wait_for("canvas", WaitState::Visible, 30_000).await?;
//! page.close().await?;
//! ```

pub mod cdp;
pub mod detect;
pub mod driver;
pub mod error;
pub mod scripts;
pub mod state;

pub use {
    cdp::{CdpLauncher, CdpSession},
    detect::{DetectedBrowser, DetectionSource, check_and_warn, detect_browser, install_instructions},
    driver::{ElementProbe, PageDriver, SessionLauncher, WaitState},
    error::{BrowserError, Result},
    state::{OriginState, StorageEntry, StorageState, StoredCookie},
};
