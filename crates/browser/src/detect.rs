//! Browser detection and install guidance.

use std::path::PathBuf;

/// Chromium-based executable names looked up in `PATH`.
const CHROMIUM_EXECUTABLES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "chrome-browser",
    "microsoft-edge",
    "microsoft-edge-stable",
    "msedge",
    "brave",
    "brave-browser",
];

#[cfg(target_os = "macos")]
const PLATFORM_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
    "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
];

#[cfg(target_os = "windows")]
const PLATFORM_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_PATHS: &[&str] = &[];

/// Where a detected browser came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    Config,
    Environment,
    Platform,
    Path,
}

impl std::fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Config => "config",
            Self::Environment => "CHROME env",
            Self::Platform => "platform default",
            Self::Path => "PATH",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct DetectedBrowser {
    pub path: PathBuf,
    pub source: DetectionSource,
}

/// Find a Chromium-based browser.
///
/// Checks, in order: the configured path, the `CHROME` environment variable,
/// platform install locations, then known executable names in `PATH`.
pub fn detect_browser(custom_path: Option<&str>) -> Option<DetectedBrowser> {
    detect_with(custom_path, std::env::var("CHROME").ok().as_deref())
}

fn detect_with(custom_path: Option<&str>, env_path: Option<&str>) -> Option<DetectedBrowser> {
    let existing = |path: &str, source| {
        let p = PathBuf::from(path);
        p.exists().then_some(DetectedBrowser { path: p, source })
    };

    custom_path
        .and_then(|p| existing(p, DetectionSource::Config))
        .or_else(|| env_path.and_then(|p| existing(p, DetectionSource::Environment)))
        .or_else(|| {
            PLATFORM_PATHS
                .iter()
                .find_map(|p| existing(p, DetectionSource::Platform))
        })
        .or_else(|| {
            CHROMIUM_EXECUTABLES.iter().find_map(|name| {
                which::which(name).ok().map(|path| DetectedBrowser {
                    path,
                    source: DetectionSource::Path,
                })
            })
        })
}

/// Platform-specific install instructions.
pub fn install_instructions() -> String {
    let instructions = if cfg!(target_os = "macos") {
        "  brew install --cask google-chrome"
    } else if cfg!(target_os = "linux") {
        "  Debian/Ubuntu: sudo apt install chromium\n  \
         Fedora:        sudo dnf install chromium\n  \
         Arch:          sudo pacman -S chromium"
    } else if cfg!(target_os = "windows") {
        "  winget install Google.Chrome"
    } else {
        "  Download from https://www.google.com/chrome/"
    };

    format!(
        "No Chromium-based browser found. Install one:\n\n\
         {instructions}\n\n\
         Or set the path manually:\n  \
         [browser]\n  \
         chrome_path = \"/path/to/chromium\"\n\n\
         Or set the CHROME environment variable."
    )
}

/// Log whether a browser is available. Returns `true` when one is found.
pub fn check_and_warn(custom_path: Option<&str>) -> bool {
    match detect_browser(custom_path) {
        Some(found) => {
            tracing::info!(path = %found.path.display(), source = %found.source, "browser detected");
            true
        },
        None => {
            tracing::warn!("Chrome/Chromium not found.\n{}", install_instructions());
            false
        },
    }
}
