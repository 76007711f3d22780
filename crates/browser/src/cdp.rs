//! Chromium over CDP: launching, page primitives, and teardown.

use std::time::{Duration, Instant};

use {
    async_trait::async_trait,
    chromiumoxide::{
        Browser, BrowserConfig as CdpBrowserConfig, Page,
        cdp::browser_protocol::{
            input::{
                DispatchMouseEventParams, DispatchMouseEventType, InsertTextParams, MouseButton,
            },
            network::{CookieParam, SetCookiesParams},
            page::{AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat},
        },
    },
    futures::StreamExt,
    serde::Deserialize,
    tokio::task::JoinHandle,
    tracing::{debug, info, warn},
    whatsend_config::BrowserConfig,
};

use crate::{
    detect,
    driver::{ElementProbe, PageDriver, SessionLauncher, WaitState},
    error::{BrowserError, Result},
    scripts,
    state::{OriginState, StorageEntry, StorageState, StoredCookie},
};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launches host Chromium for each session.
pub struct CdpLauncher {
    config: BrowserConfig,
}

impl CdpLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn build_config(&self) -> Result<CdpBrowserConfig> {
        let detected = detect::detect_browser(self.config.chrome_path.as_deref())
            .ok_or_else(|| BrowserError::BrowserNotAvailable(detect::install_instructions()))?;

        let mut builder = CdpBrowserConfig::builder();

        // chromiumoxide runs headless unless with_head() is called
        if !self.config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .chrome_executable(detected.path)
            .viewport(chromiumoxide::handler::viewport::Viewport {
                width: self.config.viewport_width,
                height: self.config.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .request_timeout(Duration::from_millis(self.config.request_timeout_ms));

        if let Some(ref dir) = self.config.user_data_dir {
            builder = builder.user_data_dir(dir);
        }

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        builder = builder
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        builder
            .build()
            .map_err(|e| BrowserError::LaunchFailed(format!("failed to build browser config: {e}")))
    }
}

#[async_trait]
impl SessionLauncher for CdpLauncher {
    async fn launch(&self, state: Option<&StorageState>) -> Result<Box<dyn PageDriver>> {
        let config = self.build_config()?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            BrowserError::LaunchFailed(format!("{e}\n\n{}", detect::install_instructions()))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
            debug!("browser event handler exited");
        });

        let mut session = CdpSession {
            browser,
            page: None,
            handler: Some(handler),
            closed: false,
        };

        // Any failure past this point still tears the process down.
        match session.open_page(state).await {
            Ok(()) => {
                info!(
                    headless = self.config.headless,
                    restored = state.is_some(),
                    "launched browser"
                );
                Ok(Box::new(session))
            },
            Err(e) => {
                let _ = session.close().await;
                Err(e)
            },
        }
    }
}

/// A launched browser with its single page.
pub struct CdpSession {
    browser: Browser,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    closed: bool,
}

#[derive(Deserialize)]
struct Point {
    found: bool,
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
struct LocalStorageDump {
    origin: String,
    entries: Vec<(String, Option<String>)>,
}

impl CdpSession {
    async fn open_page(&mut self, state: Option<&StorageState>) -> Result<()> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        if let Some(state) = state {
            apply_storage_state(&page, state).await?;
        }

        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| BrowserError::Cdp("page already closed".into()))
    }

    async fn probe(&self, selector: &str) -> Result<ElementProbe> {
        let raw: String = self
            .page()?
            .evaluate(scripts::probe_element(selector)?.as_str())
            .await
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::JsEvalFailed(format!("{e:?}")))?;

        if raw == "invalid" {
            return Err(BrowserError::InvalidSelector(selector.to_string()));
        }
        ElementProbe::parse(&raw)
            .ok_or_else(|| BrowserError::JsEvalFailed(format!("unexpected probe result {raw:?}")))
    }

    async fn mouse(&self, kind: DispatchMouseEventType, point: &Point) -> Result<()> {
        let cmd = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(point.x)
            .y(point.y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(BrowserError::Cdp)?;
        self.page()?.execute(cmd).await?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for CdpSession {
    async fn goto(&self, url: &str, timeout_ms: u64) -> Result<()> {
        validate_url(url)?;
        let page = self.page()?;

        match tokio::time::timeout(Duration::from_millis(timeout_ms), page.goto(url)).await {
            Ok(Ok(_)) => {
                info!(url, "navigated");
                Ok(())
            },
            Ok(Err(e)) => Err(BrowserError::NavigationFailed(e.to_string())),
            Err(_) => Err(BrowserError::timeout(format!("page load of {url}"), timeout_ms)),
        }
    }

    async fn wait_for(&self, selector: &str, state: WaitState, timeout_ms: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            match self.probe(selector).await {
                Ok(probe) if state.is_satisfied_by(probe) => {
                    debug!(selector, %state, "wait satisfied");
                    return Ok(());
                },
                Ok(_) => {},
                Err(e @ BrowserError::InvalidSelector(_)) => return Err(e),
                // The document may be mid-navigation; keep polling.
                Err(e) => debug!(selector, error = %e, "probe failed"),
            }

            if Instant::now() >= deadline {
                return Err(BrowserError::timeout(format!("{selector} ({state})"), timeout_ms));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        self.wait_for(selector, WaitState::Visible, timeout_ms)
            .await?;

        let point: Point = self
            .page()?
            .evaluate(scripts::element_center(selector)?.as_str())
            .await
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::JsEvalFailed(format!("{e:?}")))?;
        if !point.found {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }

        self.mouse(DispatchMouseEventType::MousePressed, &point)
            .await?;
        self.mouse(DispatchMouseEventType::MouseReleased, &point)
            .await?;

        debug!(selector, x = point.x, y = point.y, "clicked element");
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str, timeout_ms: u64) -> Result<()> {
        self.wait_for(selector, WaitState::Visible, timeout_ms)
            .await?;

        let page = self.page()?;
        let focused: bool = page
            .evaluate(scripts::focus_and_select(selector, text.is_empty())?.as_str())
            .await
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?
            .into_value()
            .unwrap_or(false);
        if !focused {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }

        if !text.is_empty() {
            page.execute(InsertTextParams::new(text)).await?;
        }

        debug!(selector, chars = text.chars().count(), "filled element");
        Ok(())
    }

    async fn screenshot(&self, selector: &str) -> Result<Vec<u8>> {
        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;

        let png = element
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|e| BrowserError::ScreenshotFailed(e.to_string()))?;

        debug!(selector, bytes = png.len(), "took element screenshot");
        Ok(png)
    }

    async fn storage_state(&self) -> Result<StorageState> {
        let page = self.page()?;

        let cookies = page.get_cookies().await?;
        let cookies: Vec<StoredCookie> = serde_json::from_value(serde_json::to_value(cookies)?)?;

        let dump: LocalStorageDump = page
            .evaluate(scripts::DUMP_LOCAL_STORAGE)
            .await
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::JsEvalFailed(format!("{e:?}")))?;

        let local_storage: Vec<StorageEntry> = dump
            .entries
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| StorageEntry { name, value }))
            .collect();

        let origins = if local_storage.is_empty() {
            Vec::new()
        } else {
            vec![OriginState {
                origin: dump.origin,
                local_storage,
            }]
        };

        Ok(StorageState { cookies, origins })
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Some(page) = self.page.take()
            && let Err(e) = page.close().await
        {
            debug!(error = %e, "failed to close page");
        }

        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "graceful browser close failed, killing process");
            if let Some(Err(e)) = self.browser.kill().await {
                warn!(error = %e, "failed to kill browser process");
            }
        }

        match self.browser.wait().await {
            Ok(status) => debug!(?status, "browser process exited"),
            Err(e) => warn!(error = %e, "failed to wait for browser process"),
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        info!("browser closed");
        Ok(())
    }
}

/// Restore cookies and local storage before the first navigation.
///
/// Cookies go through `Network.setCookies` directly: `Page::set_cookies`
/// fills in the page URL, and `about:blank` cannot carry cookies.
async fn apply_storage_state(page: &Page, state: &StorageState) -> Result<()> {
    if !state.cookies.is_empty() {
        let params = state
            .cookies
            .iter()
            .map(cookie_param)
            .collect::<Result<Vec<_>>>()?;
        page.execute(SetCookiesParams::new(params)).await?;
    }

    for origin in state.origins.iter().filter(|o| !o.local_storage.is_empty()) {
        let source = scripts::seed_local_storage(&origin.origin, &origin.local_storage)?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(source))
            .await?;
    }

    debug!(
        cookies = state.cookies.len(),
        origins = state.origins.len(),
        "applied session state"
    );
    Ok(())
}

fn cookie_param(cookie: &StoredCookie) -> Result<CookieParam> {
    let mut value = serde_json::json!({
        "name": cookie.name,
        "value": cookie.value,
        "domain": cookie.domain,
        "path": cookie.path,
        "secure": cookie.secure,
        "httpOnly": cookie.http_only,
    });
    if !cookie.is_session() {
        value["expires"] = serde_json::json!(cookie.expires);
    }
    if let Some(ref same_site) = cookie.same_site {
        value["sameSite"] = serde_json::json!(same_site);
    }
    Ok(serde_json::from_value(value)?)
}

/// Only http(s) targets are navigated to.
fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(BrowserError::NavigationFailed("URL cannot be empty".into()));
    }

    let parsed = url::Url::parse(url)
        .map_err(|e| BrowserError::NavigationFailed(format!("invalid URL '{url}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(BrowserError::NavigationFailed(format!(
            "unsupported URL scheme '{scheme}', only http/https allowed"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn validate_url_schemes() {
        assert!(validate_url("https://web.whatsapp.com/").is_ok());
        assert!(validate_url("http://localhost:8080/").is_ok());
        assert!(validate_url("").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn session_cookie_has_no_expiry_param() {
        let cookie = StoredCookie {
            name: "wa_ul".into(),
            value: "x".into(),
            domain: ".web.whatsapp.com".into(),
            path: "/".into(),
            expires: -1.0,
            http_only: true,
            secure: true,
            same_site: Some("Strict".into()),
        };
        let param = serde_json::to_value(cookie_param(&cookie).unwrap()).unwrap();
        assert_eq!(param["name"], "wa_ul");
        assert_eq!(param["httpOnly"], true);
        assert_eq!(param["sameSite"], "Strict");
        assert!(param.get("expires").is_none_or(|v| v.is_null()));
    }

    #[test]
    fn cookie_param_scopes_by_domain_not_url() {
        let cookie = StoredCookie {
            name: "wa_ul".into(),
            value: "x".into(),
            domain: ".web.whatsapp.com".into(),
            path: "/".into(),
            expires: 1_900_000_000.0,
            http_only: true,
            secure: true,
            same_site: None,
        };
        let param = cookie_param(&cookie).unwrap();
        assert!(param.url.is_none());
        assert_eq!(param.domain.as_deref(), Some(".web.whatsapp.com"));

        let batch = serde_json::to_value(SetCookiesParams::new(vec![param])).unwrap();
        assert!(batch["cookies"][0].get("url").is_none_or(|v| v.is_null()));
    }

    #[test]
    fn persistent_cookie_keeps_expiry() {
        let cookie = StoredCookie {
            name: "wa_lang_pref".into(),
            value: "en".into(),
            domain: "web.whatsapp.com".into(),
            path: "/".into(),
            expires: 1_900_000_000.0,
            http_only: false,
            secure: true,
            same_site: None,
        };
        let param = serde_json::to_value(cookie_param(&cookie).unwrap()).unwrap();
        assert_eq!(param["expires"].as_f64(), Some(1_900_000_000.0));
    }
}
