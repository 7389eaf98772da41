//! Browser session backed by a headless Chromium driven through chromiumoxide.

use crate::core::BrowserSession;
use crate::utils::error::{CrawlerError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Find a Chrome/Chromium executable.
///
/// An explicit path wins; otherwise the usual binaries on `PATH` are tried.
/// `None` leaves detection to chromiumoxide.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        tracing::warn!("Chrome path {} does not exist, searching PATH", path.display());
    }

    ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    pub user_agent: String,
    pub poll_interval: Duration,
    pub screenshot_quality: i64,
}

/// What the page reports about an XPath lookup.
#[derive(Debug, Deserialize)]
struct NodeProbe {
    found: bool,
    #[serde(default)]
    visible: bool,
    #[serde(default)]
    value: Option<String>,
}

/// Wraps `body` in a script that resolves `locator` as XPath into `el`.
fn xpath_script(locator: &str, body: &str) -> Result<String> {
    let locator = serde_json::to_string(locator)?;
    Ok(format!(
        r#"(() => {{
    const el = document.evaluate({locator}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
    if (!el) {{ return {{ found: false }}; }}
    {body}
}})()"#
    ))
}

const VISIBILITY_BODY: &str = r#"const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    const visible = rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none';
    return { found: true, visible: visible };"#;

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: Option<JoinHandle<()>>,
    options: ChromiumOptions,
    closed: bool,
}

impl ChromiumSession {
    /// Launches one browser process and opens a blank tab.
    pub async fn launch(options: ChromiumOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={}", options.user_agent));

        if let Some(path) = find_chromium(options.chrome_path.as_deref()) {
            tracing::debug!("Using browser at {}", path.display());
            builder = builder.chrome_executable(path);
        }
        if !options.headless {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(|message| CrawlerError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| CrawlerError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("browser handler: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrawlerError::BrowserLaunch {
                message: format!("failed to open tab: {}", e),
            })?;

        Ok(Self {
            browser,
            page,
            handler: Some(handler),
            options,
            closed: false,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, action: &str, locator: &str, script: &str) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| CrawlerError::browser(action, locator, e))?;
        result
            .into_value()
            .map_err(|e| CrawlerError::browser(action, locator, format!("unexpected result: {}", e)))
    }

    async fn probe(&self, locator: &str) -> Result<NodeProbe> {
        let script = xpath_script(locator, VISIBILITY_BODY)?;
        self.eval("probe", locator, &script).await
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| CrawlerError::browser("navigate", url, e))?;
        Ok(())
    }

    async fn click(&self, locator: &str) -> Result<()> {
        let element = self
            .page
            .find_xpath(locator)
            .await
            .map_err(|_| CrawlerError::ElementNotFound {
                locator: locator.to_string(),
            })?;
        element
            .click()
            .await
            .map_err(|e| CrawlerError::browser("click", locator, e))?;
        Ok(())
    }

    async fn set_value(&self, locator: &str, value: &str) -> Result<()> {
        let body = format!(
            r#"el.value = {};
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return {{ found: true }};"#,
            serde_json::to_string(value)?
        );
        let script = xpath_script(locator, &body)?;
        let probe: NodeProbe = self.eval("set value", locator, &script).await?;
        if !probe.found {
            return Err(CrawlerError::ElementNotFound {
                locator: locator.to_string(),
            });
        }
        Ok(())
    }

    async fn wait_visible(&self, locator: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let probe = self.probe(locator).await?;
            if probe.found && probe.visible {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(CrawlerError::ElementNotVisible {
                    locator: locator.to_string(),
                    waited: timeout,
                });
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    async fn attribute(&self, locator: &str, name: &str) -> Result<Option<String>> {
        let body = format!(
            "return {{ found: true, value: el.getAttribute({}) }};",
            serde_json::to_string(name)?
        );
        let script = xpath_script(locator, &body)?;
        let probe: NodeProbe = self.eval("read attribute", locator, &script).await?;
        if !probe.found {
            return Err(CrawlerError::ElementNotFound {
                locator: locator.to_string(),
            });
        }
        Ok(probe.value)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Jpeg)
            .quality(self.options.screenshot_quality)
            .full_page(true)
            .build();
        self.page
            .screenshot(params)
            .await
            .map_err(|e| CrawlerError::browser("screenshot", "page", e))
    }

    async fn set_download_dir(&self, dir: &Path) -> Result<()> {
        // Chrome only accepts absolute download paths.
        let dir = dir
            .canonicalize()
            .map_err(|e| CrawlerError::io(format!("resolving {}", dir.display()), e))?;
        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::AllowAndName)
            .download_path(dir.to_string_lossy().into_owned())
            .events_enabled(true)
            .build()
            .map_err(|e| CrawlerError::browser("set download behavior", "browser", e))?;

        self.page
            .execute(params)
            .await
            .map_err(|e| CrawlerError::browser("set download behavior", "browser", e))?;
        tracing::debug!("Downloads go to {}", dir.display());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Browser process did not exit cleanly: {}", e);
        }

        if let Some(mut handler) = self.handler.take() {
            if tokio::time::timeout(Duration::from_secs(5), &mut handler)
                .await
                .is_err()
            {
                handler.abort();
            }
        }

        closed
            .map(|_| ())
            .map_err(|e| CrawlerError::browser("close", "browser", e))
    }
}
