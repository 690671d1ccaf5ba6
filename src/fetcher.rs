use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::{Html, Selector};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::MonitorConfig;
use crate::models::PageSnapshot;
use crate::utils::error::{AppError, Result};

/// Debug screenshots land here, timestamp-tagged, and are never cleaned up.
pub const DEBUG_SCREENSHOTS_DIR: &str = "debug_screenshots";

/// Pause after navigation so dynamically injected booking widgets settle.
const SETTLE_WAIT: Duration = Duration::from_secs(2);

/// Hides the webdriver flag pages probe to spot browser automation.
const WEBDRIVER_SHIM: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// Source of rendered page text. The poll loop only talks to this trait so
/// tests can script page content without a browser.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageSnapshot>;
}

/// One Chrome session for the whole process lifetime; each fetch opens and
/// closes its own tab. Dropping the fetcher tears the browser down.
pub struct PageFetcher {
    browser: Browser,
    page_timeout: Duration,
    debug: bool,
}

impl PageFetcher {
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(!config.visible)
            .sandbox(false)
            .window_size(Some((1920, 1080)))
            .args(vec![
                OsStr::new("--disable-notifications"),
                OsStr::new("--disable-popup-blocking"),
                // Fresh content on every check
                OsStr::new("--disable-application-cache"),
                OsStr::new("--disk-cache-size=0"),
                OsStr::new("--disable-blink-features=AutomationControlled"),
            ])
            .build()
            .map_err(|e| AppError::Fetch(format!("failed to build launch options: {e}")))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(chrome_path.clone());
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Fetch(format!("failed to launch browser: {e}")))?;

        Ok(Self {
            browser,
            page_timeout: config.page_timeout(),
            debug: config.debug,
        })
    }

    async fn fetch_inner(&self, url: &str) -> Result<PageSnapshot> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| AppError::Fetch(format!("failed to open tab: {e}")))?;

        let result = self.load_page(&tab, url).await;

        if result.is_err() && self.debug {
            if let Err(shot_err) = self.take_screenshot(&tab, "error") {
                warn!("could not capture error screenshot: {shot_err}");
            }
        }

        let _ = tab.close(true);
        result
    }

    async fn load_page(&self, tab: &Arc<Tab>, url: &str) -> Result<PageSnapshot> {
        tab.navigate_to(url)
            .map_err(|e| AppError::Fetch(format!("navigation failed: {e}")))?;

        tab.wait_until_navigated()
            .map_err(|e| AppError::Fetch(format!("page load failed: {e}")))?;

        if let Err(e) = tab.evaluate(WEBDRIVER_SHIM, false) {
            warn!("could not apply webdriver shim: {e}");
        }

        tab.wait_for_element_with_custom_timeout("body", self.page_timeout)
            .map_err(|e| AppError::Timeout {
                seconds: self.page_timeout.as_secs(),
                message: e.to_string(),
            })?;

        tokio::time::sleep(SETTLE_WAIT).await;

        let screenshot_path = if self.debug {
            match self.take_screenshot(tab, "page") {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("could not capture page screenshot: {e}");
                    None
                }
            }
        } else {
            None
        };

        let html = tab
            .get_content()
            .map_err(|e| AppError::Fetch(format!("failed to get page content: {e}")))?;

        Ok(PageSnapshot {
            raw_text: visible_text(&html),
            screenshot_path,
        })
    }

    fn take_screenshot(&self, tab: &Arc<Tab>, prefix: &str) -> Result<PathBuf> {
        let data = tab
            .capture_screenshot(
                headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption::Png,
                None,
                None,
                true,
            )
            .map_err(|e| AppError::Fetch(format!("screenshot capture failed: {e}")))?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{prefix}_{timestamp}.png");
        let path = Path::new(DEBUG_SCREENSHOTS_DIR).join(filename);

        std::fs::create_dir_all(DEBUG_SCREENSHOTS_DIR)?;
        std::fs::write(&path, data)?;

        debug!("screenshot saved: {}", path.display());
        Ok(path)
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<PageSnapshot> {
        self.fetch_inner(url).await
    }
}

/// Extract the human-visible text from a rendered document, skipping script
/// and style contents the way `innerText` would.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("hard-coded selector");

    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    let mut parts = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let parent_name = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_ascii_lowercase()));
        if matches!(parent_name.as_deref(), Some("script") | Some("style")) {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }

    parts.join(" ")
}
