use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::{ChromeCapabilities, PageLoadStrategy};
use thirtyfour::error::WebDriverErrorInner;
use thirtyfour::prelude::*;
use tracing::{debug, info, warn};

use super::Navigator;
use crate::error::NavigatorError;

pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const SCROLL_SCRIPT: &str = "window.scrollBy(0, window.innerHeight); return null;";
const HEIGHT_SCRIPT: &str = "return document.body ? document.body.scrollHeight : 0;";

/// How to reach and launch the browser.
#[derive(Debug, Clone)]
pub struct WebDriverOptions {
    /// chromedriver (or Selenium) endpoint
    pub server_url: String,
    pub user_agent: String,
    pub headless: bool,
}

impl Default for WebDriverOptions {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:9515".to_string(),
            user_agent: DESKTOP_USER_AGENT.to_string(),
            headless: true,
        }
    }
}

/// Chrome driven over the WebDriver protocol; one session, one tab.
pub struct WebDriverNavigator {
    driver: Option<WebDriver>,
    page_load_timeout: Option<Duration>,
}

impl WebDriverNavigator {
    pub async fn launch(options: &WebDriverOptions) -> Result<Self, NavigatorError> {
        info!(server = %options.server_url, "Launching browser session");

        let caps = chrome_capabilities(options)?;
        let driver = WebDriver::new(&options.server_url, caps)
            .await
            .map_err(session_error)?;

        Ok(Self {
            driver: Some(driver),
            page_load_timeout: None,
        })
    }

    fn driver(&self) -> Result<&WebDriver, NavigatorError> {
        self.driver
            .as_ref()
            .ok_or_else(|| NavigatorError::SessionLost("session already closed".to_string()))
    }
}

#[async_trait]
impl Navigator for WebDriverNavigator {
    async fn open(&mut self, url: &str, timeout: Duration) -> Result<(), NavigatorError> {
        if self.page_load_timeout != Some(timeout) {
            self.driver()?
                .set_page_load_timeout(timeout)
                .await
                .map_err(session_error)?;
            self.page_load_timeout = Some(timeout);
        }

        debug!(url, "Navigating");
        let driver = self.driver()?;
        // A little slack so the driver's own timeout normally fires first.
        match tokio::time::timeout(timeout + Duration::from_secs(5), driver.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(navigation_error(url, timeout, &e)),
            Err(_) => Err(NavigatorError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn scroll_by_viewport(&mut self) -> Result<(), NavigatorError> {
        self.evaluate(SCROLL_SCRIPT).await.map(|_| ())
    }

    async fn page_height(&mut self) -> Result<u64, NavigatorError> {
        let value = self.evaluate(HEIGHT_SCRIPT).await?;
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|h| h.max(0.0) as u64))
            .ok_or_else(|| NavigatorError::Script(format!("unexpected page height: {value}")))
    }

    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, NavigatorError> {
        let ret = self
            .driver()?
            .execute(script, Vec::new())
            .await
            .map_err(script_error)?;
        Ok(ret.json().clone())
    }

    async fn snapshot(&mut self) -> Result<String, NavigatorError> {
        self.driver()?.source().await.map_err(|e| {
            if is_session_gone(&e) {
                NavigatorError::SessionLost(e.to_string())
            } else {
                NavigatorError::Extraction(e.to_string())
            }
        })
    }

    async fn close(&mut self) -> Result<(), NavigatorError> {
        let Some(driver) = self.driver.take() else {
            return Ok(());
        };
        info!("Closing browser session");
        driver.quit().await.map_err(|e| {
            warn!(error = %e, "Browser did not shut down cleanly");
            NavigatorError::SessionLost(e.to_string())
        })
    }
}

/// Headless Chrome that reports navigation done at DOMContentLoaded.
fn chrome_capabilities(options: &WebDriverOptions) -> Result<ChromeCapabilities, NavigatorError> {
    let mut caps = DesiredCapabilities::chrome();
    caps.set_page_load_strategy(PageLoadStrategy::Eager)
        .map_err(session_error)?;
    if options.headless {
        caps.set_headless().map_err(session_error)?;
    }
    for arg in [
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--disable-gpu",
        "--window-size=1280,1600",
    ] {
        caps.add_arg(arg).map_err(session_error)?;
    }
    caps.add_arg(&format!("--user-agent={}", options.user_agent))
        .map_err(session_error)?;

    Ok(caps)
}

/// Whether the browser or the driver connection is gone for good.
fn is_session_gone(err: &WebDriverError) -> bool {
    match err.as_inner() {
        WebDriverErrorInner::InvalidSessionId(_)
        | WebDriverErrorInner::NoSuchWindow(_)
        | WebDriverErrorInner::SessionNotCreated(_)
        | WebDriverErrorInner::SessionCreateError(_)
        | WebDriverErrorInner::RequestFailed(_)
        | WebDriverErrorInner::HttpError(_)
        | WebDriverErrorInner::FatalError(_)
        | WebDriverErrorInner::CommandSendError(_)
        | WebDriverErrorInner::CommandRecvError(_) => true,
        WebDriverErrorInner::UnknownError(info) => is_browser_crash(&info.value.message),
        _ => false,
    }
}

/// chromedriver reports a crashed or detached browser as "unknown error",
/// the same code it uses for page-level `net::ERR_*` failures.
fn is_browser_crash(message: &str) -> bool {
    let message = message.to_lowercase();
    [
        "not connected to devtools",
        "chrome not reachable",
        "tab crashed",
        "session deleted because of page crash",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}

fn session_error(err: WebDriverError) -> NavigatorError {
    NavigatorError::SessionLost(err.to_string())
}

fn script_error(err: WebDriverError) -> NavigatorError {
    if is_session_gone(&err) {
        NavigatorError::SessionLost(err.to_string())
    } else {
        NavigatorError::Script(err.to_string())
    }
}

fn navigation_error(url: &str, timeout: Duration, err: &WebDriverError) -> NavigatorError {
    if is_session_gone(err) {
        return NavigatorError::SessionLost(err.to_string());
    }
    match err.as_inner() {
        WebDriverErrorInner::WebDriverTimeout(_) | WebDriverErrorInner::Timeout(_) => {
            NavigatorError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            }
        }
        _ => NavigatorError::Navigation {
            url: url.to_string(),
            message: err.to_string(),
        },
    }
}
