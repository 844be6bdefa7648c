//! Headless browser session behind a small trait.

mod webdriver;

pub use webdriver::{WebDriverNavigator, WebDriverOptions};

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::NavigatorError;

/// A single browser tab, exclusively owned by one run.
#[async_trait]
pub trait Navigator: Send {
    /// Navigate and wait for the content-loaded signal.
    async fn open(&mut self, url: &str, timeout: Duration) -> Result<(), NavigatorError>;

    /// Scroll down by one viewport height.
    async fn scroll_by_viewport(&mut self) -> Result<(), NavigatorError>;

    /// Current total document height in pixels.
    async fn page_height(&mut self) -> Result<u64, NavigatorError>;

    /// Run a script against the current DOM and return its JSON result.
    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, NavigatorError>;

    /// Serialized rendered DOM of the current page.
    async fn snapshot(&mut self) -> Result<String, NavigatorError>;

    /// Release the browser. Called once on every exit path of a run.
    async fn close(&mut self) -> Result<(), NavigatorError>;

    /// Scroll until the page height plateaus or `max_steps` is reached.
    ///
    /// Returns the number of steps taken. Only fatal session errors escape;
    /// any other failure simply ends scrolling.
    async fn autoscroll(
        &mut self,
        max_steps: usize,
        step_delay: Duration,
    ) -> Result<usize, NavigatorError> {
        let mut previous = 0u64;

        for step in 1..=max_steps {
            let sampled: Result<u64, NavigatorError> = async {
                self.scroll_by_viewport().await?;
                tokio::time::sleep(step_delay).await;
                self.page_height().await
            }
            .await;

            let height = match sampled {
                Ok(height) => height,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(step, error = %e, "Scroll step failed, keeping what has loaded");
                    return Ok(step);
                }
            };

            debug!(step, height, "Scrolled");
            if height == previous {
                return Ok(step);
            }
            previous = height;
        }

        Ok(max_steps)
    }
}
