// Test mocks for the crawl pipeline.
//
// Three mocks matching the three trait boundaries, all writing to one shared
// Journal so tests can assert on the interleaving of calls:
// - ScriptedNavigator (Navigator) — URL→HTML map plus a scripted height sequence
// - RecordingNotifier (Notifier) — records sent messages, fails on demand
// - RecordingStore (SeenStore) — MemoryStore wrapper, fails on demand

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::config::CrawlConfig;
use crate::error::{DeliveryError, NavigatorError, StoreError};
use crate::model::ListingLink;
use crate::navigator::Navigator;
use crate::notify::Notifier;
use crate::store::{MemoryStore, SeenStore};

pub const SEARCH_URL: &str = "https://poshmark.com/search?query=dryvent";

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Opened(String),
    Sent(String),
    Added(String),
    Closed,
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Opened(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn sent(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Sent(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

// ---------------------------------------------------------------------------
// ScriptedNavigator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Timeout,
    SessionLost,
}

/// Serves registered HTML per URL. Unregistered URLs fail with a navigation error.
pub struct ScriptedNavigator {
    journal: Journal,
    pages: HashMap<String, String>,
    failures: HashMap<String, Failure>,
    heights: Vec<u64>,
    height_reads: usize,
    pub scrolls: usize,
    current: Option<String>,
}

impl ScriptedNavigator {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            pages: HashMap::new(),
            failures: HashMap::new(),
            heights: vec![1000],
            height_reads: 0,
            scrolls: 0,
            current: None,
        }
    }

    pub fn on_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn failing(mut self, url: &str, failure: Failure) -> Self {
        self.failures.insert(url.to_string(), failure);
        self
    }

    /// Heights returned by successive `page_height` calls; the last one repeats.
    pub fn with_heights(mut self, heights: Vec<u64>) -> Self {
        self.heights = heights;
        self
    }
}

#[async_trait]
impl Navigator for ScriptedNavigator {
    async fn open(&mut self, url: &str, timeout: Duration) -> Result<(), NavigatorError> {
        self.journal.push(Event::Opened(url.to_string()));
        match self.failures.get(url) {
            Some(Failure::Timeout) => {
                return Err(NavigatorError::NavigationTimeout {
                    url: url.to_string(),
                    timeout,
                });
            }
            Some(Failure::SessionLost) => {
                return Err(NavigatorError::SessionLost("chrome not reachable".to_string()));
            }
            None => {}
        }
        if !self.pages.contains_key(url) {
            return Err(NavigatorError::Navigation {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn scroll_by_viewport(&mut self) -> Result<(), NavigatorError> {
        self.scrolls += 1;
        Ok(())
    }

    async fn page_height(&mut self) -> Result<u64, NavigatorError> {
        let idx = self.height_reads.min(self.heights.len().saturating_sub(1));
        self.height_reads += 1;
        Ok(self.heights.get(idx).copied().unwrap_or(0))
    }

    async fn evaluate(&mut self, _script: &str) -> Result<serde_json::Value, NavigatorError> {
        Ok(serde_json::Value::Null)
    }

    async fn snapshot(&mut self) -> Result<String, NavigatorError> {
        Ok(self
            .current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .cloned()
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), NavigatorError> {
        self.journal.push(Event::Closed);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Records delivered messages. Messages containing any `fail_on` needle fail.
pub struct RecordingNotifier {
    journal: Journal,
    fail_on: Vec<String>,
}

impl RecordingNotifier {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail_on: Vec::new(),
        }
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> Result<(), DeliveryError> {
        if self.fail_on.iter().any(|n| message.contains(n.as_str())) {
            return Err(DeliveryError::Network("simulated outage".to_string()));
        }
        self.journal.push(Event::Sent(message.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingStore
// ---------------------------------------------------------------------------

pub struct RecordingStore {
    inner: MemoryStore,
    journal: Journal,
    fail_ready: bool,
    fail_has: bool,
}

impl RecordingStore {
    pub fn new(journal: Journal) -> Self {
        Self {
            inner: MemoryStore::new(),
            journal,
            fail_ready: false,
            fail_has: false,
        }
    }

    pub fn with_seen(journal: Journal, links: &[&str]) -> Self {
        Self {
            inner: MemoryStore::with_seen(links.iter().copied()),
            ..Self::new(journal)
        }
    }

    pub fn unreachable(mut self) -> Self {
        self.fail_ready = true;
        self.fail_has = true;
        self
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_has = true;
        self
    }

    pub fn contains(&self, link: &str) -> bool {
        self.inner.entry(&ListingLink::new(link)).is_some()
    }
}

#[async_trait]
impl SeenStore for RecordingStore {
    async fn ensure_ready(&self) -> Result<(), StoreError> {
        if self.fail_ready {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.ensure_ready().await
    }

    async fn has(&self, link: &ListingLink) -> Result<bool, StoreError> {
        if self.fail_has {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.has(link).await
    }

    async fn add(&self, link: &ListingLink) -> Result<(), StoreError> {
        self.journal.push(Event::Added(link.to_string()));
        self.inner.add(link).await
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn listing_url(id: &str) -> String {
    format!("https://poshmark.com/listing/{id}")
}

/// Search grid linking to `/listing/{id}` for each id, in order.
pub fn grid_html(ids: &[&str]) -> String {
    let tiles: String = ids
        .iter()
        .map(|id| {
            format!(r#"<div class="tile"><a class="tile__covershot" href="/listing/{id}">x</a></div>"#)
        })
        .collect();
    format!("<html><body>{tiles}</body></html>")
}

pub fn detail_html(title: &str, price: &str, size: &str) -> String {
    let mut body = String::new();
    if !title.is_empty() {
        body.push_str(&format!(r#"<h1 class="listing__title-container">{title}</h1>"#));
    }
    if !price.is_empty() {
        body.push_str(&format!(r#"<p class="h1">{price}</p>"#));
    }
    if !size.is_empty() {
        body.push_str(&format!(
            r#"<button class="size-selector__size-option">{size}</button>"#
        ));
    }
    format!("<html><body>{body}</body></html>")
}

/// Crawl settings with every delay zeroed.
pub fn test_config() -> CrawlConfig {
    CrawlConfig {
        search_url: Url::parse(SEARCH_URL).unwrap(),
        scroll_step_delay: Duration::ZERO,
        list_settle: Duration::ZERO,
        detail_settle: Duration::ZERO,
        pacing_min: Duration::ZERO,
        pacing_max: Duration::ZERO,
        ..CrawlConfig::default()
    }
}
