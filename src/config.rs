//! Configuration loaded from environment variables (and `.env` when present).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use url::Url;

use crate::extract::DEFAULT_UNDESIRABLE_KEYWORDS;

pub const DEFAULT_ERROR_LOG: &str = "errors.log";

pub const DEFAULT_SEARCH_URL: &str = "https://poshmark.com/search?query=the%20north%20face%20dryvent&sort_by=added_desc&brand%5B%5D=The%20North%20Face&department=Women&category=Jackets_%26_Coats&price%5B%5D=-35&size%5B%5D=M&size%5B%5D=S&size%5B%5D=L";

/// Budgets, timeouts and delays for one crawl cycle.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub search_url: Url,
    /// Shown in the header announcement
    pub digest_label: String,
    /// Cap on successfully notified items per run
    pub max_matches: usize,
    /// Cap on distinct links considered per run
    pub max_links: usize,
    pub scroll_max_steps: usize,
    pub scroll_step_delay: Duration,
    pub list_timeout: Duration,
    pub list_settle: Duration,
    pub detail_timeout: Duration,
    pub detail_settle: Duration,
    pub pacing_min: Duration,
    pub pacing_max: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            search_url: Url::parse(DEFAULT_SEARCH_URL).expect("default search URL is valid"),
            digest_label: "Women DryVent Jackets".to_string(),
            max_matches: 10,
            max_links: 120,
            scroll_max_steps: 8,
            scroll_step_delay: Duration::from_millis(1500),
            list_timeout: Duration::from_millis(30_000),
            list_settle: Duration::from_millis(5000),
            detail_timeout: Duration::from_millis(25_000),
            detail_settle: Duration::from_millis(2500),
            pacing_min: Duration::from_millis(1200),
            pacing_max: Duration::from_millis(2000),
        }
    }
}

/// Process configuration. Secrets stay optional here so dry runs need none of them.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub telegram_min_interval: Duration,
    pub webdriver_url: String,
    pub error_log_path: PathBuf,
    pub exit_delay: Duration,
    pub undesirable_keywords: Vec<String>,
    pub crawl: CrawlConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = CrawlConfig::default();

        let search_url = match get("SEARCH_URL") {
            Some(raw) => Url::parse(&raw).with_context(|| format!("SEARCH_URL is not a URL: {raw}"))?,
            None => defaults.search_url,
        };

        let crawl = CrawlConfig {
            search_url,
            digest_label: get("DIGEST_LABEL").unwrap_or(defaults.digest_label),
            max_matches: parse_or(&get, "MAX_MATCHES", defaults.max_matches)?,
            max_links: parse_or(&get, "MAX_LINKS", defaults.max_links)?,
            scroll_max_steps: parse_or(&get, "SCROLL_MAX_STEPS", defaults.scroll_max_steps)?,
            scroll_step_delay: millis_or(&get, "SCROLL_STEP_DELAY_MS", defaults.scroll_step_delay)?,
            list_timeout: millis_or(&get, "LIST_TIMEOUT_MS", defaults.list_timeout)?,
            list_settle: millis_or(&get, "LIST_SETTLE_MS", defaults.list_settle)?,
            detail_timeout: millis_or(&get, "DETAIL_TIMEOUT_MS", defaults.detail_timeout)?,
            detail_settle: millis_or(&get, "DETAIL_SETTLE_MS", defaults.detail_settle)?,
            pacing_min: millis_or(&get, "PACING_MIN_MS", defaults.pacing_min)?,
            pacing_max: millis_or(&get, "PACING_MAX_MS", defaults.pacing_max)?,
        };

        let undesirable_keywords = match get("UNDESIRABLE_KEYWORDS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_UNDESIRABLE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            telegram_token: get("TELEGRAM_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            telegram_min_interval: millis_or(
                &get,
                "TELEGRAM_MIN_INTERVAL_MS",
                Duration::from_millis(1000),
            )?,
            webdriver_url: get("WEBDRIVER_URL")
                .unwrap_or_else(|| "http://localhost:9515".to_string()),
            error_log_path: error_log_path(&get),
            exit_delay: millis_or(&get, "EXIT_DELAY_MS", Duration::from_millis(2000))?,
            undesirable_keywords,
            crawl,
        })
    }

    /// Where errors are appended, resolved on its own so that a config that
    /// fails to load can still be reported there.
    pub fn error_log_path_from_env() -> PathBuf {
        dotenvy::dotenv().ok();
        let get = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        error_log_path(&get)
    }

    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow!("DATABASE_URL must be set"))
    }

    pub fn require_telegram(&self) -> Result<(&str, &str)> {
        let token = self
            .telegram_token
            .as_deref()
            .ok_or_else(|| anyhow!("TELEGRAM_TOKEN must be set"))?;
        let chat_id = self
            .telegram_chat_id
            .as_deref()
            .ok_or_else(|| anyhow!("TELEGRAM_CHAT_ID must be set"))?;
        Ok((token, chat_id))
    }

    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  SEARCH_URL: {}", self.crawl.search_url);
        tracing::info!("  WEBDRIVER_URL: {}", self.webdriver_url);
        tracing::info!("  DATABASE_URL: {}", preview_opt(&self.database_url));
        tracing::info!("  TELEGRAM_TOKEN: {}", preview_opt(&self.telegram_token));
        tracing::info!("  TELEGRAM_CHAT_ID: {}", preview_opt(&self.telegram_chat_id));
        tracing::info!(
            "  MAX_MATCHES: {}, MAX_LINKS: {}",
            self.crawl.max_matches,
            self.crawl.max_links
        );
    }
}

/// First few characters of a secret plus its length, safe on any UTF-8.
fn preview_opt(val: &Option<String>) -> String {
    match val {
        Some(v) => format!(
            "{}...({} chars)",
            v.chars().take(5).collect::<String>(),
            v.chars().count()
        ),
        None => "<not set>".to_string(),
    }
}

fn error_log_path<G>(get: &G) -> PathBuf
where
    G: Fn(&str) -> Option<String>,
{
    get("ERROR_LOG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ERROR_LOG))
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key}={raw} is invalid: {e}")),
        None => Ok(default),
    }
}

fn millis_or<G>(get: &G, key: &str, default: Duration) -> Result<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    let default_ms = default.as_millis() as u64;
    parse_or(get, key, default_ms).map(Duration::from_millis)
}
