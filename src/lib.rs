//! dealwatch: crawl a marketplace search page and announce new listings once.
//!
//! A run loads the search results in a headless browser, walks the listing
//! links in page order, extracts title, price and size from each detail page,
//! drops incomplete and undesirable listings, and sends the rest to a chat
//! channel. Links are remembered only after their message went out.

pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod model;
pub mod navigator;
pub mod notify;
pub mod pacing;
pub mod pipeline;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, CrawlConfig};
pub use error::{DeliveryError, NavigatorError, RunError, StoreError};
pub use extract::{ExtractionRules, Selectors};
pub use model::{ItemCandidate, ItemRecord, ListingLink, SeenEntry};
pub use navigator::{Navigator, WebDriverNavigator, WebDriverOptions};
pub use notify::{LogNotifier, Notifier, TelegramNotifier, TelegramOptions};
pub use pacing::{NoPacing, Pacing, RandomPacing};
pub use pipeline::{Pipeline, RunSummary};
pub use store::{MemoryStore, PostgresStore, SeenStore};
