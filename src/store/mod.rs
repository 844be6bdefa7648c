//! Durable set of links that have already been notified.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::ListingLink;

#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Make sure the backing table exists. Called once at the start of a run.
    async fn ensure_ready(&self) -> Result<(), StoreError>;

    async fn has(&self, link: &ListingLink) -> Result<bool, StoreError>;

    /// Record a link as seen. Adding a present link is not an error.
    async fn add(&self, link: &ListingLink) -> Result<(), StoreError>;
}
