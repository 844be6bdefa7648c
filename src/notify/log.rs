use async_trait::async_trait;
use tracing::info;

use super::Notifier;
use crate::error::DeliveryError;

/// Logs messages instead of delivering them. Used for dry runs.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<(), DeliveryError> {
        info!(message = %message.escape_debug(), "Dry run, not delivering");
        Ok(())
    }
}
