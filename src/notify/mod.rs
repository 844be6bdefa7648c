//! Outbound notifications. One channel, one message at a time.

pub mod log;
pub mod telegram;

pub use log::LogNotifier;
pub use telegram::{TelegramNotifier, TelegramOptions};

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::model::ItemRecord;

/// Invisible separator. Sent first so the channel's preview shows the header, not an item.
pub const WAKE_MESSAGE: &str = "\u{2063}";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), DeliveryError>;
}

pub fn header_message(label: &str) -> String {
    format!("🔔 *You got new deals!*\n\nHere are the latest {label}:")
}

pub fn item_message(item: &ItemRecord) -> String {
    format!(
        "🧥 *{}*\n💰 {}\n📏 Size: {}\n🔗 {}",
        escape_markdown(&item.title),
        item.numeric_price,
        escape_markdown(&item.size),
        item.link,
    )
}

/// Escape the characters legacy Telegram Markdown treats as entity delimiters.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
