use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::Notifier;
use crate::error::DeliveryError;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub bot_token: String,
    pub chat_id: String,
    /// Minimum spacing between two consecutive sends
    pub min_interval: Duration,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TelegramResponse {
    ok: bool,
    description: Option<String>,
    result: Option<SentMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SentMessage {
    message_id: i64,
}

/// Telegram Bot API `sendMessage` client.
///
/// Sends are serialized through `last_sent`, so at most one request is in flight
/// and consecutive messages are spaced by `min_interval`.
pub struct TelegramNotifier {
    http: reqwest::Client,
    options: TelegramOptions,
    endpoint: String,
    last_sent: Mutex<Option<Instant>>,
}

impl TelegramNotifier {
    pub fn new(options: TelegramOptions) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let endpoint = format!("{API_BASE}/bot{}/sendMessage", options.bot_token);

        Ok(Self {
            http,
            options,
            endpoint,
            last_sent: Mutex::new(None),
        })
    }

    pub(crate) fn payload<'a>(&'a self, text: &'a str) -> SendMessage<'a> {
        SendMessage {
            chat_id: &self.options.chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: false,
        }
    }
}

pub(crate) fn check_response(response: TelegramResponse) -> Result<i64, DeliveryError> {
    if !response.ok {
        return Err(DeliveryError::Rejected(
            response
                .description
                .unwrap_or_else(|| "no description".to_string()),
        ));
    }
    Ok(response.result.map(|m| m.message_id).unwrap_or_default())
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<(), DeliveryError> {
        let mut last_sent = self.last_sent.lock().await;
        if let Some(last) = *last_sent {
            tokio::time::sleep_until(last + self.options.min_interval).await;
        }

        debug!(chars = message.chars().count(), "Sending Telegram message");
        let result: Result<i64, DeliveryError> = async {
            let resp = self
                .http
                .post(&self.endpoint)
                .json(&self.payload(message))
                .send()
                .await?;

            let status = resp.status();
            let body = resp.text().await?;
            match serde_json::from_str::<TelegramResponse>(&body) {
                Ok(parsed) => check_response(parsed),
                Err(_) => Err(DeliveryError::Api {
                    status: status.as_u16(),
                    message: body,
                }),
            }
        }
        .await;
        *last_sent = Some(Instant::now());

        match result {
            Ok(message_id) => {
                debug!(message_id, "Telegram OK");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Telegram delivery failed");
                Err(e)
            }
        }
    }
}
