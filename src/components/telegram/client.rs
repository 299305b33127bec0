use super::models::{ApiResponse, OutgoingMessage};
use crate::error::Fault;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Base URL of the Telegram Bot API
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Write-only message delivery
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Deliver one message using the given bot token
    async fn send_message(&self, token: &str, message: &OutgoingMessage) -> Result<(), Fault>;
}

/// Telegram Bot API over HTTPS
#[derive(Clone)]
pub struct TelegramBotApi {
    client: Client,
    api_base: String,
}

impl TelegramBotApi {
    /// Create a transport whose sends give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, Fault> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
        })
    }

    /// Point the transport at another API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// `{base}/bot{token}/sendMessage`
    pub fn send_message_url(&self, token: &str) -> Result<Url, Fault> {
        let mut url = Url::parse(&self.api_base)?;
        url.path_segments_mut()
            .map_err(|_| Fault::Other("telegram API base cannot hold a path".to_string()))?
            .pop_if_empty()
            .push(&format!("bot{}", token))
            .push("sendMessage");
        Ok(url)
    }
}

#[async_trait]
impl MessageTransport for TelegramBotApi {
    async fn send_message(&self, token: &str, message: &OutgoingMessage) -> Result<(), Fault> {
        let url = self.send_message_url(token)?;

        let response = self.client.post(url).json(message).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Fault::Status { status, body });
        }

        let envelope: ApiResponse = serde_json::from_str(&body)?;
        if !envelope.ok {
            return Err(Fault::Other(
                envelope
                    .description
                    .unwrap_or_else(|| "telegram rejected the message".to_string()),
            ));
        }

        Ok(())
    }
}
