use super::client::MessageTransport;
use super::models::{OutgoingMessage, ParseMode};
use crate::classify::{messages, telegram_failure};
use crate::config::TelegramConfig;
use crate::error::{AppResult, Error};
use tracing::{error, info};

/// Sends text to the configured Telegram chat
pub struct Notifier<T> {
    transport: T,
    credentials: TelegramConfig,
}

impl<T: MessageTransport> Notifier<T> {
    pub fn new(transport: T, credentials: TelegramConfig) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Deliver `text` as Markdown.
    ///
    /// Missing secrets fail with [`Error::MissingCredential`] before anything
    /// is sent. Delivery failures are classified and logged here.
    pub async fn send(&self, text: &str) -> AppResult<()> {
        let (Some(token), Some(chat_id)) = (
            self.credentials.token.as_deref(),
            self.credentials.chat_id.as_deref(),
        ) else {
            error!("Error: Telegram credentials are missing.");
            return Err(Error::MissingCredential(
                messages::TELEGRAM_MISSING_CREDENTIALS,
            ));
        };

        let message = OutgoingMessage {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            parse_mode: ParseMode::Markdown,
        };

        info!("Sending message via Telegram Bot API...");
        match self.transport.send_message(token, &message).await {
            Ok(()) => {
                info!("Success: Message sent to Telegram!");
                Ok(())
            }
            Err(fault) => {
                let err = telegram_failure(&fault);
                error!("{}", err);
                Err(err)
            }
        }
    }
}
