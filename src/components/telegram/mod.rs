//! Delivering the summary to a Telegram chat.

pub mod client;
pub mod models;
pub mod notifier;

pub use client::{MessageTransport, TelegramBotApi};
pub use models::{OutgoingMessage, ParseMode};
pub use notifier::Notifier;
