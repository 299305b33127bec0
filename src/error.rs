use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application.
///
/// Every classified variant carries a fixed, human-readable message chosen by
/// [`crate::classify`]. The payload is `&'static str` so nothing produced at
/// runtime (request URLs, bot tokens, provider error bodies) can end up in it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum Error {
    #[error("{0}")]
    #[diagnostic(code(daily_agenda::authentication))]
    Authentication(&'static str),

    #[error("{0}")]
    #[diagnostic(code(daily_agenda::quota))]
    QuotaOrRateLimit(&'static str),

    #[error("{0}")]
    #[diagnostic(code(daily_agenda::network))]
    Network(&'static str),

    #[error("{0}")]
    #[diagnostic(code(daily_agenda::timeout))]
    Timeout(&'static str),

    #[error("{0}")]
    #[diagnostic(code(daily_agenda::tls))]
    Tls(&'static str),

    #[error("{0}")]
    #[diagnostic(code(daily_agenda::calendar))]
    Calendar(&'static str),

    #[error("{0}")]
    #[diagnostic(
        code(daily_agenda::missing_credential),
        help("set TELEGRAM_TOKEN and TELEGRAM_CHAT_ID in the environment or .env")
    )]
    MissingCredential(&'static str),

    #[error("{0}")]
    #[diagnostic(code(daily_agenda::unknown))]
    Unknown(&'static str),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(daily_agenda::config))]
    Config(String),
}

impl Error {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Missing secrets and bad configuration won't fix themselves between
    /// attempts, so the retry loop gives up on them straight away.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Error::MissingCredential(_) | Error::Config(_))
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Raw failure from an external call, before classification.
///
/// The text of a `Fault` may contain secrets (the Telegram token is part of
/// the request URL, Google error bodies echo request details). It is only ever
/// inspected by the classifier and must never be logged or returned to callers.
#[derive(Debug, Error)]
pub enum Fault {
    #[error("credential file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored without its URL, which can carry the bot token
    #[error(transparent)]
    Http(reqwest::Error),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("token error: {0}")]
    Token(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Fault {
    fn from(err: reqwest::Error) -> Self {
        Fault::Http(err.without_url())
    }
}

impl Fault {
    /// Lowercased text of the fault and its whole source chain, for keyword
    /// matching only.
    pub(crate) fn lowered_text(&self) -> String {
        use std::error::Error as StdError;

        let mut text = self.to_string().to_lowercase();
        let mut source = StdError::source(self);
        while let Some(cause) = source {
            text.push(' ');
            text.push_str(&cause.to_string().to_lowercase());
            source = StdError::source(cause);
        }
        text
    }
}
