//! Redaction of external failures into safe, category-level errors.
//!
//! Each stage of the pipeline maps failures on its own: the calendar fetch and
//! the Telegram send turn a raw [`Fault`] into an [`Error`], and the flow maps
//! a stage's [`Error`] into a run-level one. Typed information (HTTP status,
//! transport error kind) is used first; keyword matching on the lowercased
//! fault text is the fallback. Fault text is read here and nowhere else.

use crate::error::{Error, Fault};

/// Safe messages, one per stage and category.
pub mod messages {
    pub const CALENDAR_AUTH: &str =
        "Authentication Error: Failed to load Google Calendar credentials securely.";
    pub const CALENDAR_QUOTA: &str = "API Quota Error: Google Calendar API rate limit exceeded.";
    pub const CALENDAR_NETWORK: &str = "Network Error: Failed to connect to Google Calendar API.";
    pub const CALENDAR_UNKNOWN: &str =
        "Unexpected Error: An unknown issue occurred while fetching schedules.";

    pub const TELEGRAM_MISSING_CREDENTIALS: &str = "Missing Telegram Credentials";
    pub const TELEGRAM_NETWORK: &str = "Network Error: Failed to connect to Telegram API.";
    pub const TELEGRAM_TIMEOUT: &str = "Timeout Error: Telegram API did not respond.";
    pub const TELEGRAM_TLS: &str = "SSL Error: Certificate verification failed.";
    pub const TELEGRAM_UNKNOWN: &str = "Telegram Send Failed: Unknown error occurred.";

    pub const RUN_AUTH: &str = "Authentication Error: Failed to verify API credentials securely.";
    pub const RUN_CALENDAR: &str =
        "Calendar Error: An issue occurred while fetching Google Calendar events.";
    pub const RUN_NETWORK: &str = "Network Error: Connection issues detected during flow execution.";
    pub const RUN_UNKNOWN: &str = "Unexpected Error: The flow failed due to an unknown issue.";
}

use messages::*;

/// Pipeline step a run-level failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Fetch,
    Notify,
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Classify a failure while authenticating against or reading from Google Calendar
pub fn calendar_failure(fault: &Fault) -> Error {
    match fault {
        Fault::Io(_) | Fault::Json(_) | Fault::Token(_) => Error::Authentication(CALENDAR_AUTH),
        Fault::Status { status, .. } if status.as_u16() == 401 => {
            Error::Authentication(CALENDAR_AUTH)
        }
        Fault::Status { status, .. } if status.as_u16() == 429 => {
            Error::QuotaOrRateLimit(CALENDAR_QUOTA)
        }
        Fault::Status { status, .. } if status.as_u16() == 403 => {
            // Google reports both exhausted quota and missing scopes as 403
            if contains_any(&fault.lowered_text(), &["quota", "ratelimit", "rate limit"]) {
                Error::QuotaOrRateLimit(CALENDAR_QUOTA)
            } else {
                Error::Authentication(CALENDAR_AUTH)
            }
        }
        Fault::Http(e) if e.is_timeout() || e.is_connect() => Error::Network(CALENDAR_NETWORK),
        _ => calendar_keywords(&fault.lowered_text()),
    }
}

fn calendar_keywords(text: &str) -> Error {
    if contains_any(text, &["credentials", "token", "json"]) {
        Error::Authentication(CALENDAR_AUTH)
    } else if contains_any(text, &["quota", "ratelimit"]) {
        Error::QuotaOrRateLimit(CALENDAR_QUOTA)
    } else if contains_any(text, &["network", "connection", "timeout"]) {
        Error::Network(CALENDAR_NETWORK)
    } else {
        Error::Unknown(CALENDAR_UNKNOWN)
    }
}

/// Classify a failure while delivering a Telegram message
pub fn telegram_failure(fault: &Fault) -> Error {
    let text = fault.lowered_text();
    match fault {
        Fault::Http(e) if e.is_timeout() => Error::Timeout(TELEGRAM_TIMEOUT),
        // Certificate problems surface as connect errors, so look for them first
        Fault::Http(e) if e.is_connect() && mentions_tls(&text) => Error::Tls(TELEGRAM_TLS),
        Fault::Http(e) if e.is_connect() => Error::Network(TELEGRAM_NETWORK),
        _ => telegram_keywords(&text),
    }
}

fn mentions_tls(text: &str) -> bool {
    contains_any(text, &["ssl", "tls", "certificate"])
}

fn telegram_keywords(text: &str) -> Error {
    if contains_any(text, &["connection", "dns"]) {
        Error::Network(TELEGRAM_NETWORK)
    } else if text.contains("timeout") {
        Error::Timeout(TELEGRAM_TIMEOUT)
    } else if mentions_tls(text) {
        Error::Tls(TELEGRAM_TLS)
    } else {
        Error::Unknown(TELEGRAM_UNKNOWN)
    }
}

/// Map a failed step to the error the whole run reports
pub fn run_failure(step: Step, err: &Error) -> Error {
    match (step, err) {
        (_, Error::Authentication(_)) | (_, Error::MissingCredential(_)) => {
            Error::Authentication(RUN_AUTH)
        }
        (Step::Fetch, Error::QuotaOrRateLimit(_))
        | (Step::Fetch, Error::Network(_))
        | (Step::Fetch, Error::Calendar(_)) => Error::Calendar(RUN_CALENDAR),
        (Step::Notify, Error::Network(_))
        | (Step::Notify, Error::Timeout(_))
        | (Step::Notify, Error::Tls(_)) => Error::Network(RUN_NETWORK),
        _ => Error::Unknown(RUN_UNKNOWN),
    }
}
