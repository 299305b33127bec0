#![allow(dead_code)]

use async_trait::async_trait;
use daily_agenda::components::google_calendar::{
    AccessToken, CalendarEvent, CalendarProvider, EventQuery, EventTime,
};
use daily_agenda::components::telegram::{MessageTransport, OutgoingMessage};
use daily_agenda::config::Config;
use daily_agenda::error::Fault;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Text planted in every fake failure; it must never show up in logs
pub const SECRET: &str = "ya29.SUPER-SECRET-TOKEN";

pub const HOLIDAYS: &str = "id.indonesian#holiday@group.v.calendar.google.com";

/// Config with zero retry delay and, optionally, Telegram secrets
pub fn test_config(with_telegram: bool) -> Config {
    let mut vars: HashMap<&str, &str> = HashMap::new();
    vars.insert("RETRY_DELAY_SECS", "0");
    if with_telegram {
        vars.insert("TELEGRAM_TOKEN", "123456:TEST");
        vars.insert("TELEGRAM_CHAT_ID", "-100200300");
    }
    Config::from_lookup(
        |key| vars.get(key).map(|v| v.to_string()),
        Path::new("tests/does-not-exist/calendars.toml"),
    )
    .unwrap()
}

/// Write an authorized-user credential file into the temp dir
pub fn credential_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "daily-agenda-it-{}-{}.json",
        name,
        std::process::id()
    ));
    std::fs::write(&path, content).unwrap();
    path
}

/// Credential file whose access token has expired, refreshed at `token_uri`
pub fn expired_credentials(name: &str, token_uri: &str) -> PathBuf {
    let content = serde_json::json!({
        "token": "ya29.expired",
        "refresh_token": "1//refresh",
        "client_id": "client.apps.googleusercontent.com",
        "client_secret": "client-secret",
        "token_uri": token_uri,
        "expiry": "2000-01-01T00:00:00Z"
    });
    credential_file(name, &content.to_string())
}

pub fn timed(title: &str, start: &str, end: &str) -> CalendarEvent {
    CalendarEvent {
        title: title.to_string(),
        start: EventTime::DateTime(start.to_string()),
        end: EventTime::DateTime(end.to_string()),
        calendar_id: "primary".to_string(),
    }
}

pub fn all_day(title: &str, start: &str, end: &str) -> CalendarEvent {
    CalendarEvent {
        title: title.to_string(),
        start: EventTime::Date(start.to_string()),
        end: EventTime::Date(end.to_string()),
        calendar_id: HOLIDAYS.to_string(),
    }
}

/// What a fake calendar answers
pub enum FakeSource {
    Events(Vec<CalendarEvent>),
    Fails,
}

/// In-memory calendar provider
#[derive(Default)]
pub struct FakeCalendar {
    sources: HashMap<String, FakeSource>,
    missing_credentials: bool,
    pub auth_calls: AtomicU32,
    pub queries: Mutex<Vec<EventQuery>>,
}

impl FakeCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, calendar_id: &str, source: FakeSource) -> Self {
        self.sources.insert(calendar_id.to_string(), source);
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.missing_credentials = true;
        self
    }

    pub fn auth_calls(&self) -> u32 {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn queried_calendars(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .map(|q| q.calendar_id.clone())
            .collect()
    }
}

#[async_trait]
impl CalendarProvider for FakeCalendar {
    async fn authenticate(&self) -> Result<AccessToken, Fault> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        if self.missing_credentials {
            return Err(Fault::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("token.json not found, last token was {}", SECRET),
            )));
        }
        Ok(AccessToken::new("fake-access-token"))
    }

    async fn list_events(
        &self,
        _token: &AccessToken,
        query: &EventQuery,
    ) -> Result<Vec<CalendarEvent>, Fault> {
        self.queries.lock().unwrap().push(query.clone());
        match self.sources.get(&query.calendar_id) {
            Some(FakeSource::Events(events)) => Ok(events.clone()),
            Some(FakeSource::Fails) => Err(Fault::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: format!("backend error for Bearer {}", SECRET),
            }),
            None => Ok(Vec::new()),
        }
    }
}

/// How a fake transport fails
#[derive(Clone, Copy)]
pub enum SendFailure {
    Timeout,
    Connection,
    Certificate,
}

/// Records messages instead of sending them
#[derive(Default)]
pub struct FakeTransport {
    failures_left: AtomicU32,
    failure: Option<SendFailure>,
    pub calls: AtomicU32,
    pub sent: Mutex<Vec<(String, OutgoingMessage)>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `times` sends with `failure`
    pub fn failing(times: u32, failure: SendFailure) -> Self {
        Self {
            failures_left: AtomicU32::new(times),
            failure: Some(failure),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(String, OutgoingMessage)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for FakeTransport {
    async fn send_message(&self, token: &str, message: &OutgoingMessage) -> Result<(), Fault> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let left = self.failures_left.load(Ordering::SeqCst);
        if let (Some(failure), true) = (self.failure, left > 0) {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            let text = match failure {
                SendFailure::Timeout => "operation timeout",
                SendFailure::Connection => "connection refused",
                SendFailure::Certificate => "ssl certificate verify failed",
            };
            return Err(Fault::Other(format!(
                "{} at https://api.telegram.org/bot{}/sendMessage",
                text, SECRET
            )));
        }

        self.sent
            .lock()
            .unwrap()
            .push((token.to_string(), message.clone()));
        Ok(())
    }
}

/// Shared buffer the test subscriber writes into
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route this thread's logs into a buffer until the guard drops
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
