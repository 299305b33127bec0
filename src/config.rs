use crate::error::{config_error, AppResult};
use crate::utils::retry::RetryPolicy;
use crate::utils::time::{parse_date, parse_time, parse_utc_offset};
use chrono::{FixedOffset, NaiveDate};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Calendars queried when no `config/calendars.toml` is present
pub const DEFAULT_CALENDARS: [&str; 2] = [
    "primary",
    "id.indonesian#holiday@group.v.calendar.google.com",
];

/// Default timezone used to decide what "today" is
pub const DEFAULT_TIMEZONE: &str = "Asia/Jakarta";

/// Default offset of the day window sent to the calendar API
pub const DEFAULT_UTC_OFFSET: &str = "+07:00";

/// Default location of the authorized-user credential file
pub const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Default time for the always-on mode
pub const DEFAULT_DAILY_TIME: &str = "07:00";

/// Optional file overriding the calendar list
pub const CALENDARS_FILE: &str = "config/calendars.toml";

/// How the process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Run the flow once and exit; an external scheduler owns timing
    Once,
    /// Stay alive and run the flow every day at `daily_notification_time`
    Serve,
}

impl RunMode {
    fn parse(value: &str) -> AppResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "once" => Ok(RunMode::Once),
            "serve" => Ok(RunMode::Serve),
            other => Err(config_error(&format!(
                "RUN_MODE must be 'once' or 'serve', got '{}'",
                other
            ))),
        }
    }
}

/// Telegram secrets.
///
/// Both values are optional here; the notifier refuses to send when either is
/// missing, so a misconfigured deployment still fetches and fails loudly at
/// the send step.
#[derive(Clone, Default)]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub chat_id: Option<String>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Main configuration structure, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token and destination chat
    pub telegram: TelegramConfig,
    /// Path to the Google authorized-user credential file
    pub google_token_file: PathBuf,
    /// Calendar IDs queried in order
    pub calendars: Vec<String>,
    /// Timezone used to compute today's date
    pub timezone: Tz,
    /// Offset of the `[00:00:00, 23:59:59]` window sent to the calendar API
    pub utc_offset: FixedOffset,
    /// One-shot or always-on
    pub run_mode: RunMode,
    /// Date a one-shot run reports on instead of today
    pub schedule_date: Option<NaiveDate>,
    /// HH:MM at which the always-on mode runs
    pub daily_notification_time: String,
    /// Retry policy for the calendar fetch
    pub fetch_retry: RetryPolicy,
    /// Retry policy for the Telegram send
    pub send_retry: RetryPolicy,
    /// Upper bound for a single Telegram send
    pub send_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct CalendarsFile {
    calendars: Vec<String>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok(), Path::new(CALENDARS_FILE))
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F, calendars_file: &Path) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram = TelegramConfig {
            token: non_empty("TELEGRAM_TOKEN"),
            chat_id: non_empty("TELEGRAM_CHAT_ID"),
        };

        let google_token_file = PathBuf::from(
            non_empty("GOOGLE_TOKEN_FILE").unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string()),
        );

        let timezone_name = non_empty("TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = timezone_name
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown TIMEZONE '{}'", timezone_name)))?;

        let offset_str =
            non_empty("CALENDAR_UTC_OFFSET").unwrap_or_else(|| DEFAULT_UTC_OFFSET.to_string());
        let utc_offset = parse_utc_offset(&offset_str).ok_or_else(|| {
            config_error(&format!("Invalid CALENDAR_UTC_OFFSET '{}'", offset_str))
        })?;

        let run_mode = match non_empty("RUN_MODE") {
            Some(mode) => RunMode::parse(&mode)?,
            None => RunMode::Once,
        };

        let schedule_date = non_empty("SCHEDULE_DATE")
            .map(|d| parse_date(d.trim()))
            .transpose()?;
        if schedule_date.is_some() && run_mode == RunMode::Serve {
            return Err(config_error("SCHEDULE_DATE only applies when RUN_MODE is 'once'"));
        }

        let daily_notification_time =
            non_empty("DAILY_NOTIFICATION_TIME").unwrap_or_else(|| DEFAULT_DAILY_TIME.to_string());
        if parse_time(&daily_notification_time).is_none() {
            return Err(config_error(&format!(
                "Invalid DAILY_NOTIFICATION_TIME '{}', expected HH:MM",
                daily_notification_time
            )));
        }

        let attempts = parse_number(non_empty("RETRY_ATTEMPTS"), "RETRY_ATTEMPTS", 3)?;
        if attempts == 0 {
            return Err(config_error("RETRY_ATTEMPTS must be at least 1"));
        }
        let delay = parse_number(non_empty("RETRY_DELAY_SECS"), "RETRY_DELAY_SECS", 5)?;
        let retry = RetryPolicy::new(attempts as u32, Duration::from_secs(delay));

        let send_timeout = Duration::from_secs(parse_number(
            non_empty("SEND_TIMEOUT_SECS"),
            "SEND_TIMEOUT_SECS",
            30,
        )?);

        let calendars = load_calendars(calendars_file)?;

        Ok(Config {
            telegram,
            google_token_file,
            calendars,
            timezone,
            utc_offset,
            run_mode,
            schedule_date,
            daily_notification_time,
            fetch_retry: retry,
            send_retry: retry,
            send_timeout,
        })
    }
}

fn parse_number(value: Option<String>, name: &str, default: u64) -> AppResult<u64> {
    match value {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map_err(|_| config_error(&format!("Invalid {} format", name))),
        None => Ok(default),
    }
}

/// Read the calendar list from the TOML file, falling back to the defaults
fn load_calendars(path: &Path) -> AppResult<Vec<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Ok(DEFAULT_CALENDARS.iter().map(|c| c.to_string()).collect()),
    };

    let file: CalendarsFile = toml::from_str(&content)
        .map_err(|e| config_error(&format!("Failed to parse {}: {}", path.display(), e)))?;

    if file.calendars.is_empty() {
        return Err(config_error(&format!(
            "{} must list at least one calendar",
            path.display()
        )));
    }

    Ok(file.calendars)
}
