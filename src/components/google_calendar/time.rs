use super::models::EventTime;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone};

/// One calendar day, `[00:00:00, 23:59:59]` at a fixed offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub date: NaiveDate,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl DateWindow {
    pub fn new(date: NaiveDate, offset: FixedOffset) -> Self {
        // A fixed offset maps every local time to exactly one instant
        let local_start = date.and_time(NaiveTime::MIN);
        let start = offset.from_utc_datetime(&(local_start - offset));
        let end = start + Duration::seconds(24 * 3600 - 1);
        Self { date, start, end }
    }

    /// `timeMin` query value
    pub fn time_min(&self) -> String {
        self.start.to_rfc3339()
    }

    /// `timeMax` query value
    pub fn time_max(&self) -> String {
        self.end.to_rfc3339()
    }
}

/// `HH:MM` of a timed value, keeping the offset it was reported in
pub fn clock_time(time: &EventTime) -> Option<String> {
    match time {
        EventTime::Date(_) => None,
        EventTime::DateTime(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Some(dt.format("%H:%M").to_string()),
            Err(_) => raw.get(11..16).map(str::to_string),
        },
    }
}

/// Date portion (first 10 characters) of a raw start value
pub fn date_part(time: &EventTime) -> &str {
    let raw = time.raw();
    raw.get(..10).unwrap_or(raw)
}
