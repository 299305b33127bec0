use crate::error::{config_error, AppResult};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

/// Format used for the dates the flow passes around
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Parse a strict `YYYY-MM-DD` date
pub fn parse_date(date_str: &str) -> AppResult<NaiveDate> {
    if date_str.len() != 10 {
        return Err(config_error(&format!(
            "Invalid date '{}', expected YYYY-MM-DD",
            date_str
        )));
    }
    NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|_| {
        config_error(&format!("Invalid date '{}', expected YYYY-MM-DD", date_str))
    })
}

/// Parse a UTC offset such as `+07:00`, `-0530` or `Z`
pub fn parse_utc_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    value.parse::<FixedOffset>().ok()
}

/// Today's calendar date as seen in the given timezone
pub fn today_in<Tz: TimeZone>(tz: &Tz) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}

/// Calculate the next daily run at `time_str` strictly after `now`
pub fn next_daily_time<Tz: TimeZone>(now: &DateTime<Tz>, time_str: &str) -> Option<DateTime<Tz>> {
    let (hour, minute) = parse_time(time_str)?;
    let tz = now.timezone();

    // Walk forward a couple of days so a DST gap on one day doesn't stall us
    for day_offset in 0..3 {
        let date = now.date_naive().checked_add_signed(Duration::days(day_offset))?;
        let naive = date.and_hms_opt(hour, minute, 0)?;
        if let Some(candidate) = tz.from_local_datetime(&naive).earliest() {
            if candidate > *now {
                return Some(candidate);
            }
        }
    }

    None
}

/// Calculate the wait until `next`, never less than one second
pub fn calculate_wait_duration<Tz: TimeZone>(
    now: &DateTime<Tz>,
    next: &DateTime<Tz>,
) -> std::time::Duration {
    let seconds = next.clone().signed_duration_since(now.clone()).num_seconds();
    std::time::Duration::from_secs(seconds.max(1) as u64)
}
