use super::client::CalendarProvider;
use super::models::{CalendarEvent, EventQuery};
use super::time::{clock_time, date_part, DateWindow};
use super::token::AccessToken;
use crate::classify::calendar_failure;
use crate::error::{AppResult, Error, Fault};
use crate::utils::time::DATE_FORMAT;
use chrono::{FixedOffset, NaiveDate};
use tracing::{error, info, warn};

/// Per-calendar cap on returned events
pub const MAX_RESULTS: u32 = 50;

/// Sentinel summary for a day without events
pub fn no_events_message(date: NaiveDate) -> String {
    format!("No events scheduled for {}.", date.format(DATE_FORMAT))
}

/// `- [YYYY-MM-DD] Title (HH:MM - HH:MM)` or `(All-day)`
pub fn format_event_line(event: &CalendarEvent) -> String {
    let time_range = if event.start.is_all_day() {
        "All-day".to_string()
    } else {
        format!(
            "{} - {}",
            clock_time(&event.start).unwrap_or_default(),
            clock_time(&event.end).unwrap_or_default()
        )
    };

    format!(
        "- [{}] {} ({})",
        date_part(&event.start),
        event.title,
        time_range
    )
}

/// Render the summary for `date`, or the sentinel when there is nothing to show
pub fn format_schedule(date: NaiveDate, events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return no_events_message(date);
    }

    let mut message = format!("Schedule for {}:\n", date.format(DATE_FORMAT));
    for event in events {
        message.push_str(&format_event_line(event));
        message.push('\n');
    }
    message
}

/// Fetches one day of events from every configured calendar and formats them
pub struct ScheduleFetcher<P> {
    provider: P,
    calendars: Vec<String>,
    utc_offset: FixedOffset,
}

impl<P: CalendarProvider> ScheduleFetcher<P> {
    pub fn new(provider: P, calendars: Vec<String>, utc_offset: FixedOffset) -> Self {
        Self {
            provider,
            calendars,
            utc_offset,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn query(&self, calendar_id: &str, window: &DateWindow) -> EventQuery {
        EventQuery {
            calendar_id: calendar_id.to_string(),
            time_min: window.time_min(),
            time_max: window.time_max(),
            max_results: MAX_RESULTS,
            single_events: true,
            order_by: "startTime",
        }
    }

    /// Query every calendar in order. A failing calendar is skipped.
    pub async fn collect_events(
        &self,
        token: &AccessToken,
        window: &DateWindow,
    ) -> Vec<CalendarEvent> {
        let mut all_events = Vec::new();

        for calendar_id in &self.calendars {
            let query = self.query(calendar_id, window);
            match self.provider.list_events(token, &query).await {
                Ok(events) => all_events.extend(events),
                Err(fault) => {
                    let safe = calendar_failure(&fault);
                    warn!("Skipping calendar {}: {}", calendar_id, safe);
                }
            }
        }

        all_events
    }

    /// Fetch and format the schedule of `date`.
    ///
    /// Fails only when authentication fails; the error is already classified
    /// and logged.
    pub async fn fetch(&self, date: NaiveDate) -> AppResult<String> {
        let token = self
            .provider
            .authenticate()
            .await
            .map_err(|fault| report(&fault))?;

        let window = DateWindow::new(date, self.utc_offset);
        let events = self.collect_events(&token, &window).await;
        info!(
            "Fetched {} event(s) from {} calendar(s) for {}",
            events.len(),
            self.calendars.len(),
            date.format(DATE_FORMAT)
        );

        Ok(format_schedule(date, &events))
    }
}

fn report(fault: &Fault) -> Error {
    let err = calendar_failure(fault);
    error!("Calendar Task Failed: {}", err);
    err
}
