use serde::{Deserialize, Serialize};

/// Title used when an event has no summary
pub const UNTITLED_EVENT: &str = "Untitled Event";

/// `start` / `end` object as returned by the Calendar API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

/// Event resource as returned by the Calendar API
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiEvent {
    pub summary: Option<String>,
    pub start: Option<ApiEventTime>,
    pub end: Option<ApiEventTime>,
}

/// One page of an `events.list` response
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventsPage {
    #[serde(default)]
    pub items: Vec<ApiEvent>,
}

/// Start or end of an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    /// RFC 3339 timestamp, e.g. `2025-01-01T09:00:00+07:00`
    DateTime(String),
    /// Date only, for all-day events, e.g. `2025-01-01`
    Date(String),
}

impl EventTime {
    /// `dateTime` wins over `date`, matching how the API marks timed events
    pub fn from_api(time: &ApiEventTime) -> Option<Self> {
        match (&time.date_time, &time.date) {
            (Some(dt), _) => Some(EventTime::DateTime(dt.clone())),
            (None, Some(d)) => Some(EventTime::Date(d.clone())),
            (None, None) => None,
        }
    }

    /// The raw value as received
    pub fn raw(&self) -> &str {
        match self {
            EventTime::DateTime(s) | EventTime::Date(s) => s,
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }
}

/// Simplified calendar event representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub title: String,
    pub start: EventTime,
    pub end: EventTime,
    /// Calendar the event was read from
    pub calendar_id: String,
}

impl CalendarEvent {
    /// Convert an API event, or `None` if it has no usable start
    pub fn from_api(event: &ApiEvent, calendar_id: &str) -> Option<Self> {
        let start = event.start.as_ref().and_then(EventTime::from_api)?;
        let end = event
            .end
            .as_ref()
            .and_then(EventTime::from_api)
            .unwrap_or_else(|| start.clone());

        Some(CalendarEvent {
            title: event
                .summary
                .clone()
                .unwrap_or_else(|| UNTITLED_EVENT.to_string()),
            start,
            end,
            calendar_id: calendar_id.to_string(),
        })
    }
}

/// Parameters of one `events.list` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub calendar_id: String,
    pub time_min: String,
    pub time_max: String,
    pub max_results: u32,
    /// Expand recurring events into single instances
    pub single_events: bool,
    pub order_by: &'static str,
}
