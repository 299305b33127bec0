//! Reading one day of events from Google Calendar.

pub mod client;
pub mod models;
pub mod schedule;
pub mod time;
pub mod token;

pub use client::{CalendarProvider, GoogleCalendarClient};
pub use models::{CalendarEvent, EventQuery, EventTime};
pub use schedule::{format_schedule, no_events_message, ScheduleFetcher};
pub use time::DateWindow;
pub use token::{AccessToken, TokenManager};
