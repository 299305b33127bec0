// Export components
pub mod google_calendar;
pub mod telegram;

pub use google_calendar::{GoogleCalendarClient, ScheduleFetcher};
pub use telegram::{Notifier, TelegramBotApi};
