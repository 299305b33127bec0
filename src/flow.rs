use crate::classify::{run_failure, Step};
use crate::components::google_calendar::{CalendarProvider, ScheduleFetcher};
use crate::components::telegram::{MessageTransport, Notifier};
use crate::config::Config;
use crate::error::{AppResult, Error};
use crate::utils::retry::{with_retry, RetryPolicy};
use crate::utils::time::{today_in, DATE_FORMAT};
use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{error, info};

/// Fetch today's schedule and send it, once
pub struct DailyFlow<P, T> {
    fetcher: ScheduleFetcher<P>,
    notifier: Notifier<T>,
    fetch_retry: RetryPolicy,
    send_retry: RetryPolicy,
    timezone: Tz,
    schedule_date: Option<NaiveDate>,
}

impl<P, T> DailyFlow<P, T>
where
    P: CalendarProvider,
    T: MessageTransport,
{
    pub fn new(config: &Config, provider: P, transport: T) -> Self {
        Self {
            fetcher: ScheduleFetcher::new(provider, config.calendars.clone(), config.utc_offset),
            notifier: Notifier::new(transport, config.telegram.clone()),
            fetch_retry: config.fetch_retry,
            send_retry: config.send_retry,
            timezone: config.timezone,
            schedule_date: config.schedule_date,
        }
    }

    pub fn fetcher(&self) -> &ScheduleFetcher<P> {
        &self.fetcher
    }

    pub fn notifier(&self) -> &Notifier<T> {
        &self.notifier
    }

    /// Run for the configured date, or today in the configured timezone
    pub async fn run(&self) -> AppResult<()> {
        let date = self
            .schedule_date
            .unwrap_or_else(|| today_in(&self.timezone));
        self.run_for(date).await
    }

    /// Run for a given date
    pub async fn run_for(&self, date: NaiveDate) -> AppResult<()> {
        info!("Getting schedule for {}", date.format(DATE_FORMAT));

        let summary = with_retry(
            self.fetch_retry,
            "Get Today Schedules From Calendar",
            move || self.fetcher.fetch(date),
        )
        .await
        .map_err(|e| fail(Step::Fetch, &e))?;

        // The "no events" sentinel is not empty, so it is sent too
        if !summary.is_empty() {
            let text = summary.as_str();
            with_retry(self.send_retry, "To Telegram", move || {
                self.notifier.send(text)
            })
            .await
            .map_err(|e| fail(Step::Notify, &e))?;
        }

        info!("Schedule for {} delivered", date.format(DATE_FORMAT));
        Ok(())
    }
}

fn fail(step: Step, err: &Error) -> Error {
    let run_err = run_failure(step, err);
    error!("Failed to load today's schedule: {}", run_err);
    run_err
}
