use crate::components::{GoogleCalendarClient, TelegramBotApi};
use crate::config::{Config, RunMode};
use crate::error::{config_error, AppResult, Error};
use crate::flow::DailyFlow;
use crate::shutdown;
use crate::utils::time::{calculate_wait_duration, next_daily_time};
use crate::components::google_calendar::CalendarProvider;
use crate::components::telegram::MessageTransport;
use chrono::Utc;
use reqwest::Client;
use tokio::time::sleep;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| config_error(&format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => {
            info!(
                "Loaded configuration: {} calendar(s), timezone {}, mode {:?}",
                config.calendars.len(),
                config.timezone,
                config.run_mode
            );
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e.into())
        }
    }
}

/// Wire the real Google and Telegram clients into a flow
pub fn build_flow(config: &Config) -> AppResult<DailyFlow<GoogleCalendarClient, TelegramBotApi>> {
    let calendar = GoogleCalendarClient::new(config.google_token_file.clone(), Client::new());
    let telegram = TelegramBotApi::new(config.send_timeout)
        .map_err(|_| config_error("Failed to build the Telegram HTTP client"))?;

    Ok(DailyFlow::new(config, calendar, telegram))
}

/// Run according to the configured mode
pub async fn run(config: Config) -> miette::Result<()> {
    let flow = build_flow(&config)?;

    match config.run_mode {
        RunMode::Once => flow.run().await.map_err(Into::into),
        RunMode::Serve => serve(&flow, &config).await.map_err(Into::into),
    }
}

/// Run the flow every day at the configured time until a shutdown signal
pub async fn serve<P, T>(flow: &DailyFlow<P, T>, config: &Config) -> AppResult<()>
where
    P: CalendarProvider,
    T: MessageTransport,
{
    info!(
        "Serving daily schedule at {} ({})",
        config.daily_notification_time, config.timezone
    );

    tokio::select! {
        result = daily_loop(flow, config) => result,
        result = shutdown::wait_for_signal() => {
            result.map_err(|_| Error::Unknown("Unexpected Error: Failed to install shutdown signal handlers."))?;
            info!("Shutting down");
            Ok(())
        }
    }
}

async fn daily_loop<P, T>(flow: &DailyFlow<P, T>, config: &Config) -> AppResult<()>
where
    P: CalendarProvider,
    T: MessageTransport,
{
    loop {
        let now = Utc::now().with_timezone(&config.timezone);
        let next = next_daily_time(&now, &config.daily_notification_time).ok_or_else(|| {
            config_error(&format!(
                "Failed to calculate next run for {}",
                config.daily_notification_time
            ))
        })?;

        info!("Next run scheduled for {}", next);
        sleep(calculate_wait_duration(&now, &next)).await;

        // A failed day is already logged; keep serving
        if flow.run().await.is_err() {
            error!("Scheduled run failed, waiting for the next one");
        }
    }
}
