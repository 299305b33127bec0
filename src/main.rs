use daily_agenda::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting daily-agenda");

    // Load configuration
    let config = startup::load_config()?;

    // Run once, or keep running on a daily schedule
    startup::run(config).await
}
