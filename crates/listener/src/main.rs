use clap::Parser;
use log::{debug, error, warn, LevelFilter};
use marketplace_listener::Cli;
use shared::utils::signal::trigger_cancellation_on_signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    // Load .env before parsing so clap sees its values.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let log_level = cli.log_level.parse().unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Failed to load .env file: {e}"),
    }

    let cancellation_token = CancellationToken::new();
    if let Err(e) = trigger_cancellation_on_signal(cancellation_token.clone()) {
        error!("❌ Failed to install signal handlers: {e}");
        std::process::exit(1);
    }

    if let Err(e) = cli.run(cancellation_token).await {
        error!("❌ Failed to start observer: {e:#}");
        std::process::exit(1);
    }
}
