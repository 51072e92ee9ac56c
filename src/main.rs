use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use listing_monitor::{
    AppConfig, Poller,
    fetcher::HttpFetcher,
    notifier::{EmailNotifier, LogNotifier, Notifier},
    web::{self, AppState, PullBuffer},
};

#[derive(Debug, Parser)]
#[command(name = "listing-monitor", version, about = "Watch marketplace searches and email new listings")]
struct Cli {
    /// Configuration file layered over config/default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single polling cycle and exit
    #[arg(long)]
    once: bool,

    /// Overrides the configured log level
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config = AppConfig::load(cli.config.as_deref())?;

    // Initialize tracing
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("listing_monitor={}", level).parse()?),
        )
        .init();

    info!("Starting listing monitor with {} searches...", config.searches.len());

    let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
        Arc::new(EmailNotifier::new(config.notifications.smtp.clone())?)
    } else {
        info!("Email notifications disabled, new listings will be logged");
        Arc::new(LogNotifier)
    };

    let fetcher = HttpFetcher::new(&config.scraper)?;
    let mut poller = Poller::from_config(&config, Box::new(fetcher), notifier)?;

    if config.server.enabled {
        let buffer = PullBuffer::with_capacity(config.server.buffer_capacity);
        poller = poller.with_pull_buffer(buffer.clone());

        let server_config = config.server.clone();
        tokio::spawn(async move {
            if let Err(e) = web::serve(&server_config, AppState { buffer }).await {
                error!("Could not start web server: {}", e);
            }
        });
    }

    if cli.once {
        let report = poller.run_cycle().await;
        info!("Single cycle finished: {:?}", report);
        return Ok(());
    }

    tokio::select! {
        _ = poller.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
        }
    }

    Ok(())
}
