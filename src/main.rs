use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use ticket_watcher::alert::{AlertDispatcher, PromptDecision};
use ticket_watcher::config::{
    DEFAULT_CATEGORIES, DEFAULT_INTERVAL_SECS, DEFAULT_PAGE_TIMEOUT_SECS, DEFAULT_URL,
};
use ticket_watcher::fetcher::PageFetcher;
use ticket_watcher::monitor::Monitor;
use ticket_watcher::MonitorConfig;

const LOG_FILE: &str = "ticket-watcher.log";

#[derive(Parser, Debug)]
#[command(name = "ticket-watcher", version, about = "Concert ticket availability monitor")]
struct Cli {
    /// Check interval in seconds
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    interval: u64,

    /// Comma-separated list of ticket category numbers to check
    #[arg(long, default_value = DEFAULT_CATEGORIES)]
    categories: String,

    /// Show the browser window during checks
    #[arg(long)]
    visible: bool,

    /// Enable debug output and page screenshots
    #[arg(long)]
    debug: bool,

    /// Perform a single check and exit
    #[arg(long = "test")]
    single_shot: bool,

    /// URL of the listing to check
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    /// Maximum page load wait in seconds
    #[arg(long, default_value_t = DEFAULT_PAGE_TIMEOUT_SECS)]
    timeout: u64,

    /// Path to the Chrome binary, if not on PATH
    #[arg(long)]
    chrome_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.debug)?;

    let config = MonitorConfig {
        target_url: cli.url,
        categories: MonitorConfig::parse_categories(&cli.categories)?,
        interval_secs: cli.interval,
        page_timeout_secs: cli.timeout,
        visible: cli.visible,
        debug: cli.debug,
        single_shot: cli.single_shot,
        chrome_path: cli.chrome_path,
    };
    config.validate()?;

    // Startup failures (no Chrome, bad config) are the only fatal ones.
    let fetcher = PageFetcher::new(&config)?;
    let dispatcher = AlertDispatcher::new(config.target_url.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Program stopped by user");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut monitor = Monitor::new(config, fetcher, dispatcher, PromptDecision, shutdown_rx);
    monitor.run().await;

    Ok(())
}

/// Console layer with ANSI colors plus an append-only plain-text log file.
fn init_tracing(debug: bool) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let directive = if debug {
        "ticket_watcher=debug"
    } else {
        "ticket_watcher=info"
    };
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_ansi(true))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    if debug {
        tracing::debug!("Debug mode enabled");
    }
    Ok(guard)
}
