// src/main.rs
use clap::Parser;
use log::{info, warn};
use retest_alert::config::MonitorConfig;
use retest_alert::data::YahooSeriesProvider;
use retest_alert::monitor::RetestMonitor;
use retest_alert::notifications::TelegramNotifier;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Polls the price feed, gates on the H1 EMA trend and alerts on EMA21-34 retests.
#[derive(Parser, Debug)]
#[command(name = "retest_alert", version)]
struct Args {
    /// Run a single analysis cycle and exit
    #[arg(long)]
    once: bool,

    /// Do not send the startup connection test message
    #[arg(long)]
    skip_test_message: bool,

    /// Env file to load before reading configuration
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Symbol to track (overrides GOLD_TICKER)
    #[arg(long)]
    symbol: Option<String>,
}

/// Load an explicit env file, else `.env`, else the legacy `env.env`.
fn load_env_file(path: Option<&PathBuf>) -> Result<(), dotenv::Error> {
    match path {
        Some(path) => dotenv::from_path(path),
        None => dotenv::dotenv()
            .or_else(|_| dotenv::from_filename("env.env"))
            .map(|_| ()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let env_loaded = load_env_file(args.env_file.as_ref());

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("retest_alert=info"));
    if let Err(e) = env_loaded {
        warn!("No env file loaded ({}), using process environment only", e);
    }

    let mut config = MonitorConfig::from_env()?;
    if let Some(symbol) = args.symbol.as_deref() {
        config.override_symbol(symbol)?;
    }
    config.log_summary();

    let provider = Arc::new(YahooSeriesProvider::new(
        &config.yahoo_base_url,
        config.provider_timeout,
    ));
    let notifier = Arc::new(TelegramNotifier::new(&config.telegram));
    let monitor = RetestMonitor::new(config, provider, notifier);

    if !args.skip_test_message {
        monitor.notifications().send_test_message().await;
    }

    if args.once {
        match monitor.guarded_cycle(chrono::Utc::now()).await {
            Some(outcome) => info!("Single cycle finished: {}", serde_json::to_string(&outcome)?),
            None => warn!("Single cycle aborted"),
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("🛑 Ctrl-C received, shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!("Ctrl-C handler unavailable: {}", e);
                // keep the sender alive so the monitor is not told to stop
                std::future::pending::<()>().await;
            }
        }
    });

    monitor.run(shutdown_rx).await;
    Ok(())
}
