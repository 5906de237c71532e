mod config;
mod detector;
mod error;
mod fetcher;
mod notifier;
mod report;
mod scanner;
mod state;
mod types;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::notifier::TelegramNotifier;
use crate::report::ReportWriter;
use crate::scanner::Scanner;
use crate::types::RunMode;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    info!(
        window = %cfg.window,
        max_minutes = cfg.max_minutes,
        mode = ?cfg.run_mode,
        dedup = ?cfg.dedup_scope,
        "Scoreless scanner starting: 0x0 matches {}",
        cfg.window,
    );

    let fetcher = Fetcher::new(&cfg)?;
    let notifier = TelegramNotifier::new(&cfg)?;
    if notifier.is_enabled() {
        info!("Telegram alerts enabled");
    }
    let report = ReportWriter::new(&cfg.report_path);
    info!("Report file: {}", report.path().display());

    let mut scanner = Scanner::new(&cfg, fetcher, notifier, report);

    // Install the Ctrl-C handler up front so a signal during the first cycle is not lost.
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted by operator, finishing current cycle");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!("Cannot listen for Ctrl-C: {e}");
                // Keep the sender alive so the scanner doesn't read this as a shutdown.
                std::future::pending::<()>().await;
            }
        }
    });

    match cfg.run_mode {
        RunMode::Loop => {
            scanner.run_loop(shutdown_rx).await;
            Ok(())
        }
        RunMode::Once => {
            tokio::select! {
                res = scanner.run_once() => {
                    let summary = res?;
                    info!(
                        qualifying = summary.qualifying,
                        notified = summary.notified,
                        "Single pass complete"
                    );
                    Ok(())
                }
                _ = shutdown_rx.changed() => {
                    info!("Single pass interrupted");
                    Ok(())
                }
            }
        }
    }
}
