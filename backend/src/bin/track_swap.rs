//! Track one cross-chain swap from the terminal until it settles.
//!
//! ```bash
//! track-swap 0x9f3c --poll-interval-ms 5000 --max-retries 120
//! ```
//!
//! Exit codes: 0 completed, 1 failed or refunded, 2 timed out, 130 interrupted.

use anyhow::Result;
use clap::Parser;
use lib_core::config::{Config, DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL_MS};
use lib_swap::{HttpSwapStatusSource, MetricsClient, SwapMetric, SwapTracker, TrackerError, TrackerOptions};
use lib_web::init_tracing;
use shared::utils::truncate_address;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Poll a swap's status until it completes, fails or runs out of retries
#[derive(Parser)]
#[command(name = "track-swap")]
struct Args {
    /// Swap id as returned by the swap vendor
    swap_id: String,

    /// Swap vendor base URL
    #[arg(long, env = "SWAP_API_BASE_URL")]
    api_url: String,

    /// Delay between polls in milliseconds
    #[arg(long, env = "SWAP_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    poll_interval_ms: u64,

    /// Retries after the first poll before giving up
    #[arg(long, env = "SWAP_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Analytics backend that receives the final outcome
    #[arg(long, env = "METRICS_API_URL")]
    metrics_url: Option<String>,
}

impl Args {
    fn config(&self) -> Result<Config> {
        let mut config = Config::with_swap_api(&self.api_url);
        config.poll_interval = Duration::from_millis(self.poll_interval_ms);
        config.max_retries = self.max_retries;
        config.metrics_api_url = self.metrics_url.clone();
        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let args = Args::parse();
    let config = args.config()?;

    let source = HttpSwapStatusSource::from_config(&config)?;
    let options = TrackerOptions::from_config(&config).on_status_update(|status| {
        info!(
            swap_id = %status.id,
            trader = %truncate_address(&status.trader),
            route = %status.route_label(),
            "{} ({})",
            status.status,
            status.client_status
        );
    });
    let metrics = MetricsClient::from_config(&config);
    let tracker = SwapTracker::new(args.swap_id.trim(), Arc::new(source), options)?;

    let run = tracker.start_tracking();
    tokio::pin!(run);

    let result = tokio::select! {
        result = &mut run => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping tracker");
            tracker.stop_polling();
            run.await
        }
    };

    if let Some(metrics) = &metrics {
        // Awaited rather than spawned so the POST is not cut off by process exit
        let metric = SwapMetric::from_outcome(tracker.swap_id(), result.as_ref());
        if let Err(e) = metrics.send(&metric).await {
            warn!("Failed to record swap outcome: {}", e);
        }
    }

    Ok(match result {
        Ok(status) => {
            info!(
                "Swap {} completed: {} {} -> {} {}",
                status.id, status.from_amount, status.from_token_symbol, status.to_amount, status.to_token_symbol
            );
            ExitCode::SUCCESS
        }
        Err(e @ TrackerError::Timeout { .. }) => {
            error!("{}", e);
            ExitCode::from(2)
        }
        Err(e @ TrackerError::Cancelled { .. }) => {
            warn!("{}", e);
            ExitCode::from(130)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    })
}
