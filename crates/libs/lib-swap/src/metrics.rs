//! # Swap Metrics
//!
//! Fire-and-forget reporting of swap outcomes to the analytics backend
//! (`POST {base}/metrics/swaps`). Recording never blocks or fails the caller;
//! delivery problems are only logged.

use crate::tracker::TrackerError;
use lib_core::Config;
use lib_utils::time::{format_time, now_utc};
use reqwest::Client;
use serde::Serialize;
use shared::dto::swap::SwapStatus;
use tracing::{debug, warn};

/// One terminal swap outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapMetric {
    pub swap_id: String,
    /// `COMPLETED`, `FAILED`, `REFUNDED`, `TIMEOUT` or `CANCELLED`
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub recorded_at: String,
}

impl SwapMetric {
    pub fn from_outcome(swap_id: &str, outcome: Result<&SwapStatus, &TrackerError>) -> Self {
        let recorded_at = format_time(now_utc());
        match outcome {
            Ok(status) => Self {
                swap_id: swap_id.to_string(),
                outcome: status.status.as_str().to_string(),
                route: Some(status.route_label()),
                from_amount: Some(status.from_amount.clone()),
                to_amount: Some(status.to_amount.clone()),
                error: None,
                recorded_at,
            },
            Err(err) => Self {
                swap_id: swap_id.to_string(),
                outcome: error_outcome(err).to_string(),
                route: None,
                from_amount: None,
                to_amount: None,
                error: Some(err.to_string()),
                recorded_at,
            },
        }
    }
}

fn error_outcome(err: &TrackerError) -> &'static str {
    match err {
        TrackerError::InvalidSwapId => "INVALID",
        TrackerError::Failed { .. } => "FAILED",
        TrackerError::Refunded { .. } => "REFUNDED",
        TrackerError::Timeout { .. } => "TIMEOUT",
        TrackerError::Cancelled { .. } => "CANCELLED",
    }
}

#[derive(Debug, Clone)]
pub struct MetricsClient {
    http: Client,
    endpoint: String,
}

impl MetricsClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}/metrics/swaps", base_url.trim_end_matches('/')),
        }
    }

    /// `None` when `METRICS_API_URL` is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.metrics_api_url.as_deref().map(Self::new)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `metric` and wait for the analytics backend to accept it.
    pub async fn send(&self, metric: &SwapMetric) -> Result<(), reqwest::Error> {
        self.http
            .post(&self.endpoint)
            .json(metric)
            .send()
            .await?
            .error_for_status()?;
        debug!(swap_id = %metric.swap_id, outcome = %metric.outcome, "[METRICS] Recorded");
        Ok(())
    }

    /// Send `metric` in the background. Requires a tokio runtime.
    pub fn record_swap(&self, metric: SwapMetric) {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client.send(&metric).await {
                warn!(swap_id = %metric.swap_id, error = %e, "[METRICS] Failed to record");
            }
        });
    }
}
