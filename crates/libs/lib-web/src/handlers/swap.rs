//! # Swap Handlers
//!
//! - `GET /api/swap/status/{swap_id}` - one-shot canonical status of a swap
//!
//! Long-running tracking belongs to [`lib_swap::SwapTracker`]; this route only
//! relays the vendor's current snapshot so clients can refresh on demand.
//!
//! ```bash
//! curl http://localhost:3001/api/swap/status/0x9f3c
//! ```

use axum::{
    extract::{Path, State},
    Json,
};
use lib_core::AppError;
use lib_swap::{FetchError, SwapStatusSource};
use shared::SwapStatus;
use std::sync::Arc;
use tracing::{info, instrument};

#[instrument(skip(source))]
pub async fn get_swap_status(
    State(source): State<Arc<dyn SwapStatusSource>>,
    Path(swap_id): Path<String>,
) -> Result<Json<SwapStatus>, AppError> {
    let swap_id = swap_id.trim();
    if swap_id.is_empty() {
        return Err(AppError::InvalidInput("Swap id cannot be empty".to_string()));
    }
    if matches!(swap_id, "." | "..") {
        return Err(AppError::InvalidInput(format!("Invalid swap id {:?}", swap_id)));
    }

    let status = source.fetch_status(swap_id).await.map_err(|e| match e {
        FetchError::Http { status: 404 } => AppError::NotFound(format!("Swap {} not found", swap_id)),
        other => AppError::Upstream(other.to_string()),
    })?;

    info!(swap_id = %swap_id, status = %status.status, "[SWAP] Status relayed");
    Ok(Json(status))
}
