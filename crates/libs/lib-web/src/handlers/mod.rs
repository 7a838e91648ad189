//! # HTTP Request Handlers
//!
//! - **[`price_proxy`]**: `GET /api/etherfi-price?url=` - CORS-enabled price feed passthrough
//! - **[`swap`]**: `GET /api/swap/status/{swap_id}` - current canonical swap status
//!
//! Handlers use axum extractors against [`AppState`](crate::AppState) sub-states
//! (`FromRef`). Errors are either `(StatusCode, Json<ErrorResponse>)` when the
//! body shape is fixed by clients, or [`lib_core::AppError`] otherwise.

pub mod price_proxy;
pub mod swap;
