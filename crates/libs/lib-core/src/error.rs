//! # HTTP-Facing Errors
//!
//! Library crates keep their own `thiserror` enums (tracker, fetch, wallet,
//! store) and convert into [`AppError`] at the route boundary. The response body
//! is `{"error": <message>, "code": <variant>}`; only client errors expose their
//! message, everything else is reduced to a generic one.
//!
//! | variant | status |
//! |---|---|
//! | `InvalidInput` | 400 |
//! | `NotFound` | 404 |
//! | `Upstream` | 502 |
//! | `Config`, `Store`, `Decoding`, `Internal` | 500 |
//!
//! ```rust
//! use lib_core::error::{AppError, Result};
//!
//! fn parse_swap_id(id: &str) -> Result<&str> {
//!     let id = id.trim();
//!     if id.is_empty() {
//!         return Err(AppError::InvalidInput("Swap id cannot be empty".to_string()));
//!     }
//!     Ok(id)
//! }
//! ```

use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The swap vendor or another third-party service failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Store(_) | AppError::Decoding(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to API clients.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::Upstream(_) => "Service temporarily unavailable".to_string(),
            _ => "An internal error occurred".to_string(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Upstream(_) => "Upstream",
            AppError::Config(_) => "Config",
            AppError::Store(_) => "Store",
            AppError::Decoding(_) => "Decoding",
            AppError::Internal(_) => "Internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_client_error() {
            debug!("[ERROR] Client error: {}", self);
        } else {
            error!("[ERROR] Server error: {}", self);
        }

        let body = Json(json!({
            "error": self.user_message(),
            "code": self.code(),
        }));
        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decoding(err.to_string())
    }
}
