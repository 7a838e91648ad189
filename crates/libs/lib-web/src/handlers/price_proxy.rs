//! # Price Proxy Handler
//!
//! `GET /api/etherfi-price?url=<upstream>` fetches a price feed server-side and
//! returns its JSON with permissive CORS headers, so browser clients can read
//! feeds that do not send CORS headers themselves.
//!
//! | case | response |
//! |---|---|
//! | `url` missing or blank | 400 `{"error":"URL parameter is required"}` |
//! | upstream unreachable, slow, non-2xx or non-JSON | 500 `{"error":"Failed to fetch price data"}` |
//! | upstream JSON | 200, body passed through |

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use reqwest::Client;
use serde_json::Value;
use shared::ErrorResponse;
use std::time::Duration;
use tracing::{debug, error, instrument};

pub const MISSING_URL_MESSAGE: &str = "URL parameter is required";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch price data";

/// HTTP client dedicated to upstream price feeds, carrying the proxy timeout.
#[derive(Clone, Debug)]
pub struct PriceProxy {
    http: Client,
}

impl PriceProxy {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, String> {
        let response = self.http.get(url).send().await.map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("upstream returned HTTP {}", status.as_u16()));
        }

        response.json::<Value>().await.map_err(|e| e.to_string())
    }
}

/// Value of the first `url` pair, unless blank. Later `url` pairs are ignored.
fn target_url(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.trim())
        .filter(|u| !u.is_empty())
}

#[instrument(skip_all)]
pub async fn etherfi_price(
    State(proxy): State<PriceProxy>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let params = params.map(|Query(params)| params).unwrap_or_else(|rejection| {
        debug!("[PROXY] Unreadable query string: {}", rejection);
        Vec::new()
    });
    let url = target_url(&params)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(MISSING_URL_MESSAGE))))?;

    let body = proxy.fetch_json(url).await.map_err(|e| {
        error!("[PROXY] Failed to fetch price data: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(FETCH_FAILED_MESSAGE)),
        )
    })?;

    debug!("[PROXY] Upstream price data relayed");
    Ok((
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
        Json(body),
    )
        .into_response())
}
