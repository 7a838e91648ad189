//! # Swap Status Source
//!
//! Fetches the current status of one swap from the swap vendor.
//!
//! The tracker only depends on the [`SwapStatusSource`] trait, so tests can
//! script responses without a network and the backend can share one HTTP
//! client across every tracker it spawns.

use async_trait::async_trait;
use lib_core::Config;
use reqwest::{Client, Url};
use shared::dto::swap::{SwapStatus, SwapTrxResponse};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Failure to obtain a status snapshot. The tracker retries every variant
/// within its budget.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Swap API returned HTTP {status}")]
    Http { status: u16 },

    #[error("Failed to parse swap status: {0}")]
    Decode(String),

    #[error("Cannot build status URL: {0}")]
    InvalidRequest(String),
}

/// Capability to fetch a swap's status by id.
#[async_trait]
pub trait SwapStatusSource: Send + Sync {
    async fn fetch_status(&self, swap_id: &str) -> Result<SwapStatus, FetchError>;
}

/// HTTP implementation against the vendor's tracking endpoint.
#[derive(Clone)]
pub struct HttpSwapStatusSource {
    http: Client,
    base_url: String,
}

impl HttpSwapStatusSource {
    /// Create a source for `base_url` with its own client and request timeout.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(http, base_url))
    }

    /// Create a source that reuses an existing client (connection pool).
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(&config.swap_api_base_url, config.swap_request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/swap/trx/{swap_id}` with the id percent-encoded as one path
    /// segment, so it cannot leave the status resource.
    fn status_url(&self, swap_id: &str) -> Result<Url, FetchError> {
        if matches!(swap_id, "." | "..") {
            return Err(FetchError::InvalidRequest(format!("swap id {:?} is not a path segment", swap_id)));
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::InvalidRequest(format!("invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidRequest(format!("base URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(["swap", "trx", swap_id]);
        Ok(url)
    }
}

#[async_trait]
impl SwapStatusSource for HttpSwapStatusSource {
    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn fetch_status(&self, swap_id: &str) -> Result<SwapStatus, FetchError> {
        let response = self
            .http
            .get(self.status_url(swap_id)?)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "[SOURCE] Non-success response");
            return Err(FetchError::Http { status: status.as_u16() });
        }

        let raw = response
            .json::<SwapTrxResponse>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(SwapStatus::from(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use shared::SwapState;

    async fn spawn_vendor() -> String {
        let app = Router::new().route(
            "/swap/trx/{id}",
            get(|Path(id): Path<String>| async move {
                match id.as_str() {
                    "missing" => Err(StatusCode::NOT_FOUND),
                    "garbled" => Ok(Json(json!({ "unexpected": true }))),
                    _ => Ok(Json(json!({
                        "id": id,
                        "clientStatus": "COMPLETED",
                        "trader": "0xabc",
                        "sourceChain": "ETH",
                        "destChain": "BASE",
                        "fromTokenSymbol": "ETH",
                        "toTokenSymbol": "ETH",
                        "fromAmount": "0.25",
                        "toAmount": "0.2491",
                        "completedAt": "2026-03-01T12:30:00Z"
                    }))),
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn test_status_url_normalizes_base() {
        let source = HttpSwapStatusSource::with_client(Client::new(), "https://api.vendor.example/v1/");
        assert_eq!(source.base_url(), "https://api.vendor.example/v1");
        assert_eq!(
            source.status_url("abc").unwrap().as_str(),
            "https://api.vendor.example/v1/swap/trx/abc"
        );
    }

    #[test]
    fn test_status_url_escapes_swap_id() {
        let source = HttpSwapStatusSource::with_client(Client::new(), "https://api.vendor.example/v1");
        let url = |id: &str| source.status_url(id).unwrap().to_string();

        assert_eq!(url("../../admin/keys"), "https://api.vendor.example/v1/swap/trx/..%2F..%2Fadmin%2Fkeys");
        assert_eq!(url("abc?status=COMPLETED"), "https://api.vendor.example/v1/swap/trx/abc%3Fstatus=COMPLETED");
        assert_eq!(url("abc#frag"), "https://api.vendor.example/v1/swap/trx/abc%23frag");
        assert!(matches!(source.status_url(".."), Err(FetchError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_fetch_status_keeps_id_inside_status_path() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        let app = Router::new().fallback(move |uri: axum::http::Uri| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(uri.to_string());
                StatusCode::NOT_FOUND
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let source = HttpSwapStatusSource::new(format!("http://{}/v1", addr), Duration::from_secs(5)).unwrap();

        for id in ["../../admin/keys", "abc?status=COMPLETED"] {
            assert_eq!(source.fetch_status(id).await.unwrap_err(), FetchError::Http { status: 404 });
        }

        assert_eq!(rx.recv().await.unwrap(), "/v1/swap/trx/..%2F..%2Fadmin%2Fkeys");
        assert_eq!(rx.recv().await.unwrap(), "/v1/swap/trx/abc%3Fstatus=COMPLETED");
    }

    #[tokio::test]
    async fn test_fetch_status_success() {
        let base = spawn_vendor().await;
        let source = HttpSwapStatusSource::new(base, Duration::from_secs(5)).unwrap();

        let status = source.fetch_status("swap-7").await.unwrap();
        assert_eq!(status.id, "swap-7");
        assert_eq!(status.status, SwapState::Completed);
        assert_eq!(status.completed_at.as_deref(), Some("2026-03-01T12:30:00Z"));
    }

    #[tokio::test]
    async fn test_fetch_status_http_error() {
        let base = spawn_vendor().await;
        let source = HttpSwapStatusSource::new(base, Duration::from_secs(5)).unwrap();

        let err = source.fetch_status("missing").await.unwrap_err();
        assert_eq!(err, FetchError::Http { status: 404 });
    }

    #[tokio::test]
    async fn test_fetch_status_decode_error() {
        let base = spawn_vendor().await;
        let source = HttpSwapStatusSource::new(base, Duration::from_secs(5)).unwrap();

        let err = source.fetch_status("garbled").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_status_network_error() {
        // Port 9 (discard) on loopback is not served
        let source = HttpSwapStatusSource::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

        let err = source.fetch_status("any").await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }
}
