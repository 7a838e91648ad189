//! # Request/Response Logging Middleware
//!
//! One structured line per request and one per response, correlated by the
//! request id from [`RequestStamp`](crate::middleware::RequestStamp).
//!
//! Proxy query strings carry upstream URLs that may embed API keys, so they are
//! redacted for the endpoints listed in [`REDACTED_QUERY_ENDPOINTS`].

use crate::middleware::mw_req_stamp::RequestStamp;
use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Headers that should not be logged
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "x-api-key", "x-auth-token"];

/// Endpoints whose query string is not logged
pub const REDACTED_QUERY_ENDPOINTS: &[&str] = &["/api/etherfi-price"];

pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = loggable_query(&path, req.uri().query());

    let request_id = req
        .extensions()
        .get::<RequestStamp>()
        .map(|s| s.id.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            if SENSITIVE_HEADERS.iter().any(|h| name_lower == *h) {
                Some((name.to_string(), "***REDACTED***".to_string()))
            } else {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            }
        })
        .collect();

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        query = ?query,
        "[REQUEST] {} {}",
        method,
        path
    );
    debug!(request_id = %request_id, headers = ?headers, "[REQUEST HEADERS]");

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status();
    let status_code = status.as_u16();

    if status.is_server_error() {
        error!(
            request_id = %request_id,
            status = status_code,
            duration_ms,
            "[RESPONSE] {} {} -> {} ({}ms) [SERVER ERROR]",
            method, path, status_code, duration_ms
        );
    } else if status.is_client_error() {
        warn!(
            request_id = %request_id,
            status = status_code,
            duration_ms,
            "[RESPONSE] {} {} -> {} ({}ms) [CLIENT ERROR]",
            method, path, status_code, duration_ms
        );
    } else {
        info!(
            request_id = %request_id,
            status = status_code,
            duration_ms,
            "[RESPONSE] {} {} -> {} ({}ms)",
            method, path, status_code, duration_ms
        );
    }

    response
}

fn loggable_query(path: &str, query: Option<&str>) -> Option<String> {
    let query = query?;
    if REDACTED_QUERY_ENDPOINTS.iter().any(|ep| path == *ep) {
        Some("***REDACTED***".to_string())
    } else {
        Some(query.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_query_is_redacted() {
        assert_eq!(
            loggable_query("/api/etherfi-price", Some("url=https://x.example/?key=secret")),
            Some("***REDACTED***".to_string())
        );
        assert_eq!(loggable_query("/api/swap/status/abc", Some("v=1")), Some("v=1".to_string()));
        assert_eq!(loggable_query("/health", None), None);
    }
}
