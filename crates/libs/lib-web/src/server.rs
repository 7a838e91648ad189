//! # Server Setup
//!
//! Tracing initialization, shared state, route registration and HTTP server
//! startup.

// region: --- Imports
use crate::handlers;
use crate::handlers::price_proxy::PriceProxy;
use crate::middleware::{log_requests, stamp_req, RequestStamp};
use axum::{extract::FromRef, routing::get, Router};
use lib_core::Config;
use lib_swap::{HttpSwapStatusSource, SwapStatusSource};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
// endregion: --- Imports

// region: --- Tracing
/// Install the global fmt subscriber. Level comes from `LOG_LEVEL`
/// (trace|debug|info|warn|error), anything else falls back to info.
pub fn init_tracing() -> anyhow::Result<()> {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let level = match log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => log_level.as_str(),
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global tracing subscriber: {}", e))?;

    info!("Log level: {}", level);
    Ok(())
}
// endregion: --- Tracing

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub price_proxy: PriceProxy,
    pub swap_source: Arc<dyn SwapStatusSource>,
}

impl AppState {
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let price_proxy = PriceProxy::new(config.price_proxy_timeout)?;
        let swap_source = HttpSwapStatusSource::from_config(&config)
            .map_err(|e| anyhow::anyhow!("Failed to create swap status source: {}", e))?;

        Ok(Self {
            config,
            price_proxy,
            swap_source: Arc::new(swap_source),
        })
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for PriceProxy {
    fn from_ref(state: &AppState) -> Self {
        state.price_proxy.clone()
    }
}

impl FromRef<AppState> for Arc<dyn SwapStatusSource> {
    fn from_ref(state: &AppState) -> Self {
        state.swap_source.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3001")
    pub bind_address: String,
    /// Origins allowed by the router-wide CORS layer
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bind_address: config.bind_address.clone(),
            ..Default::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Build state from `app_config`, bind and serve until the process ends.
///
/// # Errors
///
/// Fails when an HTTP client cannot be built or the bind address is taken.
pub async fn start_server(app_config: Config, config: ServerConfig) -> anyhow::Result<()> {
    info!(" SWAP BACKEND STARTING");
    info!("Swap API: {}", app_config.swap_api_base_url);

    let state = AppState::from_config(app_config)?;
    let app = create_router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(" SERVER READY: http://{}", config.bind_address);
    log_server_info();

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the application router with all routes and middleware.
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    use axum::http::{HeaderValue, Method};

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    info!("[ROUTE SETUP] Registering HTTP routes...");
    Router::new()
        .route("/api/etherfi-price", get(handlers::price_proxy::etherfi_price))
        .route("/api/swap/status/{swap_id}", get(handlers::swap::get_swap_status))
        .route("/health", get(|| async { "OK" }))
        .fallback(|| async {
            info!("[404 HANDLER] Unmatched route - returning 404");
            (axum::http::StatusCode::NOT_FOUND, "Route not found")
        })
        .with_state(state)
        .layer(axum::middleware::from_fn(log_requests))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::error!(
                            error = ?error,
                            latency_ms = latency.as_millis(),
                            "[HTTP FAILURE]"
                        );
                    },
                ),
        )
        // Outermost so the request id exists before the trace span is created
        .layer(axum::middleware::from_fn(stamp_req))
        .layer(cors)
}

fn log_server_info() {
    info!(" PRICE PROXY:");
    info!("   • GET  /api/etherfi-price?url={{upstream}}");
    info!(" SWAP:");
    info!("   • GET  /api/swap/status/{{swap_id}}");
    info!(" HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup
