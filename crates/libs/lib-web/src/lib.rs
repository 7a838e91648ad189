//! # Web Library
//!
//! HTTP surface of the swap backend: the price proxy, a one-shot swap status
//! passthrough, health, and the request middleware around them.
//!
//! ## Routes
//!
//! ```bash
//! # Proxy a price feed (CORS-enabled JSON passthrough)
//! curl "http://localhost:3001/api/etherfi-price?url=https://api.example.com/price"
//!
//! # Current canonical status of one swap
//! curl http://localhost:3001/api/swap/status/0x9f3c
//!
//! curl http://localhost:3001/health
//! ```

pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{create_router, init_tracing, start_server, AppState, ServerConfig};
