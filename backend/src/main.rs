//! # Backend Service
//!
//! Thin entry point that delegates to lib-web for server setup.

use lib_core::config::init_config;
use lib_web::{init_tracing, start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let config = init_config().map_err(|e| anyhow::anyhow!(e))?;
    start_server(config.clone(), ServerConfig::from_config(config)).await
}
