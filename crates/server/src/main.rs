//! folio-sw server entry point.
//!
//! Boots the offline cache controller behind an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use folio_client::{CacheController, FetchConfig, HttpNetwork};
use folio_core::{AppConfig, CacheDb};

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(
        namespace = %config.current_namespace(),
        db = %config.db_path.display(),
        "Starting folio-sw server on stdio transport"
    );

    let store = CacheDb::open(&config.db_path).await.context("opening cache database")?;
    let network = HttpNetwork::new(FetchConfig::from_app(&config)?)?;
    let controller = CacheController::open(config, store, network).await?;

    let handler = handler::FolioServer::new(controller);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
