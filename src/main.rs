mod api;
mod citations;
mod commands;
mod map;
mod pipeline;
mod reader;
mod state;

use std::sync::Arc;

use tracing::{info, Level};

use api::ApiClient;
use commands::Session;
use state::{AppState, ClientConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load env
    let _ = dotenv::dotenv();
    let level = dotenv::var("LOG_LEVEL")
        .ok()
        .and_then(|s| s.trim().parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    // Logs go to stderr so they never interleave with the answer panels.
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env()?;
    info!(
        base_url = %config.api_base_url,
        timeout = ?config.request_timeout,
        "Legal QA client configured"
    );

    let api = Arc::new(ApiClient::new(&config)?);
    let state = AppState::new(api, config);

    Session::new(state).run().await
}
