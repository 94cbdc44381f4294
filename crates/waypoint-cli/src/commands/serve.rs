//! Web server command

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use waypoint_core::{TripStore, VisionBackend, VisionClient};
use waypoint_server::AppState;

/// Start the REST API server
pub async fn cmd_serve(store: TripStore, host: &str, port: u16) -> Result<()> {
    let client = VisionClient::from_env();
    match client {
        Some(ref client) => info!("Extraction backend configured (model {})", client.model()),
        None => info!("Extraction not configured; uploads work, processing is unavailable"),
    }

    std::fs::create_dir_all(store.trips_root())?;
    let state = Arc::new(AppState::new(store, client));
    waypoint_server::serve(state, host, port).await
}
