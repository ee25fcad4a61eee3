/**
 * Server Initialization
 *
 * Builds the application: configuration, database pool with migrations,
 * the real-time hub with its periodic cleanup task, and the router.
 */

use axum::Router;
use std::sync::Arc;
use std::time::Duration;

use crate::realtime::RealtimeHub;
use crate::routes::router::create_router;
use crate::server::config::{load_database, ServerConfig};
use crate::server::state::AppState;

/// Interval at which subscriber-less broadcast channels are dropped
const HUB_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

pub async fn create_app() -> Result<(Router, Arc<ServerConfig>), String> {
    tracing::info!("initializing collabhub server");

    let config = Arc::new(ServerConfig::from_env()?);
    let pool = load_database().await?;
    let realtime = RealtimeHub::new();

    let state = AppState {
        pool,
        realtime: realtime.clone(),
        config: config.clone(),
    };

    let app = create_router(state);

    // Rooms with no remaining subscribers accumulate as clients come and
    // go; a background task sweeps them periodically.
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HUB_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = realtime.cleanup_inactive_rooms();
            if removed > 0 {
                tracing::debug!("cleaned up {removed} inactive realtime rooms");
            }
        }
    });

    tracing::info!("router configured");
    Ok((app, config))
}
