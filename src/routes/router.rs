/**
 * Router Configuration
 *
 * Composes the protected API tree behind the authentication middleware,
 * adds the unauthenticated health probe and the uploaded-file static
 * service, and applies CORS and request tracing.
 */

use axum::{extract::DefaultBodyLimit, http::HeaderValue, middleware, routing::get, Json, Router};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::auth_middleware;
use crate::files::MAX_FILE_SIZE;
use crate::realtime::subscription::handle_realtime_subscription;
use crate::routes::api::{
    configure_activity_routes, configure_chat_routes, configure_event_routes,
    configure_notification_routes, configure_task_routes, configure_team_routes,
    configure_user_routes,
};
use crate::server::state::AppState;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn create_router(state: AppState) -> Router {
    let cors = match state.config.client_url.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
        Err(_) => {
            tracing::warn!(
                "invalid CLIENT_URL '{}', allowing any origin",
                state.config.client_url
            );
            CorsLayer::permissive()
        }
    };

    let mut protected = Router::new().route("/realtime", get(handle_realtime_subscription));
    protected = configure_user_routes(protected);
    protected = configure_team_routes(protected);
    protected = configure_task_routes(protected);
    protected = configure_event_routes(protected);
    protected = configure_chat_routes(protected);
    protected = configure_notification_routes(protected);
    protected = configure_activity_routes(protected);
    let protected = protected.layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        // Slack above the file cap for multipart framing
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
