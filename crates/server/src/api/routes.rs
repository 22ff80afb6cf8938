use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{email, handlers, middleware::metrics_middleware, notifications};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Incident notifications (room provisioner)
        .route(
            "/notifications/{routing_key}",
            post(notifications::process_notification),
        )
        // Email notifications
        .route("/email", post(email::dispatch_email))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
