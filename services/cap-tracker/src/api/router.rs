use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::ApiState;

pub fn create_router(state: Arc<ApiState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    Router::new()
        .route("/api/usage/events", post(handlers::record_event))
        .route("/api/usage/status", get(handlers::get_status))
        .route("/api/usage/badge", get(handlers::get_badge))
        .route("/api/usage/reset", post(handlers::reset_window))
        .route(
            "/api/usage/config",
            get(handlers::get_config).put(handlers::update_config),
        )
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(middleware)
}
