//! Application route configuration.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{account_routes, health_check, user_routes};
use super::AppState;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/users", user_routes())
        .nest("/accounts", account_routes());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
