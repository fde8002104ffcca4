//! API routes and handlers.

mod config;
mod proxy;
mod queue;
mod share;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use super::state::AppState;

/// Build the application router.
///
/// The share intercept endpoint is registered at the configured share path;
/// every request that matches no explicit route falls through to the
/// caching gateway.
pub fn router(state: AppState) -> Router {
    let share_path = state.intercept.share_path.clone();

    Router::new()
        .route("/health", get(health))
        // Share-target intercept; other methods on the path are ordinary
        // navigations and continue to the gateway
        .route(
            &share_path,
            post(share::share_submission).fallback(proxy::gateway),
        )
        // Queue management
        .route("/api/queue", get(queue::list_queue))
        .route("/api/queue", delete(queue::clear_queue))
        .route("/api/queue/{id}", delete(queue::delete_queued))
        .route("/api/queue/sync", post(queue::sync_queue))
        // Configuration store
        .route("/api/config/{key}", get(config::get_entry))
        .route("/api/config/{key}", put(config::put_entry))
        // Caching gateway for everything else
        .fallback(proxy::gateway)
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}
