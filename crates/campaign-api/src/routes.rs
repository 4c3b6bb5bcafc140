//! # Routes
//!
//! Axum router configuration for the host event API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /api/v1/hooks - Registered integrations and catalog entries
///
/// - Events:
///   - POST /api/v1/events/save-post - Item saved
///   - POST /api/v1/events/profile-update - User profile updated
///   - POST /api/v1/events/transition-status - Item status changed
///   - POST /api/v1/events/{tag} - Render events (init, admin_menu, ...)
///
/// - Lifecycle:
///   - POST /api/v1/plugin/activate - Grant capabilities
///   - POST /api/v1/plugin/deactivate - Revoke capabilities
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // API v1
        .nest("/api/v1", api_routes())
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    // Named events take precedence over the tag route
    let event_routes = Router::new()
        .route("/save-post", post(handlers::save_post))
        .route("/profile-update", post(handlers::profile_update))
        .route("/transition-status", post(handlers::transition_status))
        .route("/{tag}", post(handlers::render_event));

    let plugin_routes = Router::new()
        .route("/activate", post(handlers::activate))
        .route("/deactivate", post(handlers::deactivate));

    Router::new()
        .route("/hooks", get(handlers::list_hooks))
        .nest("/events", event_routes)
        .nest("/plugin", plugin_routes)
}

/// Create a minimal router for testing
#[cfg(test)]
pub fn create_test_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_routes())
        .with_state(state)
}
