//! # ripple-api
//!
//! REST API layer for Ripple. Issues the credentials the gateway's
//! authentication gate consumes, and owns the authoritative store the
//! gateway's live relay mirrors into.

pub mod auth;
pub mod middleware;
pub mod routes;

use axum::Router;
use ripple_db::Database;
use ripple_gateway::ConnectionRegistry;
use std::sync::Arc;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// The gateway's live connection registry — shared so REST clients can
    /// query presence without opening a socket.
    pub registry: Arc<ConnectionRegistry>,
}

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let public = Router::new()
        .merge(routes::auth::router())
        .merge(routes::health::router());

    let protected = Router::new()
        .merge(routes::users::router())
        .merge(routes::conversations::router())
        .merge(routes::presence::router())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .nest("/api/v1", public.merge(protected))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
