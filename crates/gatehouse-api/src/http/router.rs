//! Axum router for the admin surface.
//!
//! Admin routes live under `/api/v1/admin`; the liveness probe is at the
//! root. Middleware: CORS and request tracing.

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin_routes = Router::new()
        .route("/breaker/clear", post(handlers::clear_breaker))
        .route(
            "/tiers/{user}",
            put(handlers::set_tier).get(handlers::get_tier),
        )
        .route("/usage/{user}", get(handlers::get_usage))
        .route("/wizard/{user}", get(handlers::get_wizard_session))
        .route(
            "/memory/{user}/{location}",
            delete(handlers::clear_memory),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
