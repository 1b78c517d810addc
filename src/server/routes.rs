//! Router configuration for the web server.

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, AllowOrigin, CorsLayer};

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
///
/// CORS is permissive only for the local frontend dev server (Vite
/// default port 5173).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://127.0.0.1:5173"),
        ]))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // System / utility routes
        .route("/health", get(handlers::health))
        .route("/api/ping", get(handlers::ping))
        // Research runs
        .route(
            "/api/v1/research-runs",
            post(handlers::create_run).get(handlers::list_runs),
        )
        .route("/api/v1/research-runs/:run_id", get(handlers::get_run))
        .route(
            "/api/v1/research-runs/:run_id/detail",
            get(handlers::get_run_detail),
        )
        .route(
            "/api/v1/research-runs/:run_id/state",
            get(handlers::get_run_state),
        )
        // Stage entry points and full execution
        .route(
            "/api/v1/research-runs/:run_id/search-dummy",
            post(handlers::run_dummy_search),
        )
        .route(
            "/api/v1/research-runs/:run_id/synthesize-dummy",
            post(handlers::run_dummy_synthesis),
        )
        .route(
            "/api/v1/research-runs/:run_id/execute",
            post(handlers::execute_pipeline),
        )
        .layer(cors)
        .with_state(state)
}
