//! API routes for the aspect server.

pub mod rate_limit;
pub mod request_id;
mod routes;

pub use routes::{AspectQuery, AspectResponse, ProvidersResponse};

use crate::config::Config;
use crate::state::AppState;
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn routes(config: &Config) -> Router<Arc<AppState>> {
    routes::create_router(config)
}

/// Fully layered application: routes, request ids, tracing, panic-to-500 and CORS.
pub fn app(state: Arc<AppState>) -> Router {
    routes(state.config())
        .with_state(state)
        .layer(middleware::from_fn(request_id::ensure_request_id))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
}
