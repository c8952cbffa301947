//! HTTP route definitions

use crate::{handlers, middleware, AppState};
use axum::{middleware as axum_middleware, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main router
///
/// Share URLs carry arbitrary paths and custom domains may use any path, so
/// every request goes to the single share handler.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Create rate limiter
    let rate_limiter = middleware::create_rate_limiter(state.config.rate_limit_rps);

    let router = Router::new()
        .fallback(handlers::serve)
        // Apply middleware
        .layer(axum_middleware::from_fn_with_state(
            rate_limiter,
            middleware::rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware));

    let router = if state.config.cors_enabled {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
