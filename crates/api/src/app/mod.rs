//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: event store, directories and the settlement service over them
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs (camelCase JSON)
//! - `errors.rs`: consistent `{"error": ...}` responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router over fresh in-memory services.
pub fn build_app(jwt_secret: &str) -> Router {
    build_app_with(jwt_secret, Arc::new(AppServices::in_memory()))
}

/// Build the router over existing services (the binary seeds them, tests register
/// event records directly).
pub fn build_app_with(jwt_secret: &str, services: Arc<AppServices>) -> Router {
    let jwt = Arc::new(racha_auth::Hs256JwtValidator::new(jwt_secret));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: require a verified caller.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
