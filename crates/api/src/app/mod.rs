//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: event store and dispatcher
//! - `routes/`: HTTP routes + handlers, one file per area
//! - `dto.rs`: request bodies and aggregate-to-JSON mapping
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Full router backed by a fresh in-memory store.
pub fn build_app() -> Router {
    build_app_with(AppServices::in_memory())
}

pub fn build_app_with(services: AppServices) -> Router {
    // Domain routes: require identity headers.
    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(middleware::identity_middleware))
            .layer(Extension(Arc::new(services))),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
