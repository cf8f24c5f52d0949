use axum::{Router, routing::get};

pub mod coupons;
pub mod purchases;
pub mod reconciliations;
pub mod system;
pub mod validation;

/// Router for all tenant-scoped endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/validation", validation::router())
        .nest("/purchases", purchases::router())
        .nest("/inventory", reconciliations::router())
        .nest("/coupons", coupons::router())
}
