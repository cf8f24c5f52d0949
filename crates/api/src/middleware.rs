use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use storeline_core::{TenantId, UserId};

use crate::context::{ActorContext, TenantContext};

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";

/// Session handling lives in the upstream gateway, which forwards the
/// authenticated identity as headers. Requests without a usable identity
/// never reach a handler.
pub async fn identity_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let tenant_id: TenantId = header_id(req.headers(), TENANT_HEADER)?;
    let user_id: UserId = header_id(req.headers(), USER_HEADER)?;

    req.extensions_mut().insert(TenantContext::new(tenant_id));
    req.extensions_mut().insert(ActorContext::new(user_id));

    Ok(next.run(req).await)
}

fn header_id<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Result<T, StatusCode> {
    let value = headers.get(name).ok_or(StatusCode::UNAUTHORIZED)?;
    let value = value.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
    value.trim().parse().map_err(|_| StatusCode::UNAUTHORIZED)
}
