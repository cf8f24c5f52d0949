use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;

use storeline_core::{AggregateId, ExpectedVersion, Money, TenantId};
use storeline_sales::{
    Coupon, CouponCommand, CouponId, CouponTerms, CreateCoupon, DeactivateCoupon,
    RedeemCoupon,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{ActorContext, TenantContext};

const AGGREGATE_TYPE: &str = "sales.coupon";

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_coupon))
        .route("/:id", get(get_coupon))
        .route("/:id/check", post(check_coupon))
        .route("/:id/redeem", post(redeem_coupon))
        .route("/:id/deactivate", post(deactivate_coupon))
}

fn empty_coupon(_tenant_id: TenantId, aggregate_id: AggregateId) -> Coupon {
    Coupon::empty(CouponId::new(aggregate_id))
}

fn load_coupon(
    services: &AppServices,
    tenant: TenantContext,
    raw_id: &str,
) -> Result<Coupon, Response> {
    let agg = errors::parse_path_id(raw_id, "coupon")?;
    match services.load(tenant.tenant_id(), agg, empty_coupon) {
        Ok(Some(coupon)) => Ok(coupon),
        Ok(None) => Err(errors::json_error(StatusCode::NOT_FOUND, "not_found", "coupon not found")),
        Err(e) => Err(errors::dispatch_error_to_response(e)),
    }
}

pub async fn create_coupon(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Json(terms): Json<CouponTerms>,
) -> Response {
    let agg = AggregateId::new();
    let cmd = CouponCommand::CreateCoupon(CreateCoupon {
        tenant_id: tenant.tenant_id(),
        coupon_id: CouponId::new(agg),
        actor: actor.user_id(),
        terms,
        occurred_at: Utc::now(),
    });

    match services.dispatch(
        tenant.tenant_id(),
        agg,
        AGGREGATE_TYPE,
        cmd,
        ExpectedVersion::Exact(0),
        empty_coupon,
    ) {
        Ok(committed) => {
            (StatusCode::CREATED, Json(dto::coupon_to_json(&committed.aggregate))).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_coupon(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> Response {
    match load_coupon(&services, tenant, &id) {
        Ok(coupon) => (StatusCode::OK, Json(dto::coupon_to_json(&coupon))).into_response(),
        Err(resp) => resp,
    }
}

/// Dry run of a redemption: reports every reason the coupon would be refused
/// and the discount it would grant.
pub async fn check_coupon(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::OrderAmountRequest>,
) -> Response {
    let coupon = match load_coupon(&services, tenant, &id) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let violations = coupon.check(body.order_amount, Utc::now());
    let discount = if violations.is_empty() {
        coupon.discount_for(body.order_amount)
    } else {
        Money::ZERO
    };

    (
        StatusCode::OK,
        Json(json!({
            "valid": violations.is_empty(),
            "violations": violations,
            "discount": discount,
        })),
    )
        .into_response()
}

pub async fn redeem_coupon(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RedeemCouponRequest>,
) -> Response {
    let agg = match errors::parse_path_id(&id, "coupon") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = CouponCommand::RedeemCoupon(RedeemCoupon {
        tenant_id: tenant.tenant_id(),
        coupon_id: CouponId::new(agg),
        actor: actor.user_id(),
        order_amount: body.order_amount,
        order_reference: body.order_reference,
        occurred_at: Utc::now(),
    });

    let committed = match services.dispatch(
        tenant.tenant_id(),
        agg,
        AGGREGATE_TYPE,
        cmd,
        dto::expected_version(body.expected_version),
        empty_coupon,
    ) {
        Ok(c) => c,
        Err(e) => return errors::dispatch_error_to_response(e),
    };

    // Terms are unchanged by redemption, so this is the discount just granted.
    let discount = committed.aggregate.discount_for(body.order_amount);

    tracing::info!(coupon_id = %agg, %discount, "coupon redeemed");

    (
        StatusCode::OK,
        Json(json!({
            "coupon": dto::coupon_to_json(&committed.aggregate),
            "discount": discount,
        })),
    )
        .into_response()
}

pub async fn deactivate_coupon(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::DeactivateCouponRequest>,
) -> Response {
    let agg = match errors::parse_path_id(&id, "coupon") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = CouponCommand::DeactivateCoupon(DeactivateCoupon {
        tenant_id: tenant.tenant_id(),
        coupon_id: CouponId::new(agg),
        actor: actor.user_id(),
        reason: body.reason,
        occurred_at: Utc::now(),
    });

    match services.dispatch(
        tenant.tenant_id(),
        agg,
        AGGREGATE_TYPE,
        cmd,
        dto::expected_version(body.expected_version),
        empty_coupon,
    ) {
        Ok(committed) => {
            (StatusCode::OK, Json(dto::coupon_to_json(&committed.aggregate))).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
