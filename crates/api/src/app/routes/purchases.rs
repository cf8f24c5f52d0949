use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use storeline_core::{AggregateId, ExpectedVersion, TenantId};
use storeline_purchasing::{
    CancelOrder, CreatePurchaseOrder, PlaceOrder, PurchaseOrder, PurchaseOrderCommand,
    PurchaseOrderId, ReceiveGoods,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{ActorContext, TenantContext};

const AGGREGATE_TYPE: &str = "purchasing.order";

pub fn router() -> Router {
    Router::new().nest("/orders", orders_router())
}

fn orders_router() -> Router {
    Router::new()
        .route("/", post(create_purchase_order))
        .route("/:id", get(get_purchase_order))
        .route("/:id/place", post(place_purchase_order))
        .route("/:id/receive", post(receive_purchase_order_goods))
        .route("/:id/cancel", post(cancel_purchase_order))
}

fn empty_order(_tenant_id: TenantId, aggregate_id: AggregateId) -> PurchaseOrder {
    PurchaseOrder::empty(PurchaseOrderId::new(aggregate_id))
}

fn run(
    services: &AppServices,
    tenant: TenantContext,
    agg: AggregateId,
    cmd: PurchaseOrderCommand,
    expected: ExpectedVersion,
    status: StatusCode,
) -> Response {
    match services.dispatch(tenant.tenant_id(), agg, AGGREGATE_TYPE, cmd, expected, empty_order) {
        Ok(committed) => {
            (status, Json(dto::purchase_order_to_json(&committed.aggregate))).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn create_purchase_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::CreatePurchaseOrderRequest>,
) -> Response {
    let agg = AggregateId::new();
    let cmd = PurchaseOrderCommand::CreatePurchaseOrder(CreatePurchaseOrder {
        tenant_id: tenant.tenant_id(),
        order_id: PurchaseOrderId::new(agg),
        supplier_id: body.supplier_id,
        actor: actor.user_id(),
        lines: body.lines,
        subtotal: body.subtotal,
        tax: body.tax,
        shipping: body.shipping,
        total_amount: body.total_amount,
        notes: body.notes,
        occurred_at: Utc::now(),
    });

    run(&services, tenant, agg, cmd, ExpectedVersion::Exact(0), StatusCode::CREATED)
}

pub async fn get_purchase_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> Response {
    let agg = match errors::parse_path_id(&id, "purchase order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.load(tenant.tenant_id(), agg, empty_order) {
        Ok(Some(order)) => {
            (StatusCode::OK, Json(dto::purchase_order_to_json(&order))).into_response()
        }
        Ok(None) => {
            errors::json_error(StatusCode::NOT_FOUND, "not_found", "purchase order not found")
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn place_purchase_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::TransitionRequest>,
) -> Response {
    let agg = match errors::parse_path_id(&id, "purchase order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = PurchaseOrderCommand::PlaceOrder(PlaceOrder {
        tenant_id: tenant.tenant_id(),
        order_id: PurchaseOrderId::new(agg),
        actor: actor.user_id(),
        notes: body.notes,
        occurred_at: Utc::now(),
    });

    run(&services, tenant, agg, cmd, dto::expected_version(body.expected_version), StatusCode::OK)
}

pub async fn receive_purchase_order_goods(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReceiveGoodsRequest>,
) -> Response {
    let agg = match errors::parse_path_id(&id, "purchase order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = PurchaseOrderCommand::ReceiveGoods(ReceiveGoods {
        tenant_id: tenant.tenant_id(),
        order_id: PurchaseOrderId::new(agg),
        actor: actor.user_id(),
        receipts: body.receipts,
        notes: body.notes,
        occurred_at: Utc::now(),
    });

    run(&services, tenant, agg, cmd, dto::expected_version(body.expected_version), StatusCode::OK)
}

pub async fn cancel_purchase_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReasonRequest>,
) -> Response {
    let agg = match errors::parse_path_id(&id, "purchase order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = PurchaseOrderCommand::CancelOrder(CancelOrder {
        tenant_id: tenant.tenant_id(),
        order_id: PurchaseOrderId::new(agg),
        actor: actor.user_id(),
        reason: body.reason,
        occurred_at: Utc::now(),
    });

    run(&services, tenant, agg, cmd, dto::expected_version(body.expected_version), StatusCode::OK)
}
