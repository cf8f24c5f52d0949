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
use storeline_inventory::{
    ApproveReconciliation, CountLine, RecordCount, ReconciliationCommand, RejectReconciliation,
    StartReconciliation, StockReconciliation, StockReconciliationId, SubmitForApproval,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{ActorContext, TenantContext};

const AGGREGATE_TYPE: &str = "inventory.reconciliation";

pub fn router() -> Router {
    Router::new().nest("/reconciliations", reconciliations_router())
}

fn reconciliations_router() -> Router {
    Router::new()
        .route("/", post(start_reconciliation))
        .route("/:id", get(get_reconciliation))
        .route("/:id/lines", post(record_count))
        .route("/:id/submit", post(submit_reconciliation))
        .route("/:id/approve", post(approve_reconciliation))
        .route("/:id/reject", post(reject_reconciliation))
}

fn empty_reconciliation(_tenant_id: TenantId, aggregate_id: AggregateId) -> StockReconciliation {
    StockReconciliation::empty(StockReconciliationId::new(aggregate_id))
}

fn run(
    services: &AppServices,
    tenant: TenantContext,
    agg: AggregateId,
    cmd: ReconciliationCommand,
    expected: ExpectedVersion,
    status: StatusCode,
) -> Response {
    match services.dispatch(
        tenant.tenant_id(),
        agg,
        AGGREGATE_TYPE,
        cmd,
        expected,
        empty_reconciliation,
    ) {
        Ok(committed) => {
            (status, Json(dto::reconciliation_to_json(&committed.aggregate))).into_response()
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn start_reconciliation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Json(body): Json<dto::CreateReconciliationRequest>,
) -> Response {
    let agg = AggregateId::new();
    let cmd = ReconciliationCommand::StartReconciliation(StartReconciliation {
        tenant_id: tenant.tenant_id(),
        reconciliation_id: StockReconciliationId::new(agg),
        actor: actor.user_id(),
        location: body.location,
        notes: body.notes,
        occurred_at: Utc::now(),
    });

    run(&services, tenant, agg, cmd, ExpectedVersion::Exact(0), StatusCode::CREATED)
}

pub async fn get_reconciliation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> Response {
    let agg = match errors::parse_path_id(&id, "reconciliation") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.load(tenant.tenant_id(), agg, empty_reconciliation) {
        Ok(Some(rec)) => {
            (StatusCode::OK, Json(dto::reconciliation_to_json(&rec))).into_response()
        }
        Ok(None) => {
            errors::json_error(StatusCode::NOT_FOUND, "not_found", "reconciliation not found")
        }
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn record_count(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(line): Json<CountLine>,
) -> Response {
    let agg = match errors::parse_path_id(&id, "reconciliation") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = ReconciliationCommand::RecordCount(RecordCount {
        tenant_id: tenant.tenant_id(),
        reconciliation_id: StockReconciliationId::new(agg),
        actor: actor.user_id(),
        line,
        occurred_at: Utc::now(),
    });

    run(&services, tenant, agg, cmd, ExpectedVersion::Any, StatusCode::OK)
}

pub async fn submit_reconciliation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::TransitionRequest>,
) -> Response {
    let agg = match errors::parse_path_id(&id, "reconciliation") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = ReconciliationCommand::SubmitForApproval(SubmitForApproval {
        tenant_id: tenant.tenant_id(),
        reconciliation_id: StockReconciliationId::new(agg),
        actor: actor.user_id(),
        notes: body.notes,
        occurred_at: Utc::now(),
    });

    run(&services, tenant, agg, cmd, dto::expected_version(body.expected_version), StatusCode::OK)
}

pub async fn approve_reconciliation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::TransitionRequest>,
) -> Response {
    let agg = match errors::parse_path_id(&id, "reconciliation") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = ReconciliationCommand::ApproveReconciliation(ApproveReconciliation {
        tenant_id: tenant.tenant_id(),
        reconciliation_id: StockReconciliationId::new(agg),
        actor: actor.user_id(),
        notes: body.notes,
        occurred_at: Utc::now(),
    });

    run(&services, tenant, agg, cmd, dto::expected_version(body.expected_version), StatusCode::OK)
}

pub async fn reject_reconciliation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReasonRequest>,
) -> Response {
    let agg = match errors::parse_path_id(&id, "reconciliation") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = ReconciliationCommand::RejectReconciliation(RejectReconciliation {
        tenant_id: tenant.tenant_id(),
        reconciliation_id: StockReconciliationId::new(agg),
        actor: actor.user_id(),
        reason: body.reason,
        occurred_at: Utc::now(),
    });

    run(&services, tenant, agg, cmd, dto::expected_version(body.expected_version), StatusCode::OK)
}
