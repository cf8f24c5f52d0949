//! Stateless checks: callers submit a payload and get the verdict back.
//! Nothing is stored.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::json;

use storeline_purchasing::{OrderRulesInput, TotalsCheck, TotalsInput};

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/status-transition", post(check_status_transition))
        .route("/order-rules", post(check_order_rules))
        .route("/totals", post(check_totals))
}

pub async fn check_status_transition(Json(body): Json<dto::StatusTransitionRequest>) -> Response {
    let valid = match body.entity.as_str() {
        "purchase_order" => {
            storeline_purchasing::validate_status_transition(&body.current, &body.next)
        }
        "stock_reconciliation" => {
            storeline_inventory::validate_status_transition(&body.current, &body.next)
        }
        other => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "unknown_entity",
                format!("unknown entity '{other}' (expected purchase_order or stock_reconciliation)"),
            );
        }
    };

    tracing::debug!(
        entity = %body.entity,
        current = %body.current,
        next = %body.next,
        valid,
        "transition checked"
    );
    Json(json!({ "valid": valid })).into_response()
}

/// `total_amount` is integer kobo, like every amount on the wire: a ₦1,000
/// order is `100000`.
pub async fn check_order_rules(Json(body): Json<OrderRulesInput>) -> impl IntoResponse {
    let violations = storeline_purchasing::validate_business_rules(&body);
    Json(json!({
        "valid": violations.is_empty(),
        "violations": violations,
    }))
}

/// All amounts in kobo.
pub async fn check_totals(Json(body): Json<TotalsInput>) -> Json<TotalsCheck> {
    Json(storeline_purchasing::validate_totals(&body))
}
