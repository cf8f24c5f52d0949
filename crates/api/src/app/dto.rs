use serde::Deserialize;
use serde_json::{Value, json};

use storeline_core::{AggregateRoot, ExpectedVersion, Money, SupplierId};
use storeline_inventory::StockReconciliation;
use storeline_purchasing::{LineReceipt, NewOrderLine, PurchaseOrder};
use storeline_sales::Coupon;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct StatusTransitionRequest {
    pub entity: String,
    pub current: String,
    pub next: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseOrderRequest {
    pub supplier_id: SupplierId,
    pub lines: Vec<NewOrderLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total_amount: Money,
    pub notes: Option<String>,
}

/// Body shared by transitions that only carry an optional note.
///
/// `expected_version` is the version the client last saw; when present the
/// transition is refused with 409 if the document moved on since.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub notes: Option<String>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveGoodsRequest {
    pub receipts: Vec<LineReceipt>,
    pub notes: Option<String>,
    pub expected_version: Option<u64>,
}

/// Cancel / reject: the reason is mandatory.
#[derive(Debug, Deserialize)]
pub struct ReasonRequest {
    pub reason: String,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReconciliationRequest {
    pub location: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderAmountRequest {
    pub order_amount: Money,
}

#[derive(Debug, Deserialize)]
pub struct RedeemCouponRequest {
    pub order_amount: Money,
    pub order_reference: Option<String>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct DeactivateCouponRequest {
    pub reason: Option<String>,
    pub expected_version: Option<u64>,
}

pub fn expected_version(v: Option<u64>) -> ExpectedVersion {
    v.map(ExpectedVersion::Exact).unwrap_or(ExpectedVersion::Any)
}

// -------------------------
// Response mapping
// -------------------------

pub fn purchase_order_to_json(order: &PurchaseOrder) -> Value {
    let totals = order.totals();
    json!({
        "id": order.id_typed().to_string(),
        "version": order.version(),
        "supplier_id": order.supplier_id().map(|s| s.to_string()),
        "created_by": order.created_by().map(|u| u.to_string()),
        "status": order.status(),
        "lines": order.lines(),
        "totals": totals,
        "total_display": totals.total_amount.to_string(),
        "notes": order.notes(),
        "history": order.history(),
    })
}

pub fn reconciliation_to_json(rec: &StockReconciliation) -> Value {
    json!({
        "id": rec.id_typed().to_string(),
        "version": rec.version(),
        "status": rec.status(),
        "location": rec.location(),
        "notes": rec.notes(),
        "lines": rec.lines(),
        "total_variance_value": rec.total_variance_value(),
        "adjustments": rec.adjustments(),
        "created_by": rec.created_by().map(|u| u.to_string()),
        "submitted_by": rec.submitted_by().map(|u| u.to_string()),
        "reviewed_by": rec.reviewed_by().map(|u| u.to_string()),
        "reviewed_at": rec.reviewed_at(),
        "review_note": rec.review_note(),
    })
}

pub fn coupon_to_json(coupon: &Coupon) -> Value {
    json!({
        "id": coupon.id_typed().to_string(),
        "version": coupon.version(),
        "terms": coupon.terms(),
        "active": coupon.is_active(),
        "times_used": coupon.times_used(),
    })
}
