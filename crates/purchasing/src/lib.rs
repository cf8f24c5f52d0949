//! Purchasing domain module (purchase orders, event-sourced).
//!
//! Holds the purchase order lifecycle table, the order business rules, the
//! totals cross-check, and the `PurchaseOrder` aggregate that applies all
//! three. Pure domain logic: no IO, no HTTP, no storage.

pub mod order;
pub mod rules;
pub mod status;
pub mod totals;

pub use order::{
    CancelOrder, CreatePurchaseOrder, GoodsReceived, LineReceipt, NewOrderLine, OrderLine,
    OrderTotals, PlaceOrder, PurchaseOrder, PurchaseOrderCancelled, PurchaseOrderCommand,
    PurchaseOrderCreated, PurchaseOrderEvent, PurchaseOrderId, PurchaseOrderPlaced, ReceiveGoods,
    StatusChange,
};
pub use rules::{
    MAX_ITEM_QUANTITY, MAX_ITEMS_PER_ORDER, MAX_ORDER_AMOUNT, MIN_ITEM_QUANTITY, MIN_ORDER_AMOUNT,
    OrderRulesInput, RuleItem, check_business_rules, validate_business_rules,
};
pub use status::{PurchaseOrderStatus, validate_status_transition};
pub use totals::{TotalsCheck, TotalsInput, TotalsLine, validate_totals};
