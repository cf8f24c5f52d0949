//! Inventory domain module (stock reconciliations, event-sourced).
//!
//! A reconciliation records physical counts against book quantities and goes
//! through a draft -> pending -> approved/rejected approval flow. Approval
//! yields the stock adjustments to book. No IO, no HTTP, no storage.

pub mod reconciliation;
pub mod status;

pub use reconciliation::{
    ApproveReconciliation, CountLine, CountRecorded, RecordCount, ReconciliationApproved,
    ReconciliationCommand, ReconciliationEvent, ReconciliationRejected, ReconciliationStarted,
    ReconciliationSubmitted, RejectReconciliation, StartReconciliation, StockAdjustment,
    StockReconciliation, StockReconciliationId, SubmitForApproval,
};
pub use status::{ReconciliationStatus, validate_status_transition};
