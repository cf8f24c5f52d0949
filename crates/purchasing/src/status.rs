//! Purchase order lifecycle.

use serde::{Deserialize, Serialize};

use storeline_core::{Lifecycle, validate_transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    Ordered,
    PartialReceived,
    Received,
    Cancelled,
}

impl Lifecycle for PurchaseOrderStatus {
    const ALL: &'static [Self] = &[
        Self::Draft,
        Self::Ordered,
        Self::PartialReceived,
        Self::Received,
        Self::Cancelled,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ordered => "ordered",
            Self::PartialReceived => "partial_received",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }

    fn next_states(self) -> &'static [Self] {
        use PurchaseOrderStatus::*;
        match self {
            Draft => &[Ordered, Cancelled],
            Ordered => &[PartialReceived, Received, Cancelled],
            // Further partial deliveries keep the order in partial_received.
            PartialReceived => &[PartialReceived, Received, Cancelled],
            Received | Cancelled => &[],
        }
    }
}

impl core::fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `true` iff a purchase order in `current` may move to `next`.
///
/// Unknown status names return `false`.
pub fn validate_status_transition(current: &str, next: &str) -> bool {
    validate_transition::<PurchaseOrderStatus>(current, next)
}
