//! Stock reconciliation approval lifecycle.

use serde::{Deserialize, Serialize};

use storeline_core::{Lifecycle, validate_transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl Lifecycle for ReconciliationStatus {
    const ALL: &'static [Self] = &[Self::Draft, Self::Pending, Self::Approved, Self::Rejected];

    fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    fn next_states(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Pending],
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Approved | Self::Rejected => &[],
        }
    }
}

impl core::fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `true` iff a reconciliation in `current` may move to `next`; unknown names
/// are rejected.
pub fn validate_status_transition(current: &str, next: &str) -> bool {
    validate_transition::<ReconciliationStatus>(current, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn approval_flow_is_one_directional() {
        assert!(validate_status_transition("draft", "pending"));
        assert!(validate_status_transition("pending", "approved"));
        assert!(validate_status_transition("pending", "rejected"));

        assert!(!validate_status_transition("draft", "approved"));
        assert!(!validate_status_transition("pending", "draft"));
        assert!(!validate_status_transition("approved", "pending"));
        assert!(!validate_status_transition("rejected", "draft"));
    }

    #[test]
    fn decisions_are_terminal() {
        assert!(ReconciliationStatus::Approved.is_terminal());
        assert!(ReconciliationStatus::Rejected.is_terminal());
        assert!(!ReconciliationStatus::Pending.is_terminal());
    }

    proptest! {
        #[test]
        fn unknown_current_state_never_transitions(
            current in "[a-z]{1,12}",
            next_idx in 0usize..4,
        ) {
            prop_assume!(ReconciliationStatus::parse(&current).is_none());
            let next = ReconciliationStatus::ALL[next_idx].as_str();
            prop_assert!(!validate_status_transition(&current, next));
        }
    }
}
