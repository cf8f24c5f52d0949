//! Status lifecycles backed by static transition tables.
//!
//! A lifecycle is a closed set of states plus, for each state, the slice of
//! states it may move to next. Terminal states map to an empty slice. Lookups
//! are plain slice membership; there is no other machinery.

use crate::error::{DomainError, DomainResult};

pub trait Lifecycle: Copy + Eq + core::fmt::Debug + 'static {
    /// Every state, in declaration order.
    const ALL: &'static [Self];

    /// Wire name (snake_case).
    fn as_str(self) -> &'static str;

    /// Transition table row for `self`.
    fn next_states(self) -> &'static [Self];

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|state| state.as_str() == s)
    }

    fn can_transition_to(self, next: Self) -> bool {
        self.next_states().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.next_states().is_empty()
    }

    /// Like [`Lifecycle::can_transition_to`], as an invariant error naming
    /// both states.
    fn ensure_transition(self, next: Self) -> DomainResult<()> {
        if self.can_transition_to(next) {
            return Ok(());
        }
        Err(DomainError::invariant(format!(
            "invalid status transition from '{}' to '{}'",
            self.as_str(),
            next.as_str()
        )))
    }
}

/// String-level transition check.
///
/// Fails closed: an unknown current or next state is never a valid transition.
pub fn validate_transition<S: Lifecycle>(current: &str, next: &str) -> bool {
    match (S::parse(current), S::parse(next)) {
        (Some(from), Some(to)) => from.can_transition_to(to),
        _ => false,
    }
}
