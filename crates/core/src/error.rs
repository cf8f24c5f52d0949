//! Domain error model.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic business failure raised by validators and aggregates.
///
/// Storage and transport failures have their own error types in the infra and
/// api crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A single malformed input value.
    #[error("validation failed: {0}")]
    Validation(String),

    /// One or more business rules failed. Messages are human readable and
    /// listed in the order the checks ran.
    #[error("business rules violated: {}", .0.join("; "))]
    Rules(Vec<String>),

    /// The requested operation is not allowed in the document's current state.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("not found")]
    NotFound,

    /// Stale version or duplicate creation.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Turn an accumulated violation list into a result: empty means valid.
    pub fn from_violations(violations: Vec<String>) -> DomainResult<()> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self::Rules(violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_violation_list_is_ok() {
        assert_eq!(DomainError::from_violations(vec![]), Ok(()));
    }

    #[test]
    fn rules_error_lists_every_message() {
        let err = DomainError::from_violations(vec![
            "Maximum 100 items allowed per order".to_string(),
            "Minimum order amount is ₦100".to_string(),
        ])
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "business rules violated: Maximum 100 items allowed per order; Minimum order amount is ₦100"
        );
    }
}
