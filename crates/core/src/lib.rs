//! `storeline-core`: shared building blocks for the back-office domain crates.
//!
//! Everything here is **pure**: identifiers, money, the domain error model,
//! the aggregate contract and the status lifecycle abstraction. No IO.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod money;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, ProductId, SupplierId, TenantId, UserId};
pub use lifecycle::{Lifecycle, validate_transition};
pub use money::Money;
