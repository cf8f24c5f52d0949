//! Append-only event store boundary.
//!
//! Streams are keyed by `(tenant_id, aggregate_id)`. Appends carry an
//! `ExpectedVersion`; this is the conditional update that keeps two
//! concurrent status changes from both succeeding.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
