//! Infrastructure layer: event persistence and command execution.
//!
//! Domain crates stay pure; this crate is where their decisions get
//! written down under an optimistic-concurrency check.

pub mod command_dispatcher;
pub mod event_store;

pub use command_dispatcher::{CommandDispatcher, Committed, DispatchError};
pub use event_store::{
    EventStore, EventStoreError, InMemoryEventStore, StoredEvent, UncommittedEvent,
};
