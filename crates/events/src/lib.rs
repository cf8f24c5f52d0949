//! Domain events emitted by workflow documents.

pub mod event;

pub use event::Event;
