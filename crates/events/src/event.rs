use chrono::{DateTime, Utc};

/// A fact recorded on a document stream (order placed, count approved...).
///
/// Events are appended, never edited. `event_type` and `version` are stored
/// next to the payload so old streams can still be read after the payload
/// schema changes.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name, e.g. `"purchasing.order.placed"`.
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time of the action.
    fn occurred_at(&self) -> DateTime<Utc>;
}
