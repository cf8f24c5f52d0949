//! Command execution pipeline.
//!
//! ```text
//! command
//!   -> load stream (tenant-scoped)
//!   -> rehydrate aggregate
//!   -> handle (pure; runs the validators)
//!   -> append with ExpectedVersion::Exact(loaded version)
//! ```
//!
//! The append is the only write. If another request committed to the same
//! stream in between, the append fails with `Concurrency` and nothing is
//! persisted.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use storeline_core::{Aggregate, AggregateId, DomainError, ExpectedVersion, TenantId};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("conflict: {0}")]
    Concurrency(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("business rules violated: {}", .0.join("; "))]
    Rules(Vec<String>),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("not found")]
    NotFound,

    /// A stored payload no longer matches the aggregate's event type.
    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),

    #[error(transparent)]
    Store(EventStoreError),
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg),
            EventStoreError::TenantIsolation(msg) => DispatchError::TenantIsolation(msg),
            other => DispatchError::Store(other),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::Rules(violations) => DispatchError::Rules(violations),
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::Conflict(msg) => DispatchError::Concurrency(msg),
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
        }
    }
}

/// Result of a successful dispatch: the events written and the aggregate
/// with those events applied.
#[derive(Debug, Clone)]
pub struct Committed<A> {
    pub aggregate: A,
    pub events: Vec<StoredEvent>,
}

#[derive(Debug)]
pub struct CommandDispatcher<S> {
    store: S,
}

impl<S> CommandDispatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S> CommandDispatcher<S>
where
    S: EventStore,
{
    /// Run `command` against the current state of the stream.
    pub fn dispatch<A>(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        command: A::Command,
        make_aggregate: impl FnOnce(TenantId, AggregateId) -> A,
    ) -> Result<Committed<A>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: storeline_events::Event + Serialize + DeserializeOwned,
    {
        self.dispatch_expecting(
            tenant_id,
            aggregate_id,
            aggregate_type,
            command,
            ExpectedVersion::Any,
            make_aggregate,
        )
    }

    /// Like [`CommandDispatcher::dispatch`], but fails with `Concurrency`
    /// unless the stream is at `expected` when loaded. Lets a client that
    /// reviewed version `n` make its decision only against version `n`.
    pub fn dispatch_expecting<A>(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        command: A::Command,
        expected: ExpectedVersion,
        make_aggregate: impl FnOnce(TenantId, AggregateId) -> A,
    ) -> Result<Committed<A>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: storeline_events::Event + Serialize + DeserializeOwned,
    {
        let history = self.store.load_stream(tenant_id, aggregate_id)?;
        validate_loaded_stream(tenant_id, aggregate_id, &history)?;
        let loaded_version = stream_version(&history);
        expected.check(loaded_version)?;

        let mut aggregate = make_aggregate(tenant_id, aggregate_id);
        apply_history(&mut aggregate, &history)?;

        let decided = match aggregate.handle(&command) {
            Ok(events) => events,
            Err(e) => {
                tracing::info!(
                    aggregate_type,
                    %aggregate_id,
                    error = %e,
                    "command rejected"
                );
                return Err(e.into());
            }
        };
        if decided.is_empty() {
            return Ok(Committed {
                aggregate,
                events: vec![],
            });
        }

        let uncommitted = decided
            .iter()
            .map(|ev| {
                UncommittedEvent::from_typed(
                    tenant_id,
                    aggregate_id,
                    aggregate_type,
                    Uuid::now_v7(),
                    ev,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self
            .store
            .append(uncommitted, ExpectedVersion::Exact(loaded_version))
            .inspect_err(|e| {
                tracing::warn!(aggregate_type, %aggregate_id, error = %e, "append failed");
            })?;

        for ev in &decided {
            aggregate.apply(ev);
        }

        tracing::debug!(
            aggregate_type,
            %aggregate_id,
            events = committed.len(),
            version = stream_version(&committed),
            "command committed"
        );

        Ok(Committed {
            aggregate,
            events: committed,
        })
    }

    /// Rehydrate an aggregate for reading. `None` when the stream is empty.
    pub fn load<A>(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        make_aggregate: impl FnOnce(TenantId, AggregateId) -> A,
    ) -> Result<Option<A>, DispatchError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let history = self.store.load_stream(tenant_id, aggregate_id)?;
        if history.is_empty() {
            return Ok(None);
        }
        validate_loaded_stream(tenant_id, aggregate_id, &history)?;

        let mut aggregate = make_aggregate(tenant_id, aggregate_id);
        apply_history(&mut aggregate, &history)?;
        Ok(Some(aggregate))
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), DispatchError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.tenant_id != tenant_id || e.aggregate_id != aggregate_id {
            return Err(DispatchError::TenantIsolation(format!(
                "loaded stream contains a foreign event at index {idx}"
            )));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use storeline_core::{AggregateRoot, Money, ProductId, SupplierId, UserId};
    use storeline_purchasing::{
        CancelOrder, CreatePurchaseOrder, NewOrderLine, PlaceOrder, PurchaseOrder,
        PurchaseOrderCommand, PurchaseOrderId, PurchaseOrderStatus,
    };

    use crate::event_store::InMemoryEventStore;

    const ORDER: &str = "purchasing.order";

    fn make(_t: TenantId, id: AggregateId) -> PurchaseOrder {
        PurchaseOrder::empty(PurchaseOrderId::new(id))
    }

    fn create_cmd(tenant_id: TenantId, id: AggregateId) -> PurchaseOrderCommand {
        let unit_cost = Money::naira(100);
        PurchaseOrderCommand::CreatePurchaseOrder(CreatePurchaseOrder {
            tenant_id,
            order_id: PurchaseOrderId::new(id),
            supplier_id: SupplierId::new(),
            actor: UserId::new(),
            lines: vec![NewOrderLine {
                product_id: ProductId::new(),
                quantity: 10,
                unit_cost,
                total_cost: Money::naira(1_000),
            }],
            subtotal: Money::naira(1_000),
            tax: Money::naira(50),
            shipping: Money::naira(25),
            total_amount: Money::naira(1_075),
            notes: None,
            occurred_at: Utc::now(),
        })
    }

    fn place_cmd(tenant_id: TenantId, id: AggregateId) -> PurchaseOrderCommand {
        PurchaseOrderCommand::PlaceOrder(PlaceOrder {
            tenant_id,
            order_id: PurchaseOrderId::new(id),
            actor: UserId::new(),
            notes: None,
            occurred_at: Utc::now(),
        })
    }

    fn cancel_cmd(tenant_id: TenantId, id: AggregateId) -> PurchaseOrderCommand {
        PurchaseOrderCommand::CancelOrder(CancelOrder {
            tenant_id,
            order_id: PurchaseOrderId::new(id),
            actor: UserId::new(),
            reason: "duplicate".to_string(),
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn dispatch_persists_and_returns_updated_aggregate() {
        let dispatcher = CommandDispatcher::new(Arc::new(InMemoryEventStore::new()));
        let (t, id) = (TenantId::new(), AggregateId::new());

        let created = dispatcher
            .dispatch(t, id, ORDER, create_cmd(t, id), make)
            .unwrap();
        assert_eq!(created.events.len(), 1);
        assert_eq!(created.events[0].event_type, "purchasing.order.created");

        let placed = dispatcher.dispatch(t, id, ORDER, place_cmd(t, id), make).unwrap();
        assert_eq!(placed.aggregate.status(), PurchaseOrderStatus::Ordered);
        assert_eq!(placed.events[0].sequence_number, 2);

        let loaded = dispatcher.load(t, id, make).unwrap().unwrap();
        assert_eq!(loaded.status(), PurchaseOrderStatus::Ordered);
        assert_eq!(loaded.version(), 2);
    }

    #[test]
    fn rejected_command_writes_nothing() {
        let store = Arc::new(InMemoryEventStore::new());
        let dispatcher = CommandDispatcher::new(store.clone());
        let (t, id) = (TenantId::new(), AggregateId::new());

        let err = dispatcher
            .dispatch(t, id, ORDER, place_cmd(t, id), make)
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotFound));
        assert!(store.load_stream(t, id).unwrap().is_empty());
    }

    #[test]
    fn stale_expected_version_is_a_conflict() {
        let dispatcher = CommandDispatcher::new(Arc::new(InMemoryEventStore::new()));
        let (t, id) = (TenantId::new(), AggregateId::new());
        dispatcher.dispatch(t, id, ORDER, create_cmd(t, id), make).unwrap();

        // Someone places the order after our reviewer loaded version 1.
        dispatcher.dispatch(t, id, ORDER, place_cmd(t, id), make).unwrap();

        let err = dispatcher
            .dispatch_expecting(
                t,
                id,
                ORDER,
                cancel_cmd(t, id),
                ExpectedVersion::Exact(1),
                make,
            )
            .unwrap_err();
        assert!(matches!(err, DispatchError::Concurrency(_)));

        let current = dispatcher.load(t, id, make).unwrap().unwrap();
        assert_eq!(current.status(), PurchaseOrderStatus::Ordered);
    }

    #[test]
    fn load_of_unknown_stream_is_none() {
        let dispatcher = CommandDispatcher::new(InMemoryEventStore::new());
        let loaded = dispatcher
            .load(TenantId::new(), AggregateId::new(), make)
            .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn rules_violations_survive_mapping() {
        let dispatcher = CommandDispatcher::new(InMemoryEventStore::new());
        let (t, id) = (TenantId::new(), AggregateId::new());
        let mut cmd = create_cmd(t, id);
        if let PurchaseOrderCommand::CreatePurchaseOrder(c) = &mut cmd {
            c.total_amount = Money::naira(1_070);
        }

        match dispatcher.dispatch(t, id, ORDER, cmd, make).unwrap_err() {
            DispatchError::Rules(v) => assert_eq!(v.len(), 1),
            other => panic!("expected Rules, got {other:?}"),
        }
    }
}
