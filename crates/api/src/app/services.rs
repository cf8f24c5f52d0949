use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use storeline_core::{Aggregate, AggregateId, DomainError, ExpectedVersion, TenantId};
use storeline_infra::{CommandDispatcher, Committed, DispatchError, InMemoryEventStore};

pub type InMemoryDispatcher = CommandDispatcher<Arc<InMemoryEventStore>>;

/// Shared handles for request handlers.
#[derive(Debug, Clone)]
pub struct AppServices {
    dispatcher: Arc<InMemoryDispatcher>,
}

impl AppServices {
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        Self {
            dispatcher: Arc::new(CommandDispatcher::new(store)),
        }
    }

    pub fn dispatch<A>(
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
        self.dispatcher.dispatch_expecting(
            tenant_id,
            aggregate_id,
            aggregate_type,
            command,
            expected,
            make_aggregate,
        )
    }

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
        self.dispatcher.load(tenant_id, aggregate_id, make_aggregate)
    }
}
