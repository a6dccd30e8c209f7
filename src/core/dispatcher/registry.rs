use crate::{
    base::ServiceEndpoint,
    circuitbreaker::{Breaker, StateChangeListeners},
    health::EndpointHealth,
    isolation::{ConcurrencyLimiter, OverloadPolicy},
    stat::{CallEvent, EndpointStat},
    utils::Clock,
};
use std::collections::HashMap;
use std::sync::Arc;

/// index of a slot in the registry arena, stable for the dispatcher's lifetime
pub(crate) type EndpointId = usize;

/// `Slot` bundles everything guarding one endpoint.
/// Each part carries its own synchronization, so slots are shared as `Arc`s
/// and used without holding the registry lock.
pub(crate) struct Slot {
    pub(crate) endpoint: Arc<ServiceEndpoint>,
    pub(crate) breaker: Breaker,
    pub(crate) limiter: ConcurrencyLimiter,
    pub(crate) stat: EndpointStat,
}

impl Slot {
    pub(crate) fn new(
        endpoint: Arc<ServiceEndpoint>,
        clock: Arc<dyn Clock>,
        listeners: Arc<StateChangeListeners>,
        policy: OverloadPolicy,
    ) -> Self {
        let limiter = ConcurrencyLimiter::new(endpoint.max_concurrency, policy);
        Slot {
            breaker: Breaker::new(Arc::clone(&endpoint), clock, listeners),
            limiter,
            stat: EndpointStat::new(),
            endpoint,
        }
    }

    pub(crate) fn health(&self) -> EndpointHealth {
        let circuit = self.breaker.snapshot();
        EndpointHealth {
            state: circuit.state,
            consecutive_failures: circuit.consecutive_failures,
            last_failure_ms: circuit.last_failure_ms,
            in_flight: self.limiter.in_flight(),
            passed: self.stat.get(CallEvent::Pass),
            rejected: self.stat.get(CallEvent::Reject),
            succeeded: self.stat.get(CallEvent::Success),
            failed: self.stat.get(CallEvent::Failure),
        }
    }
}

/// `Registry` is the keyed arena of endpoints. Slots are only ever appended.
#[derive(Default)]
pub(crate) struct Registry {
    slots: Vec<Arc<Slot>>,
    index: HashMap<String, EndpointId>,
}

impl Registry {
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// the caller checks for duplicates first
    pub(crate) fn insert(&mut self, slot: Slot) -> EndpointId {
        let id = self.slots.len();
        self.index.insert(slot.endpoint.name.clone(), id);
        self.slots.push(Arc::new(slot));
        id
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Arc<Slot>> {
        self.index.get(name).map(|&id| &self.slots[id])
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<Slot>> {
        self.slots.iter()
    }
}
