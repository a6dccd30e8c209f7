//! The dispatcher routes every call to an external collaborator through the
//! circuit breaker and the concurrency limiter of its endpoint.
//!
//! One invocation goes through these steps:
//!  1. look up the endpoint, an unknown name fails without touching any state;
//!  2. ask the breaker for admission, an open circuit rejects at once;
//!  3. take a concurrency permit, or reject/queue depending on the `OverloadPolicy`;
//!  4. run `work`, a panic is caught and counted as a failure;
//!  5. record the outcome on the breaker, which may change the circuit state.
//!
//! The dispatcher never retries `work` and never imposes a timeout on it.

mod builder;
mod nonblocking;
mod registry;

pub use builder::*;

use self::registry::{Registry, Slot};
use crate::{
    base::{CallOutcome, DispatchError, DispatchResult, RejectReason, ServiceEndpoint},
    circuitbreaker::{Admission, StateChangeListener, StateChangeListeners},
    health::{EndpointHealth, HealthSnapshot},
    isolation::OverloadPolicy,
    logging, metrics,
    stat::CallEvent,
    tracker::Reporter,
    utils::{Clock, SystemClock},
    Error, Result,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

/// `Dispatcher` owns the registered endpoints and guards calls to them.
/// It is `Send + Sync`, share it between threads with an `Arc`.
pub struct Dispatcher {
    registry: RwLock<Registry>,
    clock: Arc<dyn Clock>,
    listeners: Arc<StateChangeListeners>,
    overload_policy: OverloadPolicy,
    reporter: Option<Arc<Reporter>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new()
    }
}

impl Dispatcher {
    /// A dispatcher on the system clock, rejecting overload, without error tracker.
    pub fn new() -> Self {
        Dispatcher::assemble(
            Arc::new(SystemClock),
            OverloadPolicy::default(),
            None,
            Arc::new(StateChangeListeners::new()),
        )
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub(crate) fn assemble(
        clock: Arc<dyn Clock>,
        overload_policy: OverloadPolicy,
        reporter: Option<Arc<Reporter>>,
        listeners: Arc<StateChangeListeners>,
    ) -> Self {
        Dispatcher {
            registry: RwLock::new(Registry::default()),
            clock,
            listeners,
            overload_policy,
            reporter,
        }
    }

    #[inline]
    pub fn overload_policy(&self) -> OverloadPolicy {
        self.overload_policy
    }

    /// `register` adds an endpoint with a fresh Closed circuit.
    /// A name can only be registered once, the first registration stays untouched.
    pub fn register(&self, endpoint: ServiceEndpoint) -> DispatchResult<()> {
        endpoint.is_valid()?;
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if registry.contains(&endpoint.name) {
            logging::warn!(
                "[Dispatcher] Endpoint {} is already registered, ignoring {}",
                endpoint.name,
                endpoint
            );
            return Err(DispatchError::DuplicateEndpoint(endpoint.name));
        }
        let endpoint = Arc::new(endpoint);
        registry.insert(Slot::new(
            Arc::clone(&endpoint),
            Arc::clone(&self.clock),
            Arc::clone(&self.listeners),
            self.overload_policy,
        ));
        drop(registry);
        logging::info!("[Dispatcher] Endpoint registered: {}", endpoint);
        Ok(())
    }

    /// registered endpoints, in registration order
    pub fn endpoints(&self) -> Vec<Arc<ServiceEndpoint>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|slot| Arc::clone(&slot.endpoint))
            .collect()
    }

    fn slot(&self, name: &str) -> DispatchResult<Arc<Slot>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownEndpoint(name.into()))
    }

    /// `invoke` runs `work` against the named endpoint if its circuit admits it.
    ///
    /// `Err` is only returned for an unregistered name. Every other result,
    /// including collaborator failures and rejections, is a `CallOutcome`.
    pub fn invoke<T, F>(&self, name: &str, work: F) -> DispatchResult<CallOutcome<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let slot = self.slot(name)?;
        Ok(self.invoke_slot(&slot, work))
    }

    fn invoke_slot<T, F>(&self, slot: &Slot, work: F) -> CallOutcome<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let admission = slot.breaker.try_pass();
        if admission == Admission::Blocked {
            return self.reject(slot, RejectReason::CircuitOpen);
        }
        let permit = match slot.limiter.acquire() {
            Some(permit) => permit,
            None => {
                if let Admission::Probe(trial) = admission {
                    slot.breaker.rollback_probe(trial);
                }
                return self.reject(slot, RejectReason::Overloaded);
            }
        };
        // the circuit may have opened while the call was queued
        if slot.limiter.policy() == OverloadPolicy::Queue
            && slot.breaker.readmit(admission) == Admission::Blocked
        {
            drop(permit);
            return self.reject(slot, RejectReason::CircuitOpen);
        }
        slot.stat.add(CallEvent::Pass, 1);

        // the outcome is recorded before the permit goes to the next caller
        let result = run_guarded(work);
        let circuit = slot.breaker.on_request_complete(result.as_ref().err());
        let name = &slot.endpoint.name;
        match result {
            Ok(value) => {
                slot.stat.add(CallEvent::Success, 1);
                metrics::add_handled_counter(name, "success", "");
                CallOutcome::Success(value)
            }
            Err(err) => {
                slot.stat.add(CallEvent::Failure, 1);
                metrics::add_handled_counter(name, "failure", "");
                logging::warn!(
                    "[Dispatcher] Call to endpoint {} failed, consecutive failures {}, state {}, error: {:#}",
                    name,
                    circuit.consecutive_failures,
                    circuit.state,
                    err
                );
                if let Some(reporter) = &self.reporter {
                    reporter.report_failure(name, &err, &circuit);
                }
                CallOutcome::Failure(err)
            }
        }
    }

    fn reject<T>(&self, slot: &Slot, reason: RejectReason) -> CallOutcome<T> {
        slot.stat.add(CallEvent::Reject, 1);
        metrics::add_handled_counter(&slot.endpoint.name, "rejected", reason.as_str());
        logging::debug!(
            "[Dispatcher] Call to endpoint {} rejected: {}",
            slot.endpoint.name,
            reason
        );
        CallOutcome::Rejected(reason)
    }

    /// `health` takes a read-only snapshot of every endpoint.
    /// It never changes a circuit, an expired Open circuit is still reported Open.
    pub fn health(&self) -> HealthSnapshot {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let mut snapshot = HealthSnapshot::new(self.clock.now_millis());
        for slot in registry.iter() {
            snapshot
                .endpoints
                .insert(slot.endpoint.name.clone(), slot.health());
        }
        snapshot
    }

    pub fn health_of(&self, name: &str) -> DispatchResult<EndpointHealth> {
        Ok(self.slot(name)?.health())
    }

    /// `report_health` hands a fresh snapshot to the error tracker, if any, and returns it.
    pub fn report_health(&self) -> HealthSnapshot {
        let snapshot = self.health();
        if let Some(reporter) = &self.reporter {
            reporter.report_health(snapshot.clone());
        }
        snapshot
    }

    /// `flush_tracker` waits until the error tracker has seen every event reported so far.
    pub fn flush_tracker(&self) -> Result<()> {
        match &self.reporter {
            Some(reporter) => reporter.flush(),
            None => Ok(()),
        }
    }

    pub fn register_state_change_listeners(&self, listeners: Vec<Arc<dyn StateChangeListener>>) {
        self.listeners.register(listeners);
    }

    /// `clear_state_change_listeners` removes the listeners registered so far.
    /// State changes are still forwarded to the error tracker.
    pub fn clear_state_change_listeners(&self) {
        self.listeners.clear();
        if let Some(reporter) = &self.reporter {
            let reporter: Arc<dyn StateChangeListener> = reporter.clone();
            self.listeners.register(vec![reporter]);
        }
    }
}

fn run_guarded<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => result,
        Err(payload) => Err(Error::msg(format!(
            "collaborator call panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
