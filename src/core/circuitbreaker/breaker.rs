use super::{CircuitState, State, StateChangeListeners};
use crate::{base::ServiceEndpoint, logging, metrics, utils, utils::Clock, Error};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// `Admission` is the breaker's decision on one invocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Admission {
    /// the circuit is closed
    Pass,
    /// the open timeout has elapsed and this invocation is the half-open trial,
    /// the number identifies the trial
    Probe(u64),
    /// the circuit is open, or a trial is already in flight
    Blocked,
}

struct Guarded {
    circuit: CircuitState,
    // bumped on every Open -> HalfOpen, tells one trial from the next
    trial: u64,
}

/// `Breaker` is the consecutive-failure circuit breaker of one endpoint.
/// All state transitions happen under its own lock, so the transitions of
/// one endpoint are linearizable while different endpoints never contend.
/// Listeners are notified outside the lock, in the same order as the transitions.
pub struct Breaker {
    endpoint: Arc<ServiceEndpoint>,
    clock: Arc<dyn Clock>,
    listeners: Arc<StateChangeListeners>,
    guarded: Mutex<Guarded>,
    // transitions waiting for their notification, queued under `guarded`
    pending: Mutex<VecDeque<(State, CircuitState)>>,
    delivering: AtomicBool,
}

impl Breaker {
    pub fn new(
        endpoint: Arc<ServiceEndpoint>,
        clock: Arc<dyn Clock>,
        listeners: Arc<StateChangeListeners>,
    ) -> Self {
        metrics::set_circuit_state(&endpoint.name, State::Closed);
        Breaker {
            endpoint,
            clock,
            listeners,
            guarded: Mutex::new(Guarded {
                circuit: CircuitState::new(),
                trial: 0,
            }),
            pending: Mutex::new(VecDeque::new()),
            delivering: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn endpoint(&self) -> &Arc<ServiceEndpoint> {
        &self.endpoint
    }

    // the record is updated field by field inside a single critical section,
    // so a poisoned lock still guards a consistent record
    #[inline]
    fn lock(&self) -> MutexGuard<'_, Guarded> {
        self.guarded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `current_state` returns current state of the circuit breaker.
    pub fn current_state(&self) -> State {
        self.lock().circuit.state
    }

    /// `snapshot` copies the circuit record without changing it.
    pub fn snapshot(&self) -> CircuitState {
        self.lock().circuit.clone()
    }

    #[inline]
    fn retry_timeout_arrived(&self, circuit: &CircuitState, now_ms: u64) -> bool {
        match circuit.last_failure_ms {
            Some(last_failure_ms) => {
                now_ms.saturating_sub(last_failure_ms) >= self.endpoint.open_timeout_ms
            }
            None => true,
        }
    }

    /// `try_pass` decides whether an invocation may run.
    /// An open circuit whose timeout has elapsed moves to HalfOpen here,
    /// and the caller that observed it owns the trial.
    pub fn try_pass(&self) -> Admission {
        let mut guarded = self.lock();
        match guarded.circuit.state {
            State::Closed => Admission::Pass,
            State::HalfOpen => Admission::Blocked,
            State::Open => {
                if !self.retry_timeout_arrived(&guarded.circuit, self.clock.now_millis()) {
                    return Admission::Blocked;
                }
                guarded.trial += 1;
                let trial = guarded.trial;
                self.transit(guarded, State::Open, State::HalfOpen);
                Admission::Probe(trial)
            }
        }
    }

    /// `readmit` checks an earlier admission again, for a call that waited for
    /// its concurrency permit. A circuit that opened meanwhile, or a trial that
    /// is no longer the caller's, blocks the call.
    pub fn readmit(&self, admission: Admission) -> Admission {
        let guarded = self.lock();
        match (admission, guarded.circuit.state) {
            (Admission::Probe(trial), State::HalfOpen) if trial == guarded.trial => admission,
            (Admission::Pass, State::Closed) | (Admission::Probe(_), State::Closed) => {
                Admission::Pass
            }
            _ => Admission::Blocked,
        }
    }

    /// `rollback_probe` returns a trial that never ran (e.g. it was rejected for overload)
    /// back to Open. The failure record is left untouched, so the next invocation may probe again.
    /// A trial that is no longer current is left alone.
    pub fn rollback_probe(&self, trial: u64) {
        let guarded = self.lock();
        if guarded.circuit.state != State::HalfOpen || guarded.trial != trial {
            return;
        }
        self.transit(guarded, State::HalfOpen, State::Open);
    }

    /// `on_request_complete` records the outcome of an invocation that ran,
    /// handles the state transformation and returns the record right after it.
    pub fn on_request_complete(&self, err: Option<&Error>) -> CircuitState {
        let mut guarded = self.lock();
        let prev = guarded.circuit.state;
        let circuit = &mut guarded.circuit;
        let next = match err {
            None => {
                circuit.consecutive_failures = 0;
                State::Closed
            }
            Some(_) => {
                circuit.consecutive_failures = circuit.consecutive_failures.saturating_add(1);
                circuit.last_failure_ms = Some(self.clock.now_millis());
                match prev {
                    // a failed trial reopens regardless of the threshold
                    State::HalfOpen => State::Open,
                    State::Closed
                        if circuit.consecutive_failures >= self.endpoint.failure_threshold =>
                    {
                        State::Open
                    }
                    _ => prev,
                }
            }
        };
        if prev == next {
            return guarded.circuit.clone();
        }
        self.transit(guarded, prev, next)
    }

    /// `transit` applies a transition while still holding the lock, so the state
    /// gauge and the notification queue follow the transition order.
    fn transit(
        &self,
        mut guarded: MutexGuard<'_, Guarded>,
        prev: State,
        next: State,
    ) -> CircuitState {
        guarded.circuit.state = next;
        let snapshot = guarded.circuit.clone();
        metrics::add_state_change_counter(&self.endpoint.name, prev, next);
        metrics::set_circuit_state(&self.endpoint.name, next);
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back((prev, snapshot.clone()));
        drop(guarded);
        self.deliver_pending();
        snapshot
    }

    /// Only one thread delivers at a time, the others leave their transitions
    /// queued for it. A listener causing another transition therefore never deadlocks.
    fn deliver_pending(&self) {
        loop {
            if self.delivering.swap(true, Ordering::AcqRel) {
                return;
            }
            let delivering = Delivering(&self.delivering);
            while let Some((prev, snapshot)) = self.next_pending() {
                self.on_transition(prev, &snapshot);
            }
            drop(delivering);
            // a transition queued after the last pop but before the flag was cleared
            if self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
            {
                return;
            }
        }
    }

    fn next_pending(&self) -> Option<(State, CircuitState)> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn on_transition(&self, prev: State, snapshot: &CircuitState) {
        let name = &self.endpoint.name;
        match snapshot.state {
            State::Open => logging::warn!(
                "[CircuitBreaker] Endpoint {} transformed from {} to Open, consecutive failures {}, retry after {}",
                name,
                prev,
                snapshot.consecutive_failures,
                utils::format_time_millis(
                    snapshot
                        .last_failure_ms
                        .unwrap_or_default()
                        .saturating_add(self.endpoint.open_timeout_ms)
                ),
            ),
            State::HalfOpen => logging::info!(
                "[CircuitBreaker] Endpoint {} transformed from {} to HalfOpen, probing",
                name,
                prev
            ),
            State::Closed => logging::info!(
                "[CircuitBreaker] Endpoint {} transformed from {} to Closed",
                name,
                prev
            ),
        }
        self.listeners.notify(prev, &self.endpoint, snapshot);
    }
}

// clears the delivering flag even if a listener panics
struct Delivering<'a>(&'a AtomicBool);

impl Drop for Delivering<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
