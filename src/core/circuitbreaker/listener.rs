use super::{CircuitState, State};
use crate::base::ServiceEndpoint;
use std::sync::{Arc, PoisonError, RwLock};

/// `StateChangeListener` listens on the circuit breaker state change event.
/// Listeners are called after the endpoint lock is released, so they may read the
/// dispatcher (e.g. take a health snapshot). The transitions of one endpoint are
/// delivered in order, on one of the invoking threads, so listeners should return quickly.
pub trait StateChangeListener: Sync + Send {
    /// `on_transform_to_closed` is triggered when circuit breaker state transformed to Closed.
    fn on_transform_to_closed(&self, prev: State, endpoint: Arc<ServiceEndpoint>);

    /// `on_transform_to_open` is triggered when circuit breaker state transformed to Open.
    /// The "snapshot" is the circuit record right after the transformation.
    fn on_transform_to_open(
        &self,
        prev: State,
        endpoint: Arc<ServiceEndpoint>,
        snapshot: CircuitState,
    );

    /// `on_transform_to_half_open` is triggered when circuit breaker state transformed to HalfOpen.
    fn on_transform_to_half_open(&self, prev: State, endpoint: Arc<ServiceEndpoint>);
}

/// `StateChangeListeners` is the listener list shared by all breakers of one dispatcher.
#[derive(Default)]
pub struct StateChangeListeners {
    listeners: RwLock<Vec<Arc<dyn StateChangeListener>>>,
}

impl StateChangeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, mut listeners: Vec<Arc<dyn StateChangeListener>>) {
        if listeners.is_empty() {
            return;
        }
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .append(&mut listeners);
    }

    pub fn clear(&self) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify(
        &self,
        prev: State,
        endpoint: &Arc<ServiceEndpoint>,
        snapshot: &CircuitState,
    ) {
        // clone the list so that a listener may register others without deadlocking
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in &listeners {
            match snapshot.state {
                State::Closed => listener.on_transform_to_closed(prev, Arc::clone(endpoint)),
                State::Open => listener.on_transform_to_open(
                    prev,
                    Arc::clone(endpoint),
                    snapshot.clone(),
                ),
                State::HalfOpen => {
                    listener.on_transform_to_half_open(prev, Arc::clone(endpoint))
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) use test::MockStateListener;
