//! Fire-and-forget reporting to the error-tracking collaborator.
//!
//! `invoke` must never block on, or fail because of, the tracker. Events are
//! pushed into a bounded queue drained by a dedicated thread; when the queue is
//! full the event is dropped.

use crate::{
    base::ServiceEndpoint,
    circuitbreaker::{CircuitState, State, StateChangeListener},
    health::HealthSnapshot,
    logging, Error, Result,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// `ErrorTracker` is the error-tracking collaborator (e.g. an exception
/// monitoring service). Its methods run on the reporter thread.
pub trait ErrorTracker: Send + Sync {
    fn on_failure(&self, endpoint: &str, error: &str, circuit: &CircuitState);

    fn on_state_change(&self, endpoint: &str, from: State, to: State);

    fn on_health(&self, snapshot: &HealthSnapshot);
}

enum TrackerEvent {
    Failure {
        endpoint: String,
        error: String,
        circuit: CircuitState,
    },
    StateChange {
        endpoint: String,
        from: State,
        to: State,
    },
    Health(HealthSnapshot),
    // acknowledged once every event queued before it has been delivered
    Flush(SyncSender<()>),
}

/// `Reporter` forwards events to an `ErrorTracker` from a background thread.
pub struct Reporter {
    sender: Mutex<Option<SyncSender<TrackerEvent>>>,
    worker: Option<JoinHandle<()>>,
}

impl Reporter {
    pub fn new(tracker: Arc<dyn ErrorTracker>, queue_size: usize) -> Result<Self> {
        if queue_size == 0 {
            return Err(Error::msg("tracker queue size should be positive"));
        }
        let (sender, receiver) = mpsc::sync_channel(queue_size);
        let worker = thread::Builder::new()
            .name("hub-tracker".into())
            .spawn(move || drain(tracker, receiver))?;
        Ok(Reporter {
            sender: Mutex::new(Some(sender)),
            worker: Some(worker),
        })
    }

    fn send(&self, event: TrackerEvent) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = match sender.as_ref() {
            Some(sender) => sender,
            None => return,
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => logging::FREQUENT_ERROR_ONCE.call_once(|| {
                logging::warn!("[Tracker] Event queue is full, events to the error tracker are dropped");
            }),
            Err(TrySendError::Disconnected(_)) => {
                logging::error!("[Tracker] Reporter thread is gone, event dropped")
            }
        }
    }

    pub fn report_failure(&self, endpoint: &str, error: &Error, circuit: &CircuitState) {
        self.send(TrackerEvent::Failure {
            endpoint: endpoint.into(),
            error: format!("{:#}", error),
            circuit: circuit.clone(),
        });
    }

    pub fn report_state_change(&self, endpoint: &str, from: State, to: State) {
        self.send(TrackerEvent::StateChange {
            endpoint: endpoint.into(),
            from,
            to,
        });
    }

    pub fn report_health(&self, snapshot: HealthSnapshot) {
        self.send(TrackerEvent::Health(snapshot));
    }

    /// `flush` blocks until every event queued so far has been handed to the tracker.
    pub fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| Error::msg("reporter is closed"))?;
        sender
            .send(TrackerEvent::Flush(ack_tx))
            .map_err(|_| Error::msg("reporter thread is gone"))?;
        ack_rx
            .recv()
            .map_err(|_| Error::msg("reporter thread is gone"))?;
        Ok(())
    }
}

fn drain(tracker: Arc<dyn ErrorTracker>, receiver: Receiver<TrackerEvent>) {
    for event in receiver {
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| match event {
            TrackerEvent::Failure {
                endpoint,
                error,
                circuit,
            } => tracker.on_failure(&endpoint, &error, &circuit),
            TrackerEvent::StateChange { endpoint, from, to } => {
                tracker.on_state_change(&endpoint, from, to)
            }
            TrackerEvent::Health(snapshot) => tracker.on_health(&snapshot),
            TrackerEvent::Flush(ack) => {
                // the flusher may have given up waiting
                let _ = ack.send(());
            }
        }));
        if delivered.is_err() {
            logging::error!("[Tracker] Error tracker panicked while handling an event");
        }
    }
}

impl Drop for Reporter {
    fn drop(&mut self) {
        // closing the channel ends the worker after it drained the queue
        self.sender
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                logging::error!("[Tracker] Reporter thread panicked");
            }
        }
    }
}

impl StateChangeListener for Reporter {
    fn on_transform_to_closed(&self, prev: State, endpoint: Arc<ServiceEndpoint>) {
        self.report_state_change(&endpoint.name, prev, State::Closed);
    }

    fn on_transform_to_open(
        &self,
        prev: State,
        endpoint: Arc<ServiceEndpoint>,
        _snapshot: CircuitState,
    ) {
        self.report_state_change(&endpoint.name, prev, State::Open);
    }

    fn on_transform_to_half_open(&self, prev: State, endpoint: Arc<ServiceEndpoint>) {
        self.report_state_change(&endpoint.name, prev, State::HalfOpen);
    }
}

#[cfg(test)]
pub(crate) use test::RecordingTracker;
