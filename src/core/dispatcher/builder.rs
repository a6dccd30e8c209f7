use super::Dispatcher;
use crate::{
    base::ServiceEndpoint,
    circuitbreaker::{StateChangeListener, StateChangeListeners},
    config::{ConfigEntity, DEFAULT_TRACKER_QUEUE_SIZE},
    isolation::OverloadPolicy,
    tracker::{ErrorTracker, Reporter},
    utils::{Clock, SystemClock},
    Result,
};
use std::sync::Arc;

/// `DispatcherBuilder` wires the collaborators of a `Dispatcher`:
/// its clock, the error tracker, state change listeners and the initial endpoints.
pub struct DispatcherBuilder {
    clock: Arc<dyn Clock>,
    overload_policy: OverloadPolicy,
    tracker: Option<Arc<dyn ErrorTracker>>,
    tracker_queue_size: usize,
    listeners: Vec<Arc<dyn StateChangeListener>>,
    endpoints: Vec<ServiceEndpoint>,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        DispatcherBuilder {
            clock: Arc::new(SystemClock),
            overload_policy: OverloadPolicy::default(),
            tracker: None,
            tracker_queue_size: DEFAULT_TRACKER_QUEUE_SIZE,
            listeners: Vec::new(),
            endpoints: Vec::new(),
        }
    }
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_overload_policy(mut self, policy: OverloadPolicy) -> Self {
        self.overload_policy = policy;
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn ErrorTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn with_tracker_queue_size(mut self, queue_size: usize) -> Self {
        self.tracker_queue_size = queue_size;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn StateChangeListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_endpoint(mut self, endpoint: ServiceEndpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// `with_config` takes the overload policy, the tracker queue size
    /// and the endpoints of the dispatcher section.
    pub fn with_config(mut self, entity: &ConfigEntity) -> Self {
        let dispatcher = &entity.config.dispatcher;
        self.overload_policy = dispatcher.overload_policy;
        self.tracker_queue_size = dispatcher.tracker_queue_size;
        self.endpoints.extend(dispatcher.endpoints.iter().cloned());
        self
    }

    /// `build` fails if an endpoint is invalid or registered twice,
    /// or if the tracker thread cannot be started.
    pub fn build(self) -> Result<Dispatcher> {
        let listeners = Arc::new(StateChangeListeners::new());
        let reporter = match self.tracker {
            Some(tracker) => {
                let reporter = Arc::new(Reporter::new(tracker, self.tracker_queue_size)?);
                let forward: Arc<dyn StateChangeListener> = reporter.clone();
                listeners.register(vec![forward]);
                Some(reporter)
            }
            None => None,
        };
        listeners.register(self.listeners);
        let dispatcher =
            Dispatcher::assemble(self.clock, self.overload_policy, reporter, listeners);
        for endpoint in self.endpoints {
            dispatcher.register(endpoint)?;
        }
        Ok(dispatcher)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::DispatchError;
    use crate::tracker::RecordingTracker;
    use std::time::Duration;

    #[test]
    fn from_config() {
        let mut entity = ConfigEntity::new();
        entity.config.dispatcher.overload_policy = OverloadPolicy::Queue;
        entity.config.dispatcher.endpoints = vec![
            ServiceEndpoint::new("builder-email", 3, Duration::from_secs(60)),
            ServiceEndpoint::new("builder-sms", 5, Duration::from_secs(30)).with_max_concurrency(4),
        ];
        let dispatcher = Dispatcher::builder().with_config(&entity).build().unwrap();
        assert_eq!(dispatcher.overload_policy(), OverloadPolicy::Queue);
        let names: Vec<_> = dispatcher
            .endpoints()
            .iter()
            .map(|e| e.name.clone())
            .collect();
        assert_eq!(names, vec!["builder-email", "builder-sms"]);
    }

    #[test]
    fn duplicate_fails_fast() {
        let err = Dispatcher::builder()
            .with_endpoint(ServiceEndpoint::new("builder-dup", 3, Duration::from_secs(60)))
            .with_endpoint(ServiceEndpoint::new("builder-dup", 3, Duration::from_secs(60)))
            .build()
            .err()
            .unwrap();
        assert_eq!(
            err.downcast_ref::<DispatchError>(),
            Some(&DispatchError::DuplicateEndpoint("builder-dup".into()))
        );
    }

    #[test]
    fn zero_tracker_queue() {
        let result = Dispatcher::builder()
            .with_tracker(Arc::new(RecordingTracker::default()))
            .with_tracker_queue_size(0)
            .build();
        assert!(result.is_err());
    }
}
