use integration_hub::{
    circuitbreaker::State,
    tracker::ErrorTracker,
    utils::{Clock, ManualClock},
    CallOutcome, DispatchError, Dispatcher, Error, RejectReason, Result, ServiceEndpoint,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// stands in for an email SDK client, constructed once and handed to the `work` closures
struct Mailer {
    up: Mutex<bool>,
    sent: AtomicUsize,
}

impl Mailer {
    fn new() -> Self {
        Mailer {
            up: Mutex::new(false),
            sent: AtomicUsize::new(0),
        }
    }

    fn set_up(&self, up: bool) {
        *self.up.lock().unwrap() = up;
    }

    fn send(&self, to: &str) -> Result<String> {
        let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.up.lock().unwrap() {
            Ok(format!("message {} to {}", n, to))
        } else {
            Err(Error::msg("smtp connection refused"))
        }
    }

    fn calls(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct Tracker {
    failures: AtomicUsize,
    transitions: Mutex<Vec<(State, State)>>,
}

impl ErrorTracker for Tracker {
    fn on_failure(&self, _: &str, _: &str, _: &integration_hub::circuitbreaker::CircuitState) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_state_change(&self, _: &str, from: State, to: State) {
        self.transitions.lock().unwrap().push((from, to));
    }

    fn on_health(&self, _: &integration_hub::health::HealthSnapshot) {}
}

#[test]
fn email_outage_and_recovery() {
    let clock = Arc::new(ManualClock::new(1_600_000_000_000));
    let tracker = Arc::new(Tracker::default());
    let dispatcher = Dispatcher::builder()
        .with_clock(clock.clone())
        .with_tracker(tracker.clone())
        .build()
        .unwrap();
    dispatcher
        .register(ServiceEndpoint::new("email", 3, Duration::from_secs(60)))
        .unwrap();
    let mailer = Mailer::new();

    for _ in 0..3 {
        let outcome = dispatcher
            .invoke("email", || mailer.send("ada@example.com"))
            .unwrap();
        assert!(outcome.is_failure());
    }
    let health = dispatcher.health();
    assert_eq!(health.get("email").unwrap().state, State::Open);
    assert_eq!(health.get("email").unwrap().consecutive_failures, 3);

    let outcome = dispatcher
        .invoke("email", || mailer.send("ada@example.com"))
        .unwrap();
    match outcome {
        CallOutcome::Rejected(reason) => assert_eq!(reason.to_string(), "circuit-open"),
        other => panic!("expected a rejection, got {:?}", other),
    }
    assert_eq!(mailer.calls(), 3);

    clock.advance(Duration::from_secs(61));
    mailer.set_up(true);
    let outcome = dispatcher
        .invoke("email", || mailer.send("ada@example.com"))
        .unwrap();
    assert_eq!(
        outcome.success().as_deref(),
        Some("message 4 to ada@example.com")
    );
    assert_eq!(mailer.calls(), 4);
    let health = dispatcher.health_of("email").unwrap();
    assert_eq!(health.state, State::Closed);
    assert_eq!(health.consecutive_failures, 0);
    assert_eq!(health.last_failure_ms, Some(clock.now_millis() - 61_000));

    dispatcher.flush_tracker().unwrap();
    assert_eq!(tracker.failures.load(Ordering::SeqCst), 3);
    assert_eq!(
        *tracker.transitions.lock().unwrap(),
        vec![
            (State::Closed, State::Open),
            (State::Open, State::HalfOpen),
            (State::HalfOpen, State::Closed),
        ]
    );
}

#[test]
fn endpoints_are_isolated() {
    let clock = Arc::new(ManualClock::new(0));
    let dispatcher = Dispatcher::builder()
        .with_clock(clock)
        .with_endpoint(ServiceEndpoint::new("sms", 1, Duration::from_secs(30)))
        .with_endpoint(ServiceEndpoint::new("calendar", 1, Duration::from_secs(30)))
        .build()
        .unwrap();
    let outcome = dispatcher
        .invoke("sms", || -> Result<()> { Err(Error::msg("carrier down")) })
        .unwrap();
    assert!(outcome.is_failure());
    assert_eq!(
        dispatcher.invoke("sms", || Ok(())).unwrap().reject_reason(),
        Some(RejectReason::CircuitOpen)
    );
    assert!(dispatcher.invoke("calendar", || Ok(())).unwrap().is_success());
    assert_eq!(dispatcher.health().open_endpoints(), vec!["sms"]);
}

#[test]
fn misuse_is_an_error() {
    let dispatcher = Dispatcher::new();
    dispatcher
        .register(ServiceEndpoint::new("payment", 2, Duration::from_secs(10)))
        .unwrap();
    assert_eq!(
        dispatcher
            .register(ServiceEndpoint::new("payment", 5, Duration::from_secs(10)))
            .unwrap_err(),
        DispatchError::DuplicateEndpoint("payment".into())
    );
    assert_eq!(
        dispatcher.invoke("refunds", || Ok(())).unwrap_err(),
        DispatchError::UnknownEndpoint("refunds".into())
    );
}

#[test]
fn from_config_file() {
    let dispatcher = integration_hub::init_with_config_file("testdata/config/hub.yaml").unwrap();
    let endpoints = dispatcher.endpoints();
    assert_eq!(endpoints.len(), 3);
    assert_eq!(endpoints[1].name, "sms-provider");
    assert_eq!(endpoints[1].max_concurrency, 16);
    let outcome = dispatcher
        .invoke("payment-provider", || Ok(42))
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(outcome, 42);
}

#[cfg(feature = "async")]
#[tokio::test]
async fn async_invoke_from_an_executor() {
    let dispatcher = Arc::new(
        Dispatcher::builder()
            .with_endpoint(ServiceEndpoint::new("analytics", 2, Duration::from_secs(5)))
            .build()
            .unwrap(),
    );
    let mut tasks = Vec::new();
    for i in 0..8u32 {
        let dispatcher = Arc::clone(&dispatcher);
        tasks.push(tokio::spawn(async move {
            dispatcher
                .invoke_async("analytics", move || {
                    std::thread::sleep(Duration::from_millis(2));
                    Ok(i)
                })
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().is_success());
    }
    assert_eq!(dispatcher.health_of("analytics").unwrap().succeeded, 8);
}
