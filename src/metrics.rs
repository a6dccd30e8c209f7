//! Monitor the hub itself

use crate::{circuitbreaker::State, logging};
use lazy_static::lazy_static;
use prometheus::{default_registry, opts, IntCounterVec, IntGaugeVec, Registry};
use std::sync::Once;

lazy_static! {
    static ref HOST_NAME: String = hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown_host".into());
    static ref HANDLED_COUNTER: IntCounterVec = IntCounterVec::new(
        opts!(
            "hub_endpoint_handled_total",
            "total handled invocations per endpoint and outcome"
        ),
        &["host", "endpoint", "result", "reason"]
    )
    .expect("valid metric options");
    static ref STATE_CHANGE_COUNTER: IntCounterVec = IntCounterVec::new(
        opts!(
            "hub_circuit_breaker_state_changed_total",
            "circuit breaker total state change count"
        ),
        &["host", "endpoint", "from_state", "to_state"]
    )
    .expect("valid metric options");
    static ref CIRCUIT_STATE_GAUGE: IntGaugeVec = IntGaugeVec::new(
        opts!(
            "hub_circuit_breaker_state",
            "current circuit state, 0 for Closed, 1 for HalfOpen, 2 for Open"
        ),
        &["host", "endpoint"]
    )
    .expect("valid metric options");
    static ref REGISTRY_ONCE: Once = Once::new();
}

pub fn add_handled_counter(endpoint: &str, result: &str, reason: &str) {
    HANDLED_COUNTER
        .with_label_values(&[&HOST_NAME, endpoint, result, reason])
        .inc();
}

pub fn add_state_change_counter(endpoint: &str, from: State, to: State) {
    STATE_CHANGE_COUNTER
        .with_label_values(&[&HOST_NAME, endpoint, from.as_str(), to.as_str()])
        .inc();
}

pub fn set_circuit_state(endpoint: &str, state: State) {
    let value = match state {
        State::Closed => 0,
        State::HalfOpen => 1,
        State::Open => 2,
    };
    CIRCUIT_STATE_GAUGE
        .with_label_values(&[&HOST_NAME, endpoint])
        .set(value);
}

/// `register_hub_metrics` registers the hub metrics into `registry`,
/// or into prometheus' default registry. Only the first call has an effect.
pub fn register_hub_metrics(registry: Option<Box<Registry>>) {
    REGISTRY_ONCE.call_once(move || {
        let r: &Registry = match registry {
            Some(ref r) => r,
            None => default_registry(),
        };
        let registered = r
            .register(Box::new(HANDLED_COUNTER.clone()))
            .and_then(|_| r.register(Box::new(STATE_CHANGE_COUNTER.clone())))
            .and_then(|_| r.register(Box::new(CIRCUIT_STATE_GAUGE.clone())));
        if let Err(err) = registered {
            logging::error!("[Metrics] Fail to register hub metrics: {:?}", err);
        }
    });
}

pub fn reset_hub_metrics() {
    HANDLED_COUNTER.reset();
    STATE_CHANGE_COUNTER.reset();
    CIRCUIT_STATE_GAUGE.reset();
}
