use serde::{Deserialize, Serialize};
use std::fmt;

/// States of Circuit Breaker State Machine
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    Closed,
    HalfOpen,
    Open,
}

impl Default for State {
    fn default() -> State {
        State::Closed
    }
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Closed => "Closed",
            State::HalfOpen => "HalfOpen",
            State::Open => "Open",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `CircuitState` is the health record of one endpoint.
/// `state == Open` implies `last_failure_ms` is set,
/// and `consecutive_failures` is zero whenever the circuit closes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitState {
    pub state: State,
    pub consecutive_failures: u64,
    /// unix timestamp (ms) of the latest failure
    pub last_failure_ms: Option<u64>,
}

impl CircuitState {
    pub fn new() -> Self {
        Self::default()
    }
}
