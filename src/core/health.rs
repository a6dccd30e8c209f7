use crate::{circuitbreaker::State, utils};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// `EndpointHealth` is the read-only view of one endpoint at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointHealth {
    pub state: State,
    pub consecutive_failures: u64,
    pub last_failure_ms: Option<u64>,
    /// calls currently running `work`
    pub in_flight: u32,
    pub passed: u64,
    pub rejected: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// `HealthSnapshot` maps every registered endpoint name to its health.
/// Taking a snapshot never changes any circuit, in particular an expired
/// Open circuit is still reported as Open until the next invocation probes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub taken_at_ms: u64,
    pub endpoints: BTreeMap<String, EndpointHealth>,
}

impl HealthSnapshot {
    pub fn new(taken_at_ms: u64) -> Self {
        HealthSnapshot {
            taken_at_ms,
            endpoints: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&EndpointHealth> {
        self.endpoints.get(name)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// names of the endpoints that are not Closed
    pub fn open_endpoints(&self) -> Vec<&str> {
        self.endpoints
            .iter()
            .filter(|(_, health)| health.state != State::Closed)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for HealthSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "health at {}", utils::format_time_millis(self.taken_at_ms))?;
        match serde_json::to_string_pretty(&self.endpoints) {
            Ok(fmtted) => write!(f, "{}", fmtted),
            Err(_) => write!(f, "{:?}", self.endpoints),
        }
    }
}
