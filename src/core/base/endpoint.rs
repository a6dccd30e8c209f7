use std::convert::TryFrom;
use super::{DispatchError, DispatchResult};
use crate::config::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_OPEN_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// `ServiceEndpoint` identifies one named external collaborator,
/// e.g. "email-provider" or "payment-provider".
/// It is immutable once registered in a `Dispatcher`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceEndpoint {
    /// unique name of the endpoint
    pub name: String,
    /// `failure_threshold` is the number of consecutive failures that opens the circuit.
    pub failure_threshold: u64,
    /// `open_timeout_ms` represents how long (in milliseconds) an open circuit rejects calls.
    /// After that, the next call is let through as the half-open trial.
    pub open_timeout_ms: u64,
    /// `max_concurrency` caps the simultaneous in-flight calls, `0` means unlimited.
    pub max_concurrency: u32,
}

impl Default for ServiceEndpoint {
    fn default() -> Self {
        ServiceEndpoint {
            name: String::default(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            open_timeout_ms: DEFAULT_OPEN_TIMEOUT_MS,
            max_concurrency: 0,
        }
    }
}

impl ServiceEndpoint {
    pub fn new<S: Into<String>>(name: S, failure_threshold: u64, open_timeout: Duration) -> Self {
        ServiceEndpoint {
            name: name.into(),
            failure_threshold,
            open_timeout_ms: u64::try_from(open_timeout.as_millis()).unwrap_or(u64::MAX),
            ..Default::default()
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: u32) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    #[inline]
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    pub fn is_valid(&self) -> DispatchResult<()> {
        let invalid = |reason: &str| DispatchError::InvalidEndpoint {
            name: self.name.clone(),
            reason: reason.into(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("empty endpoint name"));
        }
        if self.failure_threshold == 0 {
            return Err(invalid("zero failure_threshold"));
        }
        if self.open_timeout_ms == 0 {
            return Err(invalid("zero open_timeout_ms"));
        }
        Ok(())
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(fmtted) => write!(f, "{}", fmtted),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}
