use crate::{logging, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// `OverloadPolicy` decides what happens to a call beyond the concurrency cap.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverloadPolicy {
    /// reject with `RejectReason::Overloaded`
    Reject,
    /// wait for a permit in FIFO order
    Queue,
}

impl Default for OverloadPolicy {
    fn default() -> OverloadPolicy {
        OverloadPolicy::Reject
    }
}

impl fmt::Display for OverloadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverloadPolicy::Reject => write!(f, "reject"),
            OverloadPolicy::Queue => write!(f, "queue"),
        }
    }
}

impl FromStr for OverloadPolicy {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(OverloadPolicy::Reject),
            "queue" => Ok(OverloadPolicy::Queue),
            other => Err(Error::msg(format!("unknown overload policy: {}", other))),
        }
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    in_flight: u32,
    // FIFO tickets, only used by `OverloadPolicy::Queue`
    next_ticket: u64,
    serving: u64,
}

/// `ConcurrencyLimiter` bounds the in-flight calls of one endpoint.
/// A `max_concurrency` of `0` means unlimited, the in-flight count is still tracked.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    max_concurrency: u32,
    policy: OverloadPolicy,
    state: Mutex<LimiterState>,
    available: Condvar,
}

impl ConcurrencyLimiter {
    pub fn new(max_concurrency: u32, policy: OverloadPolicy) -> Self {
        ConcurrencyLimiter {
            max_concurrency,
            policy,
            state: Mutex::new(LimiterState::default()),
            available: Condvar::new(),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub fn policy(&self) -> OverloadPolicy {
        self.policy
    }

    pub fn in_flight(&self) -> u32 {
        self.lock().in_flight
    }

    /// calls holding a ticket but no permit yet
    #[cfg(test)]
    pub(crate) fn queued(&self) -> u64 {
        let state = self.lock();
        state.next_ticket - state.serving
    }

    /// `acquire` takes a permit for one call.
    /// `None` means the call is rejected, which only happens under `OverloadPolicy::Reject`.
    pub fn acquire(&self) -> Option<Permit<'_>> {
        let mut state = self.lock();
        if self.max_concurrency == 0 {
            state.in_flight += 1;
            return Some(Permit { limiter: self });
        }
        match self.policy {
            OverloadPolicy::Reject => {
                if state.in_flight >= self.max_concurrency {
                    logging::debug!(
                        "[Isolation] concurrency exceeds threshold, in flight {}, threshold {}",
                        state.in_flight,
                        self.max_concurrency
                    );
                    return None;
                }
            }
            OverloadPolicy::Queue => {
                let ticket = state.next_ticket;
                state.next_ticket += 1;
                while ticket != state.serving || state.in_flight >= self.max_concurrency {
                    state = self
                        .available
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                state.serving += 1;
                // the next ticket holder may be able to proceed as well
                self.available.notify_all();
            }
        }
        state.in_flight += 1;
        Some(Permit { limiter: self })
    }

    fn release(&self) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        drop(state);
        self.available.notify_all();
    }
}

/// `Permit` holds one in-flight slot and gives it back when dropped,
/// including when the guarded call panics.
#[derive(Debug)]
pub struct Permit<'a> {
    limiter: &'a ConcurrencyLimiter,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
