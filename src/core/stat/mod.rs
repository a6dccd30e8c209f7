//! Cumulative call statistics of each endpoint.
//! They are never reset by circuit transitions, only by `EndpointStat::reset`.

use enum_map::{Enum, EnumMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// `CallEvent` is the event kind counted per endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
pub enum CallEvent {
    /// the invocation was admitted and `work` ran
    Pass,
    /// the invocation was rejected without running
    Reject,
    Success,
    /// `work` returned an error or panicked
    Failure,
}

/// `EndpointStat` records the call counters of one endpoint.
/// Note that all operations of the `EndpointStat` are thread-safe.
#[derive(Default)]
pub struct EndpointStat {
    // EnumMap should work as fast as arrays
    counter: EnumMap<CallEvent, AtomicU64>,
}

impl EndpointStat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add statistic count for the given call event.
    pub fn add(&self, event: CallEvent, count: u64) {
        self.counter[event].fetch_add(count, Ordering::SeqCst);
    }

    /// Get current statistic count of the given call event.
    pub fn get(&self, event: CallEvent) -> u64 {
        self.counter[event].load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        for (_, item) in &self.counter {
            item.store(0, Ordering::SeqCst);
        }
    }
}

impl fmt::Debug for EndpointStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointStat")
            .field("pass", &self.get(CallEvent::Pass))
            .field("reject", &self.get(CallEvent::Reject))
            .field("success", &self.get(CallEvent::Success))
            .field("failure", &self.get(CallEvent::Failure))
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn add_and_reset() {
        let stat = EndpointStat::new();
        stat.add(CallEvent::Pass, 3);
        stat.add(CallEvent::Failure, 1);
        assert_eq!(stat.get(CallEvent::Pass), 3);
        assert_eq!(stat.get(CallEvent::Failure), 1);
        assert_eq!(stat.get(CallEvent::Reject), 0);
        stat.reset();
        assert_eq!(stat.get(CallEvent::Pass), 0);
        assert_eq!(stat.get(CallEvent::Failure), 0);
    }

    #[test]
    fn concurrent_add() {
        let stat = Arc::new(EndpointStat::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let stat = Arc::clone(&stat);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    stat.add(CallEvent::Success, 1);
                }
            }));
        }
        for h in handles {
            h.join().expect("Couldn't join on the associated thread");
        }
        assert_eq!(stat.get(CallEvent::Success), 8000);
    }
}
