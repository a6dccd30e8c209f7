use std::convert::TryFrom;
use lazy_static::lazy_static;
use std::sync::atomic::{AtomicU64, Ordering};
use time::{macros::format_description, Duration, OffsetDateTime};

lazy_static! {
    static ref UNIX_TIME_UNIT_OFFSET: i128 = Duration::MILLISECOND.whole_nanoseconds();
}

#[inline]
pub fn curr_time_millis() -> u64 {
    u64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / (*UNIX_TIME_UNIT_OFFSET))
        .unwrap_or_default()
}

#[inline]
pub fn milli2nano<T: Into<i128>>(t: T) -> i128 {
    *UNIX_TIME_UNIT_OFFSET * t.into()
}

/// Formats a unix timestamp in milliseconds as `YYYY-MM-DD hh:mm:ss` (UTC).
/// Out-of-range timestamps fall back to the raw number.
pub fn format_time_millis(ts_millis: u64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(milli2nano(ts_millis))
        .ok()
        .and_then(|t| {
            t.format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .ok()
        })
        .unwrap_or_else(|| ts_millis.to_string())
}

/// `Clock` is the time source of the circuit breakers.
pub trait Clock: Send + Sync {
    /// current unix timestamp in milliseconds
    fn now_millis(&self) -> u64;
}

/// `SystemClock` reads the wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now_millis(&self) -> u64 {
        curr_time_millis()
    }
}

/// `ManualClock` only moves when told to, so open timeouts can be simulated
/// without sleeping.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        ManualClock {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn set_millis(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, step: std::time::Duration) {
        let step_ms = u64::try_from(step.as_millis()).unwrap_or(u64::MAX);
        // the closure always returns `Some`, the update cannot fail
        let _ = self
            .now_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(step_ms))
            });
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_millis(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn manual_clock_moves_on_demand() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_millis(), 1_000);
        clock.advance(std::time::Duration::from_secs(61));
        assert_eq!(clock.now_millis(), 62_000);
        clock.set_millis(5);
        assert_eq!(clock.now_millis(), 5);
    }

    #[test]
    fn manual_clock_saturates() {
        let clock = ManualClock::new(1_000);
        clock.advance(std::time::Duration::MAX);
        assert_eq!(clock.now_millis(), u64::MAX);
        clock.advance(std::time::Duration::from_secs(1));
        assert_eq!(clock.now_millis(), u64::MAX);
    }

    #[test]
    fn format_millis() {
        assert_eq!(format_time_millis(0), "1970-01-01 00:00:00");
        assert_eq!(format_time_millis(86_400_000 + 3_661_000), "1970-01-02 01:01:01");
    }

    #[test]
    fn system_clock_is_monotone_enough() {
        let before = curr_time_millis();
        let now = SystemClock.now_millis();
        assert!(now >= before);
    }
}
