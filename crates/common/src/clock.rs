use clocksource::coarse::UnixInstant;
use std::sync::atomic::{AtomicI64, Ordering};

/// A source of the server's wall-clock time, expressed as whole seconds
/// since the Unix epoch. The core never calls `SystemTime::now()` directly;
/// every handler is given a `now` value through the `Clock` so that tests
/// can control expiry and lock timing deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Reads real wall-clock time, coarsened to whole seconds.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        UnixInstant::now()
            .duration_since(UnixInstant::EPOCH)
            .as_secs() as i64
    }
}

/// A settable clock for tests and for scenarios that advance time
/// explicitly (e.g. simulating TTL expiry without sleeping).
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overrides_the_current_value() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.now(), 10);
        clock.set(42);
        assert_eq!(clock.now(), 42);
    }

    #[test]
    fn advance_adds_seconds() {
        let clock = ManualClock::new(10);
        clock.advance(5);
        assert_eq!(clock.now(), 15);
    }
}
