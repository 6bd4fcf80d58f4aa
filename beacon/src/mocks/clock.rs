use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::errors::{ClockError, Error};
use crate::io::Clock;

/// Mock implementation of [`Clock`]: time only moves when told to.
///
/// All clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct MockClock {
    now: Arc<AtomicU32>,
    failing: Arc<AtomicBool>,
}

impl MockClock {
    /// Creates a clock reading `now` (in ms).
    pub fn new(now: u32) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(now)),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Sets the current time (in ms).
    pub fn set(&self, now: u32) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Moves the time forward by `ms` (wrapping around like a hardware counter).
    pub fn advance(&self, ms: u32) -> u32 {
        self.now.fetch_add(ms, Ordering::SeqCst).wrapping_add(ms)
    }

    /// Makes every read fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> Result<u32, Error> {
        match self.failing.load(Ordering::SeqCst) {
            true => Err(ClockError {
                info: String::from("simulated clock failure"),
            }),
            false => Ok(self.now.load(Ordering::SeqCst)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock() {
        let clock = MockClock::new(100);
        let shared = clock.clone();
        assert_eq!(clock.now_ms().unwrap(), 100);
        assert_eq!(shared.advance(50), 150);
        assert_eq!(clock.now_ms().unwrap(), 150);

        clock.set(u32::MAX);
        assert_eq!(clock.advance(1), 0);

        shared.set_failing(true);
        assert!(clock.now_ms().is_err());
        shared.set_failing(false);
        assert_eq!(clock.now_ms().unwrap(), 0);
    }
}
