use std::fmt::Debug;
use std::time::Instant;

use crate::errors::Error;

/// A monotonic millisecond time source.
///
/// The value wraps around at `u32::MAX`: deadlines are always compared with wrapping arithmetic
/// (see [`remaining`]).
pub trait Clock: Send + Sync + Debug {
    /// Reads the current time in milliseconds.
    fn now_ms(&self) -> Result<u32, Error>;
}

/// The default [`Clock`]: milliseconds elapsed since the clock creation.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Result<u32, Error> {
        // Truncation is the intended wraparound.
        Ok(self.origin.elapsed().as_millis() as u32)
    }
}

/// Signed distance from `now` to `deadline`, modulo the clock width.
///
/// Positive when the deadline is still ahead, zero or negative once it is reached.
pub fn remaining(deadline: u32, now: u32) -> i32 {
    deadline.wrapping_sub(now) as i32
}
