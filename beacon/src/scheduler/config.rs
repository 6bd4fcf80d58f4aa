use std::time::Duration;

/// Tuning of the scheduler loop.
///
/// # Example
/// ```
/// use beacon::scheduler::SchedulerConfig;
///
/// let config = SchedulerConfig::default()
///     .with_floor_delay(5)
///     .with_idle_delay(250)
///     .with_capacity(8);
/// assert_eq!(config.get_floor_delay().as_millis(), 5);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Minimum suspend duration of a cycle (in ms): bounds the loop frequency.
    pub floor_delay_ms: u64,
    /// Suspend duration (in ms) when no indicator is running.
    pub idle_delay_ms: u64,
    /// Maximum number of indicators registered at once.
    pub capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            floor_delay_ms: 10,
            idle_delay_ms: 100,
            capacity: 64,
        }
    }
}

impl SchedulerConfig {
    /// Sets the floor delay (in ms). A zero floor is raised to 1ms to keep the loop from spinning.
    pub fn with_floor_delay(mut self, ms: u64) -> Self {
        self.floor_delay_ms = ms.max(1);
        self
    }

    /// Sets the idle delay (in ms).
    pub fn with_idle_delay(mut self, ms: u64) -> Self {
        self.idle_delay_ms = ms;
        self
    }

    /// Sets the maximum number of indicators.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn get_floor_delay(&self) -> Duration {
        Duration::from_millis(self.floor_delay_ms.max(1))
    }

    pub fn get_idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    /// Computes how long the loop suspends after a cycle.
    ///
    /// # Parameters
    /// * `min_wake`: the smallest wake request (in ms) of all running indicators, `None` if no
    ///   indicator is running. Zero or negative requests mean "as soon as possible".
    ///
    /// # Returns
    /// `max(min_wake, floor_delay)` when some indicator is running, the idle delay otherwise.
    pub fn sleep_duration(&self, min_wake: Option<i32>) -> Duration {
        match min_wake {
            None => self.get_idle_delay(),
            Some(wake) => {
                let wake = Duration::from_millis(u64::try_from(wake).unwrap_or(0));
                wake.max(self.get_floor_delay())
            }
        }
    }
}
