//! Defines the indicator data model, its timing state machine and the registry holding them.

use std::fmt::{Display, Formatter};

use crate::io::OutputRef;

mod registry;
mod state;

pub use registry::Registry;
pub use state::{Switch, Transition};

/// Longest phase duration accepted (in ms).
///
/// Deadlines are compared through a signed difference modulo 2^32: a phase may not last longer
/// than half the clock range.
pub const MAX_PHASE_MS: u32 = i32::MAX as u32;

/// The current half of the blink cycle.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Not scheduled: the loop skips the indicator until it is started again.
    #[default]
    Stopped,
    /// The output is on until the deadline.
    Lit,
    /// The output is off until the deadline.
    Dark,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let phase = match self {
            Phase::Stopped => "stopped",
            Phase::Lit => "lit",
            Phase::Dark => "dark",
        };
        write!(f, "{}", phase)
    }
}

/// The on/off/count configuration of an indicator.
///
/// - `on_ms == 0`: the output is forced off (permanently, until reconfigured).
/// - `off_ms == 0` (and `on_ms != 0`): the output is forced on.
/// - otherwise the output blinks, `repeat` times (0 meaning forever).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BlinkConfig {
    /// Duration of the lit phase (in ms).
    pub on_ms: u32,
    /// Duration of the dark phase (in ms).
    pub off_ms: u32,
    /// Number of on/off cycles before stopping automatically (0: unlimited).
    #[cfg_attr(feature = "serde", serde(default))]
    pub repeat: u32,
}

impl BlinkConfig {
    /// Creates a blink configuration. Durations are clamped to [`MAX_PHASE_MS`].
    pub fn new(on_ms: u32, off_ms: u32, repeat: u32) -> Self {
        Self {
            on_ms: on_ms.min(MAX_PHASE_MS),
            off_ms: off_ms.min(MAX_PHASE_MS),
            repeat,
        }
    }

    /// A configuration keeping the output on.
    pub fn always_on() -> Self {
        Self::new(1, 0, 0)
    }

    /// A configuration keeping the output off.
    pub fn always_off() -> Self {
        Self::new(0, 0, 0)
    }

    /// Returns the same configuration with both durations clamped to [`MAX_PHASE_MS`].
    ///
    /// Applied to every configuration an [`Indicator`] stores, however it was built (struct literal,
    /// deserialization).
    pub fn clamped(self) -> Self {
        Self::new(self.on_ms, self.off_ms, self.repeat)
    }

    /// Indicates the configuration blinks (rather than forcing a steady output).
    pub fn is_periodic(&self) -> bool {
        self.on_ms != 0 && self.off_ms != 0
    }
}

impl Display for BlinkConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.on_ms, self.off_ms) {
            (0, _) => write!(f, "always off"),
            (_, 0) => write!(f, "always on"),
            (on, off) if self.repeat == 0 => write!(f, "{}ms/{}ms forever", on, off),
            (on, off) => write!(f, "{}ms/{}ms x{}", on, off, self.repeat),
        }
    }
}

/// Opaque reference to an indicator owned by the [`Registry`].
///
/// The handle carries the generation of the slot it points to: once the indicator gets unregistered,
/// the handle is stale and every operation using it fails with `NotFound`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndicatorHandle {
    index: u32,
    generation: u32,
}

impl IndicatorHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) fn index(&self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

impl Display for IndicatorHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// One registered blinking output with its configuration and timing state.
#[derive(Clone, Debug, PartialEq)]
pub struct Indicator {
    output: OutputRef,
    config: BlinkConfig,
    cycles_completed: u32,
    next_deadline: u32,
    phase: Phase,
}

impl Indicator {
    /// Creates a stopped indicator bound to `output`.
    pub fn new(output: OutputRef, config: BlinkConfig) -> Self {
        Self {
            output,
            config: config.clamped(),
            cycles_completed: 0,
            next_deadline: 0,
            phase: Phase::Stopped,
        }
    }

    /// (Re)starts the timing: the first evaluation at or after `now` lights the indicator.
    pub fn start(&mut self, now: u32) {
        self.cycles_completed = 0;
        self.next_deadline = now;
        self.phase = Phase::Dark;
    }

    /// Replaces the configuration and (re)starts the timing.
    pub fn configure(&mut self, config: BlinkConfig, now: u32) {
        self.config = config.clamped();
        self.start(now);
    }

    /// Stops the timing.
    pub fn stop(&mut self) {
        self.phase = Phase::Stopped;
    }

    // ########################################
    // Setters and Getters.

    /// Retrieves the output the indicator is bound to.
    pub fn get_output(&self) -> OutputRef {
        self.output
    }

    /// Retrieves the current configuration.
    pub fn get_config(&self) -> BlinkConfig {
        self.config
    }

    /// Retrieves the number of cycles completed since the last start.
    pub fn get_cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    /// Retrieves the deadline of the current phase. Meaningless when stopped.
    pub fn get_next_deadline(&self) -> Option<u32> {
        match self.phase {
            Phase::Stopped => None,
            _ => Some(self.next_deadline),
        }
    }

    /// Retrieves the current phase.
    pub fn get_phase(&self) -> Phase {
        self.phase
    }

    /// Indicates the indicator is stopped.
    pub fn is_stopped(&self) -> bool {
        self.phase == Phase::Stopped
    }
}

impl Display for Indicator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Indicator ({}) [config={}, phase={}, cycles={}]",
            self.output, self.config, self.phase, self.cycles_completed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blink_config() {
        let config = BlinkConfig::new(50, 950, 3);
        assert!(config.is_periodic());
        assert_eq!(format!("{}", config), "50ms/950ms x3");
        assert_eq!(format!("{}", BlinkConfig::new(500, 500, 0)), "500ms/500ms forever");

        assert!(!BlinkConfig::always_on().is_periodic());
        assert_eq!(format!("{}", BlinkConfig::always_on()), "always on");
        assert!(!BlinkConfig::always_off().is_periodic());
        assert_eq!(format!("{}", BlinkConfig::always_off()), "always off");

        let config = BlinkConfig::new(u32::MAX, u32::MAX, 0);
        assert_eq!(config.on_ms, MAX_PHASE_MS);
        assert_eq!(config.off_ms, MAX_PHASE_MS);
    }

    #[test]
    fn test_literal_config_is_clamped() {
        let literal = BlinkConfig {
            on_ms: u32::MAX,
            off_ms: 1000,
            repeat: 0,
        };
        let mut indicator = Indicator::new(OutputRef::active_high(13), literal);
        assert_eq!(indicator.get_config().on_ms, MAX_PHASE_MS);

        indicator.configure(
            BlinkConfig {
                on_ms: 10,
                off_ms: u32::MAX - 1,
                repeat: 2,
            },
            0,
        );
        assert_eq!(indicator.get_config(), BlinkConfig::new(10, MAX_PHASE_MS, 2));
    }

    #[test]
    fn test_lifecycle() {
        let mut indicator = Indicator::new(OutputRef::active_low(8), BlinkConfig::new(50, 950, 0));
        assert!(indicator.is_stopped());
        assert_eq!(indicator.get_next_deadline(), None);

        indicator.start(1000);
        assert_eq!(indicator.get_phase(), Phase::Dark);
        assert_eq!(indicator.get_next_deadline(), Some(1000));
        assert_eq!(indicator.get_cycles_completed(), 0);

        indicator.configure(BlinkConfig::new(100, 100, 2), 2000);
        assert_eq!(indicator.get_config(), BlinkConfig::new(100, 100, 2));
        assert_eq!(indicator.get_next_deadline(), Some(2000));

        indicator.stop();
        assert!(indicator.is_stopped());
        assert_eq!(indicator.get_next_deadline(), None);
    }

    #[test]
    fn test_display_impl() {
        let indicator = Indicator::new(OutputRef::active_high(13), BlinkConfig::new(50, 950, 3));
        assert_eq!(
            format!("{}", indicator),
            "Indicator (pin 13 (active-high)) [config=50ms/950ms x3, phase=stopped, cycles=0]"
        );
        assert_eq!(format!("{}", IndicatorHandle::new(2, 5)), "#2.5");
    }
}
