use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::DriverError::{DriverFailure, UnknownOutput};
use crate::errors::Error;
use crate::io::{Level, OutputDriver, OutputMode};

/// The recorded state of one mocked output.
#[derive(Clone, Debug, Default)]
pub struct MockOutput {
    /// Configured mode: `None` until configured, and again once released.
    pub mode: Option<OutputMode>,
    /// Last written level.
    pub level: Option<Level>,
    /// Every level written, in order.
    pub history: Vec<Level>,
}

/// The data shared between all clones of a [`MockDriver`].
#[derive(Clone, Debug, Default)]
pub struct MockDriverData {
    pub outputs: HashMap<u16, MockOutput>,
    /// Pins whose operations fail.
    pub failing: HashSet<u16>,
    /// Pins whose writes fail (configuring and releasing them still works).
    pub failing_writes: HashSet<u16>,
}

/// Mock implementation of [`OutputDriver`].
///
/// All clones share the same data: keep a clone before handing the driver to a scheduler to observe
/// what the scheduler writes.
#[derive(Clone, Debug, Default)]
pub struct MockDriver {
    pub data: Arc<RwLock<MockDriverData>>,
    /// Writes attempted on an output not configured (or released).
    rogue_writes: Arc<AtomicUsize>,
}

impl MockDriver {
    /// Makes every operation on `pin` fail (or succeed again).
    pub fn set_failing(&self, pin: u16, failing: bool) {
        let mut lock = self.data.write();
        match failing {
            true => lock.failing.insert(pin),
            false => lock.failing.remove(&pin),
        };
    }

    /// Makes only the writes to `pin` fail (or succeed again).
    pub fn set_failing_writes(&self, pin: u16, failing: bool) {
        let mut lock = self.data.write();
        match failing {
            true => lock.failing_writes.insert(pin),
            false => lock.failing_writes.remove(&pin),
        };
    }

    /// Retrieves the last level written to `pin`.
    pub fn get_level(&self, pin: u16) -> Option<Level> {
        self.data.read().outputs.get(&pin).and_then(|output| output.level)
    }

    /// Retrieves the mode `pin` is configured in.
    pub fn get_mode(&self, pin: u16) -> Option<OutputMode> {
        self.data.read().outputs.get(&pin).and_then(|output| output.mode)
    }

    /// Retrieves every level written to `pin`.
    pub fn get_history(&self, pin: u16) -> Vec<Level> {
        self.data
            .read()
            .outputs
            .get(&pin)
            .map(|output| output.history.clone())
            .unwrap_or_default()
    }

    /// Indicates `pin` is currently configured as an output.
    pub fn is_bound(&self, pin: u16) -> bool {
        self.get_mode(pin).is_some()
    }

    /// Counts the writes attempted on unbound outputs.
    pub fn get_rogue_writes(&self) -> usize {
        self.rogue_writes.load(Ordering::SeqCst)
    }
}

impl Display for MockDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [outputs={}]",
            self.get_driver_name(),
            self.data.read().outputs.len()
        )
    }
}

impl OutputDriver for MockDriver {
    fn set_output_mode(&mut self, pin: u16, mode: OutputMode) -> Result<(), Error> {
        let mut lock = self.data.write();
        if lock.failing.contains(&pin) {
            return Err(DriverFailure {
                pin,
                info: String::from("simulated mode failure"),
            }
            .into());
        }
        lock.outputs.entry(pin).or_default().mode = Some(mode);
        Ok(())
    }

    fn write_output(&mut self, pin: u16, level: Level) -> Result<(), Error> {
        let mut lock = self.data.write();
        if lock.failing.contains(&pin) || lock.failing_writes.contains(&pin) {
            return Err(DriverFailure {
                pin,
                info: String::from("simulated write failure"),
            }
            .into());
        }
        match lock.outputs.get_mut(&pin) {
            Some(output) if output.mode.is_some() => {
                output.level = Some(level);
                output.history.push(level);
                Ok(())
            }
            _ => {
                self.rogue_writes.fetch_add(1, Ordering::SeqCst);
                Err(UnknownOutput { pin }.into())
            }
        }
    }

    fn release(&mut self, pin: u16) -> Result<(), Error> {
        let mut lock = self.data.write();
        let output = lock.outputs.get_mut(&pin).ok_or(UnknownOutput { pin })?;
        output.mode = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_requires_mode() {
        let mut driver = MockDriver::default();
        assert!(driver.write_output(13, Level::High).is_err());
        assert_eq!(driver.get_rogue_writes(), 1);

        driver.set_output_mode(13, OutputMode::PushPull).unwrap();
        driver.write_output(13, Level::High).unwrap();
        driver.write_output(13, Level::Low).unwrap();
        assert_eq!(driver.get_level(13), Some(Level::Low));
        assert_eq!(driver.get_history(13), vec![Level::High, Level::Low]);
        assert_eq!(driver.get_rogue_writes(), 1);
    }

    #[test]
    fn test_release() {
        let mut driver = MockDriver::default();
        driver.set_output_mode(4, OutputMode::OpenDrain).unwrap();
        assert_eq!(driver.get_mode(4), Some(OutputMode::OpenDrain));
        driver.release(4).unwrap();
        assert!(!driver.is_bound(4));
        assert!(driver.write_output(4, Level::High).is_err());
        assert_eq!(driver.get_rogue_writes(), 1);
        assert!(driver.release(5).is_err());
    }

    #[test]
    fn test_clones_share_data() {
        let observer = MockDriver::default();
        let mut driver = observer.clone();
        driver.set_output_mode(2, OutputMode::PushPull).unwrap();
        driver.write_output(2, Level::High).unwrap();
        assert_eq!(observer.get_level(2), Some(Level::High));

        observer.set_failing(2, true);
        assert!(driver.write_output(2, Level::Low).is_err());
        assert_eq!(observer.get_level(2), Some(Level::High));
        observer.set_failing(2, false);
        assert!(driver.write_output(2, Level::Low).is_ok());
    }

    #[test]
    fn test_display_impl() {
        let mut driver = MockDriver::default();
        driver.set_output_mode(2, OutputMode::PushPull).unwrap();
        assert_eq!(format!("{}", driver), "MockDriver [outputs=1]");
    }
}
