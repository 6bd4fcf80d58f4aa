//! Defines the collaborators the scheduler consumes: digital outputs and a clock source.

mod clock;
mod output;

use std::any::type_name;
use std::fmt::{Debug, Display};

use dyn_clone::DynClone;

use crate::errors::Error;
pub use clock::*;
pub use output::*;

// Makes a Box<dyn OutputDriver> clone (used to hand the driver back to callers).
dyn_clone::clone_trait_object!(OutputDriver);

/// Defines the trait all digital output drivers must implement.
///
/// A driver owns no indicator state: it only applies electrical levels. The translation from logical
/// on/off to [`Level`] (see [`Polarity`]) is done by the scheduler before calling the driver.
///
/// Drivers are cloned when handed back to callers (see `Scheduler::get_driver()`): implementations
/// backed by real hardware should share their underlying handle between clones.
pub trait OutputDriver: DynClone + Send + Sync + Debug + Display {
    /// Returns the driver name (used for Display only)
    fn get_driver_name(&self) -> &'static str {
        type_name::<Self>().split("::").last().unwrap_or("driver")
    }

    /// Configures `pin` as an output using the given `mode`.
    ///
    /// Called once when an indicator gets registered.
    fn set_output_mode(&mut self, pin: u16, mode: OutputMode) -> Result<(), Error>;

    /// Writes the electrical `level` to the `pin`.
    fn write_output(&mut self, pin: u16, level: Level) -> Result<(), Error>;

    /// Releases the binding on `pin`: no further write will target it until it is configured again.
    fn release(&mut self, _pin: u16) -> Result<(), Error> {
        Ok(())
    }
}
