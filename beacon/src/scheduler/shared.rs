use log::{debug, error, trace, warn};

use crate::errors::Error;
use crate::indicators::{BlinkConfig, Indicator, IndicatorHandle, Registry};
use crate::io::{Clock, OutputDriver, OutputRef};

/// Everything protected by the scheduler guard: the registry, the driver writing the outputs and the
/// clock. Every method expects to be called with the guard held.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) registry: Registry,
    pub(crate) driver: Box<dyn OutputDriver>,
    pub(crate) clock: Box<dyn Clock>,
}

/// Drives `output` to its logical on/off state.
fn drive(driver: &mut dyn OutputDriver, output: OutputRef, on: bool) -> Result<(), Error> {
    driver.write_output(output.pin, output.level(on))
}

impl Shared {
    pub(crate) fn new(
        registry: Registry,
        driver: Box<dyn OutputDriver>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            driver,
            clock,
        }
    }

    /// Binds `output` (configured as output and driven off) and registers a stopped indicator on it.
    pub(crate) fn register(
        &mut self,
        output: OutputRef,
        config: BlinkConfig,
    ) -> Result<IndicatorHandle, Error> {
        // Validate before touching the driver: a duplicate must leave the bound output untouched.
        self.registry.ensure_vacant(output.pin)?;
        self.driver.set_output_mode(output.pin, output.mode)?;
        let inserted = drive(self.driver.as_mut(), output, false)
            .and_then(|_| self.registry.insert(Indicator::new(output, config)));
        if inserted.is_err() {
            // Configured but never registered: hand the output back.
            if let Err(err) = self.driver.release(output.pin) {
                warn!("Scheduler: cannot release {}: {}", output, err);
            }
        }
        inserted
    }

    /// Removes an indicator, then drives its output off and releases it.
    ///
    /// The removal always happens: driver failures past that point are only logged.
    pub(crate) fn unregister(&mut self, handle: IndicatorHandle) -> Result<Indicator, Error> {
        let indicator = self.registry.remove(handle)?;
        self.release(&indicator);
        Ok(indicator)
    }

    /// Replaces the configuration of an indicator and restarts it.
    pub(crate) fn configure(
        &mut self,
        handle: IndicatorHandle,
        config: BlinkConfig,
    ) -> Result<(), Error> {
        self.registry.get(handle)?;
        let now = self.clock.now_ms()?;
        self.registry.get_mut(handle)?.configure(config, now);
        debug!("Scheduler: indicator {} configured ({})", handle, config);
        Ok(())
    }

    /// Restarts an indicator with its current configuration.
    pub(crate) fn start(&mut self, handle: IndicatorHandle) -> Result<(), Error> {
        self.registry.get(handle)?;
        let now = self.clock.now_ms()?;
        self.registry.get_mut(handle)?.start(now);
        debug!("Scheduler: indicator {} started", handle);
        Ok(())
    }

    /// Stops an indicator and drives its output off.
    pub(crate) fn stop(&mut self, handle: IndicatorHandle) -> Result<(), Error> {
        let indicator = self.registry.get_mut(handle)?;
        indicator.stop();
        let output = indicator.get_output();
        drive(self.driver.as_mut(), output, false)
    }

    /// Runs the state machine of every indicator once.
    ///
    /// # Returns
    /// The smallest wake request of the running indicators, `None` if none is running.
    pub(crate) fn scan(&mut self) -> Option<i32> {
        let now = match self.clock.now_ms() {
            Ok(now) => now,
            Err(err) => {
                error!("Scheduler: cannot read the clock: {}", err);
                return Some(0);
            }
        };

        let mut min_wake: Option<i32> = None;
        let driver = self.driver.as_mut();
        for (handle, indicator) in self.registry.iter_mut() {
            let transition = indicator.evaluate(now);
            let wake = match transition.action {
                None => transition.wake,
                Some(switch) => match drive(driver, indicator.get_output(), switch.into()) {
                    Ok(()) => {
                        trace!(
                            "Scheduler: indicator {} {} -> {} at {}ms",
                            handle,
                            indicator.get_phase(),
                            transition.phase,
                            now
                        );
                        indicator.apply(&transition);
                        transition.wake
                    }
                    Err(err) => {
                        // Keep the state as is: the transition is retried on the next cycle.
                        warn!("Scheduler: indicator {} not updated: {}", handle, err);
                        Some(0)
                    }
                },
            };
            if let Some(wake) = wake {
                min_wake = Some(min_wake.map_or(wake, |min| min.min(wake)));
            }
        }
        min_wake
    }

    /// Removes every indicator, driving each output off and releasing it.
    pub(crate) fn teardown(&mut self) {
        let indicators = self.registry.drain();
        for indicator in &indicators {
            self.release(indicator);
        }
        if !indicators.is_empty() {
            debug!("Scheduler: {} indicator(s) released", indicators.len());
        }
    }

    fn release(&mut self, indicator: &Indicator) {
        let output = indicator.get_output();
        if let Err(err) = drive(self.driver.as_mut(), output, false) {
            warn!("Scheduler: cannot turn {} off: {}", output, err);
        }
        if let Err(err) = self.driver.release(output.pin) {
            warn!("Scheduler: cannot release {}: {}", output, err);
        }
    }
}
