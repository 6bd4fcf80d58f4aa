//! Defines the scheduler: a single cooperative loop serving every registered indicator.
//!
//! ```text
//!   callers ──register/start/stop/unregister──┐
//!                                             ▼
//!                                  ┌──────────────────────┐
//!                                  │ guard (one Mutex)    │
//!                                  │  Registry            │
//!                                  │  OutputDriver, Clock │
//!                                  └──────────┬───────────┘
//!                                             │ one scan per cycle
//!   loop: lock ─▶ scan (state machine per indicator, writes) ─▶ unlock ─▶ sleep(min wake, floor) ─┐
//!     ▲                                                                                           │
//!     └───────────────────────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod shared;

use std::fmt::{Display, Formatter};
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, trace, warn};
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;

pub use config::SchedulerConfig;

use crate::errors::{Error, Unknown};
use crate::indicators::{BlinkConfig, Indicator, IndicatorHandle, Registry};
use crate::io::{Clock, MonotonicClock, OutputDriver, OutputRef};
use crate::scheduler::shared::Shared;
use crate::utils::task;
use crate::utils::task::TaskHandler;

/// Drives any number of blinking indicators from one background loop.
///
/// The scheduler is a cheap cloneable handle: every clone controls the same indicators. All
/// operations are synchronous and may be called from any thread; they only wait for the scan
/// currently in progress (if any), never for the loop sleep.
///
/// # Example
/// ```
/// use std::fmt::{Display, Formatter};
///
/// use beacon::errors::Error;
/// use beacon::indicators::BlinkConfig;
/// use beacon::io::{Level, OutputDriver, OutputMode, OutputRef};
/// use beacon::scheduler::Scheduler;
///
/// // A driver printing levels instead of driving hardware.
/// #[derive(Clone, Debug)]
/// struct Console;
///
/// impl Display for Console {
///     fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
///         write!(f, "Console")
///     }
/// }
///
/// impl OutputDriver for Console {
///     fn set_output_mode(&mut self, _: u16, _: OutputMode) -> Result<(), Error> {
///         Ok(())
///     }
///     fn write_output(&mut self, pin: u16, level: Level) -> Result<(), Error> {
///         println!("pin {} -> {}", pin, level);
///         Ok(())
///     }
/// }
///
/// #[beacon::runtime]
/// async fn main() {
///     let scheduler = Scheduler::new(Console);
///     scheduler.run().unwrap();
///
///     // A LED wired to VCC on pin 8: 50ms on, 950ms off, forever.
///     let led = scheduler
///         .register(OutputRef::active_low(8), BlinkConfig::default())
///         .unwrap();
///     scheduler.configure_and_start(led, 50, 950, 0).unwrap();
///
///     beacon::pause!(100);
///     scheduler.shutdown().await.unwrap();
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// The single guard: held for a full scan, or for one registry operation.
    shared: Mutex<Shared>,
    config: SchedulerConfig,
    /// Wakes the loop early when an indicator gets started.
    wakeup: Arc<Notify>,
    /// Stop signal, checked by the loop once per cycle.
    shutdown: watch::Sender<bool>,
    /// Inner handler to the task running the loop.
    task: Mutex<Option<TaskHandler>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shared.get_mut().teardown();
    }
}

impl Scheduler {
    /// Creates a scheduler writing to the given driver, with the default configuration.
    ///
    /// **_/!\ No indicator is serviced until the [`Scheduler::run`] method is called._**
    pub fn new<D: OutputDriver + 'static>(driver: D) -> Self {
        Self::with_config(driver, SchedulerConfig::default())
    }

    /// Creates a scheduler writing to the given driver, with a custom configuration.
    pub fn with_config<D: OutputDriver + 'static>(driver: D, config: SchedulerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared::new(
                    Registry::with_capacity(config.capacity),
                    Box::new(driver),
                    Box::new(MonotonicClock::default()),
                )),
                config,
                wakeup: Arc::new(Notify::new()),
                shutdown,
                task: Mutex::new(None),
            }),
        }
    }

    /// Replaces the clock source (a [`MonotonicClock`] by default).
    pub fn with_clock<C: Clock + 'static>(self, clock: C) -> Self {
        self.inner.shared.lock().clock = Box::new(clock);
        self
    }

    // ########################################
    // Loop control.

    /// Starts the background loop (as a [`task`]). Calling it while the loop runs does nothing.
    ///
    /// # Errors
    /// * `RuntimeError`: the loop could not be started because the code does not run inside
    ///   `#[beacon::runtime]`.
    pub fn run(&self) -> Result<&Self, Error> {
        let mut handler = self.inner.task.lock();
        if handler.as_ref().is_some_and(|handler| !handler.is_finished()) {
            return Ok(self);
        }

        self.inner.shutdown.send_replace(false);
        let shutdown = self.inner.shutdown.subscribe();
        let wakeup = self.inner.wakeup.clone();
        let inner = Arc::downgrade(&self.inner);
        *handler = Some(task::run(async move {
            serve(inner, wakeup, shutdown).await;
        })?);

        debug!("Scheduler: loop started ({})", self);
        Ok(self)
    }

    /// Indicates the background loop is running.
    pub fn is_running(&self) -> bool {
        self.inner
            .task
            .lock()
            .as_ref()
            .is_some_and(|handler| !handler.is_finished())
    }

    /// Stops the background loop and tears everything down: every indicator is driven off, its
    /// output released, and removed (all handles become stale).
    ///
    /// The scheduler can be [`Scheduler::run`] again afterward.
    ///
    /// # Errors
    /// * `Unknown`: the loop task panicked or was aborted.
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.inner.shutdown.send_replace(true);
        let handler = self.inner.task.lock().take();
        if let Some(handler) = handler {
            handler.await.map_err(|err| Unknown {
                info: err.to_string(),
            })??;
        }
        // Also covers a loop that never ran.
        self.inner.shared.lock().teardown();
        debug!("Scheduler: shut down");
        Ok(())
    }

    /// Performs one scheduler cycle: scans every indicator under the guard, applies due
    /// transitions and drives the outputs.
    ///
    /// # Returns
    /// How long the loop must suspend before the next cycle.
    pub fn run_cycle(&self) -> Duration {
        let min_wake = self.inner.shared.lock().scan();
        let delay = self.inner.config.sleep_duration(min_wake);
        trace!("Scheduler: next cycle in {}ms", delay.as_millis());
        delay
    }

    // ########################################
    // Indicator control.

    /// Registers an indicator on `output`: the output gets configured and driven off.
    ///
    /// The indicator is stopped: `config` is stored and used by [`Scheduler::start`].
    ///
    /// # Errors
    /// * `DuplicateOutput`: an indicator is already bound to this output.
    /// * `AllocationFailed`: the registry is full.
    /// * `DriverFailure`: the driver could not configure or write the output.
    pub fn register(
        &self,
        output: OutputRef,
        config: BlinkConfig,
    ) -> Result<IndicatorHandle, Error> {
        self.inner.shared.lock().register(output, config)
    }

    /// Unregisters an indicator: its output is driven off and released, the handle becomes stale.
    ///
    /// # Errors
    /// * `NotFound`: the handle is unknown or stale.
    pub fn unregister(&self, handle: IndicatorHandle) -> Result<(), Error> {
        self.inner.shared.lock().unregister(handle)?;
        Ok(())
    }

    /// Configures an indicator to blink `on_ms` on, `off_ms` off, `repeat` times (0: forever),
    /// and (re)starts it.
    ///
    /// `on_ms == 0` forces the output off, `off_ms == 0` forces it on. The output is updated by the
    /// next loop cycle, which starts with the lit phase.
    ///
    /// # Errors
    /// * `NotFound`: the handle is unknown or stale.
    /// * `ClockError`: the clock could not be read.
    pub fn configure_and_start(
        &self,
        handle: IndicatorHandle,
        on_ms: u32,
        off_ms: u32,
        repeat: u32,
    ) -> Result<(), Error> {
        self.start_with(handle, BlinkConfig::new(on_ms, off_ms, repeat))
    }

    /// Same as [`Scheduler::configure_and_start`] with a [`BlinkConfig`].
    pub fn start_with(&self, handle: IndicatorHandle, config: BlinkConfig) -> Result<(), Error> {
        self.inner.shared.lock().configure(handle, config)?;
        self.inner.wakeup.notify_one();
        Ok(())
    }

    /// Restarts an indicator with its current configuration.
    ///
    /// # Errors
    /// * `NotFound`: the handle is unknown or stale.
    /// * `ClockError`: the clock could not be read.
    pub fn start(&self, handle: IndicatorHandle) -> Result<(), Error> {
        self.inner.shared.lock().start(handle)?;
        self.inner.wakeup.notify_one();
        Ok(())
    }

    /// Stops an indicator and drives its output off. Stopping a stopped indicator is a no-op.
    ///
    /// # Errors
    /// * `NotFound`: the handle is unknown or stale.
    /// * `DriverFailure`: the output could not be written (the indicator is stopped nonetheless).
    pub fn stop(&self, handle: IndicatorHandle) -> Result<(), Error> {
        self.inner.shared.lock().stop(handle)
    }

    // ########################################
    // Setters and Getters.

    /// Retrieves a snapshot of an indicator.
    ///
    /// # Errors
    /// * `NotFound`: the handle is unknown or stale.
    pub fn indicator(&self, handle: IndicatorHandle) -> Result<Indicator, Error> {
        Ok(self.inner.shared.lock().registry.get(handle)?.clone())
    }

    /// Lists the handles of all registered indicators.
    pub fn handles(&self) -> Vec<IndicatorHandle> {
        self.inner.shared.lock().registry.handles()
    }

    /// Returns the number of registered indicators.
    pub fn len(&self) -> usize {
        self.inner.shared.lock().registry.len()
    }

    /// Indicates no indicator is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.shared.lock().registry.is_empty()
    }

    /// Retrieves the scheduler configuration.
    pub fn get_config(&self) -> SchedulerConfig {
        self.inner.config
    }

    /// Retrieves a clone of the driver.
    pub fn get_driver(&self) -> Box<dyn OutputDriver> {
        self.inner.shared.lock().driver.clone()
    }
}

impl Display for Scheduler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let shared = self.inner.shared.lock();
        write!(
            f,
            "Scheduler ({}) [indicators={}, floor={}ms, idle={}ms]",
            shared.driver,
            shared.registry.len(),
            self.inner.config.floor_delay_ms,
            self.inner.config.idle_delay_ms,
        )
    }
}

/// The scheduler loop.
///
/// Runs until the stop signal is raised or the scheduler is dropped. The guard is only held during
/// [`Scheduler::run_cycle`], never while sleeping.
async fn serve(inner: Weak<Inner>, wakeup: Arc<Notify>, mut shutdown: watch::Receiver<bool>) {
    loop {
        let started = Instant::now();
        let (delay, floor) = match inner.upgrade() {
            Some(inner) => {
                let floor = inner.config.get_floor_delay();
                (Scheduler { inner }.run_cycle(), floor)
            }
            None => break,
        };

        let woken = tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = wakeup.notified() => true,
            _ = shutdown.changed() => false,
        };

        // An early wake still waits out the floor delay since the cycle started.
        if woken {
            trace!("Scheduler: woken up");
            tokio::select! {
                _ = tokio::time::sleep_until(started + floor) => {}
                _ = shutdown.changed() => {}
            }
        }

        if *shutdown.borrow() {
            break;
        }
        if shutdown.has_changed().is_err() {
            warn!("Scheduler: dropped while running");
            break;
        }
    }
    debug!("Scheduler: loop stopped");
}
