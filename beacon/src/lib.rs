#![doc(html_root_url = "https://docs.rs/beacon/0.1.0")]

//! <h1 align="center">BEACON - Blinking indicators, one loop</h1>
//! <div style="text-align:center;font-style:italic;">Beacon drives any number of blinking indicators from a single cooperative scheduler loop - written in Rust.</div>
//!
//! # Features
//!
//! An indicator is a digital output (typically a LED) that blinks: on for some time, off for some
//! time, a given number of times or forever. **Beacon** serves all of them from one background loop:
//!
//! - Register indicators on any [`OutputDriver`](io::OutputDriver) output, active-high or active-low
//!   (see [`OutputRef`](io::OutputRef))
//! - Configure and (re)start blinking at any time, from any thread
//!   (see [`Scheduler`](scheduler::Scheduler))
//! - Blink a given number of cycles or forever, force an output on or off
//!   (see [`BlinkConfig`](indicators::BlinkConfig))
//! - The loop sleeps exactly until the next indicator is due, and the deadlines survive the wraparound
//!   of a 32-bit millisecond clock (see [`Clock`](io::Clock))
//!
//! # Getting Started
//!
//! - Add the following to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! beacon = "0.1.0"
//! ```
//!
//! - Implement [`OutputDriver`](io::OutputDriver) for your hardware, or enable the **mocks** feature
//!   to play with a fake one. See [`Scheduler`](scheduler::Scheduler) for a complete program.
//!
//! # Feature flags
//!
//! - **serde** -- Enables serialize/deserialize capabilities for configurations and output references.
//! - **mocks** -- Provides a mocked driver and clock (useful for tests mostly).

#[cfg(test)]
extern crate self as beacon;

pub mod errors;
pub mod indicators;
pub mod io;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod scheduler;
pub mod utils;

pub use beacon_macros::runtime;
