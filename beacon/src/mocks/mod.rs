//! Mocked collaborators (useful for tests mostly).

mod clock;
mod driver;

pub use clock::MockClock;
pub use driver::{MockDriver, MockDriverData, MockOutput};
