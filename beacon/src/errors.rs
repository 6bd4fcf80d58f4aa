use snafu::Snafu;

pub use crate::errors::Error::*;
use crate::indicators::IndicatorHandle;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Runtime error: Are you sure your code runs inside #[beacon::runtime]?
    RuntimeError,
    /// Registry error: {source}.
    RegistryError { source: RegistryError },
    /// Driver error: {source}.
    DriverError { source: DriverError },
    /// Clock error: {info}.
    ClockError { info: String },
    /// Unknown error: {info}.
    Unknown { info: String },
}

impl From<RegistryError> for Error {
    fn from(value: RegistryError) -> Self {
        Self::RegistryError { source: value }
    }
}

impl From<DriverError> for Error {
    fn from(value: DriverError) -> Self {
        Self::DriverError { source: value }
    }
}

impl Error {
    /// Indicates the error is due to an unknown or stale indicator handle.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RegistryError {
                source: RegistryError::NotFound { .. }
            }
        )
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RegistryError {
    /// Output {pin} is already bound to an indicator
    DuplicateOutput { pin: u16 },
    /// Indicator {handle} not found
    NotFound { handle: IndicatorHandle },
    /// Indicator storage exhausted (capacity {capacity})
    AllocationFailed { capacity: usize },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DriverError {
    /// Output {pin} failed - {info}
    DriverFailure { pin: u16, info: String },
    /// Unknown output {pin}
    UnknownOutput { pin: u16 },
}

#[cfg(test)]
mod tests {
    use crate::errors::DriverError::{DriverFailure, UnknownOutput};
    use crate::errors::RegistryError::{AllocationFailed, DuplicateOutput, NotFound};
    use crate::indicators::IndicatorHandle;

    use super::*;

    #[test]
    fn test_error_display() {
        let runtime_error = RuntimeError;
        assert_eq!(
            format!("{}", runtime_error),
            "Runtime error: Are you sure your code runs inside #[beacon::runtime]?"
        );

        let registry_error = Error::from(DuplicateOutput { pin: 8 });
        assert_eq!(
            format!("{}", registry_error),
            "Registry error: Output 8 is already bound to an indicator."
        );

        let driver_error = Error::from(DriverFailure {
            pin: 13,
            info: String::from("bus timeout"),
        });
        assert_eq!(
            format!("{}", driver_error),
            "Driver error: Output 13 failed - bus timeout."
        );

        let clock_error = ClockError {
            info: "tick counter unavailable".to_string(),
        };
        assert_eq!(
            format!("{}", clock_error),
            "Clock error: tick counter unavailable."
        );

        let unknown_error = Unknown {
            info: "Some unknown error".to_string(),
        };
        assert_eq!(
            format!("{}", unknown_error),
            "Unknown error: Some unknown error."
        );
    }

    #[test]
    fn test_from_registry_error() {
        let error: Error = NotFound {
            handle: IndicatorHandle::new(3, 7),
        }
        .into();
        assert_eq!(format!("{}", error), "Registry error: Indicator #3.7 not found.");
        assert!(error.is_not_found());

        let error: Error = AllocationFailed { capacity: 4 }.into();
        assert_eq!(
            format!("{}", error),
            "Registry error: Indicator storage exhausted (capacity 4)."
        );
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_from_driver_error() {
        let error: Error = UnknownOutput { pin: 42 }.into();
        assert_eq!(format!("{}", error), "Driver error: Unknown output 42.");
    }
}
