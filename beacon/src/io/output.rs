use std::fmt::{Display, Formatter};

/// The electrical level written to a digital output.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Level {
    High,
    #[default]
    Low,
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        match value {
            true => Level::High,
            false => Level::Low,
        }
    }
}

impl From<Level> for bool {
    fn from(value: Level) -> Self {
        value == Level::High
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::High => write!(f, "HIGH"),
            Level::Low => write!(f, "LOW"),
        }
    }
}

/// The mode an output is configured in when it gets bound to an indicator.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// Push-pull digital output.
    #[default]
    PushPull,
    /// Open-drain digital output.
    OpenDrain,
}

/// Active-level polarity: which electrical level turns the indicator on.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// The indicator is lit when the output is HIGH.
    #[default]
    ActiveHigh,
    /// The indicator is lit when the output is LOW (typically a LED wired to VCC).
    ActiveLow,
}

/// Identifies the physical output an indicator is bound to.
///
/// Two references are considered to target the same output when their `pin` matches: the polarity
/// only describes how the output is wired.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OutputRef {
    /// The platform pin id.
    pub pin: u16,
    /// The active-level polarity of the wiring.
    #[cfg_attr(feature = "serde", serde(default))]
    pub polarity: Polarity,
    /// The mode used to configure the output at registration.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: OutputMode,
}

impl OutputRef {
    /// An active-high push-pull output.
    pub fn active_high(pin: u16) -> Self {
        Self {
            pin,
            polarity: Polarity::ActiveHigh,
            mode: OutputMode::PushPull,
        }
    }

    /// An active-low push-pull output.
    pub fn active_low(pin: u16) -> Self {
        Self {
            pin,
            polarity: Polarity::ActiveLow,
            mode: OutputMode::PushPull,
        }
    }

    /// Use the given output mode instead of push-pull.
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Translates a logical on/off state into the electrical level for this output.
    pub fn level(&self, on: bool) -> Level {
        match self.polarity {
            Polarity::ActiveHigh => Level::from(on),
            Polarity::ActiveLow => Level::from(!on),
        }
    }

    /// The electrical level that turns this output on.
    pub fn on_level(&self) -> Level {
        self.level(true)
    }

    /// The electrical level that turns this output off.
    pub fn off_level(&self) -> Level {
        self.level(false)
    }
}

impl Display for OutputRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let polarity = match self.polarity {
            Polarity::ActiveHigh => "active-high",
            Polarity::ActiveLow => "active-low",
        };
        write!(f, "pin {} ({})", self.pin, polarity)
    }
}
