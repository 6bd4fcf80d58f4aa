//! The per-indicator timing state machine.
//!
//! ```text
//!              start                 deadline                 deadline
//!   Stopped ─────────▶ Dark ────────────────────▶ Lit ────────────────────▶ Dark ...
//!      ▲                                                          │
//!      └────────────────── cycles_completed == repeat ◀───────────┘
//! ```
//!
//! Steady configurations (`on_ms == 0` or `off_ms == 0`) apply their level on the first evaluation
//! and stop right away.

use crate::indicators::{Indicator, Phase};
use crate::io::remaining;

/// A logical output change requested by a transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(value: Switch) -> Self {
        value == Switch::On
    }
}

/// The outcome of evaluating an indicator at a given time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Phase after the evaluation.
    pub phase: Phase,
    /// Completed cycles after the evaluation.
    pub cycles_completed: u32,
    /// Deadline of the (new) current phase.
    pub next_deadline: u32,
    /// Output change to apply, if any.
    pub action: Option<Switch>,
    /// Time (in ms) until the indicator must be evaluated again; `None` once stopped.
    /// Zero or negative means "as soon as possible".
    pub wake: Option<i32>,
}

impl Indicator {
    /// Decides what must happen to this indicator at time `now`.
    ///
    /// This does not mutate the indicator: the caller applies the output action first and commits the
    /// transition with [`Indicator::apply`] only when the action succeeded.
    pub fn evaluate(&self, now: u32) -> Transition {
        let mut next = Transition {
            phase: self.phase,
            cycles_completed: self.cycles_completed,
            next_deadline: self.next_deadline,
            action: None,
            wake: None,
        };

        if self.phase == Phase::Stopped {
            return next;
        }

        // Forced off takes precedence over everything else.
        if self.config.on_ms == 0 {
            next.phase = Phase::Stopped;
            next.action = Some(Switch::Off);
            return next;
        }

        if self.config.off_ms == 0 {
            next.phase = Phase::Stopped;
            next.action = Some(Switch::On);
            return next;
        }

        let left = remaining(self.next_deadline, now);
        if left > 0 {
            next.wake = Some(left);
            return next;
        }

        match self.phase {
            Phase::Lit => {
                next.phase = Phase::Dark;
                next.action = Some(Switch::Off);
                next.next_deadline = now.wrapping_add(self.config.off_ms);
                next.cycles_completed = self.cycles_completed.saturating_add(1);
                if self.config.repeat != 0 && next.cycles_completed >= self.config.repeat {
                    next.phase = Phase::Stopped;
                }
            }
            _ => {
                next.phase = Phase::Lit;
                next.action = Some(Switch::On);
                next.next_deadline = now.wrapping_add(self.config.on_ms);
            }
        }

        if next.phase != Phase::Stopped {
            next.wake = Some(remaining(next.next_deadline, now));
        }
        next
    }

    /// Commits a transition computed by [`Indicator::evaluate`].
    pub fn apply(&mut self, transition: &Transition) {
        self.phase = transition.phase;
        self.cycles_completed = transition.cycles_completed;
        self.next_deadline = transition.next_deadline;
    }
}
