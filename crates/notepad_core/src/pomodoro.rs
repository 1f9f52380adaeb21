//! Pomodoro focus/break timer as a pure state machine.
//!
//! # Invariants
//! - A fresh or reset timer is paused in the focus phase with 25:00 left.
//! - Reaching zero switches phase, pauses, refills the new phase duration
//!   and raises the alarm exactly once.
//! - `tick` on a paused timer does nothing.

use serde::{Deserialize, Serialize};

pub const FOCUS_SECS: u32 = 25 * 60;
pub const BREAK_SECS: u32 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    pub fn duration_secs(self) -> u32 {
        match self {
            Self::Focus => FOCUS_SECS,
            Self::Break => BREAK_SECS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Focus => "Focus Time",
            Self::Break => "Break Time",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Focus => Self::Break,
            Self::Break => Self::Focus,
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Running,
    /// The phase finished; the caller should play the alarm.
    Alarm { next: Phase },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pomodoro {
    remaining_secs: u32,
    active: bool,
    phase: Phase,
}

impl Default for Pomodoro {
    fn default() -> Self {
        Self::new()
    }
}

impl Pomodoro {
    pub fn new() -> Self {
        Self {
            remaining_secs: FOCUS_SECS,
            active: false,
            phase: Phase::Focus,
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Start/pause.
    pub fn toggle(&mut self) {
        self.active = !self.active;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advances one second.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.active {
            return TickOutcome::Idle;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return TickOutcome::Running;
        }

        self.phase = self.phase.next();
        self.remaining_secs = self.phase.duration_secs();
        self.active = false;
        TickOutcome::Alarm { next: self.phase }
    }

    /// Elapsed share of the current phase, 0.0..=100.0.
    pub fn progress_percent(&self) -> f64 {
        let total = f64::from(self.phase.duration_secs());
        (total - f64::from(self.remaining_secs)) / total * 100.0
    }

    /// `mm:ss`.
    pub fn display(&self) -> String {
        format_mm_ss(self.remaining_secs)
    }
}

pub fn format_mm_ss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
