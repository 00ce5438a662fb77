use crate::*;

pub const DEFAULT_AUTO_INTERVAL_MS: u32 = 900;

/// Auto-play switch for the slot machine.
///
/// The core never owns a timer. A front-end schedules one tick at a time and only schedules the next one when
/// [`AutoTick::reschedule`] says so, so cancelling is just not scheduling again.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AutoPlay {
    enabled: bool,
    interval_ms: u32,
}

impl AutoPlay {
    pub const fn with_interval(interval_ms: u32) -> Self {
        Self {
            enabled: false,
            interval_ms,
        }
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub const fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub(crate) fn start(&mut self) {
        self.enabled = true;
    }

    pub(crate) fn stop(&mut self) {
        self.enabled = false;
    }
}

impl Default for AutoPlay {
    fn default() -> Self {
        Self::with_interval(DEFAULT_AUTO_INTERVAL_MS)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AutoStop {
    Cancelled,
    InsufficientFunds,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AutoTick {
    /// Spun and can afford another spin.
    Continue(SpinReport),
    /// Auto-play is off now, `last` holds the spin that ran on this tick if any.
    Stop {
        last: Option<SpinReport>,
        reason: AutoStop,
    },
}

impl AutoTick {
    pub const fn reschedule(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    pub fn report(&self) -> Option<&SpinReport> {
        match self {
            Self::Continue(report) => Some(report),
            Self::Stop { last, .. } => last.as_ref(),
        }
    }
}
