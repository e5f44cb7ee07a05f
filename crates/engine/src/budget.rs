//! Daily pump run-time budget and start cooldown.
//!
//! Accounting is reserve-at-start: a pulse books its full duration when it
//! starts, and any part that did not run (early stop, restarted deadline) is
//! handed back.  The booked total therefore equals real run time and never
//! exceeds the daily ceiling.

use serde::Serialize;

use crate::sensors::Millis;

/// Length of one budget period.
pub const DAILY_RESET_MS: Millis = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpBudget {
    daily_limit_ms: Millis,
    used_today_ms: Millis,
    reset_at: Millis,
    last_start_at: Option<Millis>,
}

/// Serialisable view for status surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub used_today_ms: Millis,
    pub remaining_ms: Millis,
    pub daily_limit_ms: Millis,
}

impl PumpBudget {
    pub fn new(now: Millis, daily_limit_ms: Millis) -> Self {
        Self {
            daily_limit_ms,
            used_today_ms: 0,
            reset_at: now + DAILY_RESET_MS,
            last_start_at: None,
        }
    }

    /// Start a fresh period if the current one has ended.  `in_flight_ms` is
    /// the part of a running pulse that has not elapsed yet; it moves into the
    /// new period so a later refund lands where the time was booked.  Returns
    /// whether a reset happened.
    pub fn roll(&mut self, now: Millis, in_flight_ms: Millis) -> bool {
        if now < self.reset_at {
            return false;
        }
        self.used_today_ms = in_flight_ms;
        self.reset_at = now + DAILY_RESET_MS;
        true
    }

    /// Adopt a new ceiling from settings.  Time already booked stays booked.
    pub fn set_daily_limit(&mut self, daily_limit_ms: Millis) {
        self.daily_limit_ms = daily_limit_ms;
    }

    pub fn used_today_ms(&self) -> Millis {
        self.used_today_ms
    }

    pub fn remaining_ms(&self) -> Millis {
        self.daily_limit_ms.saturating_sub(self.used_today_ms)
    }

    pub fn last_start_at(&self) -> Option<Millis> {
        self.last_start_at
    }

    /// True when a pulse of `pulse_ms` fits in what is left today.
    pub fn can_afford(&self, pulse_ms: Millis) -> bool {
        pulse_ms <= self.remaining_ms()
    }

    /// True when no pump start happened within the last `cooldown_ms`.
    pub fn cooldown_elapsed(&self, now: Millis, cooldown_ms: Millis) -> bool {
        match self.last_start_at {
            None => true,
            Some(at) => now.saturating_sub(at) >= cooldown_ms,
        }
    }

    /// Book `pulse_ms`, first handing back `unused_ms` from a pulse that this
    /// one supersedes.  Refused entirely (nothing changes) if the result would
    /// exceed the ceiling.
    pub fn try_reserve(&mut self, pulse_ms: Millis, unused_ms: Millis, now: Millis) -> bool {
        let base = self.used_today_ms.saturating_sub(unused_ms);
        if base + pulse_ms > self.daily_limit_ms {
            return false;
        }
        self.used_today_ms = base + pulse_ms;
        self.last_start_at = Some(now);
        true
    }

    /// Hand back booked time that was not used.
    pub fn refund(&mut self, unused_ms: Millis) {
        self.used_today_ms = self.used_today_ms.saturating_sub(unused_ms);
    }

    pub fn status(&self) -> BudgetStatus {
        BudgetStatus {
            used_today_ms: self.used_today_ms,
            remaining_ms: self.remaining_ms(),
            daily_limit_ms: self.daily_limit_ms,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
