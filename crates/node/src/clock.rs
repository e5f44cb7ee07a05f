//! Wall-clock source for the lighting and irrigation windows.
//!
//! The engine only wants the local hour, and only when it can be trusted.
//! `time` refuses to report the local offset when it cannot do so soundly
//! (e.g. multi-threaded on some platforms); that case maps to `None`, which
//! the controllers treat as "time unknown".

use std::time::Instant;
use time::OffsetDateTime;

/// Hour of day of `at`, in its own offset.
pub fn hour_of(at: OffsetDateTime) -> u8 {
    at.hour()
}

/// Current local hour, or `None` if the local offset is unavailable.
/// `fixed` pins the hour (simulation and bench testing).
pub fn local_hour(fixed: Option<u8>) -> Option<u8> {
    if let Some(hour) = fixed {
        return (hour < 24).then_some(hour);
    }
    OffsetDateTime::now_local().ok().map(hour_of)
}

/// Monotonic millisecond clock starting at zero when created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    started: Instant,
}

impl MonotonicClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
