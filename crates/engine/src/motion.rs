//! Non-blocking actuator motion: door ramp and pump auto-off.
//!
//! Advanced on every loop iteration, independently of the decision tick.
//! A new door target supersedes the in-flight motion and restarts the ramp
//! from wherever the door currently is.

use crate::sensors::Millis;

pub const DOOR_CLOSED_ANGLE: u8 = 0;
pub const DOOR_HALF_ANGLE: u8 = 60;
pub const DOOR_OPEN_ANGLE: u8 = 120;
pub const DOOR_MAX_ANGLE: u8 = 180;

/// Time for any door move, regardless of distance.
pub const DOOR_MOVE_DURATION_MS: Millis = 800;

/// The door reads as "open" once within this many degrees of fully open.
const OPEN_DETECT_MARGIN: u8 = 5;

// ---------------------------------------------------------------------------
// Door
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DoorMotion {
    angle: f32,
    start_angle: f32,
    target: u8,
    started_at: Millis,
    duration_ms: Millis,
    moving: bool,
}

impl DoorMotion {
    /// A door at rest at `angle`.
    pub fn at_rest(angle: u8) -> Self {
        let angle = angle.min(DOOR_MAX_ANGLE);
        Self {
            angle: f32::from(angle),
            start_angle: f32::from(angle),
            target: angle,
            started_at: 0,
            duration_ms: DOOR_MOVE_DURATION_MS,
            moving: false,
        }
    }

    /// Begin moving toward `angle` (clamped to 0..=180), starting from the
    /// current, possibly intermediate, position.
    pub fn set_target(&mut self, angle: u8, now: Millis) {
        self.start_angle = self.angle;
        self.target = angle.min(DOOR_MAX_ANGLE);
        self.started_at = now;
        self.moving = true;
    }

    /// Interpolate toward the target.  Returns the angle to drive while a
    /// motion is in flight (including the final snap), `None` when at rest.
    pub fn advance(&mut self, now: Millis) -> Option<u8> {
        if !self.moving {
            return None;
        }
        let elapsed = now.saturating_sub(self.started_at);
        if elapsed >= self.duration_ms {
            self.angle = f32::from(self.target);
            self.moving = false;
        } else {
            let progress = elapsed as f32 / self.duration_ms as f32;
            self.angle = self.start_angle + (f32::from(self.target) - self.start_angle) * progress;
        }
        Some(self.angle())
    }

    pub fn angle(&self) -> u8 {
        self.angle.round().clamp(0.0, f32::from(DOOR_MAX_ANGLE)) as u8
    }

    pub fn target(&self) -> u8 {
        self.target
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Open-detection from the instantaneous angle.
    pub fn is_open(&self) -> bool {
        self.angle() >= DOOR_OPEN_ANGLE - OPEN_DETECT_MARGIN
    }
}

// ---------------------------------------------------------------------------
// Pump
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpTimer {
    on: bool,
    off_at: Millis,
}

impl PumpTimer {
    /// Turn on for `duration_ms`.  Restarting while on replaces the deadline.
    pub fn start(&mut self, duration_ms: Millis, now: Millis) {
        self.on = true;
        self.off_at = now + duration_ms;
    }

    /// Explicit stop.  Returns the part of the pulse that did not run.
    pub fn stop(&mut self, now: Millis) -> Millis {
        let unused = self.remaining_ms(now);
        self.on = false;
        unused
    }

    /// Turn off once the deadline passes.  Returns true exactly on the tick
    /// that performs the auto-off.
    pub fn advance(&mut self, now: Millis) -> bool {
        if self.on && now >= self.off_at {
            self.on = false;
            return true;
        }
        false
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn remaining_ms(&self, now: Millis) -> Millis {
        if self.on {
            self.off_at.saturating_sub(now)
        } else {
            0
        }
    }
}

// ---------------------------------------------------------------------------
// Combined model
// ---------------------------------------------------------------------------

/// What changed during one fast tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionUpdate {
    pub door_angle: Option<u8>,
    pub pump_auto_off: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorMotionModel {
    pub door: DoorMotion,
    pub pump: PumpTimer,
}

impl Default for ActuatorMotionModel {
    fn default() -> Self {
        Self {
            door: DoorMotion::at_rest(DOOR_CLOSED_ANGLE),
            pump: PumpTimer::default(),
        }
    }
}

impl ActuatorMotionModel {
    pub fn advance(&mut self, now: Millis) -> MotionUpdate {
        MotionUpdate {
            door_angle: self.door.advance(now),
            pump_auto_off: self.pump.advance(now),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
