//! Climate controller: door aperture and fan from air temperature/humidity.
//!
//! ## Bands (first match wins)
//!
//! ```text
//! Emergency   t < safety_min           → door Closed, fan off   (no dwell)
//!             t > safety_max           → door Open,   fan on    (no dwell)
//! Strong      t > very_hot && h > humid → door Open,   fan on
//! Mild        t > hot || h > hum_max    → door ≥ Half, fan on
//! Recovery    t < back_t && h < back_h  → door Closed, fan off
//! (between)                            → hold
//! ```
//!
//! Every non-emergency change is gated by the same actuator's dwell time.
//! A blocked change is simply not made; the next tick re-evaluates.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::motion::{DOOR_CLOSED_ANGLE, DOOR_HALF_ANGLE, DOOR_OPEN_ANGLE};
use crate::sensors::{Millis, SensorSnapshot};
use crate::settings::{ClimateMode, Settings};

/// Humidity margin above/below `comfort_hum_max` for the strong and
/// recovery bands.
const HUMIDITY_MARGIN: f32 = 5.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aperture {
    Closed,
    Half,
    Open,
}

impl Aperture {
    pub fn angle(self) -> u8 {
        match self {
            Self::Closed => DOOR_CLOSED_ANGLE,
            Self::Half => DOOR_HALF_ANGLE,
            Self::Open => DOOR_OPEN_ANGLE,
        }
    }

    /// Nearest aperture for an arbitrary (manual) door angle.
    pub fn from_angle(angle: u8) -> Self {
        if angle < DOOR_HALF_ANGLE / 2 {
            Self::Closed
        } else if angle < (DOOR_HALF_ANGLE + DOOR_OPEN_ANGLE) / 2 {
            Self::Half
        } else {
            Self::Open
        }
    }
}

/// Minimum time an actuator must stay put before it may change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwellTimes {
    pub fan_min_on_ms: Millis,
    pub fan_min_off_ms: Millis,
    pub door_min_open_ms: Millis,
    pub door_min_closed_ms: Millis,
}

impl Default for DwellTimes {
    fn default() -> Self {
        Self {
            fan_min_on_ms: 30 * 1000,
            fan_min_off_ms: 20 * 1000,
            door_min_open_ms: 60 * 1000,
            door_min_closed_ms: 60 * 1000,
        }
    }
}

/// Committed climate actuator state and when each part last changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClimateState {
    pub door: Aperture,
    pub fan_on: bool,
    pub door_changed_at: Millis,
    pub fan_changed_at: Millis,
}

impl ClimateState {
    /// Boot state: everything closed/off, counted as a change at `now`.
    pub fn new(now: Millis) -> Self {
        Self {
            door: Aperture::Closed,
            fan_on: false,
            door_changed_at: now,
            fan_changed_at: now,
        }
    }
}

/// Which band the last evaluation landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimateBand {
    MissingReading,
    EmergencyCold,
    EmergencyHot,
    StrongVentilation,
    MildVentilation,
    Recovery,
    Hold,
}

/// Outcome of one evaluation.  `door`/`fan` are set only for committed
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateDecision {
    pub band: ClimateBand,
    pub door: Option<Aperture>,
    pub fan: Option<bool>,
}

impl ClimateDecision {
    fn idle(band: ClimateBand) -> Self {
        Self {
            band,
            door: None,
            fan: None,
        }
    }
}

/// Temperature thresholds derived from the comfort band and mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub hot: f32,
    pub very_hot: f32,
    pub back_temp: f32,
    pub humid: f32,
    pub hum_max: f32,
    pub back_hum: f32,
}

impl ClimateMode {
    /// `(hot, very_hot, back)` deltas around `comfort_temp_max`.
    pub fn deltas(self) -> (f32, f32, f32) {
        match self {
            Self::Eco => (2.0, 6.0, 1.5),
            Self::Normal => (1.0, 4.0, 1.0),
            Self::Aggressive => (0.5, 2.0, 0.5),
        }
    }
}

impl Thresholds {
    pub fn from_settings(settings: &Settings) -> Self {
        let (hot, very_hot, back) = settings.climate_mode.deltas();
        let t = settings.comfort_temp_max;
        let h = settings.comfort_hum_max;
        Self {
            hot: t + hot,
            very_hot: t + very_hot,
            back_temp: t - back,
            humid: h + HUMIDITY_MARGIN,
            hum_max: h,
            back_hum: h - HUMIDITY_MARGIN,
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ClimateController {
    state: ClimateState,
    dwell: DwellTimes,
}

impl ClimateController {
    pub fn new(now: Millis) -> Self {
        Self::with_dwell(now, DwellTimes::default())
    }

    pub fn with_dwell(now: Millis, dwell: DwellTimes) -> Self {
        Self {
            state: ClimateState::new(now),
            dwell,
        }
    }

    pub fn state(&self) -> &ClimateState {
        &self.state
    }

    /// Record a door change made outside the controller (manual override).
    pub fn sync_door(&mut self, door: Aperture, now: Millis) {
        if self.state.door != door {
            self.state.door = door;
            self.state.door_changed_at = now;
        }
    }

    /// Record a fan change made outside the controller (manual override).
    pub fn sync_fan(&mut self, on: bool, now: Millis) {
        if self.state.fan_on != on {
            self.state.fan_on = on;
            self.state.fan_changed_at = now;
        }
    }

    pub fn evaluate(
        &mut self,
        snapshot: &SensorSnapshot,
        settings: &Settings,
        now: Millis,
    ) -> ClimateDecision {
        let (Some(t), Some(h)) = (snapshot.air_temperature, snapshot.air_humidity) else {
            return ClimateDecision::idle(ClimateBand::MissingReading);
        };

        // ── Emergency: bypass dwell ─────────────────────────────────
        if let Some(min) = settings.safety_temp_min.filter(|min| t < *min) {
            let decision = self.force(ClimateBand::EmergencyCold, Aperture::Closed, false, now);
            if decision.door.is_some() || decision.fan.is_some() {
                warn!(temp = t, safety_min = min, "climate: below safety minimum, closing up");
            }
            return decision;
        }
        if let Some(max) = settings.safety_temp_max.filter(|max| t > *max) {
            let decision = self.force(ClimateBand::EmergencyHot, Aperture::Open, true, now);
            if decision.door.is_some() || decision.fan.is_some() {
                warn!(
                    temp = t,
                    safety_max = max,
                    "climate: above safety maximum, full ventilation"
                );
            }
            return decision;
        }

        let th = Thresholds::from_settings(settings);

        // ── Strong / mild ventilation ───────────────────────────────
        if t > th.very_hot && h > th.humid {
            let mut decision = ClimateDecision::idle(ClimateBand::StrongVentilation);
            decision.door = self.try_door(Aperture::Open, now);
            decision.fan = self.try_fan(true, now);
            self.log_commit(&decision, t, h);
            return decision;
        }
        if t > th.hot || h > th.hum_max {
            let mut decision = ClimateDecision::idle(ClimateBand::MildVentilation);
            if self.state.door == Aperture::Closed {
                decision.door = self.try_door(Aperture::Half, now);
            }
            decision.fan = self.try_fan(true, now);
            self.log_commit(&decision, t, h);
            return decision;
        }

        // ── Recovery ────────────────────────────────────────────────
        if t < th.back_temp && h < th.back_hum {
            let mut decision = ClimateDecision::idle(ClimateBand::Recovery);
            decision.door = self.try_door(Aperture::Closed, now);
            decision.fan = self.try_fan(false, now);
            self.log_commit(&decision, t, h);
            return decision;
        }

        ClimateDecision::idle(ClimateBand::Hold)
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Commit `door` if it differs and the current position has been held
    /// long enough.
    fn try_door(&mut self, door: Aperture, now: Millis) -> Option<Aperture> {
        if self.state.door == door {
            return None;
        }
        let dwell = match self.state.door {
            Aperture::Closed => self.dwell.door_min_closed_ms,
            Aperture::Half | Aperture::Open => self.dwell.door_min_open_ms,
        };
        let held = now.saturating_sub(self.state.door_changed_at);
        if held <= dwell {
            debug!(held_ms = held, dwell_ms = dwell, ?door, "climate: door change deferred");
            return None;
        }
        self.state.door = door;
        self.state.door_changed_at = now;
        Some(door)
    }

    fn try_fan(&mut self, on: bool, now: Millis) -> Option<bool> {
        if self.state.fan_on == on {
            return None;
        }
        let dwell = if self.state.fan_on {
            self.dwell.fan_min_on_ms
        } else {
            self.dwell.fan_min_off_ms
        };
        let held = now.saturating_sub(self.state.fan_changed_at);
        if held <= dwell {
            debug!(held_ms = held, dwell_ms = dwell, on, "climate: fan change deferred");
            return None;
        }
        self.state.fan_on = on;
        self.state.fan_changed_at = now;
        Some(on)
    }

    fn force(
        &mut self,
        band: ClimateBand,
        door: Aperture,
        fan_on: bool,
        now: Millis,
    ) -> ClimateDecision {
        let mut decision = ClimateDecision::idle(band);
        if self.state.door != door {
            self.state.door = door;
            self.state.door_changed_at = now;
            decision.door = Some(door);
        }
        if self.state.fan_on != fan_on {
            self.state.fan_on = fan_on;
            self.state.fan_changed_at = now;
            decision.fan = Some(fan_on);
        }
        decision
    }

    fn log_commit(&self, decision: &ClimateDecision, t: f32, h: f32) {
        if decision.door.is_some() || decision.fan.is_some() {
            info!(
                band = ?decision.band,
                temp = t,
                humidity = h,
                door = ?decision.door,
                fan = ?decision.fan,
                "climate: actuators changed"
            );
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
