//! Grow-light policy.
//!
//! Night (from the local hour) forces the light off regardless of lux; an
//! unknown hour counts as night.  By day the light comes on when ambient lux
//! drops below the dark threshold and then stays on until night, ignoring
//! later lux rises.  Missing lux leaves the light as it is.

use serde::Serialize;
use tracing::{debug, info};

use crate::settings::Settings;

/// Start of the daytime window; earlier hours count as night.
pub const EARLY_MORNING_HOUR: u8 = 6;

/// True when the grow light is forbidden.
pub fn is_night(hour: Option<u8>, cutoff_hour: u8) -> bool {
    match hour {
        None => true,
        Some(h) => h >= cutoff_hour || h < EARLY_MORNING_HOUR,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingReason {
    /// Inside the night window.
    Night,
    /// No real-time clock; treated as night.
    UnknownTime,
    /// Daytime but no lux reading; state untouched.
    MissingLux,
    /// Already on; kept on until night.
    HeldOn,
    /// Below the dark threshold; switched on.
    Dark,
    /// Bright enough; left off.
    Bright,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightingDecision {
    pub reason: LightingReason,
    /// New relay state, only when it changes.
    pub light: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct LightingController {
    last_reason: Option<LightingReason>,
}

impl LightingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_reason(&self) -> Option<LightingReason> {
        self.last_reason
    }

    pub fn evaluate(
        &mut self,
        light_on: bool,
        lux: Option<f32>,
        hour: Option<u8>,
        settings: &Settings,
    ) -> LightingDecision {
        let decision = decide(light_on, lux, hour, settings);

        if self.last_reason != Some(decision.reason) || decision.light.is_some() {
            info!(
                reason = ?decision.reason,
                ?lux,
                ?hour,
                light = ?decision.light,
                "lighting: policy changed"
            );
        } else {
            debug!(reason = ?decision.reason, ?lux, "lighting: no change");
        }
        self.last_reason = Some(decision.reason);
        decision
    }
}

fn decide(
    light_on: bool,
    lux: Option<f32>,
    hour: Option<u8>,
    settings: &Settings,
) -> LightingDecision {
    let off_if_on = if light_on { Some(false) } else { None };

    if hour.is_none() {
        return LightingDecision {
            reason: LightingReason::UnknownTime,
            light: off_if_on,
        };
    }
    if is_night(hour, settings.light_cutoff_hour) {
        return LightingDecision {
            reason: LightingReason::Night,
            light: off_if_on,
        };
    }

    let Some(lux) = lux else {
        return LightingDecision {
            reason: LightingReason::MissingLux,
            light: None,
        };
    };

    if light_on {
        return LightingDecision {
            reason: LightingReason::HeldOn,
            light: None,
        };
    }

    if lux < settings.light_lux_min {
        LightingDecision {
            reason: LightingReason::Dark,
            light: Some(true),
        }
    } else {
        LightingDecision {
            reason: LightingReason::Bright,
            light: None,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
