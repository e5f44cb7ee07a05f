//! Irrigation controller: decides pump pulses from soil moisture, its trend,
//! and the pump budget.
//!
//! ## Decision order
//!
//! ```text
//! no moisture reading            → hold
//! pump running: wet enough       → stop        otherwise hold
//! outside watering window        → hold
//! soil colder than floor         → hold
//! pump cooldown not elapsed      → hold
//! moisture rising fast           → hold (recent watering / flooded sensor)
//! very dry / dry                 → water now (longer pulse when drier)
//! drying, dry within horizon     → water now (predictive)
//! pulse does not fit the budget  → hold
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::budget::PumpBudget;
use crate::sensors::Millis;
use crate::settings::Settings;
use crate::trend::Trend;

/// Below `dry_threshold - VERY_DRY_MARGIN` the soil is "very dry".
const VERY_DRY_MARGIN: f32 = 5.0;

pub const PULSE_VERY_DRY_MS: Millis = 1400;
pub const PULSE_DRY_DRYING_MS: Millis = 1200;
pub const PULSE_DRY_SLOW_MS: Millis = 800;
pub const PULSE_PREDICTIVE_MS: Millis = 800;

/// Drying slower than this (%/h, negative) is noise, not a trend.
pub const SIGNIFICANT_DRYING_PER_HOUR: f32 = -0.1;

/// Wetting faster than this (%/h) suppresses watering.
pub const RISING_FAST_PER_HOUR: f32 = 3.0;

/// True inside `[start, end)`, wrapping past midnight when `start > end`.
/// `start == end` means always open; an unknown hour means closed.
pub fn in_watering_window(hour: Option<u8>, start: u8, end: u8) -> bool {
    let Some(h) = hour else {
        return false;
    };
    if start == end {
        return true;
    }
    if start < end {
        h >= start && h < end
    } else {
        h >= start || h < end
    }
}

/// Hours until `moisture` reaches `dry_threshold` at `rate_per_hour`.
/// `None` unless the soil is drying and above the threshold.
pub fn hours_to_threshold(moisture: f32, dry_threshold: f32, rate_per_hour: f32) -> Option<f32> {
    if rate_per_hour >= 0.0 || moisture <= dry_threshold {
        return None;
    }
    let hours = (dry_threshold - moisture) / rate_per_hour;
    (hours > 0.0).then_some(hours)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldReason {
    MissingReading,
    PumpRunning,
    OutsideWindow,
    ColdSoil,
    Cooldown,
    RisingFast,
    BudgetExhausted,
    Adequate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WaterReason {
    VeryDry,
    Dry,
    Predicted { hours_to_dry: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum IrrigationDecision {
    Hold { reason: HoldReason },
    Water { pulse_ms: Millis, reason: WaterReason },
    Stop,
}

impl IrrigationDecision {
    fn hold(reason: HoldReason) -> Self {
        Self::Hold { reason }
    }
}

/// Everything the controller reads for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct IrrigationInputs<'a> {
    pub moisture: Option<f32>,
    pub soil_temperature: Option<f32>,
    pub trend: Trend,
    pub pump_on: bool,
    pub budget: &'a PumpBudget,
    pub hour: Option<u8>,
    pub now: Millis,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct IrrigationController {
    last: Option<IrrigationDecision>,
}

impl IrrigationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_decision(&self) -> Option<IrrigationDecision> {
        self.last
    }

    pub fn evaluate(
        &mut self,
        inputs: &IrrigationInputs<'_>,
        settings: &Settings,
    ) -> IrrigationDecision {
        let decision = decide(inputs, settings);

        match decision {
            IrrigationDecision::Water { pulse_ms, reason } => info!(
                moisture = ?inputs.moisture,
                slope = inputs.trend.rate_per_hour,
                pulse_ms,
                ?reason,
                "irrigation: watering"
            ),
            IrrigationDecision::Stop => info!(
                moisture = ?inputs.moisture,
                wet = settings.wet_threshold(),
                "irrigation: wet enough, stopping pump"
            ),
            IrrigationDecision::Hold { reason } if self.last != Some(decision) => info!(
                moisture = ?inputs.moisture,
                ?reason,
                "irrigation: holding"
            ),
            IrrigationDecision::Hold { reason } => debug!(?reason, "irrigation: still holding"),
        }

        self.last = Some(decision);
        decision
    }
}

fn decide(inputs: &IrrigationInputs<'_>, settings: &Settings) -> IrrigationDecision {
    let Some(moisture) = inputs.moisture else {
        return IrrigationDecision::hold(HoldReason::MissingReading);
    };

    if inputs.pump_on {
        return if moisture > settings.wet_threshold() {
            IrrigationDecision::Stop
        } else {
            IrrigationDecision::hold(HoldReason::PumpRunning)
        };
    }

    if !in_watering_window(inputs.hour, settings.watering_start_hour, settings.watering_end_hour) {
        return IrrigationDecision::hold(HoldReason::OutsideWindow);
    }

    if let (Some(floor), Some(soil_t)) = (settings.soil_temp_min, inputs.soil_temperature) {
        if soil_t < floor {
            return IrrigationDecision::hold(HoldReason::ColdSoil);
        }
    }

    if !inputs.budget.cooldown_elapsed(inputs.now, settings.pump_cooldown_ms) {
        return IrrigationDecision::hold(HoldReason::Cooldown);
    }

    let trend = inputs.trend;
    if trend.is_known() && trend.rate_per_hour > RISING_FAST_PER_HOUR {
        return IrrigationDecision::hold(HoldReason::RisingFast);
    }

    let dry = settings.dry_threshold();
    let drying = trend.is_known() && trend.rate_per_hour < SIGNIFICANT_DRYING_PER_HOUR;

    let (pulse_ms, reason) = if moisture < dry - VERY_DRY_MARGIN {
        (PULSE_VERY_DRY_MS, WaterReason::VeryDry)
    } else if moisture < dry {
        let pulse = if drying { PULSE_DRY_DRYING_MS } else { PULSE_DRY_SLOW_MS };
        (pulse, WaterReason::Dry)
    } else {
        let predicted = drying
            .then(|| hours_to_threshold(moisture, dry, trend.rate_per_hour))
            .flatten()
            .filter(|h| *h < settings.predictive_horizon_hours);
        match predicted {
            Some(hours_to_dry) => (PULSE_PREDICTIVE_MS, WaterReason::Predicted { hours_to_dry }),
            None => return IrrigationDecision::hold(HoldReason::Adequate),
        }
    };

    if !inputs.budget.can_afford(pulse_ms) {
        return IrrigationDecision::hold(HoldReason::BudgetExhausted);
    }

    IrrigationDecision::Water { pulse_ms, reason }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Millis = 10 * 60 * 1000;

    fn trend(rate: f32) -> Trend {
        Trend {
            rate_per_hour: rate,
            span_hours: 0.5,
        }
    }

    fn inputs(moisture: f32, budget: &PumpBudget) -> IrrigationInputs<'_> {
        IrrigationInputs {
            moisture: Some(moisture),
            soil_temperature: Some(18.0),
            trend: Trend::UNKNOWN,
            pump_on: false,
            budget,
            hour: Some(10),
            now: NOW,
        }
    }

    fn fresh_budget() -> PumpBudget {
        PumpBudget::new(0, Settings::default().pump_daily_limit_ms)
    }

    fn decide_default(i: &IrrigationInputs<'_>) -> IrrigationDecision {
        IrrigationController::new().evaluate(i, &Settings::default())
    }

    // -- Helpers ----------------------------------------------------------

    #[test]
    fn watering_window_variants() {
        assert!(in_watering_window(Some(6), 6, 22));
        assert!(!in_watering_window(Some(22), 6, 22));
        assert!(!in_watering_window(Some(3), 6, 22));
        // Wrapping window 22:00 → 04:00.
        assert!(in_watering_window(Some(23), 22, 4));
        assert!(in_watering_window(Some(2), 22, 4));
        assert!(!in_watering_window(Some(12), 22, 4));
        // Degenerate window is always open.
        assert!(in_watering_window(Some(3), 7, 7));
        // Unknown time closes the window.
        assert!(!in_watering_window(None, 7, 7));
    }

    #[test]
    fn hours_to_threshold_basic() {
        assert_eq!(hours_to_threshold(60.0, 50.0, -5.0), Some(2.0));
        assert_eq!(hours_to_threshold(60.0, 50.0, 1.0), None);
        assert_eq!(hours_to_threshold(45.0, 50.0, -5.0), None);
    }

    // -- Immediate watering -----------------------------------------------

    #[test]
    fn very_dry_gets_longest_pulse() {
        let b = fresh_budget();
        let d = decide_default(&inputs(40.0, &b));
        assert_eq!(
            d,
            IrrigationDecision::Water {
                pulse_ms: PULSE_VERY_DRY_MS,
                reason: WaterReason::VeryDry
            }
        );
    }

    #[test]
    fn dry_and_drying_gets_medium_pulse() {
        let b = fresh_budget();
        let mut i = inputs(48.0, &b);
        i.trend = trend(-1.0);
        assert_eq!(
            decide_default(&i),
            IrrigationDecision::Water {
                pulse_ms: PULSE_DRY_DRYING_MS,
                reason: WaterReason::Dry
            }
        );
    }

    #[test]
    fn dry_without_trend_gets_short_pulse() {
        let b = fresh_budget();
        let d = decide_default(&inputs(48.0, &b));
        assert_eq!(
            d,
            IrrigationDecision::Water {
                pulse_ms: PULSE_DRY_SLOW_MS,
                reason: WaterReason::Dry
            }
        );
    }

    #[test]
    fn adequate_moisture_holds() {
        let b = fresh_budget();
        let d = decide_default(&inputs(57.0, &b));
        assert_eq!(d, IrrigationDecision::hold(HoldReason::Adequate));
    }

    // -- Predictive -------------------------------------------------------

    #[test]
    fn predictive_within_horizon_waters() {
        let b = fresh_budget();
        let settings = Settings {
            predictive_horizon_hours: 6.0,
            ..Settings::default()
        };
        let mut i = inputs(60.0, &b);
        i.trend = trend(-5.0);
        let d = IrrigationController::new().evaluate(&i, &settings);
        assert_eq!(
            d,
            IrrigationDecision::Water {
                pulse_ms: PULSE_PREDICTIVE_MS,
                reason: WaterReason::Predicted { hours_to_dry: 2.0 }
            }
        );
    }

    #[test]
    fn predictive_beyond_horizon_holds() {
        let b = fresh_budget();
        let settings = Settings {
            predictive_horizon_hours: 1.0,
            ..Settings::default()
        };
        let mut i = inputs(60.0, &b);
        i.trend = trend(-5.0);
        let d = IrrigationController::new().evaluate(&i, &settings);
        assert_eq!(d, IrrigationDecision::hold(HoldReason::Adequate));
    }

    #[test]
    fn insignificant_drying_is_not_predictive() {
        let b = fresh_budget();
        let mut i = inputs(50.01, &b);
        i.trend = trend(-0.05);
        assert_eq!(decide_default(&i), IrrigationDecision::hold(HoldReason::Adequate));
    }

    // -- Suppression ------------------------------------------------------

    #[test]
    fn rising_fast_suppresses_even_when_dry() {
        let b = fresh_budget();
        let mut i = inputs(40.0, &b);
        i.trend = trend(6.0);
        assert_eq!(decide_default(&i), IrrigationDecision::hold(HoldReason::RisingFast));
    }

    #[test]
    fn cold_soil_suppresses() {
        let b = fresh_budget();
        let mut i = inputs(40.0, &b);
        i.soil_temperature = Some(5.0);
        assert_eq!(decide_default(&i), IrrigationDecision::hold(HoldReason::ColdSoil));
    }

    #[test]
    fn missing_soil_temperature_does_not_block() {
        let b = fresh_budget();
        let mut i = inputs(40.0, &b);
        i.soil_temperature = None;
        assert!(matches!(decide_default(&i), IrrigationDecision::Water { .. }));
    }

    #[test]
    fn outside_window_holds() {
        let b = fresh_budget();
        let mut i = inputs(40.0, &b);
        i.hour = Some(23);
        assert_eq!(decide_default(&i), IrrigationDecision::hold(HoldReason::OutsideWindow));
    }

    #[test]
    fn unknown_time_closes_window() {
        let b = fresh_budget();
        let mut i = inputs(40.0, &b);
        i.hour = None;
        assert_eq!(decide_default(&i), IrrigationDecision::hold(HoldReason::OutsideWindow));
    }

    #[test]
    fn cooldown_holds() {
        let mut b = fresh_budget();
        assert!(b.try_reserve(1000, 0, NOW - 60_000));
        let d = decide_default(&inputs(40.0, &b));
        assert_eq!(d, IrrigationDecision::hold(HoldReason::Cooldown));
    }

    #[test]
    fn exhausted_budget_holds() {
        let mut b = PumpBudget::new(0, 2000);
        assert!(b.try_reserve(1000, 0, 0));
        let d = decide_default(&inputs(40.0, &b));
        assert_eq!(d, IrrigationDecision::hold(HoldReason::BudgetExhausted));
    }

    #[test]
    fn missing_moisture_holds() {
        let b = fresh_budget();
        let mut i = inputs(40.0, &b);
        i.moisture = None;
        assert_eq!(decide_default(&i), IrrigationDecision::hold(HoldReason::MissingReading));
    }

    // -- Stop -------------------------------------------------------------

    #[test]
    fn running_pump_stops_when_wet() {
        let b = fresh_budget();
        let mut i = inputs(61.0, &b);
        i.pump_on = true;
        assert_eq!(decide_default(&i), IrrigationDecision::Stop);
    }

    #[test]
    fn running_pump_below_wet_threshold_keeps_running() {
        let b = fresh_budget();
        let mut i = inputs(40.0, &b);
        i.pump_on = true;
        assert_eq!(decide_default(&i), IrrigationDecision::hold(HoldReason::PumpRunning));
    }

    #[test]
    fn controller_remembers_last_decision() {
        let b = fresh_budget();
        let mut c = IrrigationController::new();
        assert_eq!(c.last_decision(), None);
        c.evaluate(&inputs(57.0, &b), &Settings::default());
        assert_eq!(c.last_decision(), Some(IrrigationDecision::hold(HoldReason::Adequate)));
    }
}
