//! The engine owns every controller and runs them on two clocks:
//!
//! - [`Engine::advance`] on every loop iteration (door ramp, pump auto-off)
//! - [`Engine::tick`] at most once per [`AUTOMATION_INTERVAL_MS`]
//!   (soil sampling, then climate → lighting → irrigation)
//!
//! Manual overrides go through the same actuator model and bookkeeping as
//! automation, so dwell timers and the pump budget see them.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::budget::PumpBudget;
use crate::climate::{Aperture, ClimateBand, ClimateController};
use crate::irrigation::{
    hours_to_threshold, IrrigationController, IrrigationDecision, IrrigationInputs,
};
use crate::lighting::{LightingController, LightingReason};
use crate::motion::ActuatorMotionModel;
use crate::sensors::{ActuatorState, Millis, SensorDevice, SensorHealth, SensorSnapshot};
use crate::settings::Settings;
use crate::state::{EngineStatus, EventKind, EventLog};
use crate::trend::{SoilTrendTracker, Trend};

/// Minimum spacing between decision ticks.
pub const AUTOMATION_INTERVAL_MS: Millis = 5_000;

/// Dry-out forecasts further out than this are not reported.
pub const FORECAST_CAP_HOURS: f32 = 72.0;

/// Logical actuator command for the board layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "actuator")]
pub enum Command {
    DoorAngle { angle: u8 },
    Fan { on: bool },
    Light { on: bool },
    /// `pulse_ms` is the booked run time when switching on, 0 when off.
    Pump { on: bool, pulse_ms: Millis },
}

impl Command {
    fn pump_off() -> Self {
        Self::Pump {
            on: false,
            pulse_ms: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    started_at: Millis,
    settings: Settings,
    climate: ClimateController,
    lighting: LightingController,
    irrigation: IrrigationController,
    motion: ActuatorMotionModel,
    budget: PumpBudget,
    soil: SoilTrendTracker,
    light_on: bool,
    last_tick_at: Option<Millis>,
    last_band: Option<ClimateBand>,
    last_moisture: Option<f32>,
    health: SensorHealth,
    events: EventLog,
}

impl Engine {
    /// Boot state: door closed, fan/light/pump off, every timer at `now`.
    pub fn new(now: Millis) -> Self {
        let settings = Settings::default();
        let mut events = EventLog::new();
        events.push(now, EventKind::System, "engine started");

        Self {
            started_at: now,
            budget: PumpBudget::new(now, settings.pump_daily_limit_ms),
            settings,
            climate: ClimateController::new(now),
            lighting: LightingController::new(),
            irrigation: IrrigationController::new(),
            motion: ActuatorMotionModel::default(),
            soil: SoilTrendTracker::default(),
            light_on: false,
            last_tick_at: None,
            last_band: None,
            last_moisture: None,
            health: SensorHealth::default(),
            events,
        }
    }

    // ── Fast tick ─────────────────────────────────────────────────

    pub fn advance(&mut self, now: Millis) -> Vec<Command> {
        let update = self.motion.advance(now);
        let mut commands = Vec::new();

        if let Some(angle) = update.door_angle {
            commands.push(Command::DoorAngle { angle });
        }
        if update.pump_auto_off {
            debug!(used_today_ms = self.budget.used_today_ms(), "pump pulse finished");
            commands.push(Command::pump_off());
        }
        commands
    }

    // ── Decision tick ─────────────────────────────────────────────

    /// True when [`Engine::tick`] would run at `now`.
    pub fn decision_due(&self, now: Millis) -> bool {
        self.last_tick_at
            .map_or(true, |last| now.saturating_sub(last) >= AUTOMATION_INTERVAL_MS)
    }

    pub fn tick(
        &mut self,
        now: Millis,
        snapshot: &SensorSnapshot,
        settings: &Settings,
        hour: Option<u8>,
    ) -> Vec<Command> {
        if !self.decision_due(now) {
            return Vec::new();
        }
        self.last_tick_at = Some(now);

        if settings.automation_enabled != self.settings.automation_enabled {
            let state = if settings.automation_enabled { "enabled" } else { "disabled" };
            info!(state, "automation toggled");
            self.events.push(now, EventKind::System, format!("automation {state}"));
        }
        self.settings = settings.clone();

        self.budget.set_daily_limit(settings.pump_daily_limit_ms);
        if self.budget.roll(now, self.motion.pump.remaining_ms(now)) {
            info!("pump budget reset for new day");
            self.events.push(now, EventKind::System, "pump budget reset");
        }

        for (device, healthy) in self.health.observe(snapshot) {
            if healthy {
                info!(?device, "sensor recovered");
                self.events
                    .push(now, EventKind::System, format!("{device:?} sensor recovered"));
            } else {
                warn!(?device, "sensor unhealthy: no readings");
                self.events
                    .push(now, EventKind::System, format!("{device:?} sensor unhealthy"));
            }
        }

        self.last_moisture = snapshot.soil_moisture;
        if let Some(moisture) = snapshot.soil_moisture {
            if self.soil.record(moisture, now) {
                debug!(moisture, samples = self.soil.history().len(), "soil sample recorded");
            }
        }

        if !settings.automation_enabled {
            return Vec::new();
        }

        let mut commands = Vec::new();
        self.run_climate(now, snapshot, settings, &mut commands);
        self.run_lighting(now, snapshot, settings, hour, &mut commands);
        self.run_irrigation(now, snapshot, settings, hour, &mut commands);
        commands
    }

    fn run_climate(
        &mut self,
        now: Millis,
        snapshot: &SensorSnapshot,
        settings: &Settings,
        commands: &mut Vec<Command>,
    ) {
        let decision = self.climate.evaluate(snapshot, settings, now);
        self.last_band = Some(decision.band);

        let kind = match decision.band {
            ClimateBand::EmergencyCold | ClimateBand::EmergencyHot => EventKind::Safety,
            _ => EventKind::Climate,
        };

        if let Some(door) = decision.door {
            self.motion.door.set_target(door.angle(), now);
            self.events
                .push(now, kind, format!("{:?}: door {:?}", decision.band, door));
        }
        if let Some(on) = decision.fan {
            commands.push(Command::Fan { on });
            self.events
                .push(now, kind, format!("{:?}: fan {}", decision.band, on_off(on)));
        }
    }

    fn run_lighting(
        &mut self,
        now: Millis,
        snapshot: &SensorSnapshot,
        settings: &Settings,
        hour: Option<u8>,
        commands: &mut Vec<Command>,
    ) {
        let decision = self
            .lighting
            .evaluate(self.light_on, snapshot.light_lux, hour, settings);

        if let Some(on) = decision.light {
            self.light_on = on;
            commands.push(Command::Light { on });
            self.events.push(
                now,
                EventKind::Lighting,
                format!("light {} ({:?})", on_off(on), decision.reason),
            );
        }
    }

    fn run_irrigation(
        &mut self,
        now: Millis,
        snapshot: &SensorSnapshot,
        settings: &Settings,
        hour: Option<u8>,
        commands: &mut Vec<Command>,
    ) {
        let previous = self.irrigation.last_decision();
        let inputs = IrrigationInputs {
            moisture: snapshot.soil_moisture,
            soil_temperature: snapshot.soil_temperature,
            trend: self.soil.slope(now, settings.trend_strictness),
            pump_on: self.motion.pump.is_on(),
            budget: &self.budget,
            hour,
            now,
        };
        let decision = self.irrigation.evaluate(&inputs, settings);

        match decision {
            IrrigationDecision::Water { pulse_ms, reason } => {
                if self.start_pump(pulse_ms, now) {
                    commands.push(Command::Pump { on: true, pulse_ms });
                    self.events.push(
                        now,
                        EventKind::Irrigation,
                        format!("watering {pulse_ms} ms ({reason:?})"),
                    );
                }
            }
            IrrigationDecision::Stop => {
                self.stop_pump(now);
                commands.push(Command::pump_off());
                self.events
                    .push(now, EventKind::Irrigation, "pump stopped: soil wet");
            }
            IrrigationDecision::Hold { reason } => {
                if previous != Some(decision) {
                    self.events
                        .push(now, EventKind::Irrigation, format!("holding: {reason:?}"));
                }
            }
        }
    }

    // ── Pump bookkeeping ──────────────────────────────────────────

    /// Book and start a pulse, superseding any running one.  A zero
    /// `pulse_ms` runs continuously for whatever budget is left today.
    fn start_pump(&mut self, pulse_ms: Millis, now: Millis) -> bool {
        let unused = self.motion.pump.remaining_ms(now);
        self.budget.roll(now, unused);
        let duration = if pulse_ms == 0 {
            self.budget.remaining_ms() + unused
        } else {
            pulse_ms
        };

        if duration == 0 || !self.budget.try_reserve(duration, unused, now) {
            warn!(
                requested_ms = duration,
                remaining_ms = self.budget.remaining_ms(),
                "pump request refused: daily budget"
            );
            return false;
        }
        self.motion.pump.start(duration, now);
        true
    }

    fn stop_pump(&mut self, now: Millis) {
        let unused = self.motion.pump.stop(now);
        self.budget.refund(unused);
    }

    // ── Manual overrides ──────────────────────────────────────────

    /// Start a door move to `angle` (clamped to 0..=180).  Angles are
    /// emitted by [`Engine::advance`].
    pub fn set_door_target(&mut self, angle: u8, now: Millis) {
        self.motion.door.set_target(angle, now);
        self.climate.sync_door(Aperture::from_angle(angle), now);
        info!(angle, "override: door");
        self.events
            .push(now, EventKind::Override, format!("door → {angle}°"));
    }

    pub fn set_fan(&mut self, on: bool, now: Millis) -> Command {
        self.climate.sync_fan(on, now);
        info!(on, "override: fan");
        self.events
            .push(now, EventKind::Override, format!("fan {}", on_off(on)));
        Command::Fan { on }
    }

    pub fn set_light(&mut self, on: bool, now: Millis) -> Command {
        self.light_on = on;
        info!(on, "override: light");
        self.events
            .push(now, EventKind::Override, format!("light {}", on_off(on)));
        Command::Light { on }
    }

    /// Pump override.  `pulse_ms == 0` with `on` runs continuously until
    /// stopped or the budget runs out.  Returns `None` when the budget
    /// refuses the pulse.
    pub fn set_pump(&mut self, on: bool, pulse_ms: Millis, now: Millis) -> Option<Command> {
        if !on {
            self.stop_pump(now);
            info!("override: pump off");
            self.events.push(now, EventKind::Override, "pump off");
            return Some(Command::pump_off());
        }

        if !self.start_pump(pulse_ms, now) {
            self.events.push(
                now,
                EventKind::Override,
                format!("pump {pulse_ms} ms refused: daily budget"),
            );
            return None;
        }
        let booked = self.motion.pump.remaining_ms(now);
        info!(pulse_ms = booked, "override: pump on");
        self.events
            .push(now, EventKind::Override, format!("pump on for {booked} ms"));
        Some(Command::Pump {
            on: true,
            pulse_ms: booked,
        })
    }

    // ── Read side ─────────────────────────────────────────────────

    pub fn current_actuator_state(&self) -> ActuatorState {
        ActuatorState {
            door_open: self.motion.door.is_open(),
            fan_on: self.climate.state().fan_on,
            light_on: self.light_on,
            pump_on: self.motion.pump.is_on(),
        }
    }

    pub fn soil_trend(&self, now: Millis) -> Trend {
        self.soil.slope(now, self.settings.trend_strictness)
    }

    pub fn soil_tracker(&self) -> &SoilTrendTracker {
        &self.soil
    }

    pub fn budget(&self) -> &PumpBudget {
        &self.budget
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn sensor_healthy(&self, device: SensorDevice) -> bool {
        self.health.is_healthy(device)
    }

    pub fn lighting_reason(&self) -> Option<LightingReason> {
        self.lighting.last_reason()
    }

    /// Hours until the last moisture reading crosses the dry threshold at the
    /// current trend.  Only while drying, above the threshold, and within
    /// [`FORECAST_CAP_HOURS`].
    pub fn hours_to_dry(&self, now: Millis) -> Option<f32> {
        let trend = self.soil_trend(now);
        if !trend.is_known() {
            return None;
        }
        let moisture = self.last_moisture?;
        hours_to_threshold(moisture, self.settings.dry_threshold(), trend.rate_per_hour)
            .filter(|h| *h < FORECAST_CAP_HOURS)
    }

    pub fn status(&self, now: Millis) -> EngineStatus {
        let door = &self.motion.door;
        EngineStatus {
            uptime_ms: now.saturating_sub(self.started_at),
            automation_enabled: self.settings.automation_enabled,
            actuators: self.current_actuator_state(),
            door_angle: door.angle(),
            door_target: door.target(),
            door_moving: door.is_moving(),
            door_aperture: self.climate.state().door,
            soil_moisture: self.last_moisture,
            trend: self.soil_trend(now).into(),
            hours_to_dry: self.hours_to_dry(now),
            budget: self.budget.status(),
            climate_band: self.last_band,
            lighting: self.lighting.last_reason(),
            last_irrigation: self.irrigation.last_decision(),
            sensor_health: self.health.status(),
            events: self.events.newest_first(),
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irrigation::PULSE_VERY_DRY_MS;

    const MINUTE: Millis = 60 * 1000;

    fn test_settings() -> Settings {
        Settings::default()
    }

    fn air(temp: f32, hum: f32) -> SensorSnapshot {
        SensorSnapshot {
            air_temperature: Some(temp),
            air_humidity: Some(hum),
            ..SensorSnapshot::default()
        }
    }

    fn soil(moisture: f32) -> SensorSnapshot {
        SensorSnapshot {
            soil_moisture: Some(moisture),
            soil_temperature: Some(18.0),
            ..SensorSnapshot::default()
        }
    }

    fn lux(value: f32) -> SensorSnapshot {
        SensorSnapshot {
            light_lux: Some(value),
            ..SensorSnapshot::default()
        }
    }

    // -- Boot & gating ----------------------------------------------------

    #[test]
    fn boot_state_is_all_off() {
        let mut engine = Engine::new(0);
        assert_eq!(engine.current_actuator_state(), ActuatorState::default());
        assert!(engine.advance(100).is_empty());
        assert_eq!(engine.events().len(), 1);
    }

    #[test]
    fn decision_tick_is_rate_limited() {
        let mut engine = Engine::new(0);
        let settings = test_settings();
        assert!(engine.tick(0, &lux(80.0), &settings, Some(10)).is_empty());
        assert!(engine.tick(4_999, &lux(30.0), &settings, Some(10)).is_empty());
        assert_eq!(
            engine.tick(5_000, &lux(30.0), &settings, Some(10)),
            vec![Command::Light { on: true }]
        );
    }

    #[test]
    fn decision_due_tracks_interval() {
        let mut engine = Engine::new(0);
        assert!(engine.decision_due(0));
        engine.tick(1_000, &SensorSnapshot::default(), &test_settings(), None);
        assert!(!engine.decision_due(5_999));
        assert!(engine.decision_due(6_000));
    }

    #[test]
    fn automation_disabled_still_records_soil_history() {
        let mut engine = Engine::new(0);
        let settings = Settings {
            automation_enabled: false,
            ..test_settings()
        };
        assert!(engine.tick(0, &soil(30.0), &settings, Some(10)).is_empty());
        assert_eq!(engine.soil_tracker().history().len(), 1);
        assert!(!engine.current_actuator_state().pump_on);
    }

    // -- Climate ----------------------------------------------------------

    #[test]
    fn strong_heat_opens_door_and_starts_fan() {
        let mut engine = Engine::new(0);
        let commands = engine.tick(61_000, &air(35.0, 80.0), &test_settings(), Some(10));
        assert_eq!(commands, vec![Command::Fan { on: true }]);

        assert_eq!(engine.advance(61_400), vec![Command::DoorAngle { angle: 60 }]);
        assert_eq!(engine.advance(61_800), vec![Command::DoorAngle { angle: 120 }]);
        assert!(engine.advance(62_000).is_empty());

        let state = engine.current_actuator_state();
        assert!(state.door_open);
        assert!(state.fan_on);
    }

    #[test]
    fn cold_emergency_closes_immediately() {
        let mut engine = Engine::new(0);
        let settings = test_settings();
        engine.tick(61_000, &air(35.0, 80.0), &settings, Some(10));
        engine.advance(62_000);

        let commands = engine.tick(66_000, &air(2.0, 50.0), &settings, Some(10));
        assert_eq!(commands, vec![Command::Fan { on: false }]);
        assert_eq!(engine.advance(66_400), vec![Command::DoorAngle { angle: 60 }]);
        assert_eq!(engine.advance(66_800), vec![Command::DoorAngle { angle: 0 }]);

        let newest = engine.events().newest().unwrap();
        assert_eq!(newest.kind, EventKind::Safety);
    }

    #[test]
    fn missing_air_reading_changes_nothing() {
        let mut engine = Engine::new(0);
        let commands = engine.tick(61_000, &SensorSnapshot::default(), &test_settings(), Some(10));
        assert!(commands.is_empty());
        assert_eq!(engine.status(61_000).climate_band, Some(ClimateBand::MissingReading));
    }

    #[test]
    fn silent_soil_sensor_is_flagged_in_status() {
        let mut engine = Engine::new(0);
        let settings = test_settings();
        for i in 0..3u64 {
            engine.tick(i * 5_000, &air(24.0, 50.0), &settings, Some(10));
        }
        assert!(!engine.sensor_healthy(SensorDevice::Soil));
        assert!(engine.sensor_healthy(SensorDevice::Air));
        let flagged = engine
            .events()
            .newest_first()
            .iter()
            .any(|e| e.detail == "Soil sensor unhealthy");
        assert!(flagged);

        let json = serde_json::to_value(engine.status(10_000)).unwrap();
        assert_eq!(json["sensor_health"]["soil"], false);
        assert_eq!(json["sensor_health"]["all_healthy"], false);

        engine.tick(15_000, &soil(50.0), &settings, Some(10));
        assert!(engine.sensor_healthy(SensorDevice::Soil));
    }

    // -- Lighting ---------------------------------------------------------

    #[test]
    fn light_latches_until_night() {
        let mut engine = Engine::new(0);
        let settings = test_settings();
        assert_eq!(
            engine.tick(0, &lux(30.0), &settings, Some(10)),
            vec![Command::Light { on: true }]
        );
        assert!(engine.tick(5_000, &lux(80.0), &settings, Some(11)).is_empty());
        assert_eq!(
            engine.tick(10_000, &lux(80.0), &settings, Some(20)),
            vec![Command::Light { on: false }]
        );
    }

    // -- Irrigation -------------------------------------------------------

    #[test]
    fn dry_soil_runs_one_pulse_then_auto_off() {
        let mut engine = Engine::new(0);
        let settings = test_settings();
        let commands = engine.tick(0, &soil(40.0), &settings, Some(10));
        assert_eq!(
            commands,
            vec![Command::Pump {
                on: true,
                pulse_ms: PULSE_VERY_DRY_MS
            }]
        );
        assert_eq!(engine.budget().used_today_ms(), PULSE_VERY_DRY_MS);

        assert!(engine.advance(PULSE_VERY_DRY_MS - 1).is_empty());
        assert_eq!(engine.advance(PULSE_VERY_DRY_MS), vec![Command::pump_off()]);

        // Cooldown holds the next tick.
        assert!(engine.tick(5_000, &soil(40.0), &settings, Some(10)).is_empty());
    }

    #[test]
    fn continuous_pump_stops_when_soil_is_wet() {
        let mut engine = Engine::new(0);
        let settings = test_settings();
        let started = engine.set_pump(true, 0, 0);
        assert_eq!(
            started,
            Some(Command::Pump {
                on: true,
                pulse_ms: settings.pump_daily_limit_ms
            })
        );

        let commands = engine.tick(5_000, &soil(65.0), &settings, Some(10));
        assert_eq!(commands, vec![Command::pump_off()]);
        assert_eq!(engine.budget().used_today_ms(), 5_000);
    }

    #[test]
    fn pump_run_across_daily_reset_counts_on_new_day() {
        let day = crate::budget::DAILY_RESET_MS;
        let mut engine = Engine::new(0);
        let mut settings = test_settings();
        settings.automation_enabled = false;
        let limit = settings.pump_daily_limit_ms;

        assert!(engine.set_pump(true, 0, day - 1_000).is_some());
        engine.tick(day, &SensorSnapshot::default(), &settings, Some(10));
        assert_eq!(engine.budget().used_today_ms(), limit - 1_000);

        engine.set_pump(false, 0, day + 800_000);
        assert_eq!(engine.budget().used_today_ms(), 800_000);
        assert_eq!(engine.set_pump(true, limit, day + 800_000), None);
        assert!(engine.set_pump(true, 100_000, day + 800_000).is_some());
        assert_eq!(engine.budget().used_today_ms(), limit);
    }

    // -- Overrides --------------------------------------------------------

    #[test]
    fn manual_fan_respects_on_dwell() {
        let mut engine = Engine::new(0);
        let settings = test_settings();
        assert_eq!(engine.set_fan(true, 1_000), Command::Fan { on: true });

        assert!(engine.tick(10_000, &air(20.0, 50.0), &settings, Some(10)).is_empty());
        assert!(engine.current_actuator_state().fan_on);

        assert_eq!(
            engine.tick(40_000, &air(20.0, 50.0), &settings, Some(10)),
            vec![Command::Fan { on: false }]
        );
    }

    #[test]
    fn manual_door_goes_through_motion_model() {
        let mut engine = Engine::new(0);
        engine.set_door_target(90, 0);
        assert_eq!(engine.advance(800), vec![Command::DoorAngle { angle: 90 }]);
        assert_eq!(engine.status(800).door_aperture, Aperture::Open);
        assert_eq!(engine.events().newest().unwrap().kind, EventKind::Override);
    }

    #[test]
    fn pump_override_over_budget_is_refused() {
        let mut engine = Engine::new(0);
        let limit = test_settings().pump_daily_limit_ms;
        assert_eq!(engine.set_pump(true, limit + 1, 0), None);
        assert!(!engine.current_actuator_state().pump_on);
        assert_eq!(engine.budget().used_today_ms(), 0);
    }

    #[test]
    fn superseded_pulse_books_only_what_ran() {
        let mut engine = Engine::new(0);
        engine.set_pump(true, 2_000, 0);
        engine.set_pump(true, 2_000, 500);
        assert_eq!(engine.budget().used_today_ms(), 2_500);

        engine.set_pump(false, 0, 1_000);
        assert_eq!(engine.budget().used_today_ms(), 1_000);
        assert!(!engine.current_actuator_state().pump_on);
    }

    // -- Status -----------------------------------------------------------

    #[test]
    fn forecast_reported_while_drying() {
        let mut engine = Engine::new(0);
        let settings = Settings {
            automation_enabled: false,
            ..test_settings()
        };
        for i in 0..10u64 {
            let moisture = 70.0 - 0.1 * i as f32;
            engine.tick(i * MINUTE, &soil(moisture), &settings, Some(10));
        }

        let now = 9 * MINUTE;
        let trend = engine.soil_trend(now);
        assert!((trend.rate_per_hour + 6.0).abs() < 0.01, "rate {}", trend.rate_per_hour);

        let hours = engine.hours_to_dry(now).unwrap();
        assert!((hours - 19.1 / 6.0).abs() < 0.05, "hours {hours}");
    }

    #[test]
    fn no_forecast_without_trend() {
        let mut engine = Engine::new(0);
        engine.tick(0, &soil(70.0), &test_settings(), Some(10));
        assert_eq!(engine.hours_to_dry(0), None);
        assert!(!engine.status(0).trend.enough_data);
    }

    #[test]
    fn status_serialises_for_surfaces() {
        let mut engine = Engine::new(0);
        engine.set_fan(true, 100);
        let json = serde_json::to_value(engine.status(1_000)).unwrap();

        assert_eq!(json["uptime_ms"], 1_000);
        assert_eq!(json["actuators"]["fan_on"], true);
        assert_eq!(json["events"][0]["kind"], "override");
        assert_eq!(json["events"][1]["kind"], "system");
        assert_eq!(json["budget"]["remaining_ms"], 900_000);
        assert_eq!(json["door_aperture"], "closed");
    }

    #[test]
    fn command_serialises_tagged() {
        let json = serde_json::to_value(Command::Pump {
            on: true,
            pulse_ms: 800,
        })
        .unwrap();
        assert_eq!(json["actuator"], "pump");
        assert_eq!(json["pulse_ms"], 800);
    }
}
