mod board;
mod clock;
mod overrides;
#[cfg(feature = "sim")]
mod sim;

use anyhow::Result;
use std::{env, path::Path, time::Duration};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use board::ActuatorBoard;
use clock::MonotonicClock;
use greenhouse_engine::settings::{self, CropProfile};
use greenhouse_engine::{Command, Engine, Millis, SensorSnapshot, Settings};
use overrides::{parse_override, OverrideRequest};

/// Loop period: door ramp and pump auto-off resolution.  Decisions run on
/// the engine's own, slower cadence.
const FAST_TICK: Duration = Duration::from_millis(50);

/// Summary log cadence.
const STATUS_EVERY_MS: Millis = 60_000;

// ---------------------------------------------------------------------------
// Sensor source (simulated greenhouse, or nothing wired)
// ---------------------------------------------------------------------------

#[cfg(feature = "sim")]
struct SensorSource {
    sim: sim::GreenhouseSim,
    fixed_hour: Option<u8>,
}

#[cfg(feature = "sim")]
impl SensorSource {
    fn new(fixed_hour: Option<u8>) -> Self {
        let scenario = sim::Scenario::from_str_lossy(&env::var("SIM_SCENARIO").unwrap_or_default());
        let day_s: f64 = env::var("SIM_DAY_S")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|d: &f64| *d > 0.0)
            .unwrap_or(600.0);
        info!(%scenario, day_s, "simulated greenhouse");
        Self {
            sim: sim::GreenhouseSim::new(scenario, day_s),
            fixed_hour,
        }
    }

    fn advance(&mut self, now: Millis) {
        self.sim.advance(now as f64 / 1000.0);
    }

    fn read(&self) -> SensorSnapshot {
        self.sim.read()
    }

    /// Simulated time of day unless pinned.
    fn hour(&self) -> Option<u8> {
        clock::local_hour(self.fixed_hour.or(Some(self.sim.hour())))
    }

    fn apply(&mut self, command: Command) {
        self.sim.apply(command);
    }
}

#[cfg(not(feature = "sim"))]
struct SensorSource {
    fixed_hour: Option<u8>,
}

#[cfg(not(feature = "sim"))]
impl SensorSource {
    fn new(fixed_hour: Option<u8>) -> Self {
        warn!("no sensor driver in this build; every reading is unavailable");
        Self { fixed_hour }
    }

    fn advance(&mut self, _now: Millis) {}

    fn read(&self) -> SensorSnapshot {
        SensorSnapshot::default()
    }

    fn hour(&self) -> Option<u8> {
        clock::local_hour(self.fixed_hour)
    }

    fn apply(&mut self, _command: Command) {}
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Missing file means built-in defaults; a present but invalid file is fatal.
fn load_settings(path: &str) -> Result<Settings> {
    if !Path::new(path).exists() {
        warn!(path, "settings file not found, using defaults");
        return Ok(Settings::default());
    }
    let settings = settings::load(path)?;
    info!(path, profile = ?settings.crop_profile, mode = ?settings.climate_mode, "settings loaded");
    Ok(settings)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Env config ──────────────────────────────────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "greenhouse.toml".to_string());
    let mut settings = load_settings(&config_path)?;

    // Many common relay boards are active-low. If yours is active-high, set false.
    let active_low = env::var("RELAY_ACTIVE_LOW")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(true);
    let fixed_hour: Option<u8> = env::var("FIXED_HOUR").ok().and_then(|s| s.parse().ok());

    // ── Collaborators ───────────────────────────────────────────────
    let mut board = ActuatorBoard::new(active_low);
    board.all_off();
    let mut sensors = SensorSource::new(fixed_hour);

    let clock = MonotonicClock::start();
    let mut engine = Engine::new(clock.now_ms());

    let (tx, mut rx) = mpsc::channel::<OverrideRequest>(16);
    tokio::spawn(read_overrides(tx));

    // ── Control loop ────────────────────────────────────────────────
    let mut fast = interval(FAST_TICK);
    fast.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last_status: Millis = 0;
    info!(config = %config_path, "controller running; type 'status' or e.g. 'fan on'");

    loop {
        tokio::select! {
            _ = fast.tick() => {
                let now = clock.now_ms();
                sensors.advance(now);
                let mut commands = engine.advance(now);

                if engine.decision_due(now) {
                    let snapshot = sensors.read().calibrated(&settings);
                    let hour = sensors.hour();
                    commands.extend(engine.tick(now, &snapshot, &settings, hour));
                    if now.saturating_sub(last_status) >= STATUS_EVERY_MS {
                        last_status = now;
                        log_summary(&engine, now, hour);
                    }
                }

                for command in commands {
                    dispatch(command, &mut board, &mut sensors);
                }
            }
            Some(request) = rx.recv() => {
                let now = clock.now_ms();
                for command in handle_override(request, &mut engine, &mut settings, now) {
                    dispatch(command, &mut board, &mut sensors);
                }
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("ctrl-c handler failed: {e}");
                }
                info!("shutting down, switching everything off");
                let now = clock.now_ms();
                if let Some(command) = engine.set_pump(false, 0, now) {
                    dispatch(command, &mut board, &mut sensors);
                }
                board.all_off();
                return Ok(());
            }
        }
    }
}

fn dispatch(command: Command, board: &mut ActuatorBoard, sensors: &mut SensorSource) {
    board.apply(command);
    sensors.apply(command);
}

/// Apply one manual request inside the control task.
fn handle_override(
    request: OverrideRequest,
    engine: &mut Engine,
    settings: &mut Settings,
    now: Millis,
) -> Vec<Command> {
    match request {
        OverrideRequest::Door(angle) => {
            engine.set_door_target(angle, now);
            Vec::new()
        }
        OverrideRequest::Fan(on) => vec![engine.set_fan(on, now)],
        OverrideRequest::Light(on) => vec![engine.set_light(on, now)],
        OverrideRequest::Pump { on, pulse_ms } => match engine.set_pump(on, pulse_ms, now) {
            Some(command) => vec![command],
            None => {
                warn!(pulse_ms, "pump override refused by daily budget");
                Vec::new()
            }
        },
        OverrideRequest::Automation(enabled) => {
            settings.automation_enabled = enabled;
            info!(enabled, "automation override");
            Vec::new()
        }
        OverrideRequest::Setpoint(target) => {
            update_settings(settings, |s| s.soil_moisture_setpoint = target);
            Vec::new()
        }
        OverrideRequest::Profile(profile) => {
            update_settings(settings, |s| {
                s.crop_profile = CropProfile::Custom;
                profile.apply(s);
            });
            Vec::new()
        }
        OverrideRequest::Status => {
            match serde_json::to_string_pretty(&engine.status(now)) {
                Ok(json) => info!("status:\n{json}"),
                Err(e) => warn!("status serialisation failed: {e}"),
            }
            Vec::new()
        }
    }
}

/// Apply `change` to a copy and adopt it only if it still validates.  The
/// engine picks the new values up on its next decision tick.
fn update_settings(settings: &mut Settings, change: impl FnOnce(&mut Settings)) {
    let mut candidate = settings.clone();
    change(&mut candidate);
    match candidate.validate() {
        Ok(()) => {
            info!(
                profile = ?candidate.crop_profile,
                setpoint = candidate.soil_moisture_setpoint,
                "settings updated"
            );
            *settings = candidate;
        }
        Err(e) => warn!("settings change rejected: {e:#}"),
    }
}

fn log_summary(engine: &Engine, now: Millis, hour: Option<u8>) {
    let status = engine.status(now);
    info!(
        ?hour,
        door = status.door_angle,
        fan = status.actuators.fan_on,
        light = status.actuators.light_on,
        pump = status.actuators.pump_on,
        moisture = ?status.soil_moisture,
        rate_per_hour = status.trend.rate_per_hour,
        hours_to_dry = ?status.hours_to_dry,
        pump_used_ms = status.budget.used_today_ms,
        "status"
    );
}

/// Forward parsed stdin lines to the control task until stdin closes.
async fn read_overrides(tx: mpsc::Sender<OverrideRequest>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match parse_override(&line) {
                Ok(request) => {
                    if tx.send(request).await.is_err() {
                        break;
                    }
                }
                Err(msg) => warn!("{msg}"),
            },
            Ok(None) => break,
            Err(e) => {
                warn!("stdin read failed: {e}");
                break;
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_settings_file_means_defaults() {
        let settings = load_settings("/nonexistent/greenhouse.toml").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn automation_override_updates_settings() {
        let mut engine = Engine::new(0);
        let mut settings = Settings::default();
        let commands =
            handle_override(OverrideRequest::Automation(false), &mut engine, &mut settings, 0);
        assert!(commands.is_empty());
        assert!(!settings.automation_enabled);
    }

    #[test]
    fn fan_override_yields_command() {
        let mut engine = Engine::new(0);
        let mut settings = Settings::default();
        let commands = handle_override(OverrideRequest::Fan(true), &mut engine, &mut settings, 0);
        assert_eq!(commands, vec![Command::Fan { on: true }]);
        assert!(engine.current_actuator_state().fan_on);
    }

    #[test]
    fn refused_pump_override_yields_nothing() {
        let mut engine = Engine::new(0);
        let mut settings = Settings::default();
        let request = OverrideRequest::Pump {
            on: true,
            pulse_ms: settings.pump_daily_limit_ms + 1,
        };
        assert!(handle_override(request, &mut engine, &mut settings, 0).is_empty());
    }

    #[test]
    fn setpoint_override_updates_settings() {
        let mut engine = Engine::new(0);
        let mut settings = Settings::default();
        let commands =
            handle_override(OverrideRequest::Setpoint(62.0), &mut engine, &mut settings, 0);
        assert!(commands.is_empty());
        assert_eq!(settings.soil_moisture_setpoint, 62.0);
    }

    #[test]
    fn profile_override_applies_preset() {
        let mut engine = Engine::new(0);
        let mut settings = Settings::default();
        let request = OverrideRequest::Profile(CropProfile::Cucumbers);
        handle_override(request, &mut engine, &mut settings, 0);
        assert_eq!(settings.crop_profile, CropProfile::Cucumbers);
        assert_eq!(settings.soil_moisture_setpoint, 70.0);
        assert_eq!(settings.comfort_hum_min, 60.0);
    }

    #[test]
    fn invalid_settings_change_is_rejected() {
        let mut settings = Settings::default();
        let before = settings.clone();
        update_settings(&mut settings, |s| s.soil_moisture_setpoint = f32::NAN);
        assert_eq!(settings, before);
    }

    #[test]
    fn door_override_moves_via_fast_tick() {
        let mut engine = Engine::new(0);
        let mut settings = Settings::default();
        let commands = handle_override(OverrideRequest::Door(60), &mut engine, &mut settings, 0);
        assert!(commands.is_empty());
        assert_eq!(engine.advance(800), vec![Command::DoorAngle { angle: 60 }]);
    }
}
