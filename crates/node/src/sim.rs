//! Stateful greenhouse simulator for local development.
//!
//! Integrates a coarse physical model between reads:
//! - Diurnal cycle for outside temperature and daylight
//! - Solar gain, relieved by door opening and the fan
//! - Soil drying (faster in daylight), wetting while the pump runs
//! - Grow light adds lux
//!
//! Reads add per-channel noise, occasional spikes, and dropouts (`None`),
//! so the engine sees the same degraded inputs real sensors produce.

use std::fmt;

use greenhouse_engine::motion::DOOR_OPEN_ANGLE;
use greenhouse_engine::{reading, Command, SensorSnapshot};

/// Soil moisture gained per second of pump run time (%).
const WATER_PER_PUMP_S: f64 = 2.0;
/// Peak daylight at solar noon (lux).
const PEAK_DAYLIGHT_LUX: f64 = 20_000.0;
/// Grow-light contribution at the sensor (lux).
const GROW_LIGHT_LUX: f64 = 400.0;
/// Air temperature relaxation time constant (s).
const AIR_TAU_S: f64 = 300.0;
/// Soil temperature relaxation time constant (s).
const SOIL_TAU_S: f64 = 3_600.0;

// ---------------------------------------------------------------------------
// Gaussian approximation (no extra dependency)
// ---------------------------------------------------------------------------

/// Approximate a sample from N(0,1) using the Irwin-Hall method:
/// sum of 12 uniform [0,1) values minus 6.
fn approx_std_normal() -> f64 {
    (0..12).map(|_| fastrand::f64()).sum::<f64>() - 6.0
}

fn gaussian(mean: f64, sigma: f64) -> f64 {
    mean + sigma * approx_std_normal()
}

// ---------------------------------------------------------------------------
// Scenario presets
// ---------------------------------------------------------------------------

/// Simulation profiles selectable via the `SIM_SCENARIO` env var.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Warm days, steady soil drying. Exercises predictive watering.
    Drying,
    /// Mild weather, damp soil, quiet sensors. Little should happen.
    Stable,
    /// Noisy sensors with frequent spikes and dropouts.
    Flaky,
    /// Hot days that push into the emergency band.
    Heatwave,
}

impl Scenario {
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "stable" => Self::Stable,
            "flaky" => Self::Flaky,
            "heatwave" => Self::Heatwave,
            _ => Self::Drying,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drying => write!(f, "drying"),
            Self::Stable => write!(f, "stable"),
            Self::Flaky => write!(f, "flaky"),
            Self::Heatwave => write!(f, "heatwave"),
        }
    }
}

struct Profile {
    outside_mean_c: f64,
    outside_swing_c: f64,
    outside_hum: f64,
    solar_gain_c: f64,
    drying_per_hour: f64,
    start_moisture: f64,
    noise_scale: f64,
    spike_prob: f32,
    dropout_prob: f32,
}

impl Scenario {
    fn profile(self) -> Profile {
        match self {
            Self::Drying => Profile {
                outside_mean_c: 20.0,
                outside_swing_c: 6.0,
                outside_hum: 60.0,
                solar_gain_c: 10.0,
                drying_per_hour: 4.0,
                start_moisture: 58.0,
                noise_scale: 1.0,
                spike_prob: 0.02,
                dropout_prob: 0.01,
            },
            Self::Stable => Profile {
                outside_mean_c: 19.0,
                outside_swing_c: 2.0,
                outside_hum: 55.0,
                solar_gain_c: 4.0,
                drying_per_hour: 0.5,
                start_moisture: 62.0,
                noise_scale: 0.5,
                spike_prob: 0.005,
                dropout_prob: 0.0,
            },
            Self::Flaky => Profile {
                outside_mean_c: 20.0,
                outside_swing_c: 6.0,
                outside_hum: 65.0,
                solar_gain_c: 10.0,
                drying_per_hour: 3.0,
                start_moisture: 55.0,
                noise_scale: 2.5,
                spike_prob: 0.10,
                dropout_prob: 0.08,
            },
            Self::Heatwave => Profile {
                outside_mean_c: 30.0,
                outside_swing_c: 8.0,
                outside_hum: 70.0,
                solar_gain_c: 14.0,
                drying_per_hour: 6.0,
                start_moisture: 50.0,
                noise_scale: 1.0,
                spike_prob: 0.02,
                dropout_prob: 0.01,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

pub struct GreenhouseSim {
    profile: Profile,
    diurnal_period_s: f64,
    elapsed_s: f64,

    // True (noise-free) state
    air_temp: f64,
    air_hum: f64,
    soil_moisture: f64,
    soil_temp: f64,

    // Actuators as last commanded
    door_angle: u8,
    fan: bool,
    light: bool,
    pump: bool,
}

impl GreenhouseSim {
    /// `diurnal_period_s` sets the day length: 600 for fast dev iteration,
    /// 86400 for real time.  `t = 0` is midnight.
    pub fn new(scenario: Scenario, diurnal_period_s: f64) -> Self {
        let profile = scenario.profile();
        let night = profile.outside_mean_c - profile.outside_swing_c;
        Self {
            air_temp: night,
            air_hum: profile.outside_hum,
            soil_moisture: profile.start_moisture,
            soil_temp: night,
            profile,
            diurnal_period_s,
            elapsed_s: 0.0,
            door_angle: 0,
            fan: false,
            light: false,
            pump: false,
        }
    }

    /// Track what the board was told to do.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::DoorAngle { angle } => self.door_angle = angle,
            Command::Fan { on } => self.fan = on,
            Command::Light { on } => self.light = on,
            Command::Pump { on, .. } => self.pump = on,
        }
    }

    /// Fraction of peak daylight at the current time of day (0 at night).
    fn daylight(&self) -> f64 {
        let phase = 2.0 * std::f64::consts::PI * self.elapsed_s / self.diurnal_period_s;
        // Midnight at t = 0, noon at half period.
        (-phase.cos()).max(0.0)
    }

    /// Simulated hour of day.
    pub fn hour(&self) -> u8 {
        let day_frac = (self.elapsed_s / self.diurnal_period_s).fract();
        ((day_frac * 24.0) as u8).min(23)
    }

    /// 0 (sealed) ..= 1 (door open, fan on).
    fn ventilation(&self) -> f64 {
        let door = (f64::from(self.door_angle) / f64::from(DOOR_OPEN_ANGLE)).min(1.0);
        (0.6 * door + if self.fan { 0.4 } else { 0.0 }).min(1.0)
    }

    /// Integrate the model forward to `elapsed_s`.
    pub fn advance(&mut self, elapsed_s: f64) {
        let dt = (elapsed_s - self.elapsed_s).max(0.0);
        if dt == 0.0 {
            return;
        }
        self.elapsed_s = elapsed_s;

        let p = &self.profile;
        let daylight = self.daylight();
        let vent = self.ventilation();
        let phase = 2.0 * std::f64::consts::PI * self.elapsed_s / self.diurnal_period_s;
        let outside = p.outside_mean_c - p.outside_swing_c * phase.cos();

        let air_target = outside + p.solar_gain_c * daylight * (1.0 - vent);
        let k_air = (dt / AIR_TAU_S).min(1.0);
        self.air_temp += (air_target - self.air_temp) * k_air + gaussian(0.0, 0.02 * dt.sqrt());

        let hum_target = p.outside_hum + 15.0 * (1.0 - vent) - 10.0 * daylight;
        self.air_hum = (self.air_hum + (hum_target - self.air_hum) * k_air).clamp(0.0, 100.0);

        let k_soil = (dt / SOIL_TAU_S).min(1.0);
        self.soil_temp += (self.air_temp - self.soil_temp) * k_soil;

        let drying = p.drying_per_hour * (0.5 + daylight) * dt / 3_600.0;
        let wetting = if self.pump { WATER_PER_PUMP_S * dt } else { 0.0 };
        self.soil_moisture = (self.soil_moisture - drying + wetting).clamp(0.0, 100.0);
    }

    /// One noisy read of every sensor.
    pub fn read(&self) -> SensorSnapshot {
        let grow = if self.light { GROW_LIGHT_LUX } else { 0.0 };
        let lux = PEAK_DAYLIGHT_LUX * self.daylight() + grow;
        SensorSnapshot {
            air_temperature: self.channel(self.air_temp, 0.2, f64::NEG_INFINITY, f64::INFINITY),
            air_humidity: self.channel(self.air_hum, 1.0, 0.0, 100.0),
            soil_moisture: self.channel(self.soil_moisture, 0.4, 0.0, 100.0),
            soil_temperature: self.channel(self.soil_temp, 0.1, f64::NEG_INFINITY, f64::INFINITY),
            light_lux: self.channel(lux, 5.0, 0.0, f64::INFINITY),
        }
    }

    fn channel(&self, truth: f64, sigma: f64, lo: f64, hi: f64) -> Option<f32> {
        let p = &self.profile;
        if fastrand::f32() < p.dropout_prob {
            return reading(f32::NAN);
        }
        let noise = gaussian(0.0, sigma * p.noise_scale);
        let spike = if fastrand::f32() < p.spike_prob {
            gaussian(0.0, sigma * 10.0)
        } else {
            0.0
        };
        reading(((truth + noise + spike).clamp(lo, hi)) as f32)
    }

    pub fn soil_moisture(&self) -> f64 {
        self.soil_moisture
    }

    pub fn air_temperature(&self) -> f64 {
        self.air_temp
    }
}

// ===========================================================================
// Tests
// ===========================================================================
