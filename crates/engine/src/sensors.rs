//! Per-tick inputs delivered by the acquisition layer, and the logical
//! actuator state reported back to status surfaces.

use serde::Serialize;

use crate::settings::Settings;

/// Monotonic milliseconds since controller start.
pub type Millis = u64;

/// Consecutive decision ticks without a reading before a sensor is reported
/// unhealthy.
pub const UNHEALTHY_AFTER_MISSES: u32 = 3;

// ---------------------------------------------------------------------------
// Sensor snapshot
// ---------------------------------------------------------------------------

/// A point-in-time view of every sensor.  `None` means the reading is
/// unavailable this tick (bus error, sensor missing, out-of-range value).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorSnapshot {
    /// Air temperature (°C).
    pub air_temperature: Option<f32>,
    /// Relative air humidity (%).
    pub air_humidity: Option<f32>,
    /// Volumetric soil moisture (%).
    pub soil_moisture: Option<f32>,
    /// Soil temperature (°C).
    pub soil_temperature: Option<f32>,
    /// Ambient light (lux).
    pub light_lux: Option<f32>,
}

/// Normalise a raw driver value: NaN and infinities become `None`.
pub fn reading(raw: f32) -> Option<f32> {
    raw.is_finite().then_some(raw)
}

impl SensorSnapshot {
    /// Apply the per-sensor calibration offsets from `settings` to every
    /// reading that is present.  Missing readings stay missing.
    pub fn calibrated(&self, settings: &Settings) -> Self {
        let shift = |v: Option<f32>, offset: f32| v.map(|x| x + offset);
        Self {
            air_temperature: shift(self.air_temperature, settings.air_temp_offset),
            air_humidity: shift(self.air_humidity, settings.air_hum_offset),
            soil_moisture: shift(self.soil_moisture, settings.soil_moist_offset),
            soil_temperature: shift(self.soil_temperature, settings.soil_temp_offset),
            light_lux: self.light_lux,
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor health
// ---------------------------------------------------------------------------

/// The physical devices behind the snapshot fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorDevice {
    /// Air temperature and humidity come from one combined sensor.
    Air,
    Soil,
    Light,
}

/// Health of each sensor device, derived from consecutive missing readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorHealth {
    air_misses: u32,
    soil_misses: u32,
    light_misses: u32,
}

/// Serialisable view for status surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub air: bool,
    pub soil: bool,
    pub light: bool,
    pub all_healthy: bool,
}

impl SensorHealth {
    /// Count one decision tick.  Returns the devices whose health flipped,
    /// with their new state.
    pub fn observe(&mut self, snapshot: &SensorSnapshot) -> Vec<(SensorDevice, bool)> {
        let air = snapshot.air_temperature.is_some() && snapshot.air_humidity.is_some();
        let channels = [
            (SensorDevice::Air, &mut self.air_misses, air),
            (SensorDevice::Soil, &mut self.soil_misses, snapshot.soil_moisture.is_some()),
            (SensorDevice::Light, &mut self.light_misses, snapshot.light_lux.is_some()),
        ];

        let mut changed = Vec::new();
        for (device, misses, present) in channels {
            let was_healthy = *misses < UNHEALTHY_AFTER_MISSES;
            *misses = if present { 0 } else { misses.saturating_add(1) };
            let healthy = *misses < UNHEALTHY_AFTER_MISSES;
            if healthy != was_healthy {
                changed.push((device, healthy));
            }
        }
        changed
    }

    pub fn is_healthy(&self, device: SensorDevice) -> bool {
        let misses = match device {
            SensorDevice::Air => self.air_misses,
            SensorDevice::Soil => self.soil_misses,
            SensorDevice::Light => self.light_misses,
        };
        misses < UNHEALTHY_AFTER_MISSES
    }

    pub fn status(&self) -> HealthStatus {
        let air = self.is_healthy(SensorDevice::Air);
        let soil = self.is_healthy(SensorDevice::Soil);
        let light = self.is_healthy(SensorDevice::Light);
        HealthStatus {
            air,
            soil,
            light,
            all_healthy: air && soil && light,
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator state
// ---------------------------------------------------------------------------

/// Logical actuator state as last committed by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActuatorState {
    pub door_open: bool,
    pub fan_on: bool,
    pub light_on: bool,
    pub pump_on: bool,
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_rejects_nan_and_infinity() {
        assert_eq!(reading(f32::NAN), None);
        assert_eq!(reading(f32::INFINITY), None);
        assert_eq!(reading(f32::NEG_INFINITY), None);
        assert_eq!(reading(21.5), Some(21.5));
    }

    #[test]
    fn calibration_shifts_present_readings_only() {
        let settings = Settings {
            air_temp_offset: -1.0,
            air_hum_offset: 2.0,
            soil_moist_offset: 3.0,
            soil_temp_offset: 0.5,
            ..Settings::default()
        };
        let snap = SensorSnapshot {
            air_temperature: Some(25.0),
            air_humidity: None,
            soil_moisture: Some(40.0),
            soil_temperature: Some(12.0),
            light_lux: Some(100.0),
        };

        let cal = snap.calibrated(&settings);
        assert_eq!(cal.air_temperature, Some(24.0));
        assert_eq!(cal.air_humidity, None);
        assert_eq!(cal.soil_moisture, Some(43.0));
        assert_eq!(cal.soil_temperature, Some(12.5));
        assert_eq!(cal.light_lux, Some(100.0));
    }

    #[test]
    fn device_unhealthy_after_consecutive_misses() {
        let mut health = SensorHealth::default();
        let no_soil = SensorSnapshot {
            air_temperature: Some(22.0),
            air_humidity: Some(50.0),
            light_lux: Some(300.0),
            ..SensorSnapshot::default()
        };

        for _ in 1..UNHEALTHY_AFTER_MISSES {
            assert!(health.observe(&no_soil).is_empty());
        }
        assert_eq!(health.observe(&no_soil), vec![(SensorDevice::Soil, false)]);
        assert!(health.observe(&no_soil).is_empty());

        let status = health.status();
        assert!(!status.soil);
        assert!(status.air && status.light);
        assert!(!status.all_healthy);
    }

    #[test]
    fn one_reading_restores_health() {
        let mut health = SensorHealth::default();
        for _ in 0..UNHEALTHY_AFTER_MISSES {
            health.observe(&SensorSnapshot::default());
        }
        assert!(!health.is_healthy(SensorDevice::Light));

        let lux_only = SensorSnapshot {
            light_lux: Some(50.0),
            ..SensorSnapshot::default()
        };
        assert_eq!(health.observe(&lux_only), vec![(SensorDevice::Light, true)]);
        assert!(!health.is_healthy(SensorDevice::Air));
    }

    #[test]
    fn air_needs_both_temperature_and_humidity() {
        let mut health = SensorHealth::default();
        let temp_only = SensorSnapshot {
            air_temperature: Some(22.0),
            ..SensorSnapshot::default()
        };
        for _ in 0..UNHEALTHY_AFTER_MISSES {
            health.observe(&temp_only);
        }
        assert!(!health.is_healthy(SensorDevice::Air));
    }
}
