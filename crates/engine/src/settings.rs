//! TOML settings loading and validation, plus crop-profile presets.
//!
//! Every field has a default, so a partial (or empty) file is valid.  The
//! engine treats a `Settings` value as immutable for the duration of a tick.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Climate aggressiveness: selects the hysteresis deltas around the comfort
/// band.  `Eco` widens the margins, `Aggressive` narrows them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClimateMode {
    Eco,
    #[default]
    Normal,
    Aggressive,
}

/// How much history the soil trend needs before it is trusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStrictness {
    /// Accept a slope once the samples span 10 seconds.
    Relaxed,
    /// Require 9 minutes of history.
    #[default]
    Strict,
}

/// Preset bundles of comfort band, soil setpoint and light threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropProfile {
    /// Keep whatever the file says.
    #[default]
    Custom,
    Tomatoes,
    Cucumbers,
    Greens,
    Hibiscus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ── Climate ─────────────────────────────────────────────────
    pub comfort_temp_min: f32,
    pub comfort_temp_max: f32,
    pub comfort_hum_min: f32,
    pub comfort_hum_max: f32,
    pub climate_mode: ClimateMode,
    pub safety_temp_min: Option<f32>,
    pub safety_temp_max: Option<f32>,

    // ── Irrigation ──────────────────────────────────────────────
    pub soil_moisture_setpoint: f32,
    pub soil_moisture_hysteresis: f32,
    pub watering_start_hour: u8,
    pub watering_end_hour: u8,
    pub predictive_horizon_hours: f32,
    pub soil_temp_min: Option<f32>,
    pub trend_strictness: TrendStrictness,
    pub pump_daily_limit_ms: u64,
    pub pump_cooldown_ms: u64,

    // ── Lighting ────────────────────────────────────────────────
    pub light_lux_min: f32,
    pub light_cutoff_hour: u8,

    // ── General ─────────────────────────────────────────────────
    pub automation_enabled: bool,
    pub crop_profile: CropProfile,

    // ── Calibration offsets ─────────────────────────────────────
    pub air_temp_offset: f32,
    pub air_hum_offset: f32,
    pub soil_temp_offset: f32,
    pub soil_moist_offset: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            comfort_temp_min: 22.0,
            comfort_temp_max: 28.0,
            comfort_hum_min: 40.0,
            comfort_hum_max: 70.0,
            climate_mode: ClimateMode::Normal,
            safety_temp_min: Some(4.0),
            safety_temp_max: Some(40.0),

            soil_moisture_setpoint: 55.0,
            soil_moisture_hysteresis: 5.0,
            watering_start_hour: 6,
            watering_end_hour: 22,
            predictive_horizon_hours: 3.0,
            soil_temp_min: Some(8.0),
            trend_strictness: TrendStrictness::Strict,
            pump_daily_limit_ms: 15 * 60 * 1000,
            pump_cooldown_ms: 5 * 60 * 1000,

            light_lux_min: 60.0,
            light_cutoff_hour: 20,

            automation_enabled: true,
            crop_profile: CropProfile::Custom,

            air_temp_offset: 0.0,
            air_hum_offset: 0.0,
            soil_temp_offset: 0.0,
            soil_moist_offset: 0.0,
        }
    }
}

impl Settings {
    /// Moisture below which the soil counts as dry.
    pub fn dry_threshold(&self) -> f32 {
        self.soil_moisture_setpoint - self.soil_moisture_hysteresis
    }

    /// Moisture above which a continuously running pump is stopped.
    pub fn wet_threshold(&self) -> f32 {
        self.soil_moisture_setpoint + self.soil_moisture_hysteresis
    }
}

// ---------------------------------------------------------------------------
// Crop profiles
// ---------------------------------------------------------------------------

impl CropProfile {
    /// Look up a preset by name, case-insensitive, accepting singular forms.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "custom" | "user" => Some(Self::Custom),
            "tomatoes" | "tomato" => Some(Self::Tomatoes),
            "cucumbers" | "cucumber" => Some(Self::Cucumbers),
            "greens" => Some(Self::Greens),
            "hibiscus" => Some(Self::Hibiscus),
            _ => None,
        }
    }

    /// Overwrite the comfort band, soil setpoint and light threshold with the
    /// preset values.  `Custom` leaves `settings` untouched.
    pub fn apply(self, settings: &mut Settings) {
        let (t_min, t_max, h_min, h_max, soil, lux) = match self {
            Self::Custom => return,
            Self::Tomatoes => (20.0, 28.0, 40.0, 65.0, 55.0, 6000.0),
            Self::Cucumbers => (22.0, 30.0, 60.0, 80.0, 70.0, 5000.0),
            Self::Greens => (18.0, 24.0, 50.0, 70.0, 60.0, 4000.0),
            Self::Hibiscus => (20.0, 26.0, 45.0, 65.0, 60.0, 200.0),
        };
        settings.crop_profile = self;
        settings.comfort_temp_min = t_min;
        settings.comfort_temp_max = t_max;
        settings.comfort_hum_min = h_min;
        settings.comfort_hum_max = h_max;
        settings.soil_moisture_setpoint = soil;
        settings.light_lux_min = lux;
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Settings {
    /// Validate every field.  Returns `Ok(())` or an error describing every
    /// violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        self.validate_finite(&mut errors);
        self.validate_climate(&mut errors);
        self.validate_irrigation(&mut errors);
        self.validate_lighting(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "settings validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }

    /// NaN slips through every range comparison below, so reject it here.
    fn validate_finite(&self, errors: &mut Vec<String>) {
        let fields = [
            ("comfort_temp_min", Some(self.comfort_temp_min)),
            ("comfort_temp_max", Some(self.comfort_temp_max)),
            ("comfort_hum_min", Some(self.comfort_hum_min)),
            ("comfort_hum_max", Some(self.comfort_hum_max)),
            ("safety_temp_min", self.safety_temp_min),
            ("safety_temp_max", self.safety_temp_max),
            ("soil_moisture_setpoint", Some(self.soil_moisture_setpoint)),
            ("soil_moisture_hysteresis", Some(self.soil_moisture_hysteresis)),
            ("predictive_horizon_hours", Some(self.predictive_horizon_hours)),
            ("soil_temp_min", self.soil_temp_min),
            ("light_lux_min", Some(self.light_lux_min)),
            ("air_temp_offset", Some(self.air_temp_offset)),
            ("air_hum_offset", Some(self.air_hum_offset)),
            ("soil_temp_offset", Some(self.soil_temp_offset)),
            ("soil_moist_offset", Some(self.soil_moist_offset)),
        ];
        for (name, v) in fields {
            if let Some(v) = v.filter(|v| !v.is_finite()) {
                errors.push(format!("{name} must be a finite number, got {v}"));
            }
        }
    }

    fn validate_climate(&self, errors: &mut Vec<String>) {
        if self.comfort_temp_min >= self.comfort_temp_max {
            errors.push(format!(
                "comfort_temp_min ({}) must be less than comfort_temp_max ({})",
                self.comfort_temp_min, self.comfort_temp_max
            ));
        }
        for (name, v) in [
            ("comfort_hum_min", self.comfort_hum_min),
            ("comfort_hum_max", self.comfort_hum_max),
        ] {
            if !(0.0..=100.0).contains(&v) {
                errors.push(format!("{name} {v} out of range [0, 100]"));
            }
        }
        if self.comfort_hum_min >= self.comfort_hum_max {
            errors.push(format!(
                "comfort_hum_min ({}) must be less than comfort_hum_max ({})",
                self.comfort_hum_min, self.comfort_hum_max
            ));
        }
        if let (Some(lo), Some(hi)) = (self.safety_temp_min, self.safety_temp_max) {
            if lo >= hi {
                errors.push(format!(
                    "safety_temp_min ({lo}) must be less than safety_temp_max ({hi})"
                ));
            }
        }
    }

    fn validate_irrigation(&self, errors: &mut Vec<String>) {
        if !(0.0..=100.0).contains(&self.soil_moisture_setpoint) {
            errors.push(format!(
                "soil_moisture_setpoint {} out of range [0, 100]",
                self.soil_moisture_setpoint
            ));
        }
        if self.soil_moisture_hysteresis < 0.0 {
            errors.push(format!(
                "soil_moisture_hysteresis must not be negative, got {}",
                self.soil_moisture_hysteresis
            ));
        }
        for (name, h) in [
            ("watering_start_hour", self.watering_start_hour),
            ("watering_end_hour", self.watering_end_hour),
        ] {
            if h > 23 {
                errors.push(format!("{name} {h} out of range [0, 23]"));
            }
        }
        if self.predictive_horizon_hours <= 0.0 {
            errors.push(format!(
                "predictive_horizon_hours must be positive, got {}",
                self.predictive_horizon_hours
            ));
        }
        if self.pump_daily_limit_ms == 0 {
            errors.push("pump_daily_limit_ms must be positive".to_string());
        }
    }

    fn validate_lighting(&self, errors: &mut Vec<String>) {
        if self.light_lux_min < 0.0 {
            errors.push(format!(
                "light_lux_min must not be negative, got {}",
                self.light_lux_min
            ));
        }
        if self.light_cutoff_hour > 23 {
            errors.push(format!(
                "light_cutoff_hour {} out of range [0, 23]",
                self.light_cutoff_hour
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Parse settings from TOML text, apply the crop profile, and validate.
pub fn parse(contents: &str) -> Result<Settings> {
    let mut settings: Settings = toml::from_str(contents).context("failed to parse settings")?;
    let profile = settings.crop_profile;
    profile.apply(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Read, parse, and validate a TOML settings file.
pub fn load(path: &str) -> Result<Settings> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings: {path}"))?;
    parse(&contents).with_context(|| format!("invalid settings: {path}"))
}

// ===========================================================================
// Tests
// ===========================================================================
