use serde::Serialize;
use std::collections::VecDeque;

use crate::budget::BudgetStatus;
use crate::climate::{Aperture, ClimateBand};
use crate::irrigation::IrrigationDecision;
use crate::lighting::LightingReason;
use crate::sensors::{ActuatorState, HealthStatus, Millis};
use crate::trend::Trend;

/// Maximum number of events retained in the ring buffer.
pub const MAX_EVENTS: usize = 200;

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineEvent {
    pub at: Millis,
    pub kind: EventKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Climate,
    Safety,
    Lighting,
    Irrigation,
    Override,
    System,
}

#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<EngineEvent>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self {
            events: VecDeque::with_capacity(MAX_EVENTS),
        }
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at: Millis, kind: EventKind, detail: impl Into<String>) {
        if self.events.len() >= MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(EngineEvent {
            at,
            kind,
            detail: detail.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn newest(&self) -> Option<&EngineEvent> {
        self.events.back()
    }

    /// Copy of the log, most recent first.
    pub fn newest_first(&self) -> Vec<EngineEvent> {
        self.events.iter().rev().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Status snapshot (what status surfaces render)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendStatus {
    pub rate_per_hour: f32,
    pub span_hours: f32,
    pub enough_data: bool,
}

impl From<Trend> for TrendStatus {
    fn from(trend: Trend) -> Self {
        Self {
            rate_per_hour: trend.rate_per_hour,
            span_hours: trend.span_hours,
            enough_data: trend.is_known(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub uptime_ms: Millis,
    pub automation_enabled: bool,
    pub actuators: ActuatorState,
    pub door_angle: u8,
    pub door_target: u8,
    pub door_moving: bool,
    pub door_aperture: Aperture,
    pub soil_moisture: Option<f32>,
    pub trend: TrendStatus,
    /// Hours until the dry threshold at the current drying rate.
    pub hours_to_dry: Option<f32>,
    pub budget: BudgetStatus,
    pub climate_band: Option<ClimateBand>,
    pub lighting: Option<LightingReason>,
    pub last_irrigation: Option<IrrigationDecision>,
    pub sensor_health: HealthStatus,
    pub events: Vec<EngineEvent>,
}

// ===========================================================================
// Tests
// ===========================================================================
