//! Greenhouse decision engine.
//!
//! Pure, tick-driven controllers for ventilation, grow lighting and
//! irrigation.  Nothing in this crate touches hardware, clocks or threads:
//! callers pass in sensor snapshots, settings, monotonic milliseconds and the
//! local hour, and apply the returned [`Command`]s.

pub mod budget;
pub mod climate;
pub mod engine;
pub mod irrigation;
pub mod lighting;
pub mod motion;
pub mod sensors;
pub mod settings;
pub mod state;
pub mod trend;

pub use engine::{Command, Engine, AUTOMATION_INTERVAL_MS};
pub use sensors::{reading, ActuatorState, Millis, SensorDevice, SensorSnapshot};
pub use settings::Settings;
pub use state::{EngineEvent, EngineStatus, EventKind};
pub use trend::Trend;
