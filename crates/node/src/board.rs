//! Actuator board. Applies logical engine commands to relays and the door
//! servo. This build has no hardware driver: it tracks what each output is
//! set to and logs every physical change.

use greenhouse_engine::Command;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Relay {
    Fan,
    Light,
    Pump,
}

pub(crate) struct ActuatorBoard {
    /// Many relay boards switch on when the input is driven low.
    active_low: bool,
    pub(super) door_angle: u8,
    pub(super) fan: bool,
    pub(super) light: bool,
    pub(super) pump: bool,
}

impl ActuatorBoard {
    pub(crate) fn new(active_low: bool) -> Self {
        info!(active_low, "actuator board initialised (no hardware)");
        Self {
            active_low,
            door_angle: 0,
            fan: false,
            light: false,
            pump: false,
        }
    }

    /// Pin level that puts a relay in the `on` state.
    pub(crate) fn level(&self, on: bool) -> bool {
        on != self.active_low
    }

    pub(crate) fn apply(&mut self, command: Command) {
        match command {
            Command::DoorAngle { angle } => {
                if self.door_angle != angle {
                    debug!(angle, "servo: door");
                    self.door_angle = angle;
                }
            }
            Command::Fan { on } => self.set(Relay::Fan, on),
            Command::Light { on } => self.set(Relay::Light, on),
            Command::Pump { on, pulse_ms } => {
                if on {
                    info!(pulse_ms, "pump pulse booked");
                }
                self.set(Relay::Pump, on);
            }
        }
    }

    /// Repeated identical commands leave the output alone.
    pub(crate) fn set(&mut self, relay: Relay, on: bool) {
        let level = self.level(on);
        let state = match relay {
            Relay::Fan => &mut self.fan,
            Relay::Light => &mut self.light,
            Relay::Pump => &mut self.pump,
        };
        if *state == on {
            return;
        }
        *state = on;
        info!(
            ?relay,
            state = if on { "ON" } else { "OFF" },
            pin_high = level,
            "relay switched"
        );
    }

    /// Fail-safe shutdown: every relay off. The door is left where it is.
    pub(crate) fn all_off(&mut self) {
        for relay in [Relay::Fan, Relay::Light, Relay::Pump] {
            self.set(relay, false);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
