//! Manual override commands typed on stdin.
//!
//! Lines are parsed here and sent over an `mpsc` channel to the control
//! task, which is the only place the engine is touched.

use greenhouse_engine::settings::CropProfile;
use greenhouse_engine::Millis;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum OverrideRequest {
    Door(u8),
    Fan(bool),
    Light(bool),
    /// `pulse_ms == 0` runs until stopped or the daily budget is spent.
    Pump { on: bool, pulse_ms: Millis },
    Automation(bool),
    /// New soil moisture setpoint (%).
    Setpoint(f32),
    Profile(CropProfile),
    Status,
}

/// Parse an "on"/"off" word (case-insensitive).
fn parse_switch(word: &str) -> Result<bool, String> {
    match word.to_ascii_lowercase().as_str() {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(format!("expected on/off, got '{other}'")),
    }
}

/// Parse one override line, e.g. `fan on`, `door 90`, `pump 1500`,
/// `pump off`, `auto off`, `setpoint 60`, `profile tomatoes`, `status`.
pub(crate) fn parse_override(line: &str) -> Result<OverrideRequest, String> {
    let mut words = line.split_whitespace();
    let Some(target) = words.next() else {
        return Err("empty command".to_string());
    };
    let arg = words.next();
    if let Some(extra) = words.next() {
        return Err(format!("unexpected argument '{extra}'"));
    }

    let need_arg = || arg.ok_or_else(|| format!("'{target}' needs an argument"));

    match target.to_ascii_lowercase().as_str() {
        "fan" => Ok(OverrideRequest::Fan(parse_switch(need_arg()?)?)),
        "light" => Ok(OverrideRequest::Light(parse_switch(need_arg()?)?)),
        "auto" => Ok(OverrideRequest::Automation(parse_switch(need_arg()?)?)),
        "door" => {
            let raw = need_arg()?;
            let angle: u8 = raw
                .parse()
                .map_err(|_| format!("door angle '{raw}' is not a number in 0..=180"))?;
            if angle > 180 {
                return Err(format!("door angle {angle} out of range [0, 180]"));
            }
            Ok(OverrideRequest::Door(angle))
        }
        "pump" => match arg {
            None => Ok(OverrideRequest::Pump {
                on: true,
                pulse_ms: 0,
            }),
            Some(word) if word.eq_ignore_ascii_case("on") => Ok(OverrideRequest::Pump {
                on: true,
                pulse_ms: 0,
            }),
            Some(word) if word.eq_ignore_ascii_case("off") => Ok(OverrideRequest::Pump {
                on: false,
                pulse_ms: 0,
            }),
            Some(raw) => {
                let pulse_ms: Millis = raw
                    .parse()
                    .map_err(|_| format!("pump pulse '{raw}' is not a duration in ms"))?;
                Ok(OverrideRequest::Pump { on: true, pulse_ms })
            }
        },
        "setpoint" => {
            let raw = need_arg()?;
            let target: f32 = raw
                .parse()
                .map_err(|_| format!("setpoint '{raw}' is not a number"))?;
            if !(target > 0.0 && target < 100.0) {
                return Err(format!("setpoint {raw} out of range (0, 100)"));
            }
            Ok(OverrideRequest::Setpoint(target))
        }
        "profile" => {
            let name = need_arg()?;
            CropProfile::from_name(name)
                .map(OverrideRequest::Profile)
                .ok_or_else(|| format!("unknown crop profile '{name}'"))
        }
        "status" => match arg {
            None => Ok(OverrideRequest::Status),
            Some(extra) => Err(format!("unexpected argument '{extra}'")),
        },
        other => Err(format!("unknown command '{other}'")),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
