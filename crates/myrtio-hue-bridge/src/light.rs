//! Light domain types and the collaborator port
//!
//! The bridge never drives hardware itself. Every physical light is reached
//! through [`LightControl`], and asynchronous changes made outside the bridge
//! (a wall switch, a local button) come back through
//! [`StateNotifier`](crate::bridge::StateNotifier).

use serde::Serialize;

use crate::error::{Error, HardwareError};

/// Maximum brightness level
pub const BRIGHTNESS_MAX: u8 = 100;

/// Power and brightness of a light.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LightState {
    /// Current on/off state
    #[serde(rename = "on")]
    pub is_on: bool,
    /// Current brightness (0-100), `None` for on/off-only lights
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

impl LightState {
    /// Create an "ON" state
    pub const fn on() -> Self {
        Self {
            is_on: true,
            brightness: None,
        }
    }

    /// Create an "OFF" state
    pub const fn off() -> Self {
        Self {
            is_on: false,
            brightness: None,
        }
    }

    /// Set brightness
    #[must_use]
    pub const fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    /// Clamp brightness into the supported range.
    #[must_use]
    pub(crate) fn clamped(mut self) -> Self {
        self.brightness = self.brightness.map(|b| b.min(BRIGHTNESS_MAX));
        self
    }
}

/// Command applied to a single light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightCommand {
    TurnOn,
    TurnOff,
    /// Set brightness level (0-100). Zero powers the light off.
    SetBrightness(u16),
}

impl LightCommand {
    /// Parse the command name used by the device endpoint.
    ///
    /// Levels outside of `u16` are an [`Error::InvalidRange`], the same as
    /// levels above [`BRIGHTNESS_MAX`] once resolved.
    pub fn from_name(name: &str, level: Option<i64>) -> Result<Self, Error> {
        match (name, level) {
            ("turn_on", None) => Ok(LightCommand::TurnOn),
            ("turn_off", None) => Ok(LightCommand::TurnOff),
            ("set_brightness", Some(level)) => u16::try_from(level)
                .map(LightCommand::SetBrightness)
                .map_err(|_| Error::InvalidRange),
            _ => Err(Error::MalformedRequest),
        }
    }

    /// Compute the state this command leads to from `current`.
    pub fn resolve(self, current: LightState) -> Result<LightState, Error> {
        match self {
            LightCommand::TurnOn => {
                let brightness = match current.brightness {
                    Some(0) => Some(BRIGHTNESS_MAX),
                    other => other,
                };
                Ok(LightState {
                    is_on: true,
                    brightness,
                })
            }
            LightCommand::TurnOff => Ok(LightState {
                is_on: false,
                brightness: current.brightness,
            }),
            LightCommand::SetBrightness(level) => {
                let level = u8::try_from(level)
                    .ok()
                    .filter(|l| *l <= BRIGHTNESS_MAX)
                    .ok_or(Error::InvalidRange)?;
                Ok(LightState {
                    is_on: level > 0,
                    brightness: Some(level),
                })
            }
        }
    }
}

/// Capability interface of a physical light.
///
/// `set_state` is called from the shared event loop, so implementations must
/// return quickly: queue the change (e.g. `try_send` to a driver task) rather
/// than wait for the hardware to settle.
pub trait LightControl {
    /// Get the current light state
    fn get_state(&self) -> LightState;

    /// Push a new state to the hardware
    fn set_state(&mut self, state: LightState) -> Result<(), HardwareError>;
}
