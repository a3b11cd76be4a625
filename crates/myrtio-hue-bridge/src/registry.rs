//! Device registry
//!
//! Devices are registered once, at configuration time, and are never removed.
//! The registration order is the enumeration order used by discovery and by
//! the light listings, so clients that cache descriptors see a stable view.

use core::fmt;

use heapless::Vec;
use serde::Serialize;

use crate::config::{self, Name};
use crate::error::{ConfigurationError, Error};
use crate::light::{LightCommand, LightControl, LightState};

/// Stable device identifier.
///
/// It is the 1-based registration position, so it never changes while the
/// process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceId(u8);

impl DeviceId {
    /// Create an id from its raw value. Zero is not a valid id.
    pub const fn new(raw: u8) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Parse an id from a path segment
    pub fn parse(value: &str) -> Option<Self> {
        value.parse::<u8>().ok().and_then(Self::new)
    }

    const fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Virtual device exposed to the hubs
#[derive(Debug)]
pub struct Device<L> {
    id: DeviceId,
    name: Name,
    state: LightState,
    control: L,
}

impl<L> Device<L> {
    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Last confirmed light state
    pub fn state(&self) -> LightState {
        self.state
    }
}

impl<L: LightControl> Device<L> {
    /// Apply a command and update the cached state.
    ///
    /// The cached state only changes after the collaborator accepted the new
    /// state. On failure it keeps the last confirmed value.
    pub fn apply(&mut self, command: LightCommand) -> Result<LightState, Error> {
        let target = command.resolve(self.state)?;
        self.control.set_state(target)?;
        self.state = target;
        Ok(target)
    }
}

/// Ordered, fixed-capacity set of devices
#[derive(Debug)]
pub struct DeviceRegistry<L, const N: usize> {
    devices: Vec<Device<L>, N>,
}

impl<L, const N: usize> DeviceRegistry<L, N> {
    pub const fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Get a device by id
    pub fn get(&self, id: DeviceId) -> Result<&Device<L>, Error> {
        self.devices.get(id.index()).ok_or(Error::NotFound)
    }

    /// Get a mutable device by id
    pub fn get_mut(&mut self, id: DeviceId) -> Result<&mut Device<L>, Error> {
        self.devices.get_mut(id.index()).ok_or(Error::NotFound)
    }

    /// Find a device by friendly name
    pub fn find(&self, name: &str) -> Option<DeviceId> {
        self.devices
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .map(|d| d.id)
    }

    /// Iterate devices in registration order
    pub fn list(&self) -> impl Iterator<Item = &Device<L>> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Overwrite the cached state after an external change.
    pub fn update_state(&mut self, id: DeviceId, state: LightState) -> Result<(), Error> {
        self.get_mut(id)?.state = state.clamped();
        Ok(())
    }
}

impl<L: LightControl, const N: usize> DeviceRegistry<L, N> {
    /// Register a new device.
    ///
    /// Names are compared ignoring ASCII case, hubs match spoken names that way.
    pub fn register(&mut self, name: &str, control: L) -> Result<DeviceId, Error> {
        let name = config::make_name(name)?;
        if self.find(&name).is_some() {
            return Err(ConfigurationError::DuplicateName.into());
        }
        let id = u8::try_from(self.devices.len() + 1)
            .ok()
            .and_then(DeviceId::new)
            .ok_or(ConfigurationError::TooManyDevices)?;
        let state = control.get_state().clamped();

        self.devices
            .push(Device {
                id,
                name,
                state,
                control,
            })
            .map_err(|_| ConfigurationError::TooManyDevices)?;
        Ok(id)
    }

    /// Apply a command to a device
    pub fn apply(&mut self, id: DeviceId, command: LightCommand) -> Result<LightState, Error> {
        self.get_mut(id)?.apply(command)
    }
}

impl<L, const N: usize> Default for DeviceRegistry<L, N> {
    fn default() -> Self {
        Self::new()
    }
}
