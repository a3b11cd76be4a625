//! Bridge composition root
//!
//! [`Bridge`] owns the device registry and the lifecycle. The discovery
//! responder and the command server borrow it, so all of them share one
//! consistent view of the devices on a single executor.

use core::cell::{Cell, RefCell};
use core::net::Ipv4Addr;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::{Channel, Sender};
use embassy_sync::signal::Signal;
use heapless::Vec;
use log::{info, warn};

use crate::api::CommandServer;
use crate::config::{BridgeConfig, BridgeSettings, LightBinding};
use crate::descriptor::{DeviceDescriptor, ServiceLocation};
use crate::error::{Error, HardwareError};
use crate::light::{LightCommand, LightControl, LightState};
use crate::registry::{DeviceId, DeviceRegistry};
use crate::ssdp::DiscoveryResponder;

/// Capacity of the external state change queue
pub const STATE_CHANGE_QUEUE_SIZE: usize = 8;

type StateChangeChannel = Channel<NoopRawMutex, StateChange, STATE_CHANGE_QUEUE_SIZE>;

/// Bridge lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Configured, waiting for the network
    Idle,
    /// Serving discovery and commands
    Running(ServiceLocation),
    /// Stopped for good
    Stopped,
}

/// Light state changed outside of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub id: DeviceId,
    pub state: LightState,
}

/// Handle the light collaborator uses to report external state changes.
#[derive(Clone, Copy)]
pub struct StateNotifier<'a> {
    sender: Sender<'a, NoopRawMutex, StateChange, STATE_CHANGE_QUEUE_SIZE>,
}

impl StateNotifier<'_> {
    /// Queue a state change without waiting.
    pub fn notify(&self, id: DeviceId, state: LightState) -> Result<(), Error> {
        self.sender
            .try_send(StateChange { id, state })
            .map_err(|_| Error::Hardware(HardwareError::Busy))
    }
}

pub struct Bridge<L, const N: usize> {
    settings: BridgeSettings,
    registry: Mutex<NoopRawMutex, RefCell<DeviceRegistry<L, N>>>,
    lifecycle: Mutex<NoopRawMutex, Cell<Lifecycle>>,
    changes: StateChangeChannel,
    stop_signal: Signal<NoopRawMutex, ()>,
}

impl<L: LightControl, const N: usize> Bridge<L, N> {
    /// Validate the configuration and register every light.
    pub fn new<'b>(
        config: &BridgeConfig<'_>,
        lights: impl IntoIterator<Item = LightBinding<'b, L>>,
    ) -> Result<Self, Error> {
        let settings = config.validate()?;
        let mut registry = DeviceRegistry::new();
        for light in lights {
            let name = settings.device_name(light.name)?;
            let id = registry.register(&name, light.control)?;
            info!("bridge: registered device {} as \"{}\"", id, name);
        }

        Ok(Self {
            settings,
            registry: Mutex::new(RefCell::new(registry)),
            lifecycle: Mutex::new(Cell::new(Lifecycle::Idle)),
            changes: Channel::new(),
            stop_signal: Signal::new(),
        })
    }

    /// Apply a command to a device.
    pub fn apply(&self, id: DeviceId, command: LightCommand) -> Result<LightState, Error> {
        if !self.is_running() {
            return Err(Error::InvalidState);
        }
        let result = self
            .registry
            .lock(|registry| registry.borrow_mut().apply(id, command));
        match &result {
            Ok(state) => info!("bridge: device {} {:?} -> {:?}", id, command, state),
            Err(Error::Hardware(e)) => warn!("bridge: device {} rejected {:?}: {}", id, command, e),
            Err(_) => {}
        }
        result
    }

    /// HTTP handler for this bridge
    pub fn command_server(&self) -> CommandServer<'_, L, N> {
        CommandServer::new(self)
    }
}

impl<L, const N: usize> Bridge<L, N> {
    /// Start serving on the given host address.
    ///
    /// Only valid once, from the idle state.
    pub fn start(&self, host: Ipv4Addr) -> Result<ServiceLocation, Error> {
        let location = ServiceLocation::new(host, self.settings.tcp_port);
        self.lifecycle.lock(|lifecycle| match lifecycle.get() {
            Lifecycle::Idle => {
                lifecycle.set(Lifecycle::Running(location));
                Ok(())
            }
            _ => Err(Error::InvalidState),
        })?;
        info!(
            "bridge: \"{}\" running at {} with {} devices",
            self.settings.name,
            location.base_url(),
            self.len()
        );
        Ok(location)
    }

    /// Stop serving. Idempotent.
    pub fn stop(&self) {
        let was_stopped = self
            .lifecycle
            .lock(|lifecycle| lifecycle.replace(Lifecycle::Stopped) == Lifecycle::Stopped);
        if !was_stopped {
            info!("bridge: stopped");
        }
        self.stop_signal.signal(());
    }

    /// Wait until the bridge is stopped
    pub async fn stopped(&self) {
        while self.lifecycle() != Lifecycle::Stopped {
            self.stop_signal.wait().await;
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.lock(Cell::get)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.lifecycle(), Lifecycle::Running(_))
    }

    /// Command server location, `None` unless running
    pub fn location(&self) -> Option<ServiceLocation> {
        match self.lifecycle() {
            Lifecycle::Running(location) => Some(location),
            _ => None,
        }
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        self.registry.lock(|registry| registry.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of all devices in registration order
    pub fn device_ids(&self) -> Vec<DeviceId, N> {
        self.registry
            .lock(|registry| registry.borrow().list().map(|device| device.id()).collect())
    }

    /// Find a device by friendly name
    pub fn find(&self, name: &str) -> Option<DeviceId> {
        self.registry.lock(|registry| registry.borrow().find(name))
    }

    /// Cached state of a device
    pub fn state(&self, id: DeviceId) -> Result<LightState, Error> {
        self.registry
            .lock(|registry| registry.borrow().get(id).map(|device| device.state()))
    }

    /// Describe a device as seen by the hubs.
    pub fn describe(&self, id: DeviceId) -> Result<DeviceDescriptor, Error> {
        let location = self.location().ok_or(Error::InvalidState)?;
        self.registry.lock(|registry| {
            let registry = registry.borrow();
            let device = registry.get(id)?;
            Ok(DeviceDescriptor::new(device, &self.settings.serial, &location))
        })
    }

    /// Handle for reporting external state changes
    pub fn notifier(&self) -> StateNotifier<'_> {
        StateNotifier {
            sender: self.changes.sender(),
        }
    }

    /// Fold an external state change into the registry.
    ///
    /// Discovery is not re-announced, hubs read the new state on their next poll.
    pub fn apply_state_change(&self, change: StateChange) -> Result<(), Error> {
        self.registry
            .lock(|registry| registry.borrow_mut().update_state(change.id, change.state))
    }

    /// Apply every queued state change without waiting.
    ///
    /// Returns the number of changes applied.
    pub fn process_state_changes(&self) -> usize {
        let mut applied = 0;
        while let Ok(change) = self.changes.try_receive() {
            if self.apply_change_logged(change) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply queued state changes as they arrive.
    pub async fn sync_states(&self) -> ! {
        loop {
            let change = self.changes.receive().await;
            self.apply_change_logged(change);
        }
    }

    /// SSDP responder for this bridge
    pub fn responder(&self) -> DiscoveryResponder<'_, L, N> {
        DiscoveryResponder::new(self)
    }

    fn apply_change_logged(&self, change: StateChange) -> bool {
        match self.apply_state_change(change) {
            Ok(()) => true,
            Err(e) => {
                warn!("bridge: dropping state change for device {}: {}", change.id, e);
                false
            }
        }
    }
}
