//! Discovery descriptors
//!
//! Read-only views of registered devices, recomputed on every request.

use core::fmt::Write as _;
use core::net::Ipv4Addr;

use heapless::String;
use serde::Serialize;

use crate::config::Name;
use crate::light::LightState;
use crate::registry::{Device, DeviceId};

pub type Url = String<64>;
pub type DeviceUuid = String<36>;
pub type UniqueId = String<32>;

/// Where the command server can be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceLocation {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl ServiceLocation {
    pub const fn new(host: Ipv4Addr, port: u16) -> Self {
        Self { host, port }
    }

    /// Service URL of a device
    ///
    /// Format: `http://{host}:{port}/device/{id}`
    pub fn device_url(&self, id: DeviceId) -> Url {
        let mut url = Url::new();
        let _ = write!(url, "http://{}:{}/device/{}", self.host, self.port, id);
        url
    }

    /// URL of the bridge's UPnP description
    ///
    /// Format: `http://{host}:{port}/description.xml`
    pub fn description_url(&self) -> Url {
        let mut url = Url::new();
        let _ = write!(url, "http://{}:{}/description.xml", self.host, self.port);
        url
    }

    /// Base URL of the command server
    ///
    /// Format: `http://{host}:{port}/`
    pub fn base_url(&self) -> Url {
        let mut url = Url::new();
        let _ = write!(url, "http://{}:{}/", self.host, self.port);
        url
    }
}

/// UPnP UUID of a device, derived from the bridge serial
///
/// Format: `2f402f80-da50-{id:04x}-9b23-{serial}`
pub fn device_uuid(serial: &[u8; 6], id: DeviceId) -> DeviceUuid {
    serial_uuid(serial, u16::from(id.as_u8()))
}

/// UPnP UUID of the bridge itself, advertised as the UDN of `description.xml`
///
/// Format: `2f402f80-da50-11e1-9b23-{serial}`
pub fn bridge_uuid(serial: &[u8; 6]) -> DeviceUuid {
    serial_uuid(serial, 0x11e1)
}

fn serial_uuid(serial: &[u8; 6], node: u16) -> DeviceUuid {
    let mut uuid = DeviceUuid::new();
    let _ = write!(uuid, "2f402f80-da50-{:04x}-9b23-", node);
    for byte in serial {
        let _ = write!(uuid, "{:02x}", byte);
    }
    uuid
}

/// Hue-style unique id of a device
///
/// Format: `{serial with colons}:00:{id:02x}-0b`
pub fn unique_id(serial: &[u8; 6], id: DeviceId) -> UniqueId {
    let mut unique = UniqueId::new();
    for byte in serial {
        let _ = write!(unique, "{:02x}:", byte);
    }
    let _ = write!(unique, "00:{:02x}-0b", id.as_u8());
    unique
}

/// Descriptor of a single device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    pub name: Name,
    #[serde(rename = "uniqueid")]
    pub unique_id: UniqueId,
    pub uuid: DeviceUuid,
    #[serde(rename = "url")]
    pub location: Url,
    pub state: LightState,
}

impl DeviceDescriptor {
    pub fn new<L>(device: &Device<L>, serial: &[u8; 6], location: &ServiceLocation) -> Self {
        let id = device.id();
        let mut name = Name::new();
        let _ = name.push_str(device.name());

        Self {
            id,
            name,
            unique_id: unique_id(serial, id),
            uuid: device_uuid(serial, id),
            location: location.device_url(id),
            state: device.state(),
        }
    }
}
