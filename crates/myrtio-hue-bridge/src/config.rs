use core::fmt::Write as _;
use core::net::Ipv4Addr;

use embassy_time::Duration;
use heapless::String;

use crate::error::ConfigurationError;

/// Default TCP port of the command server. Gen3 voice hubs only talk to 80.
pub const DEFAULT_TCP_PORT: u16 = 80;
/// Default host name used when neither a bridge name nor a host name is set
pub const DEFAULT_HOSTNAME: &str = "myrtio-bridge";

/// SSDP multicast port
pub const SSDP_PORT: u16 = 1900;
/// SSDP multicast group
pub const SSDP_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Upper bound for the discovery reply delay
pub const MAX_REPLY_DELAY: Duration = Duration::from_millis(500);

/// Maximum length of a device or bridge name
pub const MAX_NAME_LEN: usize = 32;

pub type Name = String<MAX_NAME_LEN>;

/// Bridge configuration as provided by the host build system.
#[derive(Debug, Clone)]
pub struct BridgeConfig<'a> {
    /// Bridge friendly name, empty to use `hostname`
    pub name: &'a str,
    /// Host device name
    pub hostname: &'a str,
    /// Command server TCP port
    pub tcp_port: u16,
    /// Bridge serial, normally the station MAC address
    pub serial: [u8; 6],
    /// Prefix every device name with the bridge name
    pub prefix_names: bool,
    /// Delay before answering a discovery probe
    pub reply_delay: Duration,
}

impl<'a> BridgeConfig<'a> {
    /// Create a configuration with default values
    pub const fn new(serial: [u8; 6]) -> Self {
        Self {
            name: "",
            hostname: DEFAULT_HOSTNAME,
            tcp_port: DEFAULT_TCP_PORT,
            serial,
            prefix_names: false,
            reply_delay: Duration::from_ticks(0),
        }
    }

    /// Set bridge name
    #[must_use]
    pub const fn with_name(mut self, name: &'a str) -> Self {
        self.name = name;
        self
    }

    /// Set host name
    #[must_use]
    pub const fn with_hostname(mut self, hostname: &'a str) -> Self {
        self.hostname = hostname;
        self
    }

    /// Set command server port
    #[must_use]
    pub const fn with_tcp_port(mut self, port: u16) -> Self {
        self.tcp_port = port;
        self
    }

    /// Set name prefixing
    #[must_use]
    pub const fn with_prefix_names(mut self, prefix_names: bool) -> Self {
        self.prefix_names = prefix_names;
        self
    }

    /// Set discovery reply delay
    #[must_use]
    pub const fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    /// Validate the configuration and resolve defaults.
    pub fn validate(&self) -> Result<BridgeSettings, ConfigurationError> {
        if self.tcp_port == 0 {
            return Err(ConfigurationError::InvalidPort);
        }
        let name = if self.name.trim().is_empty() {
            self.hostname
        } else {
            self.name
        };

        Ok(BridgeSettings {
            name: make_name(name)?,
            tcp_port: self.tcp_port,
            serial: self.serial,
            prefix_names: self.prefix_names,
            reply_delay: if self.reply_delay > MAX_REPLY_DELAY {
                MAX_REPLY_DELAY
            } else {
                self.reply_delay
            },
        })
    }
}

/// A light to expose, as declared in the configuration.
pub struct LightBinding<'a, L> {
    /// Display name
    pub name: &'a str,
    /// Control handle of the light
    pub control: L,
}

impl<'a, L> LightBinding<'a, L> {
    pub const fn new(name: &'a str, control: L) -> Self {
        Self { name, control }
    }
}

/// Validated bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub name: Name,
    pub tcp_port: u16,
    pub serial: [u8; 6],
    pub prefix_names: bool,
    pub reply_delay: Duration,
}

impl BridgeSettings {
    /// Resolve the friendly name a device is exposed under.
    pub fn device_name(&self, display_name: &str) -> Result<Name, ConfigurationError> {
        if display_name.trim().is_empty() {
            return Err(ConfigurationError::EmptyName);
        }
        if !self.prefix_names {
            return make_name(display_name);
        }
        let mut name = Name::new();
        write!(name, "{} {}", self.name, display_name)
            .map_err(|_| ConfigurationError::NameTooLong)?;
        Ok(name)
    }

    /// Bridge id advertised in `hue-bridgeid`
    ///
    /// Format: MAC with `FFFE` inserted in the middle, upper-case hex.
    pub fn bridge_id(&self) -> String<16> {
        let s = &self.serial;
        let mut id = String::new();
        let _ = write!(
            id,
            "{:02X}{:02X}{:02X}FFFE{:02X}{:02X}{:02X}",
            s[0], s[1], s[2], s[3], s[4], s[5]
        );
        id
    }
}

pub(crate) fn make_name(value: &str) -> Result<Name, ConfigurationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigurationError::EmptyName);
    }
    let mut name = Name::new();
    name.push_str(value)
        .map_err(|()| ConfigurationError::NameTooLong)?;
    Ok(name)
}
