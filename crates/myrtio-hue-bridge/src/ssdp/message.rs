//! SSDP search messages
//!
//! Only the subset hubs actually use is understood: `M-SEARCH` requests and
//! unicast `200 OK` responses. Notifications (`NOTIFY`) are never sent.

use core::fmt::{self, Write};

use embassy_time::Duration;

const SEARCH_REQUEST_LINE: &str = "M-SEARCH * HTTP/1.1";
const DISCOVER: &str = "ssdp:discover";

pub const TARGET_ALL: &str = "ssdp:all";
pub const TARGET_ROOT_DEVICE: &str = "upnp:rootdevice";
pub const TARGET_BASIC_DEVICE: &str = "urn:schemas-upnp-org:device:basic:1";

const SERVER: &str = "FreeRTOS/6.0.5, UPnP/1.0, IpBridge/1.17.0";
const MAX_AGE: u32 = 100;

/// Search target of a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget<'a> {
    All,
    RootDevice,
    BasicDevice,
    /// A single device, by its UPnP UUID (without the `uuid:` prefix)
    Device(&'a str),
}

impl<'a> SearchTarget<'a> {
    pub fn parse(value: &'a str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(TARGET_ALL) {
            Some(SearchTarget::All)
        } else if value.eq_ignore_ascii_case(TARGET_ROOT_DEVICE) {
            Some(SearchTarget::RootDevice)
        } else if value.eq_ignore_ascii_case(TARGET_BASIC_DEVICE) {
            Some(SearchTarget::BasicDevice)
        } else {
            value
                .strip_prefix("uuid:")
                .filter(|uuid| !uuid.is_empty())
                .map(SearchTarget::Device)
        }
    }

    /// Check whether a device with `uuid` answers this target
    pub fn matches(&self, uuid: &str) -> bool {
        match self {
            SearchTarget::Device(target) => target.eq_ignore_ascii_case(uuid),
            _ => true,
        }
    }
}

/// Parsed `M-SEARCH` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRequest<'a> {
    pub target: SearchTarget<'a>,
    /// Maximum wait time requested by the hub
    pub max_wait: Option<Duration>,
}

impl<'a> SearchRequest<'a> {
    /// Parse a datagram as a search request.
    ///
    /// Returns `None` for anything that is not a well-formed discovery probe.
    pub fn parse(datagram: &'a [u8]) -> Option<Self> {
        let text = core::str::from_utf8(datagram).ok()?;
        let mut lines = text.split("\r\n");
        if lines.next()?.trim() != SEARCH_REQUEST_LINE {
            return None;
        }

        let mut is_discover = false;
        let mut target = None;
        let mut max_wait = None;
        for line in lines {
            if line.is_empty() {
                break;
            }
            let Some((name, value)) = line.split_once(':') else {
                return None;
            };
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("MAN") {
                is_discover = value.trim_matches('"') == DISCOVER;
            } else if name.eq_ignore_ascii_case("ST") {
                target = Some(SearchTarget::parse(value)?);
            } else if name.eq_ignore_ascii_case("MX") {
                let seconds = value.parse::<u8>().ok()?;
                max_wait = Some(Duration::from_secs(u64::from(seconds)));
            }
        }

        if !is_discover {
            return None;
        }
        Some(Self {
            target: target?,
            max_wait,
        })
    }
}

/// Unicast reply to a search request, one per device
#[derive(Debug, Clone, Copy)]
pub struct SearchResponse<'a> {
    pub target: SearchTarget<'a>,
    pub location: &'a str,
    pub uuid: &'a str,
    pub bridge_id: &'a str,
}

impl SearchResponse<'_> {
    pub fn write_to(&self, writer: &mut impl Write) -> fmt::Result {
        write!(writer, "HTTP/1.1 200 OK\r\n")?;
        write!(writer, "HOST: 239.255.255.250:1900\r\n")?;
        write!(writer, "CACHE-CONTROL: max-age={}\r\n", MAX_AGE)?;
        write!(writer, "EXT:\r\n")?;
        write!(writer, "LOCATION: {}\r\n", self.location)?;
        write!(writer, "SERVER: {}\r\n", SERVER)?;
        write!(writer, "hue-bridgeid: {}\r\n", self.bridge_id)?;
        match self.target {
            SearchTarget::Device(_) => {
                write!(writer, "ST: uuid:{}\r\n", self.uuid)?;
                write!(writer, "USN: uuid:{}\r\n", self.uuid)?;
            }
            SearchTarget::RootDevice => {
                write!(writer, "ST: {}\r\n", TARGET_ROOT_DEVICE)?;
                write!(writer, "USN: uuid:{}::{}\r\n", self.uuid, TARGET_ROOT_DEVICE)?;
            }
            SearchTarget::All | SearchTarget::BasicDevice => {
                write!(writer, "ST: {}\r\n", TARGET_BASIC_DEVICE)?;
                write!(writer, "USN: uuid:{}::{}\r\n", self.uuid, TARGET_BASIC_DEVICE)?;
            }
        }
        write!(writer, "\r\n")
    }
}
