//! Hue-compatible API surface
//!
//! Voice hubs that found the bridge over SSDP read `description.xml`, pair
//! once and then talk to the `/api/<user>/lights` resources. Only power and
//! brightness are supported; Hue `bri` (0-254) maps onto levels 0-100.

use core::fmt::Write as _;

use embedded_io_async::{Read, Write};
use heapless::String;
use log::debug;

use super::dto::{
    HueError, HueErrorDetail, HueLight, HueLightState, HueStateRequest, HueSuccess, HueUsername,
};
use crate::bridge::Bridge;
use crate::descriptor::{DeviceDescriptor, ServiceLocation, bridge_uuid};
use crate::error::Error;
use crate::light::{BRIGHTNESS_MAX, LightCommand, LightControl, LightState};
use crate::net::http::{
    ContentHeaders, ContentType, HttpConnection, HttpError, HttpResult, ResponseHeaders,
    TextEncoding,
};
use crate::registry::DeviceId;

/// Maximum Hue brightness
pub const HUE_BRIGHTNESS_MAX: u16 = 254;

const LIGHT_TYPE: &str = "Dimmable light";
const MODEL_ID: &str = "LWB010";
const MANUFACTURER: &str = "Philips";
const PRODUCT_NAME: &str = "Hue white lamp";
const SW_VERSION: &str = "1.46.13_r26312";

/// Convert a Hue `bri` value to a brightness level
///
/// Only `bri` 0 maps to level 0, the dimmest Hue value stays at level 1.
#[allow(clippy::cast_possible_truncation)]
pub fn level_from_bri(bri: u16) -> Result<u8, Error> {
    if bri > HUE_BRIGHTNESS_MAX {
        return Err(Error::InvalidRange);
    }
    let max = u32::from(HUE_BRIGHTNESS_MAX);
    let level = ((u32::from(bri) * u32::from(BRIGHTNESS_MAX) + max / 2) / max) as u8;
    Ok(if bri > 0 { level.max(1) } else { level })
}

/// Convert a brightness level to a Hue `bri` value
#[allow(clippy::cast_possible_truncation)]
pub fn bri_from_level(level: u8) -> u8 {
    let max = u16::from(BRIGHTNESS_MAX);
    ((u16::from(level.min(BRIGHTNESS_MAX)) * HUE_BRIGHTNESS_MAX + max / 2) / max) as u8
}

/// Map a Hue state request onto a light command
pub fn command_from_request(request: &HueStateRequest) -> Result<LightCommand, Error> {
    match (request.on, request.bri) {
        (Some(false), _) => Ok(LightCommand::TurnOff),
        (on, Some(bri)) => {
            let level = level_from_bri(bri)?;
            // An explicit "on" never dims the light to off
            let level = if on == Some(true) { level.max(1) } else { level };
            Ok(LightCommand::SetBrightness(u16::from(level)))
        }
        (Some(true), None) => Ok(LightCommand::TurnOn),
        (None, None) => Err(Error::MalformedRequest),
    }
}

impl<'a> HueLight<'a> {
    pub fn from_descriptor(descriptor: &'a DeviceDescriptor) -> Self {
        Self {
            state: HueLightState::from(descriptor.state),
            kind: LIGHT_TYPE,
            name: &descriptor.name,
            modelid: MODEL_ID,
            manufacturername: MANUFACTURER,
            productname: PRODUCT_NAME,
            uniqueid: &descriptor.unique_id,
            swversion: SW_VERSION,
        }
    }
}

impl From<LightState> for HueLightState {
    fn from(state: LightState) -> Self {
        Self {
            on: state.is_on,
            bri: bri_from_level(state.brightness.unwrap_or(BRIGHTNESS_MAX)),
            alert: "none",
            mode: "homeautomation",
            reachable: true,
        }
    }
}

/// Hue error type and description
const fn error_kind(error: Error) -> (u16, &'static str) {
    match error {
        Error::NotFound => (3, "resource not available"),
        Error::InvalidRange => (7, "invalid value for parameter"),
        Error::MalformedRequest => (2, "body contains invalid json"),
        Error::Hardware(_) | Error::InvalidState | Error::Configuration(_) => {
            (901, "internal error")
        }
    }
}

/// Write the UPnP device description of the bridge.
pub fn write_description(
    writer: &mut impl core::fmt::Write,
    name: &str,
    location: &ServiceLocation,
    serial: &[u8; 6],
) -> core::fmt::Result {
    let mut serial_hex = String::<12>::new();
    for byte in serial {
        write!(serial_hex, "{:02x}", byte)?;
    }

    writer.write_str("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\r\n")?;
    writer.write_str("<root xmlns=\"urn:schemas-upnp-org:device-1-0\">\r\n")?;
    writer.write_str("<specVersion><major>1</major><minor>0</minor></specVersion>\r\n")?;
    write!(writer, "<URLBase>{}</URLBase>\r\n", location.base_url())?;
    writer.write_str("<device>\r\n")?;
    writer.write_str("<deviceType>urn:schemas-upnp-org:device:Basic:1</deviceType>\r\n")?;
    write!(writer, "<friendlyName>{} ({})</friendlyName>\r\n", name, location.host)?;
    writer.write_str("<manufacturer>Royal Philips Electronics</manufacturer>\r\n")?;
    writer.write_str("<manufacturerURL>http://www.philips.com</manufacturerURL>\r\n")?;
    writer.write_str(
        "<modelDescription>Philips hue Personal Wireless Lighting</modelDescription>\r\n",
    )?;
    writer.write_str("<modelName>Philips hue bridge 2012</modelName>\r\n")?;
    writer.write_str("<modelNumber>929000226503</modelNumber>\r\n")?;
    writer.write_str("<modelURL>http://www.meethue.com</modelURL>\r\n")?;
    write!(writer, "<serialNumber>{}</serialNumber>\r\n", serial_hex)?;
    write!(writer, "<UDN>uuid:{}</UDN>\r\n", bridge_uuid(serial))?;
    writer.write_str("<presentationURL>index.html</presentationURL>\r\n")?;
    writer.write_str("</device>\r\n")?;
    writer.write_str("</root>\r\n")
}

/// Write the success body of a state change.
pub fn write_state_success(
    writer: &mut impl core::fmt::Write,
    id: DeviceId,
    request: &HueStateRequest,
    state: &LightState,
) -> core::fmt::Result {
    writer.write_char('[')?;
    let mut first = true;
    if request.on.is_some() {
        write!(
            writer,
            "{{\"success\":{{\"/lights/{}/state/on\":{}}}}}",
            id, state.is_on
        )?;
        first = false;
    }
    if request.bri.is_some() {
        if !first {
            writer.write_char(',')?;
        }
        let bri = bri_from_level(state.brightness.unwrap_or(BRIGHTNESS_MAX));
        write!(writer, "{{\"success\":{{\"/lights/{}/state/bri\":{}}}}}", id, bri)?;
    }
    writer.write_char(']')
}

pub(super) async fn handle_description<L, S: Read + Write, const N: usize>(
    bridge: &Bridge<L, N>,
    conn: &mut HttpConnection<'_, S>,
) -> HttpResult {
    let Some(location) = bridge.location() else {
        return write_hue_error(conn, Error::InvalidState, "/description.xml").await;
    };
    let settings = bridge.settings();
    let mut body = String::<1024>::new();
    write_description(&mut body, &settings.name, &location, &settings.serial)?;

    let headers = ResponseHeaders::success().with_content(
        ContentHeaders::new_with_content_type(ContentType::TextXml)
            .with_text_encoding(TextEncoding::Utf8)
            .with_content_length(body.len()),
    );
    conn.write_headers(&headers).await?;
    conn.write_body(body.as_bytes()).await
}

pub(super) async fn handle_pairing<L, S: Read + Write, const N: usize>(
    bridge: &Bridge<L, N>,
    conn: &mut HttpConnection<'_, S>,
) -> HttpResult {
    let username = bridge.settings().bridge_id();
    debug!("hue: pairing request, username {}", username);
    let response = [HueSuccess {
        success: HueUsername {
            username: &username,
        },
    }];
    conn.write_json(&response).await
}

pub(super) async fn handle_lights<L, S: Read + Write, const N: usize>(
    bridge: &Bridge<L, N>,
    conn: &mut HttpConnection<'_, S>,
) -> HttpResult {
    // The listing can exceed the body buffer, so it is streamed until close
    let headers = ResponseHeaders::success()
        .with_content(ContentHeaders::new_with_content_type(ContentType::Json));
    conn.write_headers(&headers).await?;
    conn.write_body(b"{").await?;

    let mut first = true;
    for id in bridge.device_ids() {
        let Ok(descriptor) = bridge.describe(id) else {
            continue;
        };
        let mut key = String::<8>::new();
        if !first {
            key.push(',').map_err(|_| HttpError::FormatHeaders)?;
        }
        write!(key, "\"{}\":", id)?;
        conn.write_body(key.as_bytes()).await?;
        conn.write_json_chunk(&HueLight::from_descriptor(&descriptor))
            .await?;
        first = false;
    }

    conn.write_body(b"}").await
}

pub(super) async fn handle_light<L, S: Read + Write, const N: usize>(
    bridge: &Bridge<L, N>,
    conn: &mut HttpConnection<'_, S>,
    raw_id: &str,
    path: &str,
) -> HttpResult {
    let descriptor = DeviceId::parse(raw_id)
        .ok_or(Error::NotFound)
        .and_then(|id| bridge.describe(id));
    match descriptor {
        Ok(descriptor) => conn.write_json(&HueLight::from_descriptor(&descriptor)).await,
        Err(e) => write_hue_error(conn, e, path).await,
    }
}

pub(super) async fn handle_set_state<L: LightControl, S: Read + Write, const N: usize>(
    bridge: &Bridge<L, N>,
    conn: &mut HttpConnection<'_, S>,
    raw_id: &str,
    path: &str,
) -> HttpResult {
    let Some(id) = DeviceId::parse(raw_id) else {
        return write_hue_error(conn, Error::NotFound, path).await;
    };
    let request = match conn.read_json::<HueStateRequest>().await {
        Ok(request) => request,
        Err(HttpError::NoData | HttpError::Parse) => {
            return write_hue_error(conn, Error::MalformedRequest, path).await;
        }
        Err(HttpError::TooLarge) => return conn.write_status(ResponseHeaders::too_large()).await,
        Err(e) => return Err(e),
    };

    let state = command_from_request(&request).and_then(|command| bridge.apply(id, command));
    match state {
        Ok(state) => {
            let mut body = String::<128>::new();
            write_state_success(&mut body, id, &request, &state)?;
            conn.write_response(200, ContentType::Json, body.as_bytes())
                .await
        }
        Err(e) => write_hue_error(conn, e, path).await,
    }
}

async fn write_hue_error<S: Read + Write>(
    conn: &mut HttpConnection<'_, S>,
    error: Error,
    address: &str,
) -> HttpResult {
    debug!("hue: {} failed: {}", address, error);
    let (kind, description) = error_kind(error);
    let response = [HueError {
        error: HueErrorDetail {
            kind,
            address,
            description,
        },
    }];
    conn.write_json_status(error.status_code(), &response).await
}
