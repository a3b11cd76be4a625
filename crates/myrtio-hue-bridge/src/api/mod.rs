//! Command server
//!
//! HTTP handler serving the per-device endpoints advertised through SSDP and
//! the Hue-compatible surface the hubs use after discovery.
//!
//! | Route                              | Method     |
//! |------------------------------------|------------|
//! | `/device/<id>`                     | GET        |
//! | `/device/<id>`                     | PUT, POST  |
//! | `/description.xml`                 | GET        |
//! | `/api`                             | POST       |
//! | `/api/<user>/lights`               | GET        |
//! | `/api/<user>/lights/<id>`          | GET        |
//! | `/api/<user>/lights/<id>/state`    | PUT        |

pub mod dto;
pub mod hue;

use embedded_io_async::{Read, Write};
use log::debug;

use crate::bridge::Bridge;
use crate::error::Error;
use crate::light::{LightCommand, LightControl};
use crate::net::http::connection::RequestPath;
use crate::net::http::{HttpConnection, HttpError, HttpHandler, HttpMethod, HttpResult, ResponseHeaders};
use crate::registry::DeviceId;

use dto::{CommandRequest, ErrorResponse};

/// Resource addressed by a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource<'a> {
    Device(&'a str),
    Description,
    Pairing,
    HueLights,
    HueLight(&'a str),
    HueLightState(&'a str),
}

impl<'a> Resource<'a> {
    pub fn parse(path: &'a str) -> Option<Self> {
        let path = path.trim_end_matches('/');
        match path {
            "/description.xml" => return Some(Resource::Description),
            "/api" => return Some(Resource::Pairing),
            _ => {}
        }
        if let Some(id) = path.strip_prefix("/device/") {
            return (!id.contains('/')).then_some(Resource::Device(id));
        }

        let mut segments = path.strip_prefix("/api/")?.split('/');
        let _username = segments.next()?;
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some("lights"), None, None, None) => Some(Resource::HueLights),
            (Some("lights"), Some(id), None, None) => Some(Resource::HueLight(id)),
            (Some("lights"), Some(id), Some("state"), None) => Some(Resource::HueLightState(id)),
            _ => None,
        }
    }
}

/// HTTP handler bound to a bridge
pub struct CommandServer<'a, L, const N: usize> {
    bridge: &'a Bridge<L, N>,
}

impl<'a, L: LightControl, const N: usize> CommandServer<'a, L, N> {
    pub const fn new(bridge: &'a Bridge<L, N>) -> Self {
        Self { bridge }
    }

    async fn handle_device<S: Read + Write>(
        &self,
        conn: &mut HttpConnection<'_, S>,
        method: HttpMethod,
        raw_id: &str,
    ) -> HttpResult {
        let Some(id) = DeviceId::parse(raw_id) else {
            return write_error(conn, Error::NotFound).await;
        };
        match method {
            HttpMethod::Get => match self.bridge.describe(id) {
                Ok(descriptor) => conn.write_json(&descriptor).await,
                Err(e) => write_error(conn, e).await,
            },
            HttpMethod::Put | HttpMethod::Post => {
                let command = match read_command(conn).await {
                    Ok(command) => command,
                    Err(HttpError::TooLarge) => {
                        return conn.write_status(ResponseHeaders::too_large()).await;
                    }
                    Err(e) => return Err(e),
                };
                match command.and_then(|command| self.bridge.apply(id, command)) {
                    Ok(state) => conn.write_json(&state).await,
                    Err(e) => write_error(conn, e).await,
                }
            }
            _ => conn.write_status(ResponseHeaders::method_not_allowed()).await,
        }
    }
}

impl<L: LightControl, const N: usize> HttpHandler for CommandServer<'_, L, N> {
    async fn handle_request<S: Read + Write>(&self, conn: &mut HttpConnection<'_, S>) -> HttpResult {
        let method = conn.method;
        let path: RequestPath = conn.path.clone();
        debug!("http: {:?} {}", method, path);

        let Some(resource) = Resource::parse(&path) else {
            return conn.write_status(ResponseHeaders::not_found()).await;
        };
        if !self.bridge.is_running() {
            return write_error(conn, Error::InvalidState).await;
        }

        match (method, resource) {
            (method, Resource::Device(id)) => self.handle_device(conn, method, id).await,
            (HttpMethod::Get, Resource::Description) => hue::handle_description(self.bridge, conn).await,
            (HttpMethod::Post, Resource::Pairing) => hue::handle_pairing(self.bridge, conn).await,
            (HttpMethod::Get, Resource::HueLights) => hue::handle_lights(self.bridge, conn).await,
            (HttpMethod::Get, Resource::HueLight(id)) => {
                hue::handle_light(self.bridge, conn, id, &path).await
            }
            (HttpMethod::Put, Resource::HueLightState(id)) => {
                hue::handle_set_state(self.bridge, conn, id, &path).await
            }
            _ => conn.write_status(ResponseHeaders::method_not_allowed()).await,
        }
    }
}

/// Read a device command from the request body.
///
/// Body problems are reported as [`Error::MalformedRequest`]; only transport
/// failures and oversized bodies are returned as [`HttpError`].
async fn read_command<S: Read + Write>(
    conn: &mut HttpConnection<'_, S>,
) -> Result<Result<LightCommand, Error>, HttpError> {
    let parsed = conn
        .read_json::<CommandRequest>()
        .await
        .map(|request| LightCommand::from_name(request.command, request.level));
    match parsed {
        Err(HttpError::NoData | HttpError::Parse) => Ok(Err(Error::MalformedRequest)),
        other => other,
    }
}

async fn write_error<S: Read + Write>(conn: &mut HttpConnection<'_, S>, error: Error) -> HttpResult {
    debug!("http: request failed: {}", error);
    let body = ErrorResponse {
        error: error.as_str(),
    };
    conn.write_json_status(error.status_code(), &body).await
}
