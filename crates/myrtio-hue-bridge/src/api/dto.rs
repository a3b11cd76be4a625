use serde::{Deserialize, Serialize};

use crate::descriptor::UniqueId;

/// Body of `PUT /device/<id>`
#[derive(Debug, Deserialize)]
pub struct CommandRequest<'a> {
    pub command: &'a str,
    #[serde(default)]
    pub level: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
}

/// Body of `PUT /api/<user>/lights/<id>/state`
#[derive(Debug, Default, Deserialize)]
pub struct HueStateRequest {
    #[serde(default)]
    pub on: Option<bool>,
    #[serde(default)]
    pub bri: Option<u16>,
}

#[derive(Debug, Serialize)]
pub struct HueLightState {
    pub on: bool,
    pub bri: u8,
    pub alert: &'static str,
    pub mode: &'static str,
    pub reachable: bool,
}

#[derive(Debug, Serialize)]
pub struct HueLight<'a> {
    pub state: HueLightState,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'a str,
    pub modelid: &'static str,
    pub manufacturername: &'static str,
    pub productname: &'static str,
    pub uniqueid: &'a UniqueId,
    pub swversion: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HueUsername<'a> {
    pub username: &'a str,
}

#[derive(Debug, Serialize)]
pub struct HueSuccess<T> {
    pub success: T,
}

#[derive(Debug, Serialize)]
pub struct HueErrorDetail<'a> {
    #[serde(rename = "type")]
    pub kind: u16,
    pub address: &'a str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HueError<'a> {
    pub error: HueErrorDetail<'a>,
}
