//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::{Ipv4Addr, SocketAddrV4};

use embassy_futures::block_on;
use myrtio_hue_bridge::net::http::{HttpHandler, serve};
use myrtio_hue_bridge::{
    Bridge, BridgeConfig, DatagramSocket, HardwareError, LightBinding, LightControl, LightState,
};

pub const SERIAL: [u8; 6] = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
pub const HOST: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);
pub const HUB: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 20), 50000);

pub type TestBridge<'a> = Bridge<&'a FakeLight, 8>;

// -----------------------------------------------------------------------------
// Light
// -----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeLight {
    state: Cell<LightState>,
    failing: Cell<bool>,
    writes: Cell<usize>,
}

impl FakeLight {
    pub fn new(state: LightState) -> Self {
        Self {
            state: Cell::new(state),
            ..Self::default()
        }
    }

    pub fn state(&self) -> LightState {
        self.state.get()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl LightControl for &FakeLight {
    fn get_state(&self) -> LightState {
        self.state.get()
    }

    fn set_state(&mut self, state: LightState) -> Result<(), HardwareError> {
        if self.failing.get() {
            return Err(HardwareError::Unavailable);
        }
        self.writes.set(self.writes.get() + 1);
        self.state.set(state);
        Ok(())
    }
}

pub fn bridge<'a>(lights: &[(&'a str, &'a FakeLight)]) -> TestBridge<'a> {
    bridge_with(&BridgeConfig::new(SERIAL), lights)
}

pub fn bridge_with<'a>(
    config: &BridgeConfig<'_>,
    lights: &[(&'a str, &'a FakeLight)],
) -> TestBridge<'a> {
    Bridge::new(
        config,
        lights
            .iter()
            .map(|(name, light)| LightBinding::new(name, *light)),
    )
    .expect("valid configuration")
}

pub fn running_bridge<'a>(lights: &[(&'a str, &'a FakeLight)]) -> TestBridge<'a> {
    let bridge = bridge(lights);
    bridge.start(HOST).expect("bridge starts");
    bridge
}

// -----------------------------------------------------------------------------
// Datagram socket
// -----------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
pub struct SocketClosed;

#[derive(Debug, Default)]
pub struct FakeSocket {
    inbox: VecDeque<(Vec<u8>, SocketAddrV4)>,
    pub sent: Vec<(String, SocketAddrV4)>,
    pub fail_sends: bool,
}

impl FakeSocket {
    pub fn with_datagrams<'a>(datagrams: impl IntoIterator<Item = &'a [u8]>) -> Self {
        Self {
            inbox: datagrams
                .into_iter()
                .map(|datagram| (datagram.to_vec(), HUB))
                .collect(),
            ..Self::default()
        }
    }

    pub fn sent_payloads(&self) -> Vec<&str> {
        self.sent.iter().map(|(payload, _)| payload.as_str()).collect()
    }
}

impl DatagramSocket for FakeSocket {
    type Error = SocketClosed;

    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddrV4), Self::Error> {
        let (datagram, remote) = self.inbox.pop_front().ok_or(SocketClosed)?;
        buf[..datagram.len()].copy_from_slice(&datagram);
        Ok((datagram.len(), remote))
    }

    async fn send_to(&mut self, buf: &[u8], target: SocketAddrV4) -> Result<(), Self::Error> {
        if self.fail_sends {
            return Err(SocketClosed);
        }
        let payload = String::from_utf8(buf.to_vec()).expect("responses are text");
        self.sent.push((payload, target));
        Ok(())
    }
}

pub fn search_probe(target: &str, mx: Option<u8>) -> Vec<u8> {
    let mut probe = String::from("M-SEARCH * HTTP/1.1\r\n");
    probe.push_str("HOST: 239.255.255.250:1900\r\n");
    probe.push_str("MAN: \"ssdp:discover\"\r\n");
    if let Some(mx) = mx {
        probe.push_str(&format!("MX: {mx}\r\n"));
    }
    probe.push_str(&format!("ST: {target}\r\n\r\n"));
    probe.into_bytes()
}

/// Value of a header in an SSDP or HTTP message
pub fn header<'a>(message: &'a str, name: &str) -> Option<&'a str> {
    message.split("\r\n").find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

// -----------------------------------------------------------------------------
// HTTP stream
// -----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeStream {
    input: Vec<u8>,
    position: usize,
    pub output: Vec<u8>,
}

impl FakeStream {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.to_vec(),
            ..Self::default()
        }
    }
}

impl embedded_io_async::ErrorType for FakeStream {
    type Error = Infallible;
}

impl embedded_io_async::Read for FakeStream {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = &self.input[self.position..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }
}

impl embedded_io_async::Write for FakeStream {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub head: String,
    pub body: String,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        header(&self.head, name)
    }
}

/// Serve a raw request and parse the response
pub fn send(handler: &impl HttpHandler, raw: &str) -> Response {
    let mut stream = FakeStream::new(raw.as_bytes());
    let _ = block_on(serve(&mut stream, handler));
    let output = String::from_utf8(stream.output).expect("responses are text");
    let (head, body) = output.split_once("\r\n\r\n").expect("response has a head");
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("response has a status");
    Response {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}

pub fn get(handler: &impl HttpHandler, path: &str) -> Response {
    send(handler, &format!("GET {path} HTTP/1.1\r\nHost: bridge\r\n\r\n"))
}

pub fn put(handler: &impl HttpHandler, path: &str, body: &str) -> Response {
    send(
        handler,
        &format!(
            "PUT {path} HTTP/1.1\r\nHost: bridge\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        ),
    )
}
