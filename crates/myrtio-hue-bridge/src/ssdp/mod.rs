//! Discovery responder
//!
//! Answers SSDP `M-SEARCH` probes received on the multicast group with one
//! unicast response per registered device. Everything runs on fixed-size
//! buffers; probes are never queued.

pub mod message;

use core::net::SocketAddrV4;

use embassy_time::{Duration, Timer};
use heapless::Vec;
use log::{debug, warn};

use crate::bridge::Bridge;
use crate::descriptor::{bridge_uuid, device_uuid};
use crate::net::DatagramSocket;

pub use message::{SearchRequest, SearchResponse, SearchTarget};

/// Size of the probe receive buffer
pub const RX_BUFFER_SIZE: usize = 1024;
/// Size of a single response datagram
pub const TX_BUFFER_SIZE: usize = 512;

/// SSDP responder bound to a bridge
pub struct DiscoveryResponder<'a, L, const N: usize> {
    bridge: &'a Bridge<L, N>,
}

impl<'a, L, const N: usize> DiscoveryResponder<'a, L, N> {
    pub const fn new(bridge: &'a Bridge<L, N>) -> Self {
        Self { bridge }
    }

    /// Receive and answer probes until the socket fails.
    pub async fn run<S: DatagramSocket>(&self, socket: &mut S) -> Result<(), S::Error> {
        let mut buf = [0u8; RX_BUFFER_SIZE];
        loop {
            let (len, remote) = socket.recv_from(&mut buf).await?;
            self.respond(socket, &buf[..len], remote).await;
        }
    }

    /// Answer a single probe.
    ///
    /// Returns the number of responses sent.
    pub async fn respond<S: DatagramSocket>(
        &self,
        socket: &mut S,
        datagram: &[u8],
        remote: SocketAddrV4,
    ) -> usize {
        let Some(location) = self.bridge.location() else {
            debug!("ssdp: bridge is not running, ignoring probe from {}", remote);
            return 0;
        };
        let Some(request) = SearchRequest::parse(datagram) else {
            debug!("ssdp: ignoring datagram from {}", remote);
            return 0;
        };

        let settings = self.bridge.settings();
        let delay = reply_delay(settings.reply_delay, request.max_wait);
        if delay > Duration::from_ticks(0) {
            Timer::after(delay).await;
        }

        let bridge_id = settings.bridge_id();

        // The bridge UDN from description.xml points back at the description
        let bridge_uuid = bridge_uuid(&settings.serial);
        if let SearchTarget::Device(target) = request.target
            && target.eq_ignore_ascii_case(&bridge_uuid)
        {
            let url = location.description_url();
            let response = SearchResponse {
                target: request.target,
                location: &url,
                uuid: &bridge_uuid,
                bridge_id: &bridge_id,
            };
            debug!("ssdp: answering {} for the bridge", remote);
            return usize::from(send_response(socket, &response, remote).await);
        }

        let mut sent = 0;
        for id in self.bridge.device_ids() {
            let uuid = device_uuid(&settings.serial, id);
            if !request.target.matches(&uuid) {
                continue;
            }
            let url = location.device_url(id);
            let response = SearchResponse {
                target: request.target,
                location: &url,
                uuid: &uuid,
                bridge_id: &bridge_id,
            };
            if send_response(socket, &response, remote).await {
                sent += 1;
            }
        }

        debug!("ssdp: answered {} with {} responses", remote, sent);
        sent
    }
}

async fn send_response<S: DatagramSocket>(
    socket: &mut S,
    response: &SearchResponse<'_>,
    remote: SocketAddrV4,
) -> bool {
    let mut packet = Vec::<u8, TX_BUFFER_SIZE>::new();
    if response.write_to(&mut packet).is_err() {
        warn!("ssdp: response for {} does not fit", response.uuid);
        return false;
    }
    match socket.send_to(&packet, remote).await {
        Ok(()) => true,
        Err(e) => {
            warn!("ssdp: send to {} failed: {:?}", remote, e);
            false
        }
    }
}

/// Delay before answering, bounded by the probe's `MX`
fn reply_delay(configured: Duration, max_wait: Option<Duration>) -> Duration {
    match max_wait {
        Some(max_wait) if max_wait < configured => max_wait,
        _ => configured,
    }
}
