//! `embassy-net` bindings
//!
//! Runs a [`Bridge`] on an `embassy_net::Stack`: waits for an IPv4 address,
//! joins the SSDP multicast group and serves discovery, HTTP and state sync
//! concurrently until the bridge is stopped.

use core::net::{Ipv4Addr, SocketAddrV4};

use embassy_futures::join::{join, join3};
use embassy_futures::select::select;
use embassy_net::udp::{PacketMetadata, RecvError, SendError, UdpSocket};
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, IpEndpoint, Stack, StaticConfigV4};
use embassy_time::{Duration, Timer};
use log::{error, info, warn};

use super::DatagramSocket;
use super::http::{HttpHandler, serve};
use crate::bridge::Bridge;
use crate::config::{SSDP_MULTICAST_ADDR, SSDP_PORT};
use crate::light::LightControl;

const TCP_BUFFER_SIZE: usize = 1024;
const UDP_BUFFER_SIZE: usize = 1024;
const SOCKET_TIMEOUT: Duration = Duration::from_secs(10);

/// Socket level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UdpError {
    Recv(RecvError),
    Send(SendError),
}

impl DatagramSocket for UdpSocket<'_> {
    type Error = UdpError;

    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddrV4), Self::Error> {
        loop {
            let (len, meta) = match UdpSocket::recv_from(self, buf).await {
                Ok(received) => received,
                Err(RecvError::Truncated) => {
                    warn!("ssdp: dropping truncated datagram");
                    continue;
                }
                Err(e) => return Err(UdpError::Recv(e)),
            };
            match endpoint_v4(meta.endpoint) {
                Some(remote) => return Ok((len, remote)),
                None => continue,
            }
        }
    }

    async fn send_to(&mut self, buf: &[u8], target: SocketAddrV4) -> Result<(), Self::Error> {
        UdpSocket::send_to(self, buf, (*target.ip(), target.port()))
            .await
            .map_err(UdpError::Send)
    }
}

#[allow(unreachable_patterns)]
fn endpoint_v4(endpoint: IpEndpoint) -> Option<SocketAddrV4> {
    match endpoint.addr {
        IpAddress::Ipv4(addr) => Some(SocketAddrV4::new(addr, endpoint.port)),
        _ => None,
    }
}

/// Wait for the network link to become active
pub async fn wait_for_link(stack: Stack<'_>) {
    loop {
        if stack.is_link_up() {
            break;
        }
        Timer::after(Duration::from_millis(100)).await;
    }
}

/// Wait for the network stack to obtain an IPv4 address
pub async fn wait_for_ip(stack: Stack<'_>) -> StaticConfigV4 {
    loop {
        if let Some(config) = stack.config_v4() {
            return config;
        }
        Timer::after(Duration::from_millis(100)).await;
    }
}

/// Wait for full network connectivity (link + IP address)
pub async fn wait_for_connection(stack: Stack<'_>) -> StaticConfigV4 {
    wait_for_link(stack).await;
    wait_for_ip(stack).await
}

/// Run the bridge on `stack` until it is stopped.
///
/// The bridge is started once the stack has an IPv4 address. Two HTTP
/// workers accept connections so a slow client does not block discovery
/// follow-ups.
pub async fn run<L: LightControl, const N: usize>(stack: Stack<'_>, bridge: &Bridge<L, N>) {
    let config = wait_for_connection(stack).await;
    let host: Ipv4Addr = config.address.address();

    if let Err(e) = stack.join_multicast_group(IpAddress::Ipv4(SSDP_MULTICAST_ADDR)) {
        error!("ssdp: failed to join multicast group: {:?}", e);
        return;
    }
    if let Err(e) = bridge.start(host) {
        error!("bridge: failed to start: {}", e);
        return;
    }

    let server = bridge.command_server();
    let services = join3(
        run_discovery(stack, bridge),
        join(
            run_http_worker(stack, bridge.settings().tcp_port, &server),
            run_http_worker(stack, bridge.settings().tcp_port, &server),
        ),
        bridge.sync_states(),
    );
    select(services, bridge.stopped()).await;
    info!("bridge: network services stopped");
}

async fn run_discovery<L, const N: usize>(stack: Stack<'_>, bridge: &Bridge<L, N>) {
    let mut rx_meta = [PacketMetadata::EMPTY; 8];
    let mut rx_buffer = [0u8; UDP_BUFFER_SIZE];
    let mut tx_meta = [PacketMetadata::EMPTY; 8];
    let mut tx_buffer = [0u8; UDP_BUFFER_SIZE];

    loop {
        let mut socket = UdpSocket::new(
            stack,
            &mut rx_meta,
            &mut rx_buffer,
            &mut tx_meta,
            &mut tx_buffer,
        );
        if let Err(e) = socket.bind(SSDP_PORT) {
            error!("ssdp: failed to bind port {}: {:?}", SSDP_PORT, e);
            return;
        }
        info!("ssdp: listening on port {}", SSDP_PORT);

        if let Err(e) = bridge.responder().run(&mut socket).await {
            warn!("ssdp: socket failed: {:?}, rebinding", e);
        }
        socket.close();
        Timer::after(Duration::from_secs(1)).await;
    }
}

async fn run_http_worker<H: HttpHandler>(stack: Stack<'_>, port: u16, handler: &H) {
    let mut rx_buffer = [0u8; TCP_BUFFER_SIZE];
    let mut tx_buffer = [0u8; TCP_BUFFER_SIZE];

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));

        if let Err(e) = socket.accept(port).await {
            warn!("http: accept failed: {:?}", e);
            continue;
        }
        if let Err(e) = serve(&mut socket, handler).await {
            warn!("http: connection error: {:?}", e);
        }
        socket.close();
        let _ = socket.flush().await;
    }
}
