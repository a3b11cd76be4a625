//! Network plumbing
//!
//! The bridge logic is written against small transport traits so it can run
//! on any stack: [`DatagramSocket`] for SSDP and `embedded_io_async` streams
//! for HTTP. The `embassy-net` feature provides the bindings for
//! `embassy_net` sockets.

use core::net::SocketAddrV4;

#[cfg(feature = "embassy-net")]
pub mod embassy;
pub mod http;

/// Datagram socket used by the discovery responder.
#[allow(async_fn_in_trait)]
pub trait DatagramSocket {
    type Error: core::fmt::Debug;

    /// Receive a single datagram.
    ///
    /// Returns the number of bytes written to `buf` and the sender address.
    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddrV4), Self::Error>;

    /// Send a single datagram to `target`.
    async fn send_to(&mut self, buf: &[u8], target: SocketAddrV4) -> Result<(), Self::Error>;
}
