//! Virtual light bridge for voice-assistant hubs
//!
//! Exposes a fixed set of lights to hubs on the local network. Hubs find the
//! lights with SSDP and control them over a small HTTP server that speaks a
//! per-device JSON API and a Hue-compatible subset.
//!
//! ```ignore
//! let config = BridgeConfig::new(mac).with_name("Living room");
//! let bridge: Bridge<_, 4> = Bridge::new(&config, [LightBinding::new("Lamp", lamp)])?;
//! myrtio_hue_bridge::net::embassy::run(stack, &bridge).await;
//! ```
//!
//! Without the `embassy-net` feature, drive [`DiscoveryResponder::run`] with
//! any [`DatagramSocket`] and [`serve`](net::http::serve) accepted streams
//! with [`CommandServer`].

#![no_std]

pub mod api;
pub mod bridge;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod light;
pub mod net;
pub mod registry;
pub mod ssdp;

pub use api::CommandServer;
pub use bridge::{Bridge, Lifecycle, StateChange, StateNotifier};
pub use config::{BridgeConfig, BridgeSettings, LightBinding};
pub use descriptor::{DeviceDescriptor, ServiceLocation};
pub use error::{ConfigurationError, Error, HardwareError};
pub use light::{LightCommand, LightControl, LightState};
pub use net::DatagramSocket;
pub use registry::{Device, DeviceId, DeviceRegistry};
pub use ssdp::DiscoveryResponder;
