//! Transport backends for wled-link.
//!
//! One backend per sync mode, all behind the [`Backend`] trait so that the
//! device adapter can swap them at runtime:
//! - [`UdpBackend`]: WLED realtime UDP (DRGB/DNRGB/WARLS)
//! - [`DdpBackend`]: Distributed Display Protocol
//! - [`E131Backend`]: ANSI E1.31 streaming ACN
//! - [`MockBackend`]: records calls, for tests
//!
//! # Design
//!
//! Backends are synchronous and fire-and-forget:
//! - `activate()` opens a non-blocking socket
//! - `flush()` encodes a frame and sends it without waiting
//! - `deactivate()` drops the socket
//!
//! Backends are constructed from a merged [`BackendConfig`] and receive
//! their resolved destination from the adapter via `set_destination()`.

mod ddp;
mod e131;
mod mock;
mod socket;
mod udp;

pub use ddp::DdpBackend;
pub use e131::E131Backend;
pub use mock::{BackendEvent, BackendLog, MockBackend};
pub use udp::UdpBackend;

use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;
use wled_link_core::BackendConfig;
use wled_link_types::Rgb;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket could not be opened.
    #[error("failed to open socket: {0}")]
    Bind(#[source] std::io::Error),

    /// Datagram could not be sent.
    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),

    /// No destination address has been set.
    #[error("no destination address")]
    NoDestination,

    /// Backend is not active.
    #[error("backend not active")]
    NotActive,
}

/// A sync mode's wire encoding and transmission discipline.
pub trait Backend: Send {
    /// Open the connection. Calling this while active is a no-op.
    fn activate(&mut self) -> Result<(), TransportError>;

    /// Close the connection. Always safe to call.
    fn deactivate(&mut self);

    /// Encode and send one frame of pixels.
    ///
    /// Pixels beyond the configured pixel count are ignored.
    fn flush(&mut self, frame: &[Rgb]) -> Result<(), TransportError>;

    /// Whether the backend is active.
    fn is_active(&self) -> bool;

    /// The resolved controller address.
    fn destination(&self) -> Option<IpAddr>;

    /// Set the resolved controller address.
    fn set_destination(&mut self, destination: Option<IpAddr>);

    /// The merged configuration this backend was built from.
    fn config(&self) -> &BackendConfig;
}

/// Constructs a backend from a merged configuration.
pub type BackendFactory = Arc<dyn Fn(BackendConfig) -> Box<dyn Backend> + Send + Sync>;

/// Clamp a frame to the configured pixel count.
pub(crate) fn visible(frame: &[Rgb], pixel_count: u32) -> &[Rgb] {
    let len = frame.len().min(pixel_count as usize);
    &frame[..len]
}
