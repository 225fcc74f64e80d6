//! # wled-link-client
//!
//! Device adapter for streaming pixel frames to WLED controllers.
//!
//! ## Features
//!
//! - **Sync Mode Multiplexing**: UDP realtime, DDP or E1.31 behind one adapter
//! - **Safe Backend Swaps**: old backend deactivated before the new one exists
//! - **Capability Negotiation**: reads controller geometry, gates settings
//!   writes on firmware version
//! - **Transport Abstraction**: pluggable backends and control channels (real, mock)
//!
//! ## Example
//!
//! ```ignore
//! use wled_link_client::{CapabilityNegotiator, HttpConnector, WledDevice};
//! use wled_link_types::{DeviceConfig, SyncMode};
//!
//! let config = DeviceConfig::new("strip1", "10.0.0.5", 300).with_sync_mode(SyncMode::Ddp);
//! let mut device = WledDevice::new(config)?;
//!
//! device.initialize(&HttpConnector::default(), &CapabilityNegotiator::default()).await?;
//! device.activate()?;
//! device.flush(&[[255, 0, 0]; 300])?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod control;
pub mod device;
pub mod negotiate;
pub mod registry;
pub mod transport;

pub use control::{
    ControlCall, ControlChannel, ControlConnector, ControlError, HttpConnector,
    HttpControlChannel, MockControl,
};
pub use device::{DeviceError, WledDevice};
pub use negotiate::{CapabilityNegotiator, NegotiationReport};
pub use registry::{RegistryEntry, SyncModeRegistry};
pub use transport::{
    Backend, BackendEvent, BackendFactory, BackendLog, DdpBackend, E131Backend, MockBackend,
    TransportError, UdpBackend,
};
