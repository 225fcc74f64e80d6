//! Control channel to the controller's JSON API.
//!
//! Used once per initialization by the capability negotiator:
//! - [`HttpControlChannel`]: `reqwest` client for `/json/info` and `/json/cfg`
//! - [`MockControl`]: scripted responses and recorded commits, for tests
//!
//! A [`ControlConnector`] opens a channel to a resolved address.

mod http;
mod mock;

pub use http::{HttpConnector, HttpControlChannel, DEFAULT_CONTROL_PORT};
pub use mock::{ControlCall, MockControl};

use async_trait::async_trait;
use std::net::IpAddr;
use thiserror::Error;
use wled_link_types::{RemoteIdentity, SyncSettings};

/// Control channel errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(String),

    /// Controller answered with a non-success status.
    #[error("{path} returned status {status}")]
    Status {
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
    },

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Response lacks a required field.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Controller could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

impl From<reqwest::Error> for ControlError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            ControlError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            ControlError::Decode(e.to_string())
        } else {
            ControlError::Http(e.to_string())
        }
    }
}

/// Request/response access to a controller's configuration.
#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// Fetch the controller's name, geometry and firmware version.
    async fn fetch_device_config(&self) -> Result<RemoteIdentity, ControlError>;

    /// Fetch the controller's sync settings document.
    async fn fetch_sync_settings(&self) -> Result<SyncSettings, ControlError>;

    /// Write a sync settings document back to the controller.
    async fn commit_sync_settings(&self, settings: &SyncSettings) -> Result<(), ControlError>;
}

/// Opens control channels to resolved controller addresses.
pub trait ControlConnector: Send + Sync {
    /// Channel type produced.
    type Channel: ControlChannel;

    /// Open a channel to `destination`.
    fn open(&self, destination: IpAddr) -> Result<Self::Channel, ControlError>;
}
