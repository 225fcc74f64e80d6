//! Mock control channel for testing.
//!
//! Serves a scripted identity and settings document, and records every
//! call and committed document for verification.

use super::{ControlChannel, ControlConnector, ControlError};
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use wled_link_types::{RemoteIdentity, SyncSettings};

/// A recorded control channel call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCall {
    /// `open()` on the connector.
    Open(IpAddr),
    /// `fetch_device_config()`.
    FetchDeviceConfig,
    /// `fetch_sync_settings()`.
    FetchSyncSettings,
    /// `commit_sync_settings()`.
    CommitSyncSettings,
}

/// Mock control connector and channel.
///
/// Clones share state, so a test can keep a handle while the device owns
/// another.
#[derive(Debug, Default)]
pub struct MockControl {
    inner: Arc<Mutex<MockControlInner>>,
}

#[derive(Debug, Default)]
struct MockControlInner {
    identity: Option<RemoteIdentity>,
    settings: SyncSettings,
    calls: Vec<ControlCall>,
    commits: Vec<SyncSettings>,
    fail_next_open: Option<ControlError>,
    fail_next_fetch_config: Option<ControlError>,
    fail_next_fetch_settings: Option<ControlError>,
    fail_next_commit: Option<ControlError>,
}

impl MockControl {
    /// Create a mock serving `identity` and an empty settings document.
    pub fn new(identity: RemoteIdentity) -> Self {
        let mock = Self::default();
        mock.inner.lock().unwrap().identity = Some(identity);
        mock
    }

    /// Set the settings document returned by `fetch_sync_settings()`.
    pub fn set_sync_settings(&self, settings: SyncSettings) {
        self.inner.lock().unwrap().settings = settings;
    }

    /// Replace the identity returned by `fetch_device_config()`.
    pub fn set_identity(&self, identity: RemoteIdentity) {
        self.inner.lock().unwrap().identity = Some(identity);
    }

    /// All calls, in order.
    pub fn calls(&self) -> Vec<ControlCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Every committed settings document.
    pub fn commits(&self) -> Vec<SyncSettings> {
        self.inner.lock().unwrap().commits.clone()
    }

    /// The most recently committed settings document.
    pub fn last_commit(&self) -> Option<SyncSettings> {
        self.inner.lock().unwrap().commits.last().cloned()
    }

    /// Cause the next open() to fail with the given error.
    pub fn fail_next_open(&self, error: ControlError) {
        self.inner.lock().unwrap().fail_next_open = Some(error);
    }

    /// Cause the next fetch_device_config() to fail with the given error.
    pub fn fail_next_fetch_config(&self, error: ControlError) {
        self.inner.lock().unwrap().fail_next_fetch_config = Some(error);
    }

    /// Cause the next fetch_sync_settings() to fail with the given error.
    pub fn fail_next_fetch_settings(&self, error: ControlError) {
        self.inner.lock().unwrap().fail_next_fetch_settings = Some(error);
    }

    /// Cause the next commit_sync_settings() to fail with the given error.
    pub fn fail_next_commit(&self, error: ControlError) {
        self.inner.lock().unwrap().fail_next_commit = Some(error);
    }
}

impl Clone for MockControl {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ControlConnector for MockControl {
    type Channel = MockControl;

    fn open(&self, destination: IpAddr) -> Result<MockControl, ControlError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(ControlCall::Open(destination));
        if let Some(error) = inner.fail_next_open.take() {
            return Err(error);
        }
        Ok(self.clone())
    }
}

#[async_trait]
impl ControlChannel for MockControl {
    async fn fetch_device_config(&self) -> Result<RemoteIdentity, ControlError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(ControlCall::FetchDeviceConfig);
        if let Some(error) = inner.fail_next_fetch_config.take() {
            return Err(error);
        }
        inner
            .identity
            .clone()
            .ok_or(ControlError::MissingField("name"))
    }

    async fn fetch_sync_settings(&self) -> Result<SyncSettings, ControlError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(ControlCall::FetchSyncSettings);
        if let Some(error) = inner.fail_next_fetch_settings.take() {
            return Err(error);
        }
        Ok(inner.settings.clone())
    }

    async fn commit_sync_settings(&self, settings: &SyncSettings) -> Result<(), ControlError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(ControlCall::CommitSyncSettings);
        if let Some(error) = inner.fail_next_commit.take() {
            return Err(error);
        }
        inner.settings = settings.clone();
        inner.commits.push(settings.clone());
        Ok(())
    }
}
