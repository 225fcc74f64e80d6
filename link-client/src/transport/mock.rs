//! Mock backend for testing.
//!
//! Every construction, activation, deactivation and flush is appended to a
//! shared [`BackendLog`], so tests can check the order of side effects
//! across backend swaps.

use super::{Backend, BackendFactory, TransportError};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use wled_link_core::BackendConfig;
use wled_link_types::{Rgb, SyncMode};

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// A backend was constructed.
    Constructed {
        /// Mode of the new backend.
        mode: SyncMode,
        /// Pixel count it was built with.
        pixel_count: u32,
    },
    /// A backend was activated.
    Activated {
        /// Mode of the backend.
        mode: SyncMode,
        /// Destination at activation time.
        destination: Option<IpAddr>,
    },
    /// A backend was deactivated.
    Deactivated {
        /// Mode of the backend.
        mode: SyncMode,
    },
    /// A frame was flushed.
    Flushed {
        /// Mode of the backend.
        mode: SyncMode,
        /// Number of pixels in the frame.
        pixels: usize,
    },
}

/// Event log shared by every mock backend built from the same factories.
#[derive(Debug, Default, Clone)]
pub struct BackendLog {
    inner: Arc<Mutex<BackendLogInner>>,
}

#[derive(Debug, Default)]
struct BackendLogInner {
    events: Vec<BackendEvent>,
    fail_next_activate: Option<String>,
}

impl BackendLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events so far.
    pub fn events(&self) -> Vec<BackendEvent> {
        self.inner.lock().unwrap().events.clone()
    }

    /// The most recent event.
    pub fn last(&self) -> Option<BackendEvent> {
        self.inner.lock().unwrap().events.last().cloned()
    }

    /// Cause the next activate() on any mock backend to fail.
    pub fn fail_next_activate(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_activate = Some(error.to_string());
    }

    /// Forget all events.
    pub fn clear(&self) {
        self.inner.lock().unwrap().events.clear();
    }

    fn record(&self, event: BackendEvent) {
        self.inner.lock().unwrap().events.push(event);
    }

    fn take_activate_failure(&self) -> Option<String> {
        self.inner.lock().unwrap().fail_next_activate.take()
    }
}

/// Mock backend.
#[derive(Debug)]
pub struct MockBackend {
    config: BackendConfig,
    log: BackendLog,
    active: bool,
    destination: Option<IpAddr>,
}

impl MockBackend {
    /// Create a mock backend, recording its construction.
    pub fn new(config: BackendConfig, log: BackendLog) -> Self {
        log.record(BackendEvent::Constructed {
            mode: config.mode(),
            pixel_count: config.pixel_count,
        });
        Self {
            config,
            log,
            active: false,
            destination: None,
        }
    }

    /// A factory producing mock backends that record into `log`.
    pub fn factory(log: &BackendLog) -> BackendFactory {
        let log = log.clone();
        Arc::new(move |config| Box::new(MockBackend::new(config, log.clone())))
    }
}

impl Backend for MockBackend {
    fn activate(&mut self) -> Result<(), TransportError> {
        if let Some(error) = self.log.take_activate_failure() {
            return Err(TransportError::Bind(std::io::Error::other(error)));
        }
        self.active = true;
        self.log.record(BackendEvent::Activated {
            mode: self.config.mode(),
            destination: self.destination,
        });
        Ok(())
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.log.record(BackendEvent::Deactivated {
            mode: self.config.mode(),
        });
    }

    fn flush(&mut self, frame: &[Rgb]) -> Result<(), TransportError> {
        if !self.active {
            return Err(TransportError::NotActive);
        }
        self.log.record(BackendEvent::Flushed {
            mode: self.config.mode(),
            pixels: frame.len(),
        });
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn destination(&self) -> Option<IpAddr> {
        self.destination
    }

    fn set_destination(&mut self, destination: Option<IpAddr>) {
        self.destination = destination;
    }

    fn config(&self) -> &BackendConfig {
        &self.config
    }
}
