//! WledDevice - the device adapter.
//!
//! A [`WledDevice`] owns one device configuration and at most one live
//! transport backend. The backend is chosen by the configured sync mode and
//! rebuilt whenever the mode changes; the old backend is always deactivated
//! before the new one is constructed.
//!
//! # Lifecycle
//!
//! ```text
//! new() → initialize() → activate() → flush()* → deactivate()
//!             ↓               ↑
//!         negotiate      configure() (mode change → rebuild)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use wled_link_client::{CapabilityNegotiator, HttpConnector, WledDevice};
//! use wled_link_types::DeviceConfig;
//!
//! let mut device = WledDevice::new(DeviceConfig::new("strip1", "10.0.0.5", 300))?;
//! device.initialize(&HttpConnector::default(), &CapabilityNegotiator::default()).await?;
//! device.activate()?;
//! device.flush(&frame)?;
//! ```

use std::net::IpAddr;
use thiserror::Error;
use wled_link_core::{reconcile_identity, BackendConfig, IdentityChanges};
use wled_link_types::{ConfigError, DeviceConfig, RemoteIdentity, Rgb, SyncMode};

use crate::control::{ControlConnector, ControlError};
use crate::negotiate::{CapabilityNegotiator, NegotiationReport};
use crate::registry::SyncModeRegistry;
use crate::transport::{Backend, TransportError};

/// Device adapter errors.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Invalid configuration or unknown sync mode.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Flush called before activate.
    #[error("device not activated")]
    NotActivated,

    /// Capability negotiation failed.
    #[error("negotiation failed: {0}")]
    Negotiation(#[from] ControlError),

    /// Address could not be resolved.
    #[error("could not resolve {address}: {reason}")]
    Resolve {
        /// Configured hostname or address.
        address: String,
        /// Resolver error.
        reason: String,
    },

    /// Negotiation attempted before the address was resolved.
    #[error("address not resolved")]
    Unresolved,
}

/// The live backend and the mode it was built for.
struct Subdevice {
    mode: SyncMode,
    backend: Box<dyn Backend>,
}

/// Adapter for one WLED controller.
pub struct WledDevice {
    config: DeviceConfig,
    registry: SyncModeRegistry,
    destination: Option<IpAddr>,
    subdevice: Option<Subdevice>,
    active: bool,
    ready: bool,
}

impl WledDevice {
    /// Create an adapter using the standard backends.
    ///
    /// No backend is built until the first activation.
    pub fn new(config: DeviceConfig) -> Result<Self, DeviceError> {
        Self::with_registry(config, SyncModeRegistry::standard())
    }

    /// Create an adapter with a custom registry.
    pub fn with_registry(
        config: DeviceConfig,
        registry: SyncModeRegistry,
    ) -> Result<Self, DeviceError> {
        config.validate()?;
        registry.lookup(config.sync_mode)?.merge(&config)?;
        Ok(Self {
            destination: config.ip_address.parse().ok(),
            config,
            registry,
            subdevice: None,
            active: false,
            ready: false,
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Resolved controller address.
    pub fn destination(&self) -> Option<IpAddr> {
        self.destination
    }

    /// Mode of the live backend, if one exists.
    pub fn current_mode(&self) -> Option<SyncMode> {
        self.subdevice.as_ref().map(|s| s.mode)
    }

    /// Whether the adapter is active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether negotiation has completed successfully.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Merged configuration of the live backend.
    pub fn backend_config(&self) -> Option<&BackendConfig> {
        self.subdevice.as_ref().map(|s| s.backend.config())
    }

    /// Replace the configuration.
    ///
    /// The backend is rebuilt if none is held or if the sync mode differs
    /// from the live backend's mode. A rebuilt backend is only activated when
    /// the adapter is active. A changed address updates the destination; a
    /// hostname must be resolved again with
    /// [`resolve_destination`](Self::resolve_destination).
    pub fn configure(&mut self, config: DeviceConfig) -> Result<(), DeviceError> {
        config.validate()?;
        self.registry.lookup(config.sync_mode)?.merge(&config)?;

        let address_changed = config.ip_address != self.config.ip_address;
        self.config = config;

        if address_changed {
            self.set_destination(self.config.ip_address.parse().ok());
        }

        match self.current_mode() {
            Some(mode) if mode == self.config.sync_mode => Ok(()),
            Some(mode) => {
                tracing::info!(
                    "{}: sync mode {} -> {}",
                    self.config.name,
                    mode,
                    self.config.sync_mode
                );
                self.setup_subdevice()
            }
            None => self.setup_subdevice(),
        }
    }

    /// Activate the backend, building it first if needed.
    ///
    /// Calling this while active is a no-op.
    pub fn activate(&mut self) -> Result<(), DeviceError> {
        if self.subdevice.is_none() {
            self.setup_subdevice()?;
        }
        if let Some(subdevice) = self.subdevice.as_mut() {
            subdevice.backend.activate()?;
        }
        self.active = true;
        tracing::debug!("{} activated ({})", self.config.name, self.config.sync_mode);
        Ok(())
    }

    /// Deactivate the backend, if one exists.
    pub fn deactivate(&mut self) {
        if let Some(subdevice) = self.subdevice.as_mut() {
            subdevice.backend.deactivate();
        }
        self.active = false;
    }

    /// Send one frame of pixels.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NotActivated`] unless a backend exists and the
    /// adapter is active.
    pub fn flush(&mut self, frame: &[Rgb]) -> Result<(), DeviceError> {
        if !self.active {
            return Err(DeviceError::NotActivated);
        }
        let subdevice = self.subdevice.as_mut().ok_or(DeviceError::NotActivated)?;
        subdevice.backend.flush(frame)?;
        Ok(())
    }

    /// Resolve the configured address and hand it to the backend.
    pub async fn resolve_destination(&mut self) -> Result<IpAddr, DeviceError> {
        let address = self.config.ip_address.trim();
        let ip = match address.parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(_) => {
                let mut addrs = tokio::net::lookup_host((address, 0))
                    .await
                    .map_err(|e| DeviceError::Resolve {
                        address: address.to_string(),
                        reason: e.to_string(),
                    })?;
                addrs
                    .next()
                    .map(|addr| addr.ip())
                    .ok_or_else(|| DeviceError::Resolve {
                        address: address.to_string(),
                        reason: "no addresses returned".to_string(),
                    })?
            }
        };
        tracing::debug!("{} resolved to {}", self.config.name, ip);
        self.set_destination(Some(ip));
        Ok(ip)
    }

    /// Fold the controller's identity into the configuration and rebuild.
    pub fn apply_remote_identity(
        &mut self,
        identity: &RemoteIdentity,
    ) -> Result<IdentityChanges, DeviceError> {
        let changes = reconcile_identity(&mut self.config, identity);
        if !changes.is_empty() {
            tracing::info!("{}: controller reported {:?}", self.config.name, changes);
        }
        self.setup_subdevice()?;
        Ok(changes)
    }

    /// Resolve the address and negotiate capabilities with the controller.
    ///
    /// The adapter becomes ready only if every step succeeds.
    pub async fn initialize<C: ControlConnector>(
        &mut self,
        connector: &C,
        negotiator: &CapabilityNegotiator,
    ) -> Result<NegotiationReport, DeviceError> {
        self.ready = false;
        self.resolve_destination().await?;
        let report = negotiator.negotiate(self, connector).await?;
        self.ready = true;
        tracing::info!(
            "{} ready ({}, {} pixels)",
            self.config.name,
            self.config.sync_mode,
            self.config.pixel_count
        );
        Ok(report)
    }

    fn set_destination(&mut self, destination: Option<IpAddr>) {
        self.destination = destination;
        if let Some(subdevice) = self.subdevice.as_mut() {
            subdevice.backend.set_destination(destination);
        }
    }

    /// Replace the backend with one built for the configured mode.
    ///
    /// The old backend is deactivated and dropped before the new one is
    /// constructed. If the adapter was active, the new backend is activated.
    fn setup_subdevice(&mut self) -> Result<(), DeviceError> {
        let mode = self.config.sync_mode;
        let entry = self.registry.lookup(mode)?;
        let merged = entry.merge(&self.config)?;

        if let Some(mut old) = self.subdevice.take() {
            old.backend.deactivate();
        }

        let mut backend = entry.construct(merged);
        backend.set_destination(self.destination);
        if self.active {
            if let Err(e) = backend.activate() {
                self.active = false;
                self.subdevice = Some(Subdevice { mode, backend });
                return Err(e.into());
            }
        }
        self.subdevice = Some(Subdevice { mode, backend });
        tracing::debug!("{}: built {} backend", self.config.name, mode);
        Ok(())
    }
}

impl std::fmt::Debug for WledDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WledDevice")
            .field("config", &self.config)
            .field("destination", &self.destination)
            .field("mode", &self.current_mode())
            .field("active", &self.active)
            .field("ready", &self.ready)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{BackendEvent, BackendLog, MockBackend};
    use wled_link_core::{E131Settings, ModeSettings, UdpSettings};
    use wled_link_types::ModeOverrides;

    fn mock_registry(log: &BackendLog) -> SyncModeRegistry {
        let mut registry = SyncModeRegistry::empty();
        for mode in SyncMode::ALL {
            registry = registry.with_factory(mode, MockBackend::factory(log));
        }
        registry
    }

    fn device(mode: SyncMode, log: &BackendLog) -> WledDevice {
        let config = DeviceConfig::new("strip1", "10.0.0.5", 300).with_sync_mode(mode);
        WledDevice::with_registry(config, mock_registry(log)).unwrap()
    }

    // ===========================================
    // Construction
    // ===========================================

    #[test]
    fn new_builds_nothing() {
        let log = BackendLog::new();
        let device = device(SyncMode::Udp, &log);

        assert!(log.events().is_empty());
        assert_eq!(device.current_mode(), None);
        assert!(!device.is_active());
        assert!(!device.is_ready());
        assert_eq!(device.destination(), Some("10.0.0.5".parse().unwrap()));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = DeviceConfig::new("strip1", "10.0.0.5", 300).with_timeout(11);
        assert!(matches!(
            WledDevice::new(config),
            Err(DeviceError::Config(ConfigError::TimeoutOutOfRange(11)))
        ));
    }

    #[test]
    fn new_rejects_unregistered_mode() {
        let config = DeviceConfig::new("strip1", "10.0.0.5", 300).with_sync_mode(SyncMode::Ddp);
        let registry = SyncModeRegistry::empty()
            .with_factory(SyncMode::Udp, MockBackend::factory(&BackendLog::new()));
        assert!(matches!(
            WledDevice::with_registry(config, registry),
            Err(DeviceError::Config(ConfigError::UnknownSyncMode(_)))
        ));
    }

    // ===========================================
    // Activation
    // ===========================================

    #[test]
    fn activate_builds_backend_of_configured_mode() {
        for mode in SyncMode::ALL {
            let log = BackendLog::new();
            let mut device = device(mode, &log);
            device.activate().unwrap();

            assert_eq!(device.current_mode(), Some(mode));
            assert_eq!(device.backend_config().unwrap().mode(), mode);
            assert_eq!(
                log.last(),
                Some(BackendEvent::Activated {
                    mode,
                    destination: Some("10.0.0.5".parse().unwrap())
                })
            );
        }
    }

    #[test]
    fn activate_twice_builds_once() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Ddp, &log);
        device.activate().unwrap();
        device.activate().unwrap();

        let constructed = log
            .events()
            .iter()
            .filter(|e| matches!(e, BackendEvent::Constructed { .. }))
            .count();
        assert_eq!(constructed, 1);
    }

    #[test]
    fn failed_activation_leaves_device_inactive() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        log.fail_next_activate("address in use");

        assert!(matches!(
            device.activate(),
            Err(DeviceError::Transport(TransportError::Bind(_)))
        ));
        assert!(!device.is_active());
    }

    #[test]
    fn flush_before_activate_fails() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        assert!(matches!(
            device.flush(&[[1, 2, 3]]),
            Err(DeviceError::NotActivated)
        ));
    }

    #[test]
    fn flush_after_deactivate_fails() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        device.activate().unwrap();
        device.flush(&[[1, 2, 3]]).unwrap();
        device.deactivate();

        assert!(matches!(
            device.flush(&[[1, 2, 3]]),
            Err(DeviceError::NotActivated)
        ));
        assert_eq!(
            log.last(),
            Some(BackendEvent::Deactivated {
                mode: SyncMode::Udp
            })
        );
    }

    #[test]
    fn deactivate_without_backend_is_safe() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        device.deactivate();
        device.deactivate();
        assert!(log.events().is_empty());
    }

    // ===========================================
    // Mode Switching
    // ===========================================

    #[test]
    fn mode_switch_deactivates_before_constructing() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        device.activate().unwrap();
        log.clear();

        let config = device.config().clone().with_sync_mode(SyncMode::Ddp);
        device.configure(config).unwrap();

        assert_eq!(
            log.events(),
            vec![
                BackendEvent::Deactivated {
                    mode: SyncMode::Udp
                },
                BackendEvent::Constructed {
                    mode: SyncMode::Ddp,
                    pixel_count: 300
                },
                BackendEvent::Activated {
                    mode: SyncMode::Ddp,
                    destination: Some("10.0.0.5".parse().unwrap())
                },
            ]
        );
    }

    #[test]
    fn unrelated_change_does_not_rebuild() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        device.activate().unwrap();
        log.clear();

        let config = device.config().clone().with_timeout(5);
        device.configure(config).unwrap();

        assert!(log.events().is_empty());
        assert_eq!(device.config().timeout, 5);
    }

    #[test]
    fn configure_without_backend_builds_inactive() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        let config = device.config().clone().with_sync_mode(SyncMode::E131);
        device.configure(config).unwrap();

        assert_eq!(
            log.events(),
            vec![BackendEvent::Constructed {
                mode: SyncMode::E131,
                pixel_count: 300
            }]
        );
        assert_eq!(device.current_mode(), Some(SyncMode::E131));
        assert!(!device.is_active());

        device.activate().unwrap();
        assert_eq!(
            log.events()
                .iter()
                .filter(|e| matches!(e, BackendEvent::Constructed { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn configure_rejects_offset_past_universe_size() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        let config = device
            .config()
            .clone()
            .with_sync_mode(SyncMode::E131)
            .with_overrides(ModeOverrides {
                universe_size: Some(100),
                channel_offset: Some(100),
                ..Default::default()
            });

        assert!(matches!(
            device.configure(config),
            Err(DeviceError::Config(ConfigError::ChannelOffsetOutOfRange { .. }))
        ));
        assert_eq!(device.config().sync_mode, SyncMode::Udp);
        assert!(log.events().is_empty());
    }

    #[test]
    fn rebuild_while_inactive_stays_inactive() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        device.activate().unwrap();
        device.deactivate();
        log.clear();

        let config = device.config().clone().with_sync_mode(SyncMode::Ddp);
        device.configure(config).unwrap();

        assert!(!device.is_active());
        assert!(!log
            .events()
            .iter()
            .any(|e| matches!(e, BackendEvent::Activated { .. })));
    }

    #[test]
    fn invalid_configure_keeps_old_config() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        let bad = device.config().clone().with_timeout(42);

        assert!(device.configure(bad).is_err());
        assert_eq!(device.config().timeout, 1);
    }

    #[test]
    fn address_change_updates_destination_without_rebuild() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        device.activate().unwrap();
        log.clear();

        let mut config = device.config().clone();
        config.ip_address = "10.0.0.6".into();
        device.configure(config).unwrap();
        assert_eq!(device.destination(), Some("10.0.0.6".parse().unwrap()));
        assert!(log.events().is_empty());

        let mut config = device.config().clone();
        config.ip_address = "wled-strip.local".into();
        device.configure(config).unwrap();
        assert_eq!(device.destination(), None);
    }

    #[test]
    fn rebuild_preserves_mode_agnostic_fields() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        device.activate().unwrap();

        for mode in [SyncMode::Ddp, SyncMode::E131, SyncMode::Udp] {
            let config = device.config().clone().with_sync_mode(mode);
            device.configure(config).unwrap();

            let merged = device.backend_config().unwrap();
            assert_eq!(merged.name, "strip1");
            assert_eq!(merged.ip_address, "10.0.0.5");
            assert_eq!(merged.pixel_count, 300);
            assert_eq!(merged.mode(), mode);
        }
    }

    #[test]
    fn udp_prefix_tracks_timeout_on_rebuild() {
        for timeout in [0u8, 10] {
            let log = BackendLog::new();
            let config = DeviceConfig::new("strip1", "10.0.0.5", 300)
                .with_sync_mode(SyncMode::Ddp)
                .with_timeout(timeout);
            let mut device = WledDevice::with_registry(config, mock_registry(&log)).unwrap();
            device.activate().unwrap();

            let config = device.config().clone().with_sync_mode(SyncMode::Udp);
            device.configure(config).unwrap();

            assert_eq!(
                device.backend_config().unwrap().settings,
                ModeSettings::Udp(UdpSettings {
                    data_prefix: Some(vec![0x02, timeout]),
                    ..Default::default()
                })
            );
        }
    }

    #[test]
    fn udp_to_e131_end_to_end() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        device.activate().unwrap();
        device.flush(&vec![[255, 0, 0]; 300]).unwrap();

        let config = device.config().clone().with_sync_mode(SyncMode::E131);
        device.configure(config).unwrap();
        device.flush(&vec![[0, 0, 255]; 300]).unwrap();

        assert_eq!(
            device.backend_config().unwrap().settings,
            ModeSettings::E131(E131Settings {
                port: 5568,
                universe: 1,
                universe_size: 510,
                channel_offset: 0,
            })
        );
        let destination = Some("10.0.0.5".parse().unwrap());
        assert_eq!(
            log.events(),
            vec![
                BackendEvent::Constructed {
                    mode: SyncMode::Udp,
                    pixel_count: 300
                },
                BackendEvent::Activated {
                    mode: SyncMode::Udp,
                    destination
                },
                BackendEvent::Flushed {
                    mode: SyncMode::Udp,
                    pixels: 300
                },
                BackendEvent::Deactivated {
                    mode: SyncMode::Udp
                },
                BackendEvent::Constructed {
                    mode: SyncMode::E131,
                    pixel_count: 300
                },
                BackendEvent::Activated {
                    mode: SyncMode::E131,
                    destination
                },
                BackendEvent::Flushed {
                    mode: SyncMode::E131,
                    pixels: 300
                },
            ]
        );
    }

    // ===========================================
    // Remote Identity
    // ===========================================

    #[test]
    fn remote_identity_rebuilds_with_remote_geometry() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Ddp, &log);
        let identity = RemoteIdentity {
            name: "Kitchen".into(),
            pixel_count: 144,
            rgbw: true,
            firmware_version: "0.14.0".into(),
        };

        let changes = device.apply_remote_identity(&identity).unwrap();
        assert!(changes.geometry_changed());
        assert_eq!(device.backend_config().unwrap().pixel_count, 144);
        assert_eq!(device.backend_config().unwrap().name, "Kitchen");

        let again = device.apply_remote_identity(&identity).unwrap();
        assert!(again.is_empty());
        assert_eq!(device.config().pixel_count, 144);
    }

    // ===========================================
    // Resolution
    // ===========================================

    #[tokio::test]
    async fn literal_address_resolves_without_lookup() {
        let log = BackendLog::new();
        let mut device = device(SyncMode::Udp, &log);
        let ip = device.resolve_destination().await.unwrap();
        assert_eq!(ip, "10.0.0.5".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn hostname_resolves_and_reaches_backend() {
        let log = BackendLog::new();
        let config = DeviceConfig::new("strip1", "localhost", 10);
        let mut device = WledDevice::with_registry(config, mock_registry(&log)).unwrap();
        assert_eq!(device.destination(), None);

        let ip = device.resolve_destination().await.unwrap();
        assert!(ip.is_loopback());

        device.activate().unwrap();
        assert_eq!(
            log.last(),
            Some(BackendEvent::Activated {
                mode: SyncMode::Udp,
                destination: Some(ip)
            })
        );
    }
}
