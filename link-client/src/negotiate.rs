//! Capability negotiation with the controller.
//!
//! Runs once per initialization, after the address is resolved:
//!
//! 1. open a control channel to the resolved address
//! 2. fetch the controller's identity
//! 3. fetch its sync settings
//! 4. fold the identity into the device config and rebuild the backend
//! 5. gate on firmware version; apply the configured features if supported
//! 6. commit the sync settings back
//!
//! Any control channel failure aborts negotiation. A malformed firmware
//! version does not; it is logged and treated as unsupported.

use wled_link_core::{apply_features, GateDecision, GatedFeature, IdentityChanges, NegotiatorConfig};
use wled_link_types::RemoteIdentity;

use crate::control::{ControlChannel, ControlConnector};
use crate::device::{DeviceError, WledDevice};

/// What negotiation found and changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationReport {
    /// Identity reported by the controller.
    pub identity: RemoteIdentity,
    /// Configuration fields the identity changed.
    pub changes: IdentityChanges,
    /// Firmware version gate outcome.
    pub gate: GateDecision,
    /// Features written to the controller's sync settings.
    pub applied_features: Vec<GatedFeature>,
}

/// Negotiates capabilities with a controller.
#[derive(Debug, Clone, Default)]
pub struct CapabilityNegotiator {
    config: NegotiatorConfig,
}

impl CapabilityNegotiator {
    /// Create a negotiator.
    pub fn new(config: NegotiatorConfig) -> Self {
        Self { config }
    }

    /// Negotiation settings.
    pub fn config(&self) -> &NegotiatorConfig {
        &self.config
    }

    /// Negotiate with the controller behind `device`'s resolved address.
    ///
    /// The device's configuration is updated and its backend rebuilt before
    /// this returns, so no frame can be flushed with stale geometry.
    pub async fn negotiate<C: ControlConnector>(
        &self,
        device: &mut WledDevice,
        connector: &C,
    ) -> Result<NegotiationReport, DeviceError> {
        let destination = device.destination().ok_or(DeviceError::Unresolved)?;
        let channel = connector.open(destination)?;

        let identity = channel.fetch_device_config().await?;
        let mut settings = channel.fetch_sync_settings().await?;

        let changes = device.apply_remote_identity(&identity)?;

        let name = &device.config().name;
        let gate = GateDecision::evaluate(&identity.firmware_version, &self.config.min_version);
        let applied_features = match &gate {
            GateDecision::Supported(version) => {
                let applied =
                    apply_features(&mut settings, &self.config.features, device.config().timeout);
                tracing::info!(
                    "{} firmware {} supports sync settings, applied {:?}",
                    name,
                    version,
                    applied
                );
                applied
            }
            GateDecision::BelowMinimum(version) => {
                tracing::debug!(
                    "{} firmware {} is below {}, skipping sync settings",
                    name,
                    version,
                    self.config.min_version
                );
                Vec::new()
            }
            GateDecision::Unparseable(e) => {
                tracing::warn!("{}: {}, skipping sync settings", name, e);
                Vec::new()
            }
        };

        channel.commit_sync_settings(&settings).await?;

        Ok(NegotiationReport {
            identity,
            changes,
            gate,
            applied_features,
        })
    }
}
