//! Query a controller without changing it.

use anyhow::{Context, Result};
use std::net::IpAddr;
use wled_link_client::{ControlChannel, ControlConnector, WledDevice};
use wled_link_core::{
    apply_features, reconcile_identity, GateDecision, GatedFeature, IdentityChanges,
};
use wled_link_types::RemoteIdentity;

use crate::config::AppConfig;

/// What a probe found.
#[derive(Debug)]
pub struct ProbeReport {
    /// Resolved controller address.
    pub destination: IpAddr,
    /// Identity reported by the controller.
    pub identity: RemoteIdentity,
    /// Local config fields negotiation would overwrite.
    pub changes: IdentityChanges,
    /// Firmware gate outcome.
    pub gate: GateDecision,
    /// Features negotiation would write.
    pub would_apply: Vec<GatedFeature>,
    /// Controller's current realtime timeout, in tenths of a second.
    pub live_timeout: Option<u64>,
}

/// Run the probe command.
pub async fn run<C: ControlConnector>(config: &AppConfig, connector: &C) -> Result<()> {
    let report = probe(config, connector).await?;

    println!("=== wled-link probe ===");
    println!();
    println!("Controller:");
    println!("  Address:  {}", report.destination);
    println!("  Name:     {}", report.identity.name);
    println!("  Firmware: {}", report.identity.firmware_version);
    println!(
        "  Pixels:   {}{}",
        report.identity.pixel_count,
        if report.identity.rgbw { " (RGBW)" } else { "" }
    );
    if let Some(timeout) = report.live_timeout {
        println!("  Realtime timeout: {:.1}s", timeout as f64 / 10.0);
    }
    println!();

    match &report.gate {
        GateDecision::Supported(_) if report.would_apply.is_empty() => {
            println!("Sync settings: supported, no features configured");
        }
        GateDecision::Supported(_) => {
            println!("Sync settings: supported, would apply {:?}", report.would_apply);
        }
        GateDecision::BelowMinimum(version) => {
            println!(
                "Sync settings: firmware {} is older than {}, none applied",
                version, config.negotiation.min_version
            );
        }
        GateDecision::Unparseable(e) => {
            println!("Sync settings: {}, none applied", e);
        }
    }

    if report.changes.is_empty() {
        println!("Local config matches the controller.");
    } else {
        println!("Negotiation would update local config: {:?}", report.changes);
    }

    Ok(())
}

/// Resolve the controller and read its identity and sync settings.
pub async fn probe<C: ControlConnector>(config: &AppConfig, connector: &C) -> Result<ProbeReport> {
    let mut device =
        WledDevice::new(config.device.clone()).context("Invalid device configuration")?;
    let destination = device
        .resolve_destination()
        .await
        .context("Failed to resolve controller address")?;

    let channel = connector
        .open(destination)
        .context("Failed to open control channel")?;
    let identity = channel
        .fetch_device_config()
        .await
        .context("Failed to fetch controller info")?;
    let settings = channel
        .fetch_sync_settings()
        .await
        .context("Failed to fetch sync settings")?;

    let gate = GateDecision::evaluate(&identity.firmware_version, &config.negotiation.min_version);
    let would_apply = if gate.allows_gated_features() {
        apply_features(
            &mut settings.clone(),
            &config.negotiation.features,
            config.device.timeout,
        )
    } else {
        Vec::new()
    };

    let changes = reconcile_identity(&mut config.device.clone(), &identity);

    Ok(ProbeReport {
        destination,
        changes,
        gate,
        would_apply,
        live_timeout: settings.get("/if/live/timeout").and_then(|v| v.as_u64()),
        identity,
    })
}
