//! Folding a controller's reported identity into local configuration.
//!
//! Precedence: the controller is authoritative for its own name, pixel count
//! and color mode. Nothing else in [`DeviceConfig`] is touched. A blank name
//! or zero pixel count is treated as "not reported" and leaves the local
//! value in place.

use wled_link_types::{DeviceConfig, RemoteIdentity};

/// Fields changed by [`reconcile_identity`], as `(old, new)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityChanges {
    /// Name change.
    pub name: Option<(String, String)>,
    /// Pixel count change.
    pub pixel_count: Option<(u32, u32)>,
    /// White channel flag change.
    pub rgbw: Option<(bool, bool)>,
}

impl IdentityChanges {
    /// True if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.pixel_count.is_none() && self.rgbw.is_none()
    }

    /// True if the strip geometry (pixel count or channel layout) changed.
    pub fn geometry_changed(&self) -> bool {
        self.pixel_count.is_some() || self.rgbw.is_some()
    }
}

/// Overwrite name, pixel count and color mode with the controller's values.
///
/// Idempotent: applying the same identity twice reports no changes the
/// second time.
pub fn reconcile_identity(config: &mut DeviceConfig, identity: &RemoteIdentity) -> IdentityChanges {
    let mut changes = IdentityChanges::default();

    let name = identity.name.trim();
    if !name.is_empty() && config.name != name {
        let previous = std::mem::replace(&mut config.name, name.to_string());
        changes.name = Some((previous, name.to_string()));
    }

    if identity.pixel_count > 0 && config.pixel_count != identity.pixel_count {
        changes.pixel_count = Some((config.pixel_count, identity.pixel_count));
        config.pixel_count = identity.pixel_count;
    }

    if config.rgbw_led != identity.rgbw {
        changes.rgbw = Some((config.rgbw_led, identity.rgbw));
        config.rgbw_led = identity.rgbw;
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use wled_link_types::SyncMode;

    fn identity(name: &str, pixel_count: u32, rgbw: bool) -> RemoteIdentity {
        RemoteIdentity {
            name: name.to_string(),
            pixel_count,
            rgbw,
            firmware_version: "0.13.0".to_string(),
        }
    }

    #[test]
    fn remote_values_win() {
        let mut config = DeviceConfig::new("local", "10.0.0.5", 30);
        let changes = reconcile_identity(&mut config, &identity("Kitchen", 144, true));

        assert_eq!(config.name, "Kitchen");
        assert_eq!(config.pixel_count, 144);
        assert!(config.rgbw_led);
        assert_eq!(changes.name, Some(("local".into(), "Kitchen".into())));
        assert_eq!(changes.pixel_count, Some((30, 144)));
        assert_eq!(changes.rgbw, Some((false, true)));
        assert!(changes.geometry_changed());
    }

    #[test]
    fn second_merge_is_a_no_op() {
        let mut config = DeviceConfig::new("local", "10.0.0.5", 30);
        let remote = identity("Kitchen", 144, false);

        reconcile_identity(&mut config, &remote);
        let after_first = config.clone();
        let changes = reconcile_identity(&mut config, &remote);

        assert!(changes.is_empty());
        assert_eq!(config, after_first);
    }

    #[test]
    fn other_fields_untouched() {
        let mut config = DeviceConfig::new("local", "10.0.0.5", 30)
            .with_sync_mode(SyncMode::E131)
            .with_timeout(4);
        reconcile_identity(&mut config, &identity("Kitchen", 144, false));

        assert_eq!(config.ip_address, "10.0.0.5");
        assert_eq!(config.sync_mode, SyncMode::E131);
        assert_eq!(config.timeout, 4);
    }

    #[test]
    fn unreported_fields_keep_local_values() {
        let mut config = DeviceConfig::new("local", "10.0.0.5", 30);
        let changes = reconcile_identity(&mut config, &identity("  ", 0, false));

        assert_eq!(config.name, "local");
        assert_eq!(config.pixel_count, 30);
        assert!(changes.is_empty());
    }
}
