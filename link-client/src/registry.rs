//! Sync mode registry.
//!
//! Maps each [`SyncMode`] to the backend constructor and settings template
//! used to build it. Lookups never fall back to another mode.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use wled_link_core::{merge_config, template_for, BackendConfig, ModeSettings};
use wled_link_types::{ConfigError, DeviceConfig, SyncMode};

use crate::transport::{Backend, BackendFactory, DdpBackend, E131Backend, UdpBackend};

/// Constructor and template for one sync mode.
#[derive(Clone)]
pub struct RegistryEntry {
    template: ModeSettings,
    factory: BackendFactory,
}

impl RegistryEntry {
    /// The mode's default settings.
    pub fn template(&self) -> &ModeSettings {
        &self.template
    }

    /// Merge the template with `config`.
    pub fn merge(&self, config: &DeviceConfig) -> Result<BackendConfig, ConfigError> {
        merge_config(&self.template, config)
    }

    /// Construct an inactive backend from a merged configuration.
    pub fn construct(&self, config: BackendConfig) -> Box<dyn Backend> {
        (self.factory)(config)
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

/// Lookup from sync mode to backend constructor and template.
#[derive(Clone, Default)]
pub struct SyncModeRegistry {
    entries: BTreeMap<SyncMode, RegistryEntry>,
}

impl SyncModeRegistry {
    /// A registry with no modes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with the UDP, DDP and E1.31 backends.
    pub fn standard() -> Self {
        Self::empty()
            .with_factory(
                SyncMode::Udp,
                Arc::new(|config| Box::new(UdpBackend::new(config))),
            )
            .with_factory(
                SyncMode::Ddp,
                Arc::new(|config| Box::new(DdpBackend::new(config))),
            )
            .with_factory(
                SyncMode::E131,
                Arc::new(|config| Box::new(E131Backend::new(config))),
            )
    }

    /// Register (or replace) the constructor for `mode`.
    ///
    /// The template is always the mode's standard defaults.
    pub fn with_factory(mut self, mode: SyncMode, factory: BackendFactory) -> Self {
        self.entries.insert(
            mode,
            RegistryEntry {
                template: template_for(mode),
                factory,
            },
        );
        self
    }

    /// Look up the entry for `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSyncMode`] if `mode` is not registered.
    pub fn lookup(&self, mode: SyncMode) -> Result<&RegistryEntry, ConfigError> {
        self.entries
            .get(&mode)
            .ok_or_else(|| ConfigError::UnknownSyncMode(mode.to_string()))
    }

    /// Registered modes, in order.
    pub fn modes(&self) -> Vec<SyncMode> {
        self.entries.keys().copied().collect()
    }
}

impl fmt::Debug for SyncModeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncModeRegistry")
            .field("modes", &self.modes())
            .finish()
    }
}
