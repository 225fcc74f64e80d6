//! # link-core
//!
//! Pure logic for wled-link (no I/O, instant tests).
//!
//! This crate implements the decisions behind device configuration and
//! capability negotiation without any network I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects:
//! - [`template`]: per-mode default settings and the clone-then-overlay merge
//!   that produces a backend's configuration
//! - [`reconcile`]: folding a controller's reported identity into local config
//! - [`gate`]: the firmware version gate and the features it unlocks
//!
//! The actual I/O (sockets, HTTP) is performed by `link-client`, which
//! interprets the results produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod gate;
pub mod reconcile;
pub mod template;

pub use gate::{
    apply_features, GateDecision, GatedFeature, NegotiatorConfig, MIN_SYNC_API_VERSION,
};
pub use reconcile::{reconcile_identity, IdentityChanges};
pub use template::{
    merge_config, template_for, udp_data_prefix, BackendConfig, DdpSettings, E131Settings,
    ModeSettings, UdpSettings,
};
