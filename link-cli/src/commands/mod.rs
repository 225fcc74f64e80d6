//! CLI command implementations.

pub mod modes;
pub mod probe;
pub mod stream;
