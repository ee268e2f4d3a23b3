//! # Core Module
//!
//! Shared configuration and re-exports of the foundation layers the other
//! modules build on.
//!
//! ## Organization
//!
//! - **Config**: [`ComposeConfig`] and its placement section
//! - **Foundation**: math, handles and logging

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;
pub use crate::assets;

// Re-export commonly used config types
pub use config::{ComposeConfig, PlacementConfig};
pub use crate::config::{Config, ConfigError};
