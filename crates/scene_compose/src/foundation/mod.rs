//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and transform composition
//! - Typed handles over slot maps
//! - Logging setup

pub mod math;
pub mod collections;
pub mod logging;
