//! # Compose Configuration
//!
//! Settings shared by tools that load and instantiate entity descriptors:
//! logging, where resources live, default template substitutions and the
//! placement used when a caller does not supply one.
//!
//! Files may be TOML or RON (see [`Config`]). Every field has a default, so
//! a config file only needs to name what it changes:
//!
//! ```toml
//! log_level = "debug"
//! resource_root = "game"
//!
//! [placement]
//! position = [0.0, 0.0, 5.0]
//!
//! [substitutions]
//! NAME = "PirateShip"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::foundation::math::{normalize_rotation, Transform, Vec3, MIN_ROTATION_NORM};
use crate::template::Substitutions;

/// # Placement Configuration
///
/// Entity placement within its containing scene, in plain arrays so it reads
/// naturally in config files. Rotation is `[x, y, z, w]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Position of the entity origin
    pub position: [f32; 3],
    /// Rotation quaternion as `[x, y, z, w]`
    pub rotation: [f32; 4],
    /// Scale factors
    pub scale: [f32; 3],
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

impl PlacementConfig {
    /// Convert to a transform, normalizing the rotation
    pub fn to_transform(&self, min_norm: f32) -> Result<Transform, ConfigError> {
        let [x, y, z, w] = self.rotation;
        let rotation = normalize_rotation(x, y, z, w, min_norm).ok_or_else(|| {
            ConfigError::Invalid(format!("placement rotation {:?} cannot be normalized", self.rotation))
        })?;

        Ok(Transform::new(Vec3::from(self.position), rotation, Vec3::from(self.scale)))
    }
}

/// # Complete Compose Configuration
///
/// Top-level configuration for loading and instantiating descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Directory that resource locators such as `/scripts/boat.script` resolve against
    pub resource_root: PathBuf,
    /// Quaternions with a smaller norm are rejected as rotations
    pub rotation_epsilon: f32,
    /// Placement applied to instantiated entities
    pub placement: PlacementConfig,
    /// Default template substitutions, overridden per invocation
    pub substitutions: BTreeMap<String, String>,
}

impl ComposeConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            resource_root: PathBuf::from("."),
            rotation_epsilon: MIN_ROTATION_NORM,
            placement: PlacementConfig::default(),
            substitutions: BTreeMap::new(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the resource root directory
    pub fn with_resource_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.resource_root = root.into();
        self
    }

    /// Set the entity placement
    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    /// Add a default substitution
    pub fn with_substitution(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.substitutions.insert(token.into(), value.into());
        self
    }

    /// Merge the configured defaults under `overrides`.
    ///
    /// Entries in `overrides` win over configured defaults.
    pub fn merged_substitutions(&self, overrides: &Substitutions) -> Substitutions {
        let mut merged: Substitutions = self
            .substitutions
            .iter()
            .map(|(token, value)| (token.clone(), value.clone()))
            .collect();
        merged.extend(overrides.iter().map(|(token, value)| (token.clone(), value.clone())));
        merged
    }

    /// Placement as a transform
    pub fn placement_transform(&self) -> Result<Transform, ConfigError> {
        self.placement.to_transform(self.rotation_epsilon)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log level cannot be empty".to_string()));
        }

        if !(self.rotation_epsilon.is_finite() && self.rotation_epsilon > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "rotation epsilon must be positive, got {}",
                self.rotation_epsilon
            )));
        }

        if self.substitutions.keys().any(String::is_empty) {
            return Err(ConfigError::Invalid("substitution tokens cannot be empty".to_string()));
        }

        self.placement_transform()?;
        Ok(())
    }
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for ComposeConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_are_valid() {
        let config = ComposeConfig::default();

        assert!(config.validate().is_ok());
        assert!(config.placement_transform().unwrap().is_identity());
    }

    #[test]
    fn test_zero_rotation_is_rejected() {
        let config = ComposeConfig::default().with_placement(PlacementConfig {
            rotation: [0.0, 0.0, 0.0, 0.0],
            ..PlacementConfig::default()
        });

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_overrides_win_when_merging() {
        let config = ComposeConfig::default()
            .with_substitution("NAME", "Default")
            .with_substitution("TEAM", "red");
        let overrides: Substitutions = [("NAME".to_string(), "PirateShip".to_string())].into_iter().collect();

        let merged = config.merged_substitutions(&overrides);

        assert_eq!(merged["NAME"], "PirateShip");
        assert_eq!(merged["TEAM"], "red");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ComposeConfig = toml::from_str(
            r#"
            log_level = "debug"

            [placement]
            position = [0.0, 0.0, 5.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.resource_root, PathBuf::from("."));
        let placement = config.placement_transform().unwrap();
        assert_relative_eq!(placement.position, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(placement.scale, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_save_and_load_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let config = ComposeConfig::new()
            .with_log_level("warn")
            .with_resource_root("assets")
            .with_substitution("NAME", "Boat1");

        for name in ["compose.toml", "compose.ron"] {
            let path = dir.path().join(name);
            config.save_to_file(&path).unwrap();
            let loaded = ComposeConfig::load_from_file(&path).unwrap();
            assert_eq!(loaded, config, "{name}");
        }
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compose.json");

        let result = ComposeConfig::default().save_to_file(&path);

        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
