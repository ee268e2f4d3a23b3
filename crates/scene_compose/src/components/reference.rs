//! Component references
//!
//! A reference names a reusable component defined elsewhere (usually a
//! script) by locator. It does not own the resource; the store does.

use std::collections::HashSet;

use super::InstanceContext;
use crate::assets::{ResourceHandle, ResourceStore};
use crate::error::ComponentError;
use crate::foundation::math::{normalize_rotation, Transform, Vec3, Vec4, MIN_ROTATION_NORM};
use crate::template;

/// Declared type of a property override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// Floating point number
    Number,
    /// Hashed string
    Hash,
    /// Message address
    Url,
    /// Three component vector
    Vector3,
    /// Four component vector
    Vector4,
    /// Rotation quaternion
    Quat,
    /// `true` or `false`
    Boolean,
}

impl PropertyType {
    /// Parse a `PROPERTY_TYPE_*` identifier
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "PROPERTY_TYPE_NUMBER" => Self::Number,
            "PROPERTY_TYPE_HASH" => Self::Hash,
            "PROPERTY_TYPE_URL" => Self::Url,
            "PROPERTY_TYPE_VECTOR3" => Self::Vector3,
            "PROPERTY_TYPE_VECTOR4" => Self::Vector4,
            "PROPERTY_TYPE_QUAT" => Self::Quat,
            "PROPERTY_TYPE_BOOLEAN" => Self::Boolean,
            _ => return None,
        })
    }

    /// `PROPERTY_TYPE_*` identifier as written in descriptors
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "PROPERTY_TYPE_NUMBER",
            Self::Hash => "PROPERTY_TYPE_HASH",
            Self::Url => "PROPERTY_TYPE_URL",
            Self::Vector3 => "PROPERTY_TYPE_VECTOR3",
            Self::Vector4 => "PROPERTY_TYPE_VECTOR4",
            Self::Quat => "PROPERTY_TYPE_QUAT",
            Self::Boolean => "PROPERTY_TYPE_BOOLEAN",
        }
    }

    /// Interpret a textual value. Vectors and quaternions are written as
    /// comma-separated components, e.g. `"1.0, 2.0, 3.0"`.
    pub fn parse_value(self, value: &str) -> Result<PropertyValue, String> {
        match self {
            Self::Number => parse_number(value).map(PropertyValue::Number),
            Self::Hash => {
                if value.is_empty() {
                    Err("hash value cannot be empty".to_string())
                } else {
                    Ok(PropertyValue::Hash(value.to_string()))
                }
            }
            Self::Url => Ok(PropertyValue::Url(value.to_string())),
            Self::Vector3 => {
                let [x, y, z] = parse_components::<3>(value)?;
                Ok(PropertyValue::Vector3(Vec3::new(x, y, z)))
            }
            Self::Vector4 => {
                let [x, y, z, w] = parse_components::<4>(value)?;
                Ok(PropertyValue::Vector4(Vec4::new(x, y, z, w)))
            }
            Self::Quat => {
                let [x, y, z, w] = parse_components::<4>(value)?;
                normalize_rotation(x, y, z, w, MIN_ROTATION_NORM)
                    .map(PropertyValue::Quat)
                    .ok_or_else(|| format!("quaternion '{value}' cannot be normalized"))
            }
            Self::Boolean => match value.trim() {
                "true" => Ok(PropertyValue::Boolean(true)),
                "false" => Ok(PropertyValue::Boolean(false)),
                other => Err(format!("invalid boolean '{other}'")),
            },
        }
    }
}

fn parse_number(text: &str) -> Result<f32, String> {
    match text.trim().parse::<f32>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(format!("invalid number '{}'", text.trim())),
    }
}

fn parse_components<const N: usize>(text: &str) -> Result<[f32; N], String> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated components, found {}", parts.len()));
    }

    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = parse_number(part)?;
    }
    Ok(out)
}

/// Typed value of a resolved property override
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Number value
    Number(f32),
    /// Hashed string
    Hash(String),
    /// Message address
    Url(String),
    /// Vector value
    Vector3(Vec3),
    /// Vector value
    Vector4(Vec4),
    /// Normalized rotation
    Quat(crate::foundation::math::Quat),
    /// Flag value
    Boolean(bool),
}

/// `properties { id value type }` entry on a component reference
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyOverride {
    /// Property name on the referenced component
    pub id: String,
    /// Textual value; may hold placeholders until instantiation
    pub value: String,
    /// Type the value is checked against
    pub property_type: PropertyType,
}

impl PropertyOverride {
    /// Create an override
    pub fn new(id: impl Into<String>, value: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            property_type,
        }
    }
}

/// Property after template substitution and type checking
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProperty {
    /// Property name
    pub id: String,
    /// Value after substitution
    pub value: PropertyValue,
}

/// Named pointer to an externally defined component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentReference {
    /// Identifier, unique among the entity's children
    pub id: String,
    /// Locator of the component resource
    pub component_path: String,
    /// Transform relative to the owning entity's origin
    pub local_transform: Transform,
    /// Property overrides in document order
    pub properties: Vec<PropertyOverride>,
}

impl ComponentReference {
    /// Create a reference with identity transform and no overrides
    pub fn new(id: impl Into<String>, component_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component_path: component_path.into(),
            local_transform: Transform::identity(),
            properties: Vec::new(),
        }
    }

    /// Set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.local_transform = transform;
        self
    }

    /// Add a property override
    pub fn with_property(mut self, id: impl Into<String>, value: impl Into<String>, property_type: PropertyType) -> Self {
        self.properties.push(PropertyOverride::new(id, value, property_type));
        self
    }

    /// Check property ids are unique and placeholder-free values match
    /// their declared type
    pub fn validate(&self) -> Result<(), ComponentError> {
        let mut seen = HashSet::new();
        for (index, property) in self.properties.iter().enumerate() {
            if property.id.is_empty() {
                return Err(ComponentError::schema(format!("properties[{index}].id"), "property id cannot be empty"));
            }
            if !seen.insert(property.id.as_str()) {
                return Err(ComponentError::Validation {
                    message: format!("duplicate property id '{}'", property.id),
                });
            }
            if !template::contains_placeholder(&property.value) {
                property
                    .property_type
                    .parse_value(&property.value)
                    .map_err(|message| ComponentError::schema(format!("properties[{index}].value"), message))?;
            }
        }
        Ok(())
    }

    /// Look the component up in `store`
    pub fn resolve(&self, store: &dyn ResourceStore) -> Result<ResourceHandle, ComponentError> {
        let handle = store.lookup(&self.component_path).ok_or_else(|| ComponentError::NotFound {
            path: self.component_path.clone(),
        })?;

        if !handle.kind().is_component() {
            return Err(ComponentError::schema(
                "component",
                format!("'{}' is a {} resource, not a component", self.component_path, handle.kind()),
            ));
        }
        Ok(handle)
    }

    /// Resolve the reference and its property overrides
    pub fn instantiate(&self, context: &InstanceContext<'_>) -> Result<RuntimeComponent, ComponentError> {
        self.validate()?;
        let handle = self.resolve(context.store)?;

        let mut properties = Vec::with_capacity(self.properties.len());
        for (index, property) in self.properties.iter().enumerate() {
            let field = format!("properties[{index}].value");
            let text = template::resolve(&property.value, context.substitutions).map_err(|source| {
                ComponentError::UnresolvedPlaceholder {
                    field: field.clone(),
                    source,
                }
            })?;
            let value = property
                .property_type
                .parse_value(&text)
                .map_err(|message| ComponentError::schema(field, message))?;
            properties.push(ResolvedProperty {
                id: property.id.clone(),
                value,
            });
        }

        log::debug!("Resolved component '{}' -> {}", self.id, handle);
        Ok(RuntimeComponent {
            id: self.id.clone(),
            handle,
            properties,
            local_transform: self.local_transform,
            world_transform: context.placement.combine(&self.local_transform),
        })
    }
}

/// A resolved component reference
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeComponent {
    /// Child id
    pub id: String,
    /// Resource the reference resolved to
    pub handle: ResourceHandle,
    /// Type-checked overrides
    pub properties: Vec<ResolvedProperty>,
    /// Transform relative to the entity
    pub local_transform: Transform,
    /// Placement combined with the local transform
    pub world_transform: Transform,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryResourceStore;
    use crate::components::schema::SchemaRegistry;
    use crate::template::Substitutions;
    use approx::assert_relative_eq;

    fn context<'a>(store: &'a MemoryResourceStore, substitutions: &'a Substitutions, placement: &'a Transform) -> InstanceContext<'a> {
        InstanceContext {
            registry: SchemaRegistry::builtin(),
            substitutions,
            store,
            placement,
        }
    }

    #[test]
    fn test_resolve_found_and_missing() {
        let store = MemoryResourceStore::with_resources(["/scripts/boat.script"]);

        let script = ComponentReference::new("script", "/scripts/boat.script");
        assert_eq!(script.resolve(&store).unwrap().path(), "/scripts/boat.script");

        let missing = ComponentReference::new("script", "/scripts/raft.script");
        assert_eq!(
            missing.resolve(&store).unwrap_err(),
            ComponentError::NotFound { path: "/scripts/raft.script".to_string() }
        );
    }

    #[test]
    fn test_non_component_resource_is_rejected() {
        let store = MemoryResourceStore::with_resources(["/assets/models/ship_dark.glb"]);
        let reference = ComponentReference::new("mesh", "/assets/models/ship_dark.glb");

        assert!(matches!(
            reference.resolve(&store),
            Err(ComponentError::Schema { ref field, .. }) if field == "component"
        ));
    }

    #[test]
    fn test_property_values_parse_by_type() {
        assert_eq!(PropertyType::Number.parse_value(" 2.5 "), Ok(PropertyValue::Number(2.5)));
        assert_eq!(PropertyType::Boolean.parse_value("true"), Ok(PropertyValue::Boolean(true)));
        assert_eq!(
            PropertyType::Vector3.parse_value("1, 2.5, -3"),
            Ok(PropertyValue::Vector3(Vec3::new(1.0, 2.5, -3.0)))
        );
        assert!(PropertyType::Vector3.parse_value("1, 2").is_err());
        assert!(PropertyType::Quat.parse_value("0, 0, 0, 0").is_err());
        assert!(PropertyType::Hash.parse_value("").is_err());
        assert_eq!(PropertyType::from_tag("PROPERTY_TYPE_URL"), Some(PropertyType::Url));
        assert_eq!(PropertyType::from_tag("PROPERTY_TYPE_STRING"), None);
    }

    #[test]
    fn test_duplicate_property_ids() {
        let reference = ComponentReference::new("script", "/scripts/boat.script")
            .with_property("speed", "1", PropertyType::Number)
            .with_property("speed", "2", PropertyType::Number);

        assert!(matches!(reference.validate(), Err(ComponentError::Validation { .. })));
    }

    #[test]
    fn test_placeholder_values_are_checked_after_substitution() {
        let reference = ComponentReference::new("script", "/scripts/boat.script")
            .with_property("speed", "{{SPEED}}", PropertyType::Number)
            .with_transform(Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));
        assert!(reference.validate().is_ok());

        let store = MemoryResourceStore::with_resources(["/scripts/boat.script"]);
        let placement = Transform::from_position(Vec3::new(0.0, 0.0, 5.0));

        let subs: Substitutions = [("SPEED".to_string(), "4.5".to_string())].into_iter().collect();
        let runtime = reference.instantiate(&context(&store, &subs, &placement)).unwrap();
        assert_eq!(runtime.properties[0].value, PropertyValue::Number(4.5));
        assert_relative_eq!(runtime.world_transform.position, Vec3::new(1.0, 0.0, 5.0));

        let bad: Substitutions = [("SPEED".to_string(), "fast".to_string())].into_iter().collect();
        assert!(matches!(
            reference.instantiate(&context(&store, &bad, &placement)),
            Err(ComponentError::Schema { ref field, .. }) if field == "properties[0].value"
        ));

        assert!(matches!(
            reference.instantiate(&context(&store, &Substitutions::new(), &placement)),
            Err(ComponentError::UnresolvedPlaceholder { .. })
        ));
    }
}
