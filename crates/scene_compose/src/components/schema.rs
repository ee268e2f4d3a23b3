//! Payload sub-schemas and the type registry
//!
//! Every embedded component names a type tag. The tag selects a
//! [`PayloadSchema`] from a [`SchemaRegistry`], and the payload text is
//! parsed against that schema so field kinds are checked while reading.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use super::payload::{self, PayloadBlock};
use crate::error::ComponentError;

/// Kind of value a payload field holds
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Free text, subject to template substitution
    String,
    /// Resource locator, template-substituted then resolved against the store
    Resource,
    /// Floating point number
    Number,
    /// Integer
    Integer,
    /// `true` / `false`
    Bool,
    /// One identifier out of a fixed set
    Enum(Vec<String>),
    /// Nested block with its own schema
    Block(PayloadSchema),
}

impl FieldKind {
    /// Enum kind from a list of identifiers
    pub fn enumeration(values: &[&str]) -> Self {
        Self::Enum(values.iter().map(|v| (*v).to_string()).collect())
    }

    /// Whether template substitution applies to this kind
    pub fn is_string_leaf(&self) -> bool {
        matches!(self, Self::String | Self::Resource)
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Resource => "resource path",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Bool => "boolean",
            Self::Enum(_) => "enum value",
            Self::Block(_) => "block",
        }
    }
}

/// How often a field may appear in its block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Zero or one
    Optional,
    /// Exactly one
    Required,
    /// Zero or more, order preserved
    Repeated,
}

/// One field of a payload schema
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name as written in the payload
    pub name: String,
    /// Value kind
    pub kind: FieldKind,
    /// Occurrence rule
    pub cardinality: Cardinality,
}

/// Schema for a payload block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PayloadSchema {
    fields: Vec<FieldSpec>,
}

impl PayloadSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    fn with_field(mut self, name: &str, kind: FieldKind, cardinality: Cardinality) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            kind,
            cardinality,
        });
        self
    }

    /// Add an optional field
    pub fn optional(self, name: &str, kind: FieldKind) -> Self {
        self.with_field(name, kind, Cardinality::Optional)
    }

    /// Add a required field
    pub fn required(self, name: &str, kind: FieldKind) -> Self {
        self.with_field(name, kind, Cardinality::Required)
    }

    /// Add a repeated field
    pub fn repeated(self, name: &str, kind: FieldKind) -> Self {
        self.with_field(name, kind, Cardinality::Repeated)
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Parse payload text against this schema
    pub fn parse(&self, text: &str) -> Result<PayloadBlock, ComponentError> {
        payload::parse_payload(self, text)
    }
}

/// Embedded component type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// 3D model with materials
    Model,
    /// 2D sprite
    Sprite,
    /// Physics collision object
    CollisionObject,
    /// Spawner of prototype entities
    Factory,
    /// Sound emitter
    Sound,
    /// Text label
    Label,
    /// Any other tag; needs a schema registered by the caller
    Custom(CustomTag),
}

/// Tag of a type without a built-in schema. Only built through
/// [`ComponentType::from_tag`], so it never names a built-in type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomTag(String);

impl CustomTag {
    /// Tag text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ComponentType {
    /// Map a textual tag to a type
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "model" => Self::Model,
            "sprite" => Self::Sprite,
            "collisionobject" => Self::CollisionObject,
            "factory" => Self::Factory,
            "sound" => Self::Sound,
            "label" => Self::Label,
            other => Self::Custom(CustomTag(other.to_string())),
        }
    }

    /// Type for a caller-defined tag; built-in tags map to their variant
    pub fn custom(tag: impl AsRef<str>) -> Self {
        Self::from_tag(tag.as_ref())
    }

    /// Textual tag as written in descriptors
    pub fn as_str(&self) -> &str {
        match self {
            Self::Model => "model",
            Self::Sprite => "sprite",
            Self::CollisionObject => "collisionobject",
            Self::Factory => "factory",
            Self::Sound => "sound",
            Self::Label => "label",
            Self::Custom(tag) => tag.as_str(),
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of type tag to payload schema
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRegistry {
    schemas: HashMap<ComponentType, PayloadSchema>,
}

impl SchemaRegistry {
    /// Registry with no schemas at all
    pub fn empty() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Registry with the built-in component types
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(ComponentType::Model, model_schema());
        registry.register(ComponentType::Sprite, sprite_schema());
        registry.register(ComponentType::CollisionObject, collision_object_schema());
        registry.register(ComponentType::Factory, factory_schema());
        registry.register(ComponentType::Sound, sound_schema());
        registry.register(ComponentType::Label, label_schema());
        registry
    }

    /// Shared instance of [`SchemaRegistry::with_builtin`]
    pub fn builtin() -> &'static SchemaRegistry {
        static BUILTIN: OnceLock<SchemaRegistry> = OnceLock::new();
        BUILTIN.get_or_init(Self::with_builtin)
    }

    /// Register or replace the schema for a type, returning the old one
    pub fn register(&mut self, component_type: ComponentType, schema: PayloadSchema) -> Option<PayloadSchema> {
        self.schemas.insert(component_type, schema)
    }

    /// Schema for a type
    pub fn get(&self, component_type: &ComponentType) -> Option<&PayloadSchema> {
        self.schemas.get(component_type)
    }

    /// Whether a schema is registered for a type
    pub fn contains(&self, component_type: &ComponentType) -> bool {
        self.schemas.contains_key(component_type)
    }

    /// Validate payload text for a type
    pub fn validate(&self, component_type: &ComponentType, text: &str) -> Result<PayloadBlock, ComponentError> {
        let schema = self.get(component_type).ok_or_else(|| {
            ComponentError::schema("type", format!("no schema registered for component type '{component_type}'"))
        })?;
        schema.parse(text)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

fn texture_binding_schema() -> PayloadSchema {
    PayloadSchema::new()
        .required("sampler", FieldKind::String)
        .required("texture", FieldKind::Resource)
}

fn model_schema() -> PayloadSchema {
    let material = PayloadSchema::new()
        .required("name", FieldKind::String)
        .required("material", FieldKind::Resource)
        .repeated("textures", FieldKind::Block(texture_binding_schema()));

    PayloadSchema::new()
        .required("mesh", FieldKind::Resource)
        .optional("name", FieldKind::String)
        .repeated("materials", FieldKind::Block(material))
        .optional("skeleton", FieldKind::Resource)
        .optional("animations", FieldKind::Resource)
        .optional("default_animation", FieldKind::String)
        .optional("create_go_bones", FieldKind::Bool)
}

fn sprite_schema() -> PayloadSchema {
    PayloadSchema::new()
        .required("tile_set", FieldKind::Resource)
        .optional("default_animation", FieldKind::String)
        .optional("material", FieldKind::Resource)
        .optional(
            "blend_mode",
            FieldKind::enumeration(&["BLEND_MODE_ALPHA", "BLEND_MODE_ADD", "BLEND_MODE_MULT", "BLEND_MODE_SCREEN"]),
        )
        .repeated("textures", FieldKind::Block(texture_binding_schema()))
}

fn collision_object_schema() -> PayloadSchema {
    PayloadSchema::new()
        .optional("collision_shape", FieldKind::Resource)
        .required(
            "type",
            FieldKind::enumeration(&[
                "COLLISION_OBJECT_TYPE_DYNAMIC",
                "COLLISION_OBJECT_TYPE_KINEMATIC",
                "COLLISION_OBJECT_TYPE_STATIC",
                "COLLISION_OBJECT_TYPE_TRIGGER",
            ]),
        )
        .optional("mass", FieldKind::Number)
        .optional("friction", FieldKind::Number)
        .optional("restitution", FieldKind::Number)
        .optional("group", FieldKind::String)
        .repeated("mask", FieldKind::String)
}

fn factory_schema() -> PayloadSchema {
    PayloadSchema::new()
        .required("prototype", FieldKind::Resource)
        .optional("load_dynamically", FieldKind::Bool)
}

fn sound_schema() -> PayloadSchema {
    PayloadSchema::new()
        .required("sound", FieldKind::Resource)
        .optional("looping", FieldKind::Integer)
        .optional("group", FieldKind::String)
        .optional("gain", FieldKind::Number)
        .optional("pan", FieldKind::Number)
        .optional("speed", FieldKind::Number)
}

fn label_schema() -> PayloadSchema {
    let size = PayloadSchema::new()
        .optional("x", FieldKind::Number)
        .optional("y", FieldKind::Number)
        .optional("z", FieldKind::Number)
        .optional("w", FieldKind::Number);

    PayloadSchema::new()
        .optional("size", FieldKind::Block(size))
        .optional("text", FieldKind::String)
        .required("font", FieldKind::Resource)
        .optional("material", FieldKind::Resource)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_map_both_ways() {
        for tag in ["model", "sprite", "collisionobject", "factory", "sound", "label", "frobnicator"] {
            assert_eq!(ComponentType::from_tag(tag).as_str(), tag);
        }
        assert!(matches!(ComponentType::from_tag("frobnicator"), ComponentType::Custom(ref tag) if tag.as_str() == "frobnicator"));
    }

    #[test]
    fn test_custom_never_shadows_builtin_tag() {
        assert_eq!(ComponentType::custom("model"), ComponentType::Model);
        assert_eq!(ComponentType::custom("collisionobject"), ComponentType::CollisionObject);
        assert_eq!(ComponentType::custom("frobnicator"), ComponentType::from_tag("frobnicator"));
    }

    #[test]
    fn test_builtin_registry_knows_standard_types() {
        let registry = SchemaRegistry::builtin();

        assert!(registry.contains(&ComponentType::Model));
        assert!(registry.contains(&ComponentType::Label));
        assert!(!registry.contains(&ComponentType::from_tag("frobnicator")));
    }

    #[test]
    fn test_unknown_type_is_schema_error() {
        let err = SchemaRegistry::builtin()
            .validate(&ComponentType::from_tag("frobnicator"), "")
            .unwrap_err();

        assert!(matches!(err, ComponentError::Schema { ref field, .. } if field == "type"));
    }

    #[test]
    fn test_custom_schema_registration() {
        let mut registry = SchemaRegistry::empty();
        let emitter = ComponentType::from_tag("emitter");
        registry.register(emitter.clone(), PayloadSchema::new().required("rate", FieldKind::Number));

        assert!(registry.validate(&emitter, "rate: 12.5").is_ok());
        assert!(registry.validate(&emitter, "").is_err());
        assert!(registry.validate(&ComponentType::Model, "mesh: \"/a.glb\"").is_err());
    }
}
