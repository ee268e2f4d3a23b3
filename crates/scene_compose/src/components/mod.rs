//! Entity children: component references and embedded components
//!
//! - [`ComponentReference`]: non-owning pointer to a reusable component
//! - [`EmbeddedComponent`]: inline definition with a typed payload
//! - [`SchemaRegistry`]: type tag to payload schema

pub mod embedded;
pub mod payload;
pub mod reference;
pub mod schema;

pub use embedded::{EmbeddedComponent, ResolvedResource, RuntimeObjectDescriptor};
pub use payload::{Payload, PayloadBlock, PayloadField, PayloadValue};
pub use reference::{
    ComponentReference, PropertyOverride, PropertyType, PropertyValue, ResolvedProperty, RuntimeComponent,
};
pub use schema::{Cardinality, ComponentType, CustomTag, FieldKind, FieldSpec, PayloadSchema, SchemaRegistry};

use crate::assets::ResourceStore;
use crate::foundation::math::Transform;
use crate::template::Substitutions;

/// Everything a child needs to instantiate
#[derive(Clone, Copy)]
pub struct InstanceContext<'a> {
    /// Schemas payloads are checked against
    pub registry: &'a SchemaRegistry,
    /// Placeholder values
    pub substitutions: &'a Substitutions,
    /// Where locators resolve
    pub store: &'a dyn ResourceStore,
    /// World transform of the owning entity
    pub placement: &'a Transform,
}
