//! Embedded (inline) components

use super::payload::{Payload, PayloadBlock};
use super::schema::{ComponentType, SchemaRegistry};
use super::InstanceContext;
use crate::assets::ResourceHandle;
use crate::error::ComponentError;
use crate::foundation::math::Transform;

/// Inline component definition: type tag, payload text and local transform
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedComponent {
    /// Identifier, unique among the entity's children
    pub id: String,
    /// Type tag selecting the payload schema
    pub component_type: ComponentType,
    /// Payload text
    pub payload: Payload,
    /// Transform relative to the owning entity's origin
    pub local_transform: Transform,
}

impl EmbeddedComponent {
    /// Create an embedded component with identity transform
    pub fn new(id: impl Into<String>, component_type: ComponentType, payload: impl Into<Payload>) -> Self {
        Self {
            id: id.into(),
            component_type,
            payload: payload.into(),
            local_transform: Transform::identity(),
        }
    }

    /// Set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.local_transform = transform;
        self
    }

    /// Parse the payload under the schema for its type
    pub fn validate(&self, registry: &SchemaRegistry) -> Result<PayloadBlock, ComponentError> {
        registry.validate(&self.component_type, self.payload.as_str())
    }

    /// Substitute placeholders in string leaves, then resolve every
    /// resource locator in the payload
    pub fn instantiate(&self, context: &InstanceContext<'_>) -> Result<RuntimeObjectDescriptor, ComponentError> {
        let fields = self.validate(context.registry)?.resolve_templates(context.substitutions)?;

        let mut resources = Vec::new();
        for (field, locator) in fields.resources() {
            let handle = context
                .store
                .lookup(&locator)
                .ok_or_else(|| ComponentError::ResourceNotFound {
                    field: field.clone(),
                    path: locator.clone(),
                })?;
            resources.push(ResolvedResource { field, handle });
        }

        log::debug!(
            "Resolved embedded {} '{}' with {} resource(s)",
            self.component_type,
            self.id,
            resources.len()
        );

        Ok(RuntimeObjectDescriptor {
            id: self.id.clone(),
            component_type: self.component_type.clone(),
            payload: Payload::new(fields.to_text()),
            fields,
            resources,
            local_transform: self.local_transform,
            world_transform: context.placement.combine(&self.local_transform),
        })
    }
}

/// Payload locator and the handle it resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedResource {
    /// Field path, e.g. `materials[0].material`
    pub field: String,
    /// Resource the locator resolved to
    pub handle: ResourceHandle,
}

/// Embedded component ready for the engine's runtime
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeObjectDescriptor {
    /// Child id
    pub id: String,
    /// Type tag
    pub component_type: ComponentType,
    /// Payload text after substitution
    pub payload: Payload,
    /// Parsed payload after substitution
    pub fields: PayloadBlock,
    /// Resources referenced by the payload, in document order
    pub resources: Vec<ResolvedResource>,
    /// Transform relative to the entity
    pub local_transform: Transform,
    /// Placement combined with the local transform
    pub world_transform: Transform,
}
