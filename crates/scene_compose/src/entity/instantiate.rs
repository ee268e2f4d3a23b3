//! Descriptor instantiation
//!
//! Every child is resolved before anything is returned, so a failure in
//! the last child leaves no partial entity behind.

use super::descriptor::EntityDescriptor;
use crate::assets::ResourceStore;
use crate::components::{InstanceContext, RuntimeComponent, RuntimeObjectDescriptor, SchemaRegistry};
use crate::error::DescriptorError;
use crate::foundation::math::Transform;
use crate::template::Substitutions;

/// Fully resolved entity ready for the engine's runtime
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeEntity {
    /// Entity id
    pub id: String,
    /// World placement of the entity origin
    pub transform: Transform,
    /// Resolved component references
    pub components: Vec<RuntimeComponent>,
    /// Instantiated embedded components
    pub objects: Vec<RuntimeObjectDescriptor>,
}

impl RuntimeEntity {
    /// Resolved reference by child id
    pub fn component(&self, id: &str) -> Option<&RuntimeComponent> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Embedded object by child id
    pub fn object(&self, id: &str) -> Option<&RuntimeObjectDescriptor> {
        self.objects.iter().find(|o| o.id == id)
    }
}

impl EntityDescriptor {
    /// Instantiate against the built-in schemas
    pub fn instantiate(
        &self,
        substitutions: &Substitutions,
        store: &dyn ResourceStore,
        placement: &Transform,
    ) -> Result<RuntimeEntity, DescriptorError> {
        self.instantiate_with(SchemaRegistry::builtin(), substitutions, store, placement)
    }

    /// Resolve every child; world transforms are `placement ∘ local`
    pub fn instantiate_with(
        &self,
        registry: &SchemaRegistry,
        substitutions: &Substitutions,
        store: &dyn ResourceStore,
        placement: &Transform,
    ) -> Result<RuntimeEntity, DescriptorError> {
        self.validate(registry)?;

        let context = InstanceContext {
            registry,
            substitutions,
            store,
            placement,
        };

        let components = self
            .components
            .iter()
            .map(|component| {
                component
                    .instantiate(&context)
                    .map_err(|e| DescriptorError::in_component(&self.id, &component.id, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let objects = self
            .embedded_components
            .iter()
            .map(|embedded| {
                embedded
                    .instantiate(&context)
                    .map_err(|e| DescriptorError::in_component(&self.id, &embedded.id, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "Instantiated entity '{}' ({} component(s), {} embedded)",
            self.id,
            components.len(),
            objects.len()
        );

        Ok(RuntimeEntity {
            id: self.id.clone(),
            transform: *placement,
            components,
            objects,
        })
    }
}
