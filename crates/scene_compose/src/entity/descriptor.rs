//! Entity descriptors

use std::collections::HashSet;
use std::path::Path;

use crate::components::{ComponentReference, EmbeddedComponent, SchemaRegistry};
use crate::error::DescriptorError;
use crate::format::{self, Deserializer};

/// Named collection of component references and embedded components.
///
/// Child ids of both kinds share one namespace and are unique within the
/// descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityDescriptor {
    /// Entity id, unique within a scene
    pub id: String,
    /// Component references in document order
    pub components: Vec<ComponentReference>,
    /// Embedded components in document order
    pub embedded_components: Vec<EmbeddedComponent>,
}

impl EntityDescriptor {
    /// Empty descriptor
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            components: Vec::new(),
            embedded_components: Vec::new(),
        }
    }

    /// Add a component reference
    pub fn with_component(mut self, component: ComponentReference) -> Self {
        self.components.push(component);
        self
    }

    /// Add an embedded component
    pub fn with_embedded(mut self, embedded: EmbeddedComponent) -> Self {
        self.embedded_components.push(embedded);
        self
    }

    /// Parse and validate text against the built-in schemas
    pub fn parse(text: &str) -> Result<Self, DescriptorError> {
        format::deserialize(text)
    }

    /// Load a descriptor file against the built-in schemas
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescriptorError> {
        Deserializer::new(SchemaRegistry::builtin()).load_file(path)
    }

    /// Render as text
    pub fn serialize(&self) -> String {
        format::serialize(self)
    }

    /// Ids of all children, references first, in document order
    pub fn child_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.components
            .iter()
            .map(|c| c.id.as_str())
            .chain(self.embedded_components.iter().map(|e| e.id.as_str()))
    }

    /// Component reference by id
    pub fn component(&self, id: &str) -> Option<&ComponentReference> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Embedded component by id
    pub fn embedded(&self, id: &str) -> Option<&EmbeddedComponent> {
        self.embedded_components.iter().find(|e| e.id == id)
    }

    /// Check ids, property overrides and every payload against `registry`
    pub fn validate(&self, registry: &SchemaRegistry) -> Result<(), DescriptorError> {
        if self.id.is_empty() {
            return Err(DescriptorError::validation(&self.id, None, "entity id cannot be empty"));
        }

        let mut seen = HashSet::new();
        for id in self.child_ids() {
            if id.is_empty() {
                return Err(DescriptorError::validation(&self.id, None, "child id cannot be empty"));
            }
            if !seen.insert(id) {
                return Err(DescriptorError::validation(
                    &self.id,
                    Some(id),
                    format!("duplicate child id '{id}'"),
                ));
            }
        }

        for component in &self.components {
            component
                .validate()
                .map_err(|e| DescriptorError::in_component(&self.id, &component.id, e))?;
        }
        for embedded in &self.embedded_components {
            embedded
                .validate(registry)
                .map_err(|e| DescriptorError::in_component(&self.id, &embedded.id, e))?;
        }
        Ok(())
    }
}
