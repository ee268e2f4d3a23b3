//! # Entity Registry
//!
//! Scene-level registry of instantiated entities. An entity is published
//! only after its instantiation has fully succeeded, and entity ids are
//! unique within the registry. A failed spawn leaves the registry exactly
//! as it was.

use std::collections::HashMap;

use super::descriptor::EntityDescriptor;
use super::instantiate::RuntimeEntity;
use crate::assets::ResourceStore;
use crate::components::SchemaRegistry;
use crate::error::DescriptorError;
use crate::foundation::collections::{HandleMap, TypedHandle};
use crate::foundation::math::Transform;
use crate::template::Substitutions;

/// Handle to a published entity
pub type EntityHandle = TypedHandle<RuntimeEntity>;

/// Published entities keyed by handle and by id
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: HandleMap<RuntimeEntity>,
    by_id: HashMap<String, EntityHandle>,
}

impl EntityRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate `descriptor` and publish it on success
    pub fn spawn(
        &mut self,
        descriptor: &EntityDescriptor,
        substitutions: &Substitutions,
        store: &dyn ResourceStore,
        placement: &Transform,
    ) -> Result<EntityHandle, DescriptorError> {
        self.spawn_with(SchemaRegistry::builtin(), descriptor, substitutions, store, placement)
    }

    /// [`EntityRegistry::spawn`] with an explicit schema registry
    pub fn spawn_with(
        &mut self,
        registry: &SchemaRegistry,
        descriptor: &EntityDescriptor,
        substitutions: &Substitutions,
        store: &dyn ResourceStore,
        placement: &Transform,
    ) -> Result<EntityHandle, DescriptorError> {
        self.ensure_free(&descriptor.id)?;
        let entity = descriptor.instantiate_with(registry, substitutions, store, placement)?;
        self.publish(entity)
    }

    /// Publish an already instantiated entity
    pub fn publish(&mut self, entity: RuntimeEntity) -> Result<EntityHandle, DescriptorError> {
        self.ensure_free(&entity.id)?;

        let id = entity.id.clone();
        let handle = EntityHandle::new(self.entities.insert(entity));
        self.by_id.insert(id.clone(), handle);

        log::info!("Published entity '{}' ({} in scene)", id, self.entities.len());
        Ok(handle)
    }

    fn ensure_free(&self, id: &str) -> Result<(), DescriptorError> {
        if self.by_id.contains_key(id) {
            return Err(DescriptorError::validation(id, None, format!("entity '{id}' already exists in the scene")));
        }
        Ok(())
    }

    /// Entity behind a handle
    pub fn get(&self, handle: EntityHandle) -> Option<&RuntimeEntity> {
        self.entities.get(handle.key())
    }

    /// Look up a published entity by id
    pub fn find(&self, id: &str) -> Option<(EntityHandle, &RuntimeEntity)> {
        let handle = *self.by_id.get(id)?;
        self.get(handle).map(|entity| (handle, entity))
    }

    /// Remove an entity, freeing its id
    pub fn despawn(&mut self, handle: EntityHandle) -> Option<RuntimeEntity> {
        let entity = self.entities.remove(handle.key())?;
        self.by_id.remove(&entity.id);
        log::debug!("Despawned entity '{}'", entity.id);
        Some(entity)
    }

    /// Whether an entity with `id` is published
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of published entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing is published
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Published entities with their handles
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &RuntimeEntity)> {
        self.entities.iter().map(|(key, entity)| (EntityHandle::new(key), entity))
    }
}
