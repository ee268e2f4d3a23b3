//! Publication into the scene registry is all-or-nothing

use super::{boat_store, subs, BOAT_GO};
use crate::assets::MemoryResourceStore;
use crate::components::SchemaRegistry;
use crate::entity::{EntityDescriptor, EntityRegistry};
use crate::error::ErrorKind;
use crate::format::Deserializer;
use crate::foundation::math::Transform;

fn boat(id: &str) -> EntityDescriptor {
    Deserializer::new(SchemaRegistry::builtin())
        .deserialize_with_id(BOAT_GO, id)
        .unwrap()
}

#[test]
fn test_spawn_publishes_entity() {
    let mut registry = EntityRegistry::new();
    let store = boat_store();

    let handle = registry
        .spawn(&boat("boat"), &subs(&[("NAME", "PirateShip")]), &store, &Transform::identity())
        .unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get(handle).unwrap().id, "boat");
    assert_eq!(registry.find("boat").map(|(h, _)| h), Some(handle));
}

#[test]
fn test_failed_spawn_registers_nothing() {
    let mut registry = EntityRegistry::new();
    let store = boat_store();

    let err = registry
        .spawn(&boat("boat"), &subs(&[]), &store, &Transform::identity())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnresolvedPlaceholder);
    assert!(registry.is_empty());
    assert!(!registry.contains("boat"));

    let partial_store = MemoryResourceStore::with_resources(["/scripts/boat.script"]);
    assert!(registry
        .spawn(&boat("boat"), &subs(&[("NAME", "PirateShip")]), &partial_store, &Transform::identity())
        .is_err());
    assert!(registry.is_empty());
}

#[test]
fn test_entity_ids_are_unique_in_scene() {
    let mut registry = EntityRegistry::new();
    let store = boat_store();
    let names = subs(&[("NAME", "PirateShip")]);

    registry.spawn(&boat("boat"), &names, &store, &Transform::identity()).unwrap();
    let err = registry
        .spawn(&boat("boat"), &names, &store, &Transform::identity())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(registry.len(), 1);

    registry.spawn(&boat("boat2"), &names, &store, &Transform::identity()).unwrap();
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_despawn_frees_id() {
    let mut registry = EntityRegistry::new();
    let store = boat_store();
    let names = subs(&[("NAME", "PirateShip")]);

    let handle = registry.spawn(&boat("boat"), &names, &store, &Transform::identity()).unwrap();
    let removed = registry.despawn(handle).unwrap();

    assert_eq!(removed.id, "boat");
    assert!(registry.get(handle).is_none());
    assert!(registry.despawn(handle).is_none());

    registry.spawn(&boat("boat"), &names, &store, &Transform::identity()).unwrap();
    assert_eq!(registry.iter().count(), 1);
}
