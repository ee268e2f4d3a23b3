//! # Scene Compose
//!
//! Composition and instancing format for game entities.
//!
//! An entity is described as a tree of reusable component references plus
//! inline (embedded) component definitions. Each child carries a local
//! transform, embedded payloads may contain `{{TOKEN}}` placeholders, and
//! everything is resolved against a resource store when the entity is
//! instantiated.
//!
//! ## Features
//!
//! - **Text Format**: read and write the engine's protobuf-style descriptor files
//! - **Typed Payloads**: embedded payloads are checked against per-type schemas
//! - **Templating**: placeholder substitution in string fields
//! - **Transforms**: position/rotation/scale composition
//! - **Scene Registry**: all-or-nothing publication of instantiated entities
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_compose::prelude::*;
//!
//! let descriptor = EntityDescriptor::parse(r#"
//!     id: "boat"
//!     components { id: "script" component: "/scripts/boat.script" }
//!     embedded_components {
//!       id: "spawner"
//!       type: "factory"
//!       data: "prototype: \"/ships/{{NAME}}.go\"\n"
//!       position { y: 3.210658 }
//!     }
//! "#)?;
//!
//! let store = MemoryResourceStore::with_resources(["/scripts/boat.script", "/ships/PirateShip.go"]);
//! let substitutions: Substitutions = [("NAME".to_string(), "PirateShip".to_string())].into_iter().collect();
//!
//! let entity = descriptor.instantiate(&substitutions, &store, &Transform::identity())?;
//! assert!(entity.object("spawner").unwrap().payload.as_str().contains("PirateShip"));
//! # Ok::<(), scene_compose::error::DescriptorError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod foundation;

pub mod assets;
pub mod components;
pub mod config;
pub mod entity;
pub mod error;
pub mod format;
pub mod template;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        assets::{DirectoryResourceStore, MemoryResourceStore, ResourceHandle, ResourceStore},
        components::{ComponentReference, ComponentType, EmbeddedComponent, PropertyType, SchemaRegistry},
        config::Config,
        core::config::{ComposeConfig, PlacementConfig},
        entity::{EntityDescriptor, EntityRegistry, RuntimeEntity},
        error::{DescriptorError, ErrorKind},
        format::{Deserializer, ParseError},
        foundation::math::{Quat, Transform, Vec3},
        template::Substitutions,
    };
}
