//! Entity descriptors, instantiation and the scene registry

pub mod descriptor;
pub mod instantiate;
pub mod registry;

pub use descriptor::EntityDescriptor;
pub use instantiate::RuntimeEntity;
pub use registry::{EntityHandle, EntityRegistry};

#[cfg(test)]
mod tests;
