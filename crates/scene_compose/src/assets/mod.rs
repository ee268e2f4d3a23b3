//! Resource lookup for descriptor instantiation

pub mod store;

pub use store::{
    DirectoryResourceStore, MemoryResourceStore, ResourceEntry, ResourceHandle, ResourceKind, ResourceStore,
};
