//! Resource stores
//!
//! Descriptors name resources by locator (`/scripts/boat.script`). A
//! [`ResourceStore`] turns a locator into a [`ResourceHandle`]; once a
//! locator has resolved, every later lookup returns the same handle.

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::foundation::collections::{HandleMap, TypedHandle};

/// Broad category of a resource, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `.script`
    Script,
    /// `.gui_script`
    GuiScript,
    /// Standalone component file (`.model`, `.sprite`, ...)
    ComponentFile,
    /// Mesh data
    Mesh,
    /// `.material`
    Material,
    /// Image
    Texture,
    /// Animation set
    Animation,
    /// Tile source or atlas
    TileSource,
    /// `.font`
    Font,
    /// Audio clip
    Sound,
    /// Entity or collection prototype
    Prototype,
    /// `.convexshape`
    CollisionShape,
    /// Anything unrecognised
    Other,
}

impl ResourceKind {
    /// Classify a locator by its extension
    pub fn from_path(path: &str) -> Self {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "script" => Self::Script,
            "gui_script" => Self::GuiScript,
            "model" | "sprite" | "collisionobject" | "factory" | "sound" | "label" | "particlefx" | "camera" => {
                Self::ComponentFile
            }
            "glb" | "gltf" | "dae" | "obj" | "buffer" => Self::Mesh,
            "material" => Self::Material,
            "png" | "jpg" | "jpeg" | "tga" | "texture" => Self::Texture,
            "animationset" | "ani" => Self::Animation,
            "tilesource" | "tileset" | "atlas" => Self::TileSource,
            "font" | "ttf" | "otf" => Self::Font,
            "wav" | "ogg" => Self::Sound,
            "go" | "collection" => Self::Prototype,
            "convexshape" => Self::CollisionShape,
            _ => Self::Other,
        }
    }

    /// Whether a component reference may point at this kind
    pub fn is_component(self) -> bool {
        matches!(self, Self::Script | Self::GuiScript | Self::ComponentFile)
    }

    /// Human readable kind
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::GuiScript => "gui script",
            Self::ComponentFile => "component",
            Self::Mesh => "mesh",
            Self::Material => "material",
            Self::Texture => "texture",
            Self::Animation => "animation",
            Self::TileSource => "tile source",
            Self::Font => "font",
            Self::Sound => "sound",
            Self::Prototype => "prototype",
            Self::CollisionShape => "collision shape",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record a store keeps per known resource
#[derive(Debug, Clone)]
pub struct ResourceEntry {
    /// Locator
    pub path: Arc<str>,
    /// Kind derived at registration
    pub kind: ResourceKind,
}

/// Handle to a resource owned by a store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    id: TypedHandle<ResourceEntry>,
    path: Arc<str>,
    kind: ResourceKind,
}

impl ResourceHandle {
    /// Slot identity inside the owning store
    pub fn id(&self) -> TypedHandle<ResourceEntry> {
        self.id
    }

    /// Locator the handle was resolved from
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Kind of the resource
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Read-only locator lookup shared across instantiations
pub trait ResourceStore: Send + Sync {
    /// Resolve a locator, `None` when the resource does not exist
    fn lookup(&self, path: &str) -> Option<ResourceHandle>;

    /// Whether a locator resolves
    fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }
}

#[derive(Debug, Default)]
struct ResourceTable {
    entries: HandleMap<ResourceEntry>,
    by_path: HashMap<Arc<str>, ResourceHandle>,
}

impl ResourceTable {
    fn get(&self, path: &str) -> Option<ResourceHandle> {
        self.by_path.get(path).cloned()
    }

    /// Register a locator; a known locator keeps its existing handle
    fn insert(&mut self, path: &str, kind: ResourceKind) -> ResourceHandle {
        if let Some(existing) = self.by_path.get(path) {
            return existing.clone();
        }

        let path: Arc<str> = Arc::from(path);
        let key = self.entries.insert(ResourceEntry { path: Arc::clone(&path), kind });
        let handle = ResourceHandle {
            id: TypedHandle::new(key),
            path: Arc::clone(&path),
            kind,
        };
        self.by_path.insert(path, handle.clone());
        handle
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Store holding pre-registered resources
#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    table: RwLock<ResourceTable>,
}

impl MemoryResourceStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `paths`
    pub fn with_resources<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let store = Self::new();
        for path in paths {
            store.insert(path.as_ref());
        }
        store
    }

    /// Register a resource, classifying it by extension
    pub fn insert(&self, path: &str) -> ResourceHandle {
        self.insert_with_kind(path, ResourceKind::from_path(path))
    }

    /// Register a resource with an explicit kind
    pub fn insert_with_kind(&self, path: &str, kind: ResourceKind) -> ResourceHandle {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, kind)
    }

    /// Number of registered resources
    pub fn len(&self) -> usize {
        self.table.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceStore for MemoryResourceStore {
    fn lookup(&self, path: &str) -> Option<ResourceHandle> {
        self.table.read().unwrap_or_else(PoisonError::into_inner).get(path)
    }
}

/// Store mapping `/a/b.ext` locators onto files under a root directory.
/// A resolved locator is cached so its handle stays stable even if the
/// file later disappears.
#[derive(Debug)]
pub struct DirectoryResourceStore {
    root: PathBuf,
    cache: RwLock<ResourceTable>,
}

impl DirectoryResourceStore {
    /// Store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(ResourceTable::default()),
        }
    }

    /// Directory locators resolve against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File a locator maps to; `None` for locators escaping the root
    pub fn file_path(&self, locator: &str) -> Option<PathBuf> {
        let relative = Path::new(locator.trim_start_matches('/'));
        let mut file = self.root.clone();
        let mut segments = 0;

        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    file.push(segment);
                    segments += 1;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        (segments > 0).then_some(file)
    }

    /// Number of locators resolved so far
    pub fn cached(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl ResourceStore for DirectoryResourceStore {
    fn lookup(&self, path: &str) -> Option<ResourceHandle> {
        if let Some(handle) = self.cache.read().unwrap_or_else(PoisonError::into_inner).get(path) {
            return Some(handle);
        }

        let file = self.file_path(path)?;
        if !file.is_file() {
            log::debug!("Resource '{}' not found at {}", path, file.display());
            return None;
        }

        let handle = self
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, ResourceKind::from_path(path));
        log::debug!("Resolved resource '{}' ({})", path, handle.kind());
        Some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(ResourceKind::from_path("/scripts/boat.script"), ResourceKind::Script);
        assert_eq!(ResourceKind::from_path("/assets/models/ship_dark.glb"), ResourceKind::Mesh);
        assert_eq!(ResourceKind::from_path("/builtins/materials/model.material"), ResourceKind::Material);
        assert_eq!(ResourceKind::from_path("/x/colormap.PNG"), ResourceKind::Texture);
        assert_eq!(ResourceKind::from_path("/README"), ResourceKind::Other);

        assert!(ResourceKind::Script.is_component());
        assert!(!ResourceKind::Mesh.is_component());
    }

    #[test]
    fn test_memory_store_identity_is_stable() {
        let store = MemoryResourceStore::with_resources(["/scripts/boat.script"]);

        let first = store.lookup("/scripts/boat.script").unwrap();
        let again = store.insert("/scripts/boat.script");

        assert_eq!(first, again);
        assert_eq!(store.len(), 1);
        assert!(store.lookup("/scripts/missing.script").is_none());
    }

    #[test]
    fn test_directory_store_resolves_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("scripts")).unwrap();
        std::fs::write(dir.path().join("scripts/boat.script"), "-- boat").unwrap();

        let store = DirectoryResourceStore::new(dir.path());
        let handle = store.lookup("/scripts/boat.script").unwrap();

        assert_eq!(handle.kind(), ResourceKind::Script);
        assert_eq!(handle.path(), "/scripts/boat.script");
        assert_eq!(store.lookup("/scripts/boat.script"), Some(handle));
        assert_eq!(store.cached(), 1);
        assert!(store.lookup("/scripts/other.script").is_none());
        assert!(store.lookup("/scripts").is_none());
    }

    #[test]
    fn test_directory_store_rejects_escaping_locators() {
        let store = DirectoryResourceStore::new("/tmp/resources");

        assert!(store.file_path("/../etc/passwd").is_none());
        assert!(store.file_path("/").is_none());
        assert_eq!(
            store.file_path("/a/./b.script"),
            Some(PathBuf::from("/tmp/resources/a/b.script"))
        );
    }
}
