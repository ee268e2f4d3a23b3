//! End-to-end tests over descriptor text, instantiation and the registry

mod registry_publication;

use crate::assets::MemoryResourceStore;
use crate::template::Substitutions;

/// The boat entity as the engine writes it: no `id`, one script, one model
pub(crate) const BOAT_GO: &str = r#"components {
  id: "boat"
  component: "/scripts/boat.script"
}
embedded_components {
  id: "model"
  type: "model"
  data: "mesh: \"/assets/kenney-pirates/GLB format/ship-pirate-large.glb\"\n"
  "name: \"{{NAME}}\"\n"
  "materials {\n"
  "  name: \"colormap\"\n"
  "  material: \"/components/materials/model_instanced.material\"\n"
  "  textures {\n"
  "    sampler: \"tex0\"\n"
  "    texture: \"/assets/kenney-pirates/GLB format/Textures/colormap.png\"\n"
  "  }\n"
  "}\n"
  "create_go_bones: false\n"
  ""
  position {
    y: 3.210658
  }
  rotation {
    y: -0.70710677
    w: 0.70710677
  }
}
"#;

pub(crate) fn boat_store() -> MemoryResourceStore {
    MemoryResourceStore::with_resources([
        "/scripts/boat.script",
        "/assets/kenney-pirates/GLB format/ship-pirate-large.glb",
        "/components/materials/model_instanced.material",
        "/assets/kenney-pirates/GLB format/Textures/colormap.png",
    ])
}

pub(crate) fn subs(pairs: &[(&str, &str)]) -> Substitutions {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}
