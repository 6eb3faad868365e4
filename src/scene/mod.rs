//! Scene composition
//!
//! - Description: serializable scene data (objects, materials, transforms)
//! - Geometry: mesh generators for the supported primitives
//! - Presets: the built-in scenes
//! - Assemble: description to meshes and ordered draws

pub mod assemble;
pub mod description;
pub mod geometry;
pub mod presets;

pub use assemble::{assemble, AssembledScene, DrawItem, MaterialKind};
pub use description::{
    CameraPlacement, Geometry, MaterialPreset, SceneDescription, SceneError, SceneObject, Transform,
};
pub use geometry::{Mesh, Vertex};

/// Resolve a scene argument: a preset name, or a path to a `.json` description
pub fn load(scene: &str) -> Result<SceneDescription, SceneError> {
    if scene.ends_with(".json") {
        SceneDescription::from_file(scene)
    } else {
        presets::by_name(scene)
    }
}
