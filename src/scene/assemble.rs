//! Turns a scene description into draw-ready data
//!
//! One mesh is generated per distinct geometry, so the six identical cage
//! hoops share a single vertex buffer. Draws are ordered opaque first,
//! then transparent, each group keeping description order.

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::scene::description::{Geometry, MaterialPreset, SceneDescription, Transform};
use crate::scene::geometry::Mesh;

/// Pipeline selector for a material preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Matcap,
    Basic,
    EnvMap,
    Glow,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 4] = [
        MaterialKind::Matcap,
        MaterialKind::Basic,
        MaterialKind::EnvMap,
        MaterialKind::Glow,
    ];

    /// Fragment shader entry point
    pub fn entry_point(self) -> &'static str {
        match self {
            MaterialKind::Matcap => "fs_matcap",
            MaterialKind::Basic => "fs_basic",
            MaterialKind::EnvMap => "fs_env_map",
            MaterialKind::Glow => "fs_glow",
        }
    }
}

impl From<&MaterialPreset> for MaterialKind {
    fn from(material: &MaterialPreset) -> Self {
        match material {
            MaterialPreset::Matcap { .. } => MaterialKind::Matcap,
            MaterialPreset::Basic { .. } => MaterialKind::Basic,
            MaterialPreset::EnvMap { .. } => MaterialKind::EnvMap,
            MaterialPreset::Glow { .. } => MaterialKind::Glow,
        }
    }
}

/// One draw call
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub name: String,
    /// Index into [`AssembledScene::meshes`]
    pub mesh: usize,
    pub material: MaterialPreset,
    pub model: Mat4,
}

impl DrawItem {
    pub fn kind(&self) -> MaterialKind {
        MaterialKind::from(&self.material)
    }

    /// Inverse-transpose of the model matrix, for transforming normals
    pub fn normal_matrix(&self) -> Mat4 {
        self.model.inverse().transpose()
    }

    /// Material colour and parameters packed for the shader
    ///
    /// `params.x`/`params.y` carry the material's scalar knobs.
    pub fn color_and_params(&self) -> ([f32; 4], [f32; 4]) {
        match self.material {
            MaterialPreset::Matcap { color } => ([color[0], color[1], color[2], 1.0], [32.0, 0.35, 0.0, 0.0]),
            MaterialPreset::Basic { color } => ([color[0], color[1], color[2], 1.0], [0.0; 4]),
            MaterialPreset::EnvMap { tint, reflectivity } => {
                ([tint[0], tint[1], tint[2], 1.0], [reflectivity, 0.0, 0.0, 0.0])
            }
            MaterialPreset::Glow {
                color,
                coefficient,
                power,
            } => ([color[0], color[1], color[2], 1.0], [coefficient, power, 0.0, 0.0]),
        }
    }
}

/// Draw-ready scene
#[derive(Debug, Clone)]
pub struct AssembledScene {
    pub meshes: Vec<Mesh>,
    pub draws: Vec<DrawItem>,
    pub background: [f32; 3],
}

impl AssembledScene {
    pub fn triangle_count(&self) -> usize {
        self.draws
            .iter()
            .map(|draw| self.meshes[draw.mesh].triangle_count())
            .sum()
    }
}

/// Model matrix: translate * rotate (Euler XYZ) * scale
pub fn model_matrix(transform: &Transform) -> Mat4 {
    let [rx, ry, rz] = transform.rotation;
    Mat4::from_scale_rotation_translation(
        Vec3::from_array(transform.scale),
        Quat::from_euler(EulerRot::XYZ, rx, ry, rz),
        Vec3::from_array(transform.position),
    )
}

/// Assemble a description into meshes and ordered draws
pub fn assemble(description: &SceneDescription) -> AssembledScene {
    let mut geometries: Vec<Geometry> = Vec::new();
    let mut meshes = Vec::new();
    let mut opaque = Vec::new();
    let mut transparent = Vec::new();

    for object in &description.objects {
        let mesh = match geometries.iter().position(|g| *g == object.geometry) {
            Some(index) => index,
            None => {
                geometries.push(object.geometry);
                meshes.push(Mesh::from_geometry(&object.geometry));
                meshes.len() - 1
            }
        };

        let draw = DrawItem {
            name: object.name.clone(),
            mesh,
            material: object.material,
            model: model_matrix(&object.transform),
        };
        if object.material.is_transparent() {
            transparent.push(draw);
        } else {
            opaque.push(draw);
        }
    }

    log::debug!(
        "Assembled scene '{}': {} objects, {} meshes",
        description.name,
        opaque.len() + transparent.len(),
        meshes.len()
    );

    opaque.extend(transparent);
    AssembledScene {
        meshes,
        draws: opaque,
        background: description.background,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::presets;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_cage_shares_hoop_mesh() {
        let scene = assemble(&presets::cage());
        assert_eq!(scene.draws.len(), 10);
        // glow, hoop, lead ring, cloud ring, core
        assert_eq!(scene.meshes.len(), 5);

        let hoop_meshes: Vec<usize> = scene
            .draws
            .iter()
            .filter(|d| d.name.starts_with("hoop_"))
            .map(|d| d.mesh)
            .collect();
        assert_eq!(hoop_meshes.len(), 6);
        assert!(hoop_meshes.iter().all(|&m| m == hoop_meshes[0]));
    }

    #[test]
    fn test_transparent_draws_last() {
        let scene = assemble(&presets::cage());
        // Glow is first in the description but must be drawn last
        let last = scene.draws.last().unwrap();
        assert_eq!(last.name, "glow");
        assert_eq!(last.kind(), MaterialKind::Glow);
        assert!(scene.draws[..scene.draws.len() - 1]
            .iter()
            .all(|d| d.kind() != MaterialKind::Glow));
    }

    #[test]
    fn test_opaque_order_preserved() {
        let scene = assemble(&presets::cage());
        assert_eq!(scene.draws[0].name, "hoop_vertical_left");
        assert_eq!(scene.draws[1].name, "lead_ring");
        assert_eq!(scene.draws[8].name, "core");
    }

    #[test]
    fn test_model_matrix_rotation_about_x() {
        let model = model_matrix(&Transform::rotated_x(FRAC_PI_2));
        // +Y rotates onto +Z
        let rotated = model.transform_vector3(Vec3::Y);
        assert!((rotated - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_model_matrix_applies_scale_before_translation() {
        let transform = Transform {
            position: [1.0, 0.0, 0.0],
            rotation: [0.0; 3],
            scale: [2.0, 2.0, 2.0],
        };
        let point = model_matrix(&transform).transform_point3(Vec3::X);
        assert!((point - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_normal_matrix_handles_non_uniform_scale() {
        let draw = DrawItem {
            name: "squashed".to_string(),
            mesh: 0,
            material: MaterialPreset::Basic { color: [1.0; 3] },
            model: model_matrix(&Transform {
                scale: [1.0, 0.5, 1.0],
                ..Transform::default()
            }),
        };
        let normal = draw.normal_matrix().transform_vector3(Vec3::new(1.0, 1.0, 0.0)).normalize();
        // Squashing Y tilts normals towards Y
        assert!(normal.y > normal.x);
    }

    #[test]
    fn test_every_preset_assembles() {
        for name in presets::PRESET_NAMES {
            let scene = assemble(&presets::by_name(name).unwrap());
            assert!(scene.triangle_count() > 0, "preset {} has no triangles", name);
            assert!(scene.draws.iter().all(|d| d.mesh < scene.meshes.len()));
        }
    }
}
