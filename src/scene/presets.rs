//! Built-in scene presets

use std::f32::consts::PI;

use crate::scene::description::{
    CameraPlacement, Geometry, MaterialPreset, SceneDescription, SceneError, SceneObject, Transform,
};

/// Names of the built-in presets, in display order
pub const PRESET_NAMES: [&str; 4] = ["cage", "halo", "pillars", "rings"];

const RED: [f32; 3] = [0.80, 0.05, 0.04];
const LEAD: [f32; 3] = [0.36, 0.38, 0.42];
const BLACK: [f32; 3] = [0.03, 0.03, 0.03];
const DARK_RED: [f32; 3] = [0.545, 0.0, 0.0];
const EMBER: [f32; 3] = [1.0, 0.28, 0.08];

/// Look up a built-in preset by name
pub fn by_name(name: &str) -> Result<SceneDescription, SceneError> {
    match name {
        "cage" => Ok(cage()),
        "halo" => Ok(halo()),
        "pillars" => Ok(pillars()),
        "rings" => Ok(rings()),
        other => Err(SceneError::UnknownPreset(other.to_string())),
    }
}

fn cage_torus() -> Geometry {
    Geometry::Torus {
        radius: 0.93,
        tube: 0.02,
        radial_segments: 64,
        tubular_segments: 128,
    }
}

fn glow_shell(radius: f32) -> SceneObject {
    SceneObject::new(
        "glow",
        Geometry::Icosahedron { radius, detail: 1 },
        MaterialPreset::Glow {
            color: EMBER,
            coefficient: 0.7,
            power: 2.0,
        },
    )
}

/// Red core in a lead ring, wrapped by six thin cage hoops and a glow shell
pub fn cage() -> SceneDescription {
    let hoop = |name: &str, transform: Transform| {
        SceneObject::new(name, cage_torus(), MaterialPreset::Matcap { color: BLACK })
            .with_transform(transform)
    };

    SceneDescription {
        name: "cage".to_string(),
        background: [0.0; 3],
        camera: CameraPlacement::default(),
        objects: vec![
            glow_shell(0.46),
            hoop("hoop_vertical_left", Transform::rotated_y(PI / 2.6)),
            SceneObject::new(
                "lead_ring",
                Geometry::Torus {
                    radius: 0.77,
                    tube: 0.17,
                    radial_segments: 64,
                    tubular_segments: 128,
                },
                MaterialPreset::Matcap { color: LEAD },
            ),
            hoop("hoop_horizontal_top", Transform::rotated_x(PI / 2.6)),
            hoop("hoop_horizontal_bottom", Transform::rotated_x(-PI / 2.6)),
            hoop("hoop_horizontal_centre", Transform::rotated_x(-PI / 2.0)),
            hoop("hoop_vertical_right", Transform::rotated_y(-PI / 2.6)),
            hoop("hoop_vertical_centre", Transform::rotated_y(-PI / 2.0)),
            SceneObject::new(
                "cloud_ring",
                Geometry::Torus {
                    radius: 0.52,
                    tube: 0.09,
                    radial_segments: 32,
                    tubular_segments: 64,
                },
                MaterialPreset::Basic { color: DARK_RED },
            ),
            SceneObject::new(
                "core",
                Geometry::Sphere {
                    radius: 0.34,
                    width_segments: 64,
                    height_segments: 64,
                },
                MaterialPreset::Matcap { color: RED },
            ),
        ],
    }
}

/// Chrome sphere with a tilted ring and a wide glow
pub fn halo() -> SceneDescription {
    SceneDescription {
        name: "halo".to_string(),
        background: [0.01, 0.01, 0.02],
        camera: CameraPlacement::default(),
        objects: vec![
            SceneObject::new(
                "chrome_core",
                Geometry::Sphere {
                    radius: 0.4,
                    width_segments: 64,
                    height_segments: 64,
                },
                MaterialPreset::EnvMap {
                    tint: [0.9, 0.9, 0.95],
                    reflectivity: 0.9,
                },
            ),
            SceneObject::new(
                "ring",
                Geometry::Torus {
                    radius: 0.7,
                    tube: 0.03,
                    radial_segments: 32,
                    tubular_segments: 128,
                },
                MaterialPreset::Matcap { color: LEAD },
            )
            .with_transform(Transform {
                rotation: [PI / 2.4, 0.0, PI / 8.0],
                ..Transform::default()
            }),
            glow_shell(0.6),
        ],
    }
}

/// Three matcap columns under a floating sphere
pub fn pillars() -> SceneDescription {
    let column = |name: &str, x: f32, height: f32| {
        SceneObject::new(
            name,
            Geometry::Cylinder {
                radius_top: 0.08,
                radius_bottom: 0.1,
                height,
                radial_segments: 48,
            },
            MaterialPreset::Matcap { color: LEAD },
        )
        .with_transform(Transform::at([x, -0.6 + height / 2.0, 0.0]))
    };

    SceneDescription {
        name: "pillars".to_string(),
        background: [0.02, 0.02, 0.03],
        camera: CameraPlacement {
            position: [0.0, 0.3, 2.2],
            ..CameraPlacement::default()
        },
        objects: vec![
            column("pillar_left", -0.5, 0.8),
            column("pillar_centre", 0.0, 1.0),
            column("pillar_right", 0.5, 0.8),
            SceneObject::new(
                "orb",
                Geometry::Sphere {
                    radius: 0.2,
                    width_segments: 48,
                    height_segments: 48,
                },
                MaterialPreset::Matcap { color: RED },
            )
            .with_transform(Transform::at([0.0, 0.65, 0.0])),
        ],
    }
}

/// Nested reflective rings at alternating tilts
pub fn rings() -> SceneDescription {
    let objects = (0..4)
        .map(|i| {
            let radius = 0.35 + i as f32 * 0.18;
            let axis_tilt = if i % 2 == 0 { PI / 2.0 } else { 0.0 };
            SceneObject::new(
                &format!("ring_{}", i),
                Geometry::Torus {
                    radius,
                    tube: 0.035,
                    radial_segments: 32,
                    tubular_segments: 128,
                },
                MaterialPreset::EnvMap {
                    tint: [1.0, 0.85, 0.6],
                    reflectivity: 0.75,
                },
            )
            .with_transform(Transform {
                rotation: [axis_tilt, i as f32 * PI / 6.0, 0.0],
                ..Transform::default()
            })
        })
        .chain(std::iter::once(SceneObject::new(
            "core",
            Geometry::Icosahedron {
                radius: 0.18,
                detail: 0,
            },
            MaterialPreset::Matcap { color: RED },
        )))
        .collect();

    SceneDescription {
        name: "rings".to_string(),
        background: [0.0; 3],
        camera: CameraPlacement::default(),
        objects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_resolves() {
        for name in PRESET_NAMES {
            let scene = by_name(name).unwrap();
            assert_eq!(scene.name, name);
            assert!(!scene.objects.is_empty());
        }
    }

    #[test]
    fn test_unknown_preset() {
        assert!(matches!(by_name("teapot"), Err(SceneError::UnknownPreset(_))));
    }

    #[test]
    fn test_cage_composition() {
        let scene = cage();
        assert_eq!(scene.objects.len(), 10);

        let hoops = scene
            .objects
            .iter()
            .filter(|o| o.geometry == cage_torus())
            .count();
        assert_eq!(hoops, 6);

        let glow = scene.objects.iter().find(|o| o.name == "glow").unwrap();
        assert_eq!(glow.geometry, Geometry::Icosahedron { radius: 0.46, detail: 1 });
        assert!(glow.material.is_transparent());
    }

    #[test]
    fn test_cage_camera() {
        let camera = cage().camera;
        assert_eq!(camera.position, [0.0, 0.0, 1.75]);
        assert!((camera.fov_degrees - 75.0).abs() < f32::EPSILON);
    }
}
