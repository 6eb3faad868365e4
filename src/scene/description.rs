//! Declarative scene description
//!
//! A scene is plain data: a background colour, a camera placement and an
//! ordered list of objects, each pairing a primitive geometry with a
//! material preset and a transform. Descriptions serialize to JSON so
//! scenes can be authored outside the binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Primitive geometry, parameterised like common scene-graph libraries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Torus {
        /// Distance from the centre to the middle of the tube
        radius: f32,
        /// Tube radius
        tube: f32,
        radial_segments: u32,
        tubular_segments: u32,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
    },
    Icosahedron { radius: f32, detail: u32 },
}

/// Material presets understood by the scene renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialPreset {
    /// Studio-lit matcap shading tinted by `color`
    Matcap { color: [f32; 3] },
    /// Unlit flat colour
    Basic { color: [f32; 3] },
    /// Reflection of a procedural sky, mixed with `tint`
    EnvMap { tint: [f32; 3], reflectivity: f32 },
    /// Additive back-face rim glow
    Glow {
        color: [f32; 3],
        coefficient: f32,
        power: f32,
    },
}

impl MaterialPreset {
    /// Transparent materials are drawn after every opaque object
    pub fn is_transparent(&self) -> bool {
        matches!(self, MaterialPreset::Glow { .. })
    }
}

/// Object transform; rotation is Euler XYZ in radians
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: unit_scale(),
        }
    }
}

impl Transform {
    /// Identity transform rotated about X
    pub fn rotated_x(angle: f32) -> Self {
        Self {
            rotation: [angle, 0.0, 0.0],
            ..Self::default()
        }
    }

    /// Identity transform rotated about Y
    pub fn rotated_y(angle: f32) -> Self {
        Self {
            rotation: [0.0, angle, 0.0],
            ..Self::default()
        }
    }

    /// Identity transform translated to `position`
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// One object in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub geometry: Geometry,
    pub material: MaterialPreset,
    #[serde(default)]
    pub transform: Transform,
}

impl SceneObject {
    pub fn new(name: &str, geometry: Geometry, material: MaterialPreset) -> Self {
        Self {
            name: name.to_string(),
            geometry,
            material,
            transform: Transform::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Initial camera placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPlacement {
    pub position: [f32; 3],
    #[serde(default)]
    pub target: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraPlacement {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 1.75],
            target: [0.0; 3],
            fov_degrees: 75.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Complete scene description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub name: String,
    /// Clear colour (linear RGB)
    #[serde(default)]
    pub background: [f32; 3],
    #[serde(default)]
    pub camera: CameraPlacement,
    pub objects: Vec<SceneObject>,
}

impl SceneDescription {
    /// Load a scene description from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|error| SceneError::Io {
            path: path.as_ref().to_path_buf(),
            error,
        })?;
        serde_json::from_str(&contents).map_err(|error| SceneError::Parse {
            path: path.as_ref().to_path_buf(),
            error,
        })
    }

    /// Save the description as pretty-printed JSON.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneError> {
        let contents =
            serde_json::to_string_pretty(self).map_err(|error| SceneError::Serialize { error })?;
        fs::write(path.as_ref(), contents).map_err(|error| SceneError::Io {
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Error types for scene loading.
#[derive(Debug)]
pub enum SceneError {
    /// No built-in preset with this name
    UnknownPreset(String),
    /// IO error when reading or writing a scene file
    Io {
        path: std::path::PathBuf,
        error: std::io::Error,
    },
    /// JSON parsing error
    Parse {
        path: std::path::PathBuf,
        error: serde_json::Error,
    },
    /// JSON serialization error
    Serialize { error: serde_json::Error },
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::UnknownPreset(name) => write!(formatter, "Unknown scene preset '{}'", name),
            SceneError::Io { path, error } => {
                write!(
                    formatter,
                    "Failed to read/write scene file '{}': {}",
                    path.display(),
                    error
                )
            }
            SceneError::Parse { path, error } => {
                write!(
                    formatter,
                    "Failed to parse scene file '{}': {}",
                    path.display(),
                    error
                )
            }
            SceneError::Serialize { error } => {
                write!(formatter, "Failed to serialize scene: {}", error)
            }
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::UnknownPreset(_) => None,
            SceneError::Io { error, .. } => Some(error),
            SceneError::Parse { error, .. } => Some(error),
            SceneError::Serialize { error } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_json_is_tagged() {
        let geometry = Geometry::Torus {
            radius: 0.93,
            tube: 0.02,
            radial_segments: 64,
            tubular_segments: 128,
        };
        let json = serde_json::to_value(geometry).unwrap();
        assert_eq!(json["kind"], "torus");
        assert_eq!(json["tubular_segments"], 128);
    }

    #[test]
    fn test_transform_defaults_when_omitted() {
        let json = r#"{
            "name": "ball",
            "geometry": { "kind": "sphere", "radius": 1.0, "width_segments": 8, "height_segments": 8 },
            "material": { "kind": "basic", "color": [1.0, 0.0, 0.0] }
        }"#;
        let object: SceneObject = serde_json::from_str(json).unwrap();
        assert_eq!(object.transform, Transform::default());
        assert_eq!(object.transform.scale, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_only_glow_is_transparent() {
        assert!(MaterialPreset::Glow {
            color: [1.0; 3],
            coefficient: 0.7,
            power: 2.0
        }
        .is_transparent());
        assert!(!MaterialPreset::Matcap { color: [1.0; 3] }.is_transparent());
        assert!(!MaterialPreset::Basic { color: [1.0; 3] }.is_transparent());
    }

    #[test]
    fn test_missing_scene_file() {
        let result = SceneDescription::from_file("/nonexistent/scene.json");
        assert!(matches!(result, Err(SceneError::Io { .. })));
    }

    #[test]
    fn test_scene_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let scene = SceneDescription {
            name: "single".to_string(),
            background: [0.0; 3],
            camera: CameraPlacement::default(),
            objects: vec![SceneObject::new(
                "ico",
                Geometry::Icosahedron {
                    radius: 0.5,
                    detail: 1,
                },
                MaterialPreset::Basic { color: [0.2, 0.4, 0.6] },
            )
            .with_transform(Transform::rotated_y(0.5))],
        };
        scene.to_file(&path).unwrap();
        let loaded = SceneDescription::from_file(&path).unwrap();
        assert_eq!(loaded, scene);
    }
}
