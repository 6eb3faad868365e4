//! Application configuration.
//!
//! Settings load from a JSON file. Every section and field has a default, so a
//! partial file (or none at all) yields a complete configuration; command-line
//! flags override individual values afterwards.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::screenshot::DEFAULT_CAPTURE_ASPECT;
use crate::viewport::DEFAULT_MAX_PIXEL_RATIO;

/// Window creation and pixel-ratio policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,

    /// Initial logical width
    pub width: u32,

    /// Initial logical height
    pub height: u32,

    /// Upper bound on the device pixel ratio used for the render target
    pub max_pixel_ratio: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Orb Scene".to_string(),
            width: 1280,
            height: 720,
            max_pixel_ratio: DEFAULT_MAX_PIXEL_RATIO,
        }
    }
}

/// Screenshot export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Requested capture width; validated when an export runs
    pub width: i64,

    /// Requested capture height; validated when an export runs
    pub height: i64,

    /// Camera aspect during capture; `null` uses width / height
    pub aspect: Option<f32>,

    /// Directory that receives exported files
    pub output_dir: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 3000,
            height: 3000,
            aspect: DEFAULT_CAPTURE_ASPECT,
            output_dir: PathBuf::from("screenshots"),
        }
    }
}

/// Orbit control behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub damping_enabled: bool,

    /// Fraction of the remaining drag velocity applied per frame
    pub damping_factor: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            damping_enabled: true,
            damping_factor: 0.05,
        }
    }
}

impl ControlsConfig {
    /// Damping as the camera expects it
    pub fn damping(&self) -> Option<f32> {
        self.damping_enabled.then_some(self.damping_factor)
    }
}

/// Complete application configuration combining all sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,

    pub capture: CaptureConfig,

    pub controls: ControlsConfig,

    /// Preset name or path to a scene description (`.json`)
    pub scene: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            capture: CaptureConfig::default(),
            controls: ControlsConfig::default(),
            scene: "cage".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file.
    ///
    /// # Arguments
    /// * `path` - Path to the JSON configuration file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Parsed configuration, missing fields defaulted
    /// * `Err` - If file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|error| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            error,
        })?;
        serde_json::from_str(&contents).map_err(|error| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            error,
        })
    }

    /// Save configuration to a JSON file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents =
            serde_json::to_string_pretty(self).map_err(|error| ConfigError::Serialize { error })?;
        fs::write(path.as_ref(), contents).map_err(|error| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Error types for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error when reading or writing configuration files
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
    /// JSON parsing error
    Parse {
        path: PathBuf,
        error: serde_json::Error,
    },
    /// JSON serialization error
    Serialize { error: serde_json::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, error } => {
                write!(
                    formatter,
                    "Failed to read/write config file '{}': {}",
                    path.display(),
                    error
                )
            }
            ConfigError::Parse { path, error } => {
                write!(
                    formatter,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    error
                )
            }
            ConfigError::Serialize { error } => {
                write!(formatter, "Failed to serialize config: {}", error)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { error, .. } => Some(error),
            ConfigError::Parse { error, .. } => Some(error),
            ConfigError::Serialize { error } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!((config.capture.width, config.capture.height), (3000, 3000));
        assert_eq!(config.capture.aspect, Some(1.0));
        assert_eq!(config.capture.output_dir, PathBuf::from("screenshots"));
        assert!((config.window.max_pixel_ratio - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.scene, "cage");
    }

    #[test]
    fn test_damping() {
        let mut controls = ControlsConfig::default();
        assert_eq!(controls.damping(), Some(0.05));
        controls.damping_enabled = false;
        assert_eq!(controls.damping(), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "capture": { "width": 1024 }, "scene": "rings" }"#).unwrap();
        assert_eq!(config.capture.width, 1024);
        assert_eq!(config.capture.height, 3000);
        assert_eq!(config.scene, "rings");
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn test_null_aspect_follows_request() {
        let config: AppConfig = serde_json::from_str(r#"{ "capture": { "aspect": null } }"#).unwrap();
        assert_eq!(config.capture.aspect, None);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.capture.height = 1500;
        config.controls.damping_enabled = false;
        config.to_file(&path).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded.capture.height, 1500);
        assert!(!loaded.controls.damping_enabled);
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::from_file("/nonexistent/config.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
