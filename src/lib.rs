//! Orb Scene Library
//!
//! Orbit-camera 3D scenes built from declarative descriptions, with:
//! - Matcap, environment-map and additive glow materials
//! - Windowed and headless wgpu rendering
//! - High-resolution PNG export independent of the window size

pub mod config;
pub mod export;
pub mod render;
pub mod scene;
pub mod viewport;

pub use config::AppConfig;
pub use export::{ExportError, ScreenshotExporter};
pub use viewport::{RenderSurface, Viewport};
