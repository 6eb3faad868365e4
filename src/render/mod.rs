//! GPU rendering modules
//!
//! Contains wgpu-based rendering infrastructure:
//! - Gpu: Instance, adapter and device setup
//! - Target: Offscreen colour/depth target with pixel readback
//! - Scene renderer: Per-material pipelines and draw encoding
//! - Pipeline: Windowed renderer with blit and egui overlay
//! - Headless: Window-free renderer for tests and one-shot captures
//! - Camera: Orbit camera controls

pub mod camera;
pub mod gpu;
pub mod headless;
pub mod pipeline;
pub mod scene_renderer;
pub mod target;

pub use camera::Camera;
pub use gpu::GpuError;
pub use headless::HeadlessRenderer;
pub use pipeline::RenderPipeline;
pub use scene_renderer::SceneRenderer;
pub use target::{CaptureError, RenderTarget};
