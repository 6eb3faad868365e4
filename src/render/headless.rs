//! Headless scene renderer
//!
//! Renders a scene into an offscreen target without a window or display.
//! Used by the integration tests and by the `--capture` command-line mode,
//! where it stands in for the windowed pipeline as the exporter's
//! [`RenderSurface`].

use crate::render::camera::Camera;
use crate::render::gpu::{self, GpuError};
use crate::render::scene_renderer::SceneRenderer;
use crate::render::target::{CaptureError, RenderTarget};
use crate::scene::{self, SceneDescription};
use crate::viewport::RenderSurface;

/// Scene renderer bound to an offscreen target
pub struct HeadlessRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    scene: SceneRenderer,
    target: RenderTarget,
    scene_name: String,
    pub camera: Camera,
}

impl HeadlessRenderer {
    /// Create a headless renderer for `description` at `width` x `height`
    ///
    /// # Returns
    /// `GpuError::NoAdapter` when no GPU is available, which callers in tests
    /// treat as a reason to skip.
    pub async fn new(description: &SceneDescription, width: u32, height: u32) -> Result<Self, GpuError> {
        let instance = gpu::create_instance();
        let (_adapter, device, queue) = gpu::request_device(&instance, None, "Headless Device").await?;

        let target = RenderTarget::new(&device, width, height)?;
        let camera = Camera::from_placement(&description.camera, width as f32 / height as f32);
        let assembled = scene::assemble(description);
        let scene = SceneRenderer::new(&device, &assembled, &camera);

        log::debug!(
            "Headless renderer for '{}' at {}x{} ({} triangles)",
            description.name,
            width,
            height,
            scene.triangle_count()
        );

        Ok(Self {
            device,
            queue,
            scene,
            target,
            scene_name: description.name.clone(),
            camera,
        })
    }

    /// Render a frame into the offscreen target
    pub fn render(&mut self) {
        self.camera.update();
        self.scene.update_camera(&self.queue, &self.camera);

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Headless Render Encoder"),
        });
        self.scene
            .encode(&mut encoder, self.target.color_view(), self.target.depth_view());
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Render a frame and return its pixels as tightly packed RGBA rows
    pub fn render_to_buffer(&mut self) -> Result<Vec<u8>, CaptureError> {
        self.render();
        self.target.read_pixels(&self.device, &self.queue)
    }

    /// Get render dimensions
    pub fn size(&self) -> (u32, u32) {
        self.target.size()
    }

    pub fn scene_name(&self) -> &str {
        &self.scene_name
    }

    pub fn triangle_count(&self) -> usize {
        self.scene.triangle_count()
    }

    /// Largest target side the device accepts
    pub fn max_target_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Largest staging buffer the device accepts for a readback
    pub fn max_readback_bytes(&self) -> u64 {
        self.device.limits().max_buffer_size
    }

    /// Orbit the camera
    pub fn orbit_camera(&mut self, delta_x: f32, delta_y: f32) {
        self.camera.orbit(delta_x, delta_y);
    }

    /// Zoom the camera
    pub fn zoom_camera(&mut self, delta: f32) {
        self.camera.zoom(delta);
    }

    /// Set camera distance directly
    pub fn set_camera_distance(&mut self, distance: f32) {
        self.camera.distance = distance.clamp(self.camera.min_distance, self.camera.max_distance);
    }
}

impl RenderSurface for HeadlessRenderer {
    fn set_camera_aspect(&mut self, aspect: f32) {
        self.camera.set_aspect(aspect);
    }

    fn camera_aspect(&self) -> f32 {
        self.camera.aspect
    }

    fn resize_target(&mut self, width: u32, height: u32) -> Result<(), CaptureError> {
        self.target.resize(&self.device, width, height)
    }

    fn target_size(&self) -> (u32, u32) {
        self.target.size()
    }

    fn render_capture(&mut self) -> Result<Vec<u8>, CaptureError> {
        self.render_to_buffer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::presets;

    #[test]
    fn test_headless_renderer_creation() {
        // May fail on systems without GPU, which is acceptable for unit tests
        let result = pollster::block_on(HeadlessRenderer::new(&presets::cage(), 64, 48));
        if let Ok(renderer) = result {
            assert_eq!(renderer.size(), (64, 48));
            assert_eq!(renderer.scene_name(), "cage");
            assert!((renderer.camera_aspect() - 64.0 / 48.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_resize_target_keeps_size_on_failure() {
        let Ok(mut renderer) = pollster::block_on(HeadlessRenderer::new(&presets::halo(), 32, 32)) else {
            return;
        };
        let too_big = renderer.max_target_dimension() + 1;
        assert!(matches!(
            renderer.resize_target(too_big, 16),
            Err(CaptureError::TooLarge { .. })
        ));
        assert_eq!(renderer.target_size(), (32, 32));
    }

    #[test]
    fn test_zero_sized_target_is_rejected() {
        let Ok(mut renderer) = pollster::block_on(HeadlessRenderer::new(&presets::halo(), 32, 32)) else {
            return;
        };
        assert!(matches!(
            renderer.resize_target(0, 16),
            Err(CaptureError::Empty { width: 0, height: 16 })
        ));
        assert_eq!(renderer.target_size(), (32, 32));
    }
}
