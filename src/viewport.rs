//! Viewport sizing
//!
//! The camera aspect and the render-target size are shared between the
//! window-resize path and screenshot capture. [`Viewport`] owns the window
//! dimensions and is the only code that writes either value to a
//! [`RenderSurface`]; both [`Viewport::apply_window_size`] and
//! [`Viewport::apply_capture_size`] go through the same private `apply`.

use crate::render::target::CaptureError;

/// Default upper bound on the device pixel ratio
pub const DEFAULT_MAX_PIXEL_RATIO: f64 = 2.0;

/// A drawable target with a camera, as driven by the viewport and the exporter
pub trait RenderSurface {
    /// Set the camera aspect ratio and recompute its projection
    fn set_camera_aspect(&mut self, aspect: f32);

    fn camera_aspect(&self) -> f32;

    /// Resize the render target; on failure the previous size is kept
    fn resize_target(&mut self, width: u32, height: u32) -> Result<(), CaptureError>;

    fn target_size(&self) -> (u32, u32);

    /// Render the scene once into the target and read it back as tightly
    /// packed RGBA8 rows of `target_size()`
    fn render_capture(&mut self) -> Result<Vec<u8>, CaptureError>;
}

/// On-screen window dimensions and pixel-ratio policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Logical window width
    pub width: u32,
    /// Logical window height
    pub height: u32,
    /// Window scale factor (device pixel ratio)
    pub scale_factor: f64,
    pub max_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            scale_factor,
            max_pixel_ratio: DEFAULT_MAX_PIXEL_RATIO,
        }
    }

    pub fn with_max_pixel_ratio(mut self, max_pixel_ratio: f64) -> Self {
        self.max_pixel_ratio = max_pixel_ratio;
        self
    }

    /// Record new window dimensions (does not touch any surface)
    pub fn set_window_size(&mut self, width: u32, height: u32, scale_factor: f64) {
        self.width = width;
        self.height = height;
        self.scale_factor = scale_factor;
    }

    /// Device pixel ratio, clamped to `max_pixel_ratio`
    pub fn pixel_ratio(&self) -> f64 {
        self.scale_factor.min(self.max_pixel_ratio)
    }

    /// Render-target size for the current window
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let ratio = self.pixel_ratio();
        let scale = |logical: u32| ((logical as f64 * ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }

    /// Window aspect ratio (width / height)
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn is_visible(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Restore camera aspect and target size from the window
    ///
    /// A zero-area (minimised) window leaves the surface untouched.
    pub fn apply_window_size<S: RenderSurface + ?Sized>(&self, surface: &mut S) -> Result<(), CaptureError> {
        if !self.is_visible() {
            return Ok(());
        }
        let (width, height) = self.drawing_buffer_size();
        self.apply(surface, self.aspect(), width, height)
    }

    /// Switch the surface to capture dimensions
    pub fn apply_capture_size<S: RenderSurface + ?Sized>(
        &self,
        surface: &mut S,
        width: u32,
        height: u32,
        aspect: f32,
    ) -> Result<(), CaptureError> {
        self.apply(surface, aspect, width, height)
    }

    fn apply<S: RenderSurface + ?Sized>(
        &self,
        surface: &mut S,
        aspect: f32,
        width: u32,
        height: u32,
    ) -> Result<(), CaptureError> {
        surface.set_camera_aspect(aspect);
        surface.resize_target(width, height)
    }
}
