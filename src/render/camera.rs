//! Orbit camera with optional damping

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use std::f32::consts::PI;

use crate::scene::CameraPlacement;

/// Camera uniform data for GPU
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            camera_pos: [0.0, 0.0, 1.0],
            _padding: 0.0,
        }
    }
}

const ORBIT_SENSITIVITY: f32 = 0.01;
const MAX_PITCH: f32 = PI / 2.0 - 0.01;

/// Orbit camera that rotates around a target point
pub struct Camera {
    /// Target point to look at
    pub target: Vec3,
    /// Distance from target
    pub distance: f32,
    /// Horizontal angle (radians)
    pub yaw: f32,
    /// Vertical angle (radians, clamped)
    pub pitch: f32,
    /// Vertical field of view (radians)
    pub fov: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Zoom limits
    pub min_distance: f32,
    pub max_distance: f32,
    /// Fraction of the pending rotation applied (and removed) per update;
    /// `None` applies drags immediately
    pub damping: Option<f32>,
    yaw_velocity: f32,
    pitch_velocity: f32,
}

impl Camera {
    /// Create a camera at the default placement with given aspect ratio
    pub fn new(aspect: f32) -> Self {
        Self::from_placement(&CameraPlacement::default(), aspect)
    }

    /// Create a camera looking from `placement.position` at `placement.target`
    pub fn from_placement(placement: &CameraPlacement, aspect: f32) -> Self {
        let target = Vec3::from_array(placement.target);
        let offset = Vec3::from_array(placement.position) - target;
        let distance = offset.length().max(f32::EPSILON);

        Self {
            target,
            distance,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).clamp(-1.0, 1.0).asin().clamp(-MAX_PITCH, MAX_PITCH),
            fov: placement.fov_degrees.to_radians(),
            aspect,
            near: placement.near,
            far: placement.far,
            min_distance: 0.2,
            max_distance: 20.0,
            damping: None,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
        }
    }

    /// Calculate camera position from orbit parameters
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Rotate camera around target
    ///
    /// With damping enabled the rotation is queued and eased in by [`Camera::update`].
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        let yaw = -delta_x * ORBIT_SENSITIVITY;
        let pitch = delta_y * ORBIT_SENSITIVITY;
        if self.damping.is_some() {
            self.yaw_velocity += yaw;
            self.pitch_velocity += pitch;
        } else {
            self.rotate(yaw, pitch);
        }
    }

    fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.yaw += yaw;
        self.pitch = (self.pitch + pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Advance damped motion by one frame
    pub fn update(&mut self) {
        let Some(factor) = self.damping else {
            return;
        };
        let factor = factor.clamp(0.0, 1.0);
        let (yaw, pitch) = (self.yaw_velocity * factor, self.pitch_velocity * factor);
        self.rotate(yaw, pitch);
        self.yaw_velocity -= yaw;
        self.pitch_velocity -= pitch;
    }

    /// Zoom in/out
    pub fn zoom(&mut self, delta: f32) {
        self.distance *= 1.0 - delta * 0.1;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
    }

    /// Set aspect ratio; the projection is derived from it on every uniform upload
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// Get combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get camera uniform for GPU
    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection_matrix().to_cols_array_2d(),
            view: self.view_matrix().to_cols_array_2d(),
            camera_pos: self.position().to_array(),
            _padding: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_placement() {
        let camera = Camera::new(1.0);
        let pos = camera.position();
        assert!((pos - Vec3::new(0.0, 0.0, 1.75)).length() < 1e-4);
        assert!((camera.fov - 75.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_placement_off_axis() {
        let placement = CameraPlacement {
            position: [0.0, 0.3, 2.2],
            ..CameraPlacement::default()
        };
        let camera = Camera::from_placement(&placement, 1.0);
        assert!((camera.position() - Vec3::new(0.0, 0.3, 2.2)).length() < 1e-4);
    }

    #[test]
    fn test_camera_uniform_size() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 144);
    }

    #[test]
    fn test_orbit_changes_position() {
        let mut camera = Camera::new(1.0);
        let initial_pos = camera.position();
        camera.orbit(50.0, 50.0);
        let final_pos = camera.position();
        assert!(
            (initial_pos - final_pos).length() > 0.001,
            "Camera position should change after orbit"
        );
    }

    #[test]
    fn test_pitch_clamping() {
        let mut camera = Camera::new(1.0);
        camera.orbit(0.0, 10000.0);
        assert!(camera.pitch <= MAX_PITCH, "got {}", camera.pitch);
        camera.orbit(0.0, -20000.0);
        assert!(camera.pitch >= -MAX_PITCH, "got {}", camera.pitch);
    }

    #[test]
    fn test_zoom_bounds() {
        let mut camera = Camera::new(1.0);
        camera.zoom(1000.0);
        assert!(camera.distance >= camera.min_distance);
        camera.zoom(-1000.0);
        assert!(camera.distance <= camera.max_distance);
    }

    #[test]
    fn test_damped_orbit_eases_in() {
        let mut camera = Camera::new(1.0);
        camera.damping = Some(0.1);
        let initial_yaw = camera.yaw;

        camera.orbit(-100.0, 0.0);
        assert!((camera.yaw - initial_yaw).abs() < f32::EPSILON, "Damped orbit waits for update");

        camera.update();
        let first_step = camera.yaw - initial_yaw;
        assert!((first_step - 0.1).abs() < 1e-5);

        for _ in 0..200 {
            camera.update();
        }
        // Total rotation converges to the undamped amount
        assert!((camera.yaw - initial_yaw - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_update_without_damping_is_noop() {
        let mut camera = Camera::new(1.0);
        camera.orbit(10.0, 0.0);
        let yaw = camera.yaw;
        camera.update();
        assert!((camera.yaw - yaw).abs() < f32::EPSILON);
    }

    #[test]
    fn test_aspect_changes_projection() {
        let mut camera = Camera::new(16.0 / 9.0);
        let wide = camera.projection_matrix();
        camera.set_aspect(1.0);
        let square = camera.projection_matrix();
        assert!((wide.col(0).x - square.col(0).x).abs() > 0.01);
    }

    #[test]
    fn test_camera_uniform_contents() {
        let camera = Camera::new(1.0);
        let uniform = camera.uniform();
        let pos = camera.position();
        assert!((uniform.camera_pos[0] - pos.x).abs() < 0.001);
        assert!((uniform.camera_pos[2] - pos.z).abs() < 0.001);

        let vp = camera.view_projection_matrix();
        for i in 0..4 {
            for j in 0..4 {
                assert!(
                    (uniform.view_proj[i][j] - vp.col(i)[j]).abs() < 0.001,
                    "View-projection matrix mismatch at [{},{}]",
                    i,
                    j
                );
            }
        }
    }
}
