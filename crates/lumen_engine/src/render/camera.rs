//! Minimal camera at the render-loop boundary
//!
//! The render tick needs two matrices from the active camera: its
//! world-to-eye transformation and its projection. Anything richer
//! (controllers, frustum extraction) lives outside the engine core.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Camera supplying the view and projection matrices for a frame
#[derive(Debug, Clone)]
pub struct Camera {
    transform: Mat4,
    projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Mat4::identity(),
            projection: Mat4::identity(),
        }
    }
}

impl Camera {
    /// Place the camera at `eye`, looking at `target`
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.transform = Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up);
    }

    /// Configure a perspective projection for a surface of the given
    /// pixel dimensions
    pub fn set_perspective(&mut self, width: u32, height: u32, fov_y_radians: f32, near: f32, far: f32) {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        self.projection = Mat4::new_perspective(aspect, fov_y_radians, near, far);
    }

    /// Reset the camera orientation to the origin looking down -Z
    ///
    /// The projection is kept; navigation resets where the camera is,
    /// not what lens it uses.
    pub fn reset(&mut self) {
        self.transform = Mat4::identity();
    }

    /// World-to-eye transformation matrix
    pub fn transformation_matrix(&self) -> Mat4 {
        self.transform
    }

    /// Projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_restores_identity_transform_but_keeps_projection() {
        let mut camera = Camera::default();
        camera.set_perspective(800, 600, std::f32::consts::FRAC_PI_4, 0.1, 100.0);
        camera.look_at(
            Vec3::new(0.0, 2.0, 5.0),
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let projection = camera.projection_matrix();

        camera.reset();

        assert_eq!(camera.transformation_matrix(), Mat4::identity());
        assert_eq!(camera.projection_matrix(), projection);
    }
}
