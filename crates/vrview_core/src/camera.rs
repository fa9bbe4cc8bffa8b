//! Perspective camera
//!
//! The camera is not part of a [`crate::SceneGraph`]; it is shared by the
//! raster and overlay renders of the same frame. Its projection is cached and
//! must be refreshed with [`PerspectiveCamera::update_projection_matrix`]
//! after changing `fov`, `aspect`, `near` or `far`.

use vrview_math::{mat4, Mat4, Vec3};

use crate::Transform;

/// Perspective camera with a cached projection matrix
#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Width / height of the viewport
    pub aspect: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
    /// Placement in world space
    pub transform: Transform,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(45.0, 1.0, 0.1, 1000.0)
    }
}

impl PerspectiveCamera {
    /// Create a camera at the origin looking down -Z
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            transform: Transform::identity(),
            projection: mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Builder: set the camera position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Recompute the projection from the current parameters
    pub fn update_projection_matrix(&mut self) {
        let aspect = if self.aspect.is_finite() && self.aspect > 0.0 {
            self.aspect
        } else {
            1.0
        };
        self.projection = mat4::perspective(self.fov.to_radians(), aspect, self.near, self.far);
    }

    /// Cached projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// World-to-camera matrix
    pub fn view_matrix(&self) -> Mat4 {
        mat4::inverse(self.transform.to_matrix()).unwrap_or(mat4::IDENTITY)
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    #[test]
    fn test_projection_tracks_aspect() {
        let mut camera = PerspectiveCamera::new(90.0, 1.0, 0.1, 100.0);
        let before = camera.projection_matrix();

        camera.aspect = 2.0;
        // cached until refreshed
        assert_eq!(camera.projection_matrix(), before);

        camera.update_projection_matrix();
        assert!((camera.projection_matrix()[0][0] - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_degenerate_aspect_falls_back() {
        let mut camera = PerspectiveCamera::default();
        camera.aspect = f32::NAN;
        camera.update_projection_matrix();
        assert!(camera.projection_matrix()[0][0].is_finite());
    }

    #[test]
    fn test_view_matrix_moves_world_opposite() {
        let camera = PerspectiveCamera::default().with_position(Vec3::new(0.0, 0.0, 5.0));
        let p = mat4::transform_point(camera.view_matrix(), Vec3::ZERO);
        assert!(p.approx_eq(Vec3::new(0.0, 0.0, -5.0), EPSILON));
    }
}
