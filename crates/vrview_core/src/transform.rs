//! 3D Transform (position, rotation, scale)
//!
//! A Transform represents the local placement of a scene node relative to its
//! parent. World placement is the product of the chain of parent transforms.

use vrview_math::{mat4, Mat4, Quat, Vec3};
use serde::{Serialize, Deserialize};

/// A 3D transform with position, rotation, and per-axis scale
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position relative to the parent
    pub position: Vec3,
    /// Rotation relative to the parent
    pub rotation: Quat,
    /// Per-axis scale
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Create an identity transform (no translation, rotation, or scale change)
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Decompose an affine matrix into a transform
    pub fn from_matrix(m: Mat4) -> Self {
        let (position, rotation, scale) = mat4::decompose(m);
        Self { position, rotation, scale }
    }

    /// Builder: set a uniform scale
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Compose into a local matrix (T * R * S)
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        mat4::compose(self.position, self.rotation, self.scale)
    }

    /// Transform a point from local space to parent space
    ///
    /// Applies scale, then rotation, then translation.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.rotate(p.component_mul(self.scale)) + self.position
    }

    /// Transform a direction from local space to parent space
    ///
    /// Applies scale and rotation, but not translation.
    pub fn transform_direction(&self, d: Vec3) -> Vec3 {
        self.rotation.rotate(d.component_mul(self.scale))
    }

    /// Translate the transform by an offset
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Rotate the transform by a quaternion (applied after the current rotation)
    pub fn rotate(&mut self, q: Quat) {
        self.rotation = q.compose(&self.rotation).normalize();
    }

    /// Approximate equality of position, rotation, and scale
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.position.approx_eq(other.position, epsilon)
            && self.rotation.approx_eq(&other.rotation, epsilon)
            && self.scale.approx_eq(other.scale, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 0.0001;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(t.transform_point(p).approx_eq(p, EPSILON));
    }

    #[test]
    fn test_transform_order() {
        // Transform applies: scale, then rotate, then translate
        let mut t = Transform::from_position_rotation(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_axis_angle(Vec3::Z, FRAC_PI_2),
        );
        t.scale = Vec3::splat(2.0);

        let transformed = t.transform_point(Vec3::X);
        assert!(transformed.approx_eq(Vec3::new(10.0, 2.0, 0.0), EPSILON),
            "Expected (10, 2, 0), got {:?}", transformed);
    }

    #[test]
    fn test_matrix_agrees_with_transform_point() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(Vec3::new(1.0, 1.0, 1.0), 0.9),
            scale: Vec3::new(1.0, 2.0, 0.5),
        };
        let p = Vec3::new(-3.0, 0.5, 4.0);
        let via_matrix = mat4::transform_point(t.to_matrix(), p);
        assert!(via_matrix.approx_eq(t.transform_point(p), EPSILON));
    }

    #[test]
    fn test_from_matrix_roundtrip() {
        let t = Transform {
            position: Vec3::new(-1.0, 0.25, 8.0),
            rotation: Quat::from_axis_angle(Vec3::Y, 2.0),
            scale: Vec3::new(3.0, 1.0, 1.0),
        };
        let back = Transform::from_matrix(t.to_matrix());
        assert!(back.approx_eq(&t, EPSILON), "Expected {:?}, got {:?}", t, back);
    }

    #[test]
    fn test_transform_direction_ignores_position() {
        let t = Transform::from_position(Vec3::new(100.0, 100.0, 100.0));
        assert!(t.transform_direction(Vec3::X).approx_eq(Vec3::X, EPSILON));
    }

    #[test]
    fn test_default() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
    }
}
