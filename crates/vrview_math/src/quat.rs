//! Unit quaternion for 3D rotations
//!
//! Quaternions are stored as `(x, y, z, w)` with `w` the scalar part.
//! Composition follows the usual convention: `a.compose(&b)` applies `b`
//! first, then `a`.

use bytemuck::{Pod, Zeroable};
use serde::{Serialize, Deserialize};
use crate::Vec3;

/// Rotation quaternion
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    /// Identity rotation
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians around `axis` (normalized internally)
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalized();
        let half = angle * 0.5;
        let s = half.sin();
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    /// Build from the upper 3x3 of a pure rotation matrix (column-major, unscaled)
    ///
    /// `m[col][row]` layout, matching [`crate::Mat4`].
    pub fn from_rotation_matrix(m: &[[f32; 4]; 4]) -> Self {
        let (m11, m12, m13) = (m[0][0], m[1][0], m[2][0]);
        let (m21, m22, m23) = (m[0][1], m[1][1], m[2][1]);
        let (m31, m32, m33) = (m[0][2], m[1][2], m[2][2]);
        let trace = m11 + m22 + m33;

        if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            Self::new((m32 - m23) * s, (m13 - m31) * s, (m21 - m12) * s, 0.25 / s)
        } else if m11 > m22 && m11 > m33 {
            let s = 2.0 * (1.0 + m11 - m22 - m33).sqrt();
            Self::new(0.25 * s, (m12 + m21) / s, (m13 + m31) / s, (m32 - m23) / s)
        } else if m22 > m33 {
            let s = 2.0 * (1.0 + m22 - m11 - m33).sqrt();
            Self::new((m12 + m21) / s, 0.25 * s, (m23 + m32) / s, (m13 - m31) / s)
        } else {
            let s = 2.0 * (1.0 + m33 - m11 - m22).sqrt();
            Self::new((m13 + m31) / s, (m23 + m32) / s, 0.25 * s, (m21 - m12) / s)
        }
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Normalize to unit length (identity if degenerate)
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len < 1e-10 {
            return Self::IDENTITY;
        }
        let inv = 1.0 / len;
        Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
    }

    /// Conjugate (the inverse for unit quaternions)
    #[inline]
    pub fn conjugate(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Hamilton product: applies `other` first, then `self`
    pub fn compose(&self, other: &Self) -> Self {
        let (ax, ay, az, aw) = (self.x, self.y, self.z, self.w);
        let (bx, by, bz, bw) = (other.x, other.y, other.z, other.w);
        Self::new(
            ax * bw + aw * bx + ay * bz - az * by,
            ay * bw + aw * by + az * bx - ax * bz,
            az * bw + aw * bz + ax * by - ay * bx,
            aw * bw - ax * bx - ay * by - az * bz,
        )
    }

    /// Rotate a vector
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    /// Whether two quaternions describe the same rotation (q and -q are equal)
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.dot(other).abs() - 1.0).abs() < epsilon
    }
}
