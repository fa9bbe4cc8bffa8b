//! 4x4 matrix utilities for affine 3D transforms
//!
//! Matrices are column-major `m[col][row]`, the layout GPU uniform buffers
//! expect. Translation lives in column 3.

use crate::{Quat, Vec3};

/// 4x4 matrix type (column-major)
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Multiply two 4x4 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut result = [[0.0f32; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Build a matrix from translation, rotation, and per-axis scale (T * R * S)
pub fn compose(position: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    let Quat { x, y, z, w } = rotation;
    let (x2, y2, z2) = (x + x, y + y, z + z);
    let (xx, xy, xz) = (x * x2, x * y2, x * z2);
    let (yy, yz, zz) = (y * y2, y * z2, z * z2);
    let (wx, wy, wz) = (w * x2, w * y2, w * z2);

    [
        [(1.0 - (yy + zz)) * scale.x, (xy + wz) * scale.x, (xz - wy) * scale.x, 0.0],
        [(xy - wz) * scale.y, (1.0 - (xx + zz)) * scale.y, (yz + wx) * scale.y, 0.0],
        [(xz + wy) * scale.z, (yz - wx) * scale.z, (1.0 - (xx + yy)) * scale.z, 0.0],
        [position.x, position.y, position.z, 1.0],
    ]
}

/// Split an affine matrix into translation, rotation, and scale
///
/// Assumes no shear. A negative determinant is folded into the X scale.
pub fn decompose(m: Mat4) -> (Vec3, Quat, Vec3) {
    let mut sx = column_length(m, 0);
    let sy = column_length(m, 1);
    let sz = column_length(m, 2);

    if determinant(m) < 0.0 {
        sx = -sx;
    }

    let position = get_position(m);

    let mut r = m;
    let inv = [
        if sx != 0.0 { 1.0 / sx } else { 0.0 },
        if sy != 0.0 { 1.0 / sy } else { 0.0 },
        if sz != 0.0 { 1.0 / sz } else { 0.0 },
    ];
    for (col, s) in inv.iter().enumerate() {
        for row in 0..3 {
            r[col][row] *= s;
        }
    }

    let rotation = Quat::from_rotation_matrix(&r).normalize();
    (position, rotation, Vec3::new(sx, sy, sz))
}

/// Translation component
#[inline]
pub fn get_position(m: Mat4) -> Vec3 {
    Vec3::new(m[3][0], m[3][1], m[3][2])
}

/// Length of one of the basis columns (0 = X, 1 = Y, 2 = Z)
#[inline]
pub fn column_length(m: Mat4, col: usize) -> f32 {
    Vec3::new(m[col][0], m[col][1], m[col][2]).length()
}

/// Pure rotation part of `m`: basis columns normalized, translation dropped
pub fn extract_rotation(m: Mat4) -> Mat4 {
    let mut r = IDENTITY;
    for col in 0..3 {
        let len = column_length(m, col);
        let inv = if len > 0.0 { 1.0 / len } else { 0.0 };
        for row in 0..3 {
            r[col][row] = m[col][row] * inv;
        }
    }
    r
}

/// Transform a point (w = 1), with perspective divide
pub fn transform_point(m: Mat4, v: Vec3) -> Vec3 {
    let w = m[0][3] * v.x + m[1][3] * v.y + m[2][3] * v.z + m[3][3];
    let w = if w != 0.0 { 1.0 / w } else { 1.0 };
    Vec3::new(
        (m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z + m[3][0]) * w,
        (m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z + m[3][1]) * w,
        (m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z + m[3][2]) * w,
    )
}

/// Transform a direction (w = 0); translation is ignored
pub fn transform_direction(m: Mat4, v: Vec3) -> Vec3 {
    Vec3::new(
        m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z,
        m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z,
        m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z,
    )
}

/// Determinant of a 4x4 matrix
pub fn determinant(m: Mat4) -> f32 {
    let a = flatten(m);
    let cofactors = cofactor_row0(&a);
    a[0] * cofactors[0] + a[1] * cofactors[1] + a[2] * cofactors[2] + a[3] * cofactors[3]
}

/// Inverse of a 4x4 matrix, or `None` if singular
pub fn inverse(m: Mat4) -> Option<Mat4> {
    let a = flatten(m);
    let mut inv = [0.0f32; 16];

    inv[0] = a[5] * a[10] * a[15] - a[5] * a[11] * a[14] - a[9] * a[6] * a[15]
        + a[9] * a[7] * a[14] + a[13] * a[6] * a[11] - a[13] * a[7] * a[10];
    inv[4] = -a[4] * a[10] * a[15] + a[4] * a[11] * a[14] + a[8] * a[6] * a[15]
        - a[8] * a[7] * a[14] - a[12] * a[6] * a[11] + a[12] * a[7] * a[10];
    inv[8] = a[4] * a[9] * a[15] - a[4] * a[11] * a[13] - a[8] * a[5] * a[15]
        + a[8] * a[7] * a[13] + a[12] * a[5] * a[11] - a[12] * a[7] * a[9];
    inv[12] = -a[4] * a[9] * a[14] + a[4] * a[10] * a[13] + a[8] * a[5] * a[14]
        - a[8] * a[6] * a[13] - a[12] * a[5] * a[10] + a[12] * a[6] * a[9];
    inv[1] = -a[1] * a[10] * a[15] + a[1] * a[11] * a[14] + a[9] * a[2] * a[15]
        - a[9] * a[3] * a[14] - a[13] * a[2] * a[11] + a[13] * a[3] * a[10];
    inv[5] = a[0] * a[10] * a[15] - a[0] * a[11] * a[14] - a[8] * a[2] * a[15]
        + a[8] * a[3] * a[14] + a[12] * a[2] * a[11] - a[12] * a[3] * a[10];
    inv[9] = -a[0] * a[9] * a[15] + a[0] * a[11] * a[13] + a[8] * a[1] * a[15]
        - a[8] * a[3] * a[13] - a[12] * a[1] * a[11] + a[12] * a[3] * a[9];
    inv[13] = a[0] * a[9] * a[14] - a[0] * a[10] * a[13] - a[8] * a[1] * a[14]
        + a[8] * a[2] * a[13] + a[12] * a[1] * a[10] - a[12] * a[2] * a[9];
    inv[2] = a[1] * a[6] * a[15] - a[1] * a[7] * a[14] - a[5] * a[2] * a[15]
        + a[5] * a[3] * a[14] + a[13] * a[2] * a[7] - a[13] * a[3] * a[6];
    inv[6] = -a[0] * a[6] * a[15] + a[0] * a[7] * a[14] + a[4] * a[2] * a[15]
        - a[4] * a[3] * a[14] - a[12] * a[2] * a[7] + a[12] * a[3] * a[6];
    inv[10] = a[0] * a[5] * a[15] - a[0] * a[7] * a[13] - a[4] * a[1] * a[15]
        + a[4] * a[3] * a[13] + a[12] * a[1] * a[7] - a[12] * a[3] * a[5];
    inv[14] = -a[0] * a[5] * a[14] + a[0] * a[6] * a[13] + a[4] * a[1] * a[14]
        - a[4] * a[2] * a[13] - a[12] * a[1] * a[6] + a[12] * a[2] * a[5];
    inv[3] = -a[1] * a[6] * a[11] + a[1] * a[7] * a[10] + a[5] * a[2] * a[11]
        - a[5] * a[3] * a[10] - a[9] * a[2] * a[7] + a[9] * a[3] * a[6];
    inv[7] = a[0] * a[6] * a[11] - a[0] * a[7] * a[10] - a[4] * a[2] * a[11]
        + a[4] * a[3] * a[10] + a[8] * a[2] * a[7] - a[8] * a[3] * a[6];
    inv[11] = -a[0] * a[5] * a[11] + a[0] * a[7] * a[9] + a[4] * a[1] * a[11]
        - a[4] * a[3] * a[9] - a[8] * a[1] * a[7] + a[8] * a[3] * a[5];
    inv[15] = a[0] * a[5] * a[10] - a[0] * a[6] * a[9] - a[4] * a[1] * a[10]
        + a[4] * a[2] * a[9] + a[8] * a[1] * a[6] - a[8] * a[2] * a[5];

    let det = a[0] * inv[0] + a[1] * inv[4] + a[2] * inv[8] + a[3] * inv[12];
    if det.abs() < 1e-12 {
        return None;
    }

    let inv_det = 1.0 / det;
    let mut result = [[0.0f32; 4]; 4];
    for (i, value) in inv.iter().enumerate() {
        result[i / 4][i % 4] = value * inv_det;
    }
    Some(result)
}

/// Perspective projection (right-handed, clip z in [-1, 1])
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y / 2.0).tan();
    let nf = 1.0 / (near - far);

    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, (far + near) * nf, -1.0],
        [0.0, 0.0, 2.0 * far * near * nf, 0.0],
    ]
}

/// Transpose a matrix
pub fn transpose(m: Mat4) -> Mat4 {
    [
        [m[0][0], m[1][0], m[2][0], m[3][0]],
        [m[0][1], m[1][1], m[2][1], m[3][1]],
        [m[0][2], m[1][2], m[2][2], m[3][2]],
        [m[0][3], m[1][3], m[2][3], m[3][3]],
    ]
}

/// Element-wise approximate equality
pub fn approx_eq(a: Mat4, b: Mat4, epsilon: f32) -> bool {
    a.iter()
        .flatten()
        .zip(b.iter().flatten())
        .all(|(x, y)| (x - y).abs() < epsilon)
}

fn flatten(m: Mat4) -> [f32; 16] {
    let mut a = [0.0f32; 16];
    for (i, value) in a.iter_mut().enumerate() {
        *value = m[i / 4][i % 4];
    }
    a
}

fn cofactor_row0(a: &[f32; 16]) -> [f32; 4] {
    [
        a[5] * a[10] * a[15] - a[5] * a[11] * a[14] - a[9] * a[6] * a[15]
            + a[9] * a[7] * a[14] + a[13] * a[6] * a[11] - a[13] * a[7] * a[10],
        -a[4] * a[10] * a[15] + a[4] * a[11] * a[14] + a[8] * a[6] * a[15]
            - a[8] * a[7] * a[14] - a[12] * a[6] * a[11] + a[12] * a[7] * a[10],
        a[4] * a[9] * a[15] - a[4] * a[11] * a[13] - a[8] * a[5] * a[15]
            + a[8] * a[7] * a[13] + a[12] * a[5] * a[11] - a[12] * a[7] * a[9],
        -a[4] * a[9] * a[14] + a[4] * a[10] * a[13] + a[8] * a[5] * a[14]
            - a[8] * a[6] * a[13] - a[12] * a[5] * a[10] + a[12] * a[6] * a[9],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 0.0001;

    #[test]
    fn test_identity() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!(transform_point(IDENTITY, v).approx_eq(v, EPSILON));
    }

    #[test]
    fn test_compose_applies_scale_rotate_translate() {
        let m = compose(
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_axis_angle(Vec3::Z, FRAC_PI_2),
            Vec3::splat(2.0),
        );
        // X * 2 = (2,0,0), rotated 90° about Z = (0,2,0), + (10,0,0)
        let p = transform_point(m, Vec3::X);
        assert!(p.approx_eq(Vec3::new(10.0, 2.0, 0.0), EPSILON), "got {:?}", p);
    }

    #[test]
    fn test_decompose_roundtrip() {
        let position = Vec3::new(1.0, -2.0, 3.5);
        let rotation = Quat::from_axis_angle(Vec3::new(0.3, 1.0, -0.2), 1.1);
        let scale = Vec3::new(0.5, 2.0, 1.5);

        let (p, r, s) = decompose(compose(position, rotation, scale));
        assert!(p.approx_eq(position, EPSILON));
        assert!(r.approx_eq(&rotation, EPSILON));
        assert!(s.approx_eq(scale, EPSILON));
    }

    #[test]
    fn test_inverse() {
        let m = compose(
            Vec3::new(4.0, 5.0, 6.0),
            Quat::from_axis_angle(Vec3::Y, 0.8),
            Vec3::new(1.0, 3.0, 2.0),
        );
        let inv = inverse(m).expect("matrix is invertible");
        assert!(approx_eq(mul(m, inv), IDENTITY, EPSILON));
        assert!(approx_eq(mul(inv, m), IDENTITY, EPSILON));
    }

    #[test]
    fn test_inverse_singular() {
        let m = compose(Vec3::ZERO, Quat::IDENTITY, Vec3::new(1.0, 0.0, 1.0));
        assert!(inverse(m).is_none());
    }

    #[test]
    fn test_determinant() {
        let m = compose(Vec3::new(7.0, 0.0, 0.0), Quat::IDENTITY, Vec3::new(2.0, 3.0, 4.0));
        assert!((determinant(m) - 24.0).abs() < EPSILON);
    }

    #[test]
    fn test_extract_rotation_drops_scale_and_translation() {
        let rotation = Quat::from_axis_angle(Vec3::X, 0.4);
        let m = compose(Vec3::new(9.0, 9.0, 9.0), rotation, Vec3::splat(3.0));
        let r = extract_rotation(m);
        let expected = compose(Vec3::ZERO, rotation, Vec3::ONE);
        assert!(approx_eq(r, expected, EPSILON));
    }

    #[test]
    fn test_transform_direction_ignores_translation() {
        let m = compose(Vec3::new(100.0, 100.0, 100.0), Quat::IDENTITY, Vec3::ONE);
        assert!(transform_direction(m, Vec3::X).approx_eq(Vec3::X, EPSILON));
    }

    #[test]
    fn test_perspective_aspect() {
        let p = perspective(FRAC_PI_2, 2.0, 0.1, 100.0);
        // tan(45°) = 1, so f = 1 and x scale = 1/aspect
        assert!((p[0][0] - 0.5).abs() < EPSILON);
        assert!((p[1][1] - 1.0).abs() < EPSILON);
        assert_eq!(p[2][3], -1.0);
    }

    #[test]
    fn test_transpose_twice() {
        let m = compose(Vec3::new(1.0, 2.0, 3.0), Quat::from_axis_angle(Vec3::Y, 0.3), Vec3::ONE);
        assert!(approx_eq(transpose(transpose(m)), m, EPSILON));
    }
}
