//! Vector and matrix math for the transform pipeline
//!
//! Row-vector convention throughout: a point is transformed as `v * M`,
//! so `world * view * projection` maps model space straight to clip space.

use std::f32::consts::PI;
use std::ops::{Add, Mul, Sub};
use serde::{Serialize, Deserialize};

/// Clamp `value` into `[min, max]`
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    max.min(value).max(min)
}

/// Linear interpolation with the gradient clamped to `[0, 1]`
pub fn interpolate(min: f32, max: f32, gradient: f32) -> f32 {
    min + (max - min) * clamp(gradient, 0.0, 1.0)
}

/// Homogeneous position with texture coordinates
///
/// Once a vertex reaches screen space, `w` no longer holds the homogeneous
/// weight: it becomes the clip marker (`w < 0` means the clip test failed).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
    pub u: f32,
    pub v: f32,
}

impl Default for Vec4 {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 1.0, u: 0.0, v: 0.0 };

    /// Point with `w = 1`
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 1.0, u: 0.0, v: 0.0 }
    }

    pub fn with_w(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w, u: 0.0, v: 0.0 }
    }

    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.u = u;
        self.v = v;
        self
    }

    /// Screen-space validity marker
    pub fn is_visible(&self) -> bool {
        self.w >= 0.0
    }

    pub fn dot(self, other: Vec4) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec4) -> Vec4 {
        Vec4::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Divide by the Euclidean length.
    ///
    /// A zero-length vector yields NaN components; use [`Vec4::try_normalize`]
    /// when the input may be degenerate.
    pub fn normalize(self) -> Vec4 {
        let l = self.length();
        Vec4::new(self.x / l, self.y / l, self.z / l)
    }

    pub fn try_normalize(self) -> Option<Vec4> {
        let l = self.length();
        if l == 0.0 || !l.is_finite() {
            return None;
        }
        Some(Vec4::new(self.x / l, self.y / l, self.z / l))
    }

    /// Angle between two vectors in radians (NaN if either has zero length)
    pub fn angle(self, other: Vec4) -> f32 {
        (self.dot(other) / (self.length() * other.length())).acos()
    }

    pub fn scale(self, s: f32) -> Vec4 {
        Vec4::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Add for Vec4 {
    type Output = Vec4;
    fn add(self, other: Vec4) -> Vec4 {
        Vec4::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vec4 {
    type Output = Vec4;
    fn sub(self, other: Vec4) -> Vec4 {
        Vec4::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f32> for Vec4 {
    type Output = Vec4;
    fn mul(self, s: f32) -> Vec4 {
        self.scale(s)
    }
}

/// Full homogeneous transform; texture coordinates ride along untouched
impl Mul<Mat4> for Vec4 {
    type Output = Vec4;
    fn mul(self, m: Mat4) -> Vec4 {
        let r = &m.m;
        Vec4 {
            x: self.x * r[0][0] + self.y * r[1][0] + self.z * r[2][0] + self.w * r[3][0],
            y: self.x * r[0][1] + self.y * r[1][1] + self.z * r[2][1] + self.w * r[3][1],
            z: self.x * r[0][2] + self.y * r[1][2] + self.z * r[2][2] + self.w * r[3][2],
            w: self.x * r[0][3] + self.y * r[1][3] + self.z * r[2][3] + self.w * r[3][3],
            u: self.u,
            v: self.v,
        }
    }
}

/// 4x4 row-major matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self { m: rows }
    }

    pub fn row(&self, index: usize) -> [f32; 4] {
        self.m[index]
    }

    pub fn translation(dx: f32, dy: f32, dz: f32) -> Self {
        let mut mat = Self::IDENTITY;
        mat.translate(dx, dy, dz);
        mat
    }

    pub fn rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, s, 0.0],
            [0.0, -s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [c, 0.0, -s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::from_rows([
            [c, s, 0.0, 0.0],
            [-s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation built fresh from Euler angles, applied Y, then Z, then X
    pub fn from_euler(x_angle: f32, y_angle: f32, z_angle: f32) -> Self {
        Self::rotation_y(y_angle) * Self::rotation_z(z_angle) * Self::rotation_x(x_angle)
    }

    /// Add an offset into the translation row
    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.m[3][0] += dx;
        self.m[3][1] += dy;
        self.m[3][2] += dz;
    }

    /// Compose a Y, Z, X rotation onto this matrix in place.
    ///
    /// Repeated calls accumulate, and so does rounding error. Anything that
    /// rotates every frame should keep an [`Orientation`] and rebuild instead.
    pub fn rotate(&mut self, x_angle: f32, y_angle: f32, z_angle: f32) {
        *self = *self * Self::from_euler(x_angle, y_angle, z_angle);
    }

    /// Scale the first three rows
    pub fn scale(&mut self, sx: f32, sy: f32, sz: f32) {
        for (row, s) in self.m.iter_mut().zip([sx, sy, sz]) {
            for value in row.iter_mut() {
                *value *= s;
            }
        }
    }

    pub fn approx_eq(&self, other: &Mat4, epsilon: f32) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, other: Mat4) -> Mat4 {
        let mut out = [[0.0; 4]; 4];
        for (j, row) in out.iter_mut().enumerate() {
            for (i, cell) in row.iter_mut().enumerate() {
                *cell = self.m[j][0] * other.m[0][i]
                    + self.m[j][1] * other.m[1][i]
                    + self.m[j][2] * other.m[2][i]
                    + self.m[j][3] * other.m[3][i];
            }
        }
        Mat4 { m: out }
    }
}

/// Euler angle triple (radians) that a rotation matrix is rebuilt from
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Orientation {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Add increments, keeping every angle in `(-PI, PI]`
    pub fn accumulate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x = wrap_angle(self.x + dx);
        self.y = wrap_angle(self.y + dy);
        self.z = wrap_angle(self.z + dz);
    }

    pub fn to_matrix(self) -> Mat4 {
        Mat4::from_euler(self.x, self.y, self.z)
    }
}

fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI { PI } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_matrix() -> Mat4 {
        Mat4::from_rows([
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ])
    }

    #[test]
    fn test_default_is_identity() {
        assert_eq!(Mat4::default(), Mat4::IDENTITY);
    }

    #[test]
    fn test_identity_multiplication() {
        let m = sample_matrix();
        assert_eq!(m * Mat4::IDENTITY, m);
        assert_eq!(Mat4::IDENTITY * m, m);
    }

    #[test]
    fn test_multiplication_not_commutative() {
        let a = Mat4::rotation_x(0.5);
        let b = Mat4::translation(1.0, 2.0, 3.0);
        assert!(!(a * b).approx_eq(&(b * a), 1e-4));
    }

    #[test]
    fn test_multiplication_associative() {
        let a = Mat4::rotation_y(0.3);
        let b = Mat4::translation(1.0, -2.0, 0.5);
        let c = Mat4::rotation_z(-1.1);
        assert!(((a * b) * c).approx_eq(&(a * (b * c)), 1e-5));
    }

    #[test]
    fn test_vec4_dot() {
        let a = Vec4::new(1.0, 2.0, 3.0);
        let b = Vec4::new(4.0, 5.0, 6.0);
        assert!((a.dot(b) - 32.0).abs() < 0.001);
    }

    #[test]
    fn test_vec4_cross() {
        let c = Vec4::new(1.0, 0.0, 0.0).cross(Vec4::new(0.0, 1.0, 0.0));
        assert!((c.z - 1.0).abs() < 0.001);
        assert_eq!(c.w, 1.0);
    }

    #[test]
    fn test_normalize() {
        let n = Vec4::new(3.0, 0.0, 4.0).normalize();
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!((n.z - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_length() {
        assert!(Vec4::ZERO.normalize().x.is_nan());
        assert!(Vec4::ZERO.try_normalize().is_none());
    }

    #[test]
    fn test_angle() {
        let a = Vec4::new(1.0, 0.0, 0.0);
        let b = Vec4::new(0.0, 2.0, 0.0);
        assert!((a.angle(b) - PI / 2.0).abs() < 1e-5);
        assert!(a.angle(Vec4::ZERO).is_nan());
    }

    #[test]
    fn test_translate_row_vector() {
        let mut m = Mat4::IDENTITY;
        m.translate(1.0, 2.0, 3.0);
        m.translate(1.0, 0.0, 0.0);
        let p = Vec4::new(0.0, 0.0, 0.0) * m;
        assert_eq!((p.x, p.y, p.z, p.w), (2.0, 2.0, 3.0, 1.0));
    }

    #[test]
    fn test_transform_keeps_uv() {
        let p = Vec4::new(1.0, 1.0, 1.0).with_uv(0.25, 0.75) * Mat4::rotation_x(1.0);
        assert_eq!((p.u, p.v), (0.25, 0.75));
    }

    #[test]
    fn test_rotate_matches_from_euler() {
        let mut m = Mat4::IDENTITY;
        m.rotate(0.2, 0.4, -0.3);
        assert!(m.approx_eq(&Mat4::from_euler(0.2, 0.4, -0.3), 1e-6));
    }

    #[test]
    fn test_rotate_accumulates() {
        let mut m = Mat4::IDENTITY;
        m.rotate(0.0, 0.25, 0.0);
        m.rotate(0.0, 0.25, 0.0);
        assert!(m.approx_eq(&Mat4::rotation_y(0.5), 1e-6));
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        let p = Vec4::new(1.0, 0.0, 0.0) * Mat4::rotation_z(PI / 2.0);
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_scale_rows() {
        let mut m = Mat4::IDENTITY;
        m.scale(2.0, 3.0, 4.0);
        let p = Vec4::new(1.0, 1.0, 1.0) * m;
        assert_eq!((p.x, p.y, p.z), (2.0, 3.0, 4.0));
    }

    #[test]
    fn test_interpolate_clamps_gradient() {
        assert_eq!(interpolate(2.0, 4.0, 0.5), 3.0);
        assert_eq!(interpolate(2.0, 4.0, -1.0), 2.0);
        assert_eq!(interpolate(2.0, 4.0, 3.0), 4.0);
    }

    #[test]
    fn test_orientation_wraps() {
        let mut o = Orientation::default();
        o.accumulate(3.0, 0.0, 0.0);
        o.accumulate(1.0, 0.0, 0.0);
        assert!(o.x > -PI && o.x <= PI);
        assert!((o.x - (4.0 - 2.0 * PI)).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_identity_is_neutral(values in prop::array::uniform16(-1000.0f32..1000.0)) {
            let mut rows = [[0.0; 4]; 4];
            for (i, value) in values.iter().enumerate() {
                rows[i / 4][i % 4] = *value;
            }
            let m = Mat4::from_rows(rows);
            prop_assert_eq!(m * Mat4::IDENTITY, m);
            prop_assert_eq!(Mat4::IDENTITY * m, m);
        }
    }
}
