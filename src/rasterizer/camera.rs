//! View and projection matrices

use serde::{Serialize, Deserialize};
use super::math::{Mat4, Vec4};

/// Build a view matrix looking from `eye` towards `target`.
///
/// The rotation block holds the camera basis as columns and the last row
/// moves the eye to the origin. Undefined when `up` is parallel to the
/// viewing direction.
pub fn look_at(eye: Vec4, target: Vec4, up: Vec4) -> Mat4 {
    let z = (target - eye).normalize();
    let x = up.cross(z).normalize();
    let y = z.cross(x).normalize();

    Mat4::from_rows([
        [x.x, y.x, z.x, 0.0],
        [x.y, y.y, z.y, 0.0],
        [x.z, y.z, z.z, 0.0],
        [-eye.dot(x), -eye.dot(y), -eye.dot(z), 1.0],
    ])
}

/// Build a perspective projection from a vertical field of view (radians).
///
/// Maps view depth `near` to 0 and `far` to 1 after the divide; clip `w`
/// is the view-space depth. Requires `far > near > 0`.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let t = near * (fov_y / 2.0).tan();
    let r = t * aspect;

    Mat4::from_rows([
        [near / r, 0.0, 0.0, 0.0],
        [0.0, near / t, 0.0, 0.0],
        [0.0, 0.0, far / (far - near), 1.0],
        [0.0, 0.0, -far * near / (far - near), 0.0],
    ])
}

/// Camera placement and lens, supplied once at setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub eye: Vec4,
    pub target: Vec4,
    pub up: Vec4,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(eye: Vec4, target: Vec4, up: Vec4) -> Self {
        Self { eye, target, up, ..Self::default() }
    }

    pub fn with_lens(mut self, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        self.fov_y = fov_y;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self
    }

    /// Match the aspect ratio to a `width` x `height` viewport
    pub fn fit_viewport(&mut self, width: usize, height: usize) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        look_at(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        perspective(self.fov_y, self.aspect, self.near, self.far)
    }
}

impl Default for Camera {
    /// Looking at the origin from +X with Z up, 90 degree lens for 800x600
    fn default() -> Self {
        Self {
            eye: Vec4::new(3.5, 0.0, 0.0),
            target: Vec4::new(0.0, 0.0, 0.0),
            up: Vec4::new(0.0, 0.0, 1.0),
            fov_y: std::f32::consts::FRAC_PI_2,
            aspect: 800.0 / 600.0,
            near: 1.0,
            far: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row3(m: &Mat4, i: usize) -> Vec4 {
        let r = m.row(i);
        Vec4::new(r[0], r[1], r[2])
    }

    fn assert_orthonormal(view: &Mat4) {
        for i in 0..3 {
            assert!((row3(view, i).length() - 1.0).abs() < 1e-5, "row {} not unit", i);
            for j in (i + 1)..3 {
                assert!(row3(view, i).dot(row3(view, j)).abs() < 1e-5, "rows {} {} not orthogonal", i, j);
            }
        }
    }

    #[test]
    fn test_look_at_orthonormal() {
        assert_orthonormal(&Camera::default().view_matrix());
        assert_orthonormal(&look_at(
            Vec4::new(1.0, 2.0, 3.0),
            Vec4::new(-4.0, 0.5, 1.0),
            Vec4::new(0.0, 1.0, 0.0),
        ));
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let cam = Camera::default();
        let p = cam.eye * cam.view_matrix();
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5 && p.z.abs() < 1e-5);
    }

    #[test]
    fn test_look_at_target_on_forward_axis() {
        let cam = Camera::default();
        let p = cam.target * cam.view_matrix();
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5);
        assert!((p.z - 3.5).abs() < 1e-5);
    }

    #[test]
    fn test_look_at_parallel_up_is_degenerate() {
        let view = look_at(Vec4::new(0.0, 0.0, 5.0), Vec4::ZERO, Vec4::new(0.0, 0.0, 1.0));
        assert!(view.row(0)[0].is_nan());
    }

    #[test]
    fn test_camera_builder() {
        let cam = Camera::new(Vec4::new(0.0, -5.0, 0.0), Vec4::ZERO, Vec4::new(0.0, 0.0, 1.0))
            .with_lens(1.0, 2.0, 0.5, 50.0);
        assert_eq!((cam.fov_y, cam.aspect, cam.near, cam.far), (1.0, 2.0, 0.5, 50.0));
        let p = Vec4::ZERO * cam.view_matrix();
        assert!((p.z - 5.0).abs() < 1e-5);
        assert!(cam.projection_matrix().approx_eq(&perspective(1.0, 2.0, 0.5, 50.0), 0.0));
    }

    #[test]
    fn test_fit_viewport() {
        let mut cam = Camera::default();
        cam.fit_viewport(1000, 500);
        assert_eq!(cam.aspect, 2.0);
        cam.fit_viewport(0, 500);
        assert_eq!(cam.aspect, 2.0);
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = perspective(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
        let near = Vec4::new(0.0, 0.0, 1.0) * proj;
        let far = Vec4::new(0.0, 0.0, 100.0) * proj;
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-5);
        assert!((far.w - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_perspective_fov_edge() {
        // 90 degrees vertical: y == z lands on the top clip plane
        let proj = perspective(std::f32::consts::FRAC_PI_2, 2.0, 1.0, 10.0);
        let p = Vec4::new(0.0, 5.0, 5.0) * proj;
        assert!((p.y / p.w - 1.0).abs() < 1e-5);
        let q = Vec4::new(10.0, 0.0, 5.0) * proj;
        assert!((q.x / q.w - 1.0).abs() < 1e-5);
    }
}
