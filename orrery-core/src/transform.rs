/// 4x4 transformation matrices in the column-major layout shaders expect
use std::ops::Mul;

use crate::vector::Vec3;

/// A 4x4 matrix stored column-major (`m[col * 4 + row]`).
///
/// The storage is private: a `Mat4` only ever comes out of one of the
/// constructors below or out of multiplying two other matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    m: [f32; 16],
}

impl Mat4 {
    const ZERO: Mat4 = Mat4 { m: [0.0; 16] };

    pub fn identity() -> Self {
        let mut r = Self::ZERO;
        r.m[0] = 1.0;
        r.m[5] = 1.0;
        r.m[10] = 1.0;
        r.m[15] = 1.0;
        r
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut r = Self::identity();
        r.m[12] = x;
        r.m[13] = y;
        r.m[14] = z;
        r
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        let mut r = Self::ZERO;
        r.m[0] = x;
        r.m[5] = y;
        r.m[10] = z;
        r.m[15] = 1.0;
        r
    }

    /// Rotation about the Y axis. A positive angle turns +X toward +Z,
    /// the same way orbit angles advance.
    pub fn rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let mut r = Self::identity();
        r.m[0] = c;
        r.m[2] = s;
        r.m[8] = -s;
        r.m[10] = c;
        r
    }

    /// Right-handed perspective projection with a [-1, 1] depth range.
    pub fn perspective(fovy: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        let tan_half_fovy = (fovy / 2.0).tan();
        let mut r = Self::ZERO;
        r.m[0] = 1.0 / (aspect * tan_half_fovy);
        r.m[5] = 1.0 / tan_half_fovy;
        r.m[10] = -(z_far + z_near) / (z_far - z_near);
        r.m[11] = -1.0;
        r.m[14] = -(2.0 * z_far * z_near) / (z_far - z_near);
        r
    }

    /// Right-handed view matrix looking from `eye` toward `center`.
    ///
    /// The side vector comes from `cross(forward, up)` and the camera up from
    /// `cross(side, forward)`, so the basis is orthonormal even when `up` is
    /// not perpendicular to the view direction.
    pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Self {
        let f = (center - eye).normalize();
        let s = f.cross(up).normalize();
        let u = s.cross(f);

        let mut r = Self::identity();
        r.m[0] = s.x;
        r.m[4] = s.y;
        r.m[8] = s.z;

        r.m[1] = u.x;
        r.m[5] = u.y;
        r.m[9] = u.z;

        r.m[2] = -f.x;
        r.m[6] = -f.y;
        r.m[10] = -f.z;

        r.m[12] = -s.dot(eye);
        r.m[13] = -u.dot(eye);
        r.m[14] = f.dot(eye);
        r
    }

    /// `a * b`: applies `b` first, then `a`.
    pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
        let mut r = Self::ZERO;
        for col in 0..4 {
            for row in 0..4 {
                r.m[col * 4 + row] = (0..4).map(|k| a.m[k * 4 + row] * b.m[col * 4 + k]).sum();
            }
        }
        r
    }

    /// Transform a point (w = 1) into homogeneous coordinates.
    pub fn transform_point(&self, p: Vec3) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (row, value) in out.iter_mut().enumerate() {
            *value = self.m[row] * p.x + self.m[4 + row] * p.y + self.m[8 + row] * p.z + self.m[12 + row];
        }
        out
    }

    pub fn get(&self, col: usize, row: usize) -> f32 {
        self.m[col * 4 + row]
    }

    pub fn as_array(&self) -> &[f32; 16] {
        &self.m
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        Mat4::multiply(&self, &rhs)
    }
}

impl From<Mat4> for nalgebra::Matrix4<f32> {
    fn from(mat: Mat4) -> Self {
        nalgebra::Matrix4::from_column_slice(&mat.m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix4, Point3, Vector3};

    fn assert_close(a: &Mat4, b: &Mat4) {
        for (x, y) in a.as_array().iter().zip(b.as_array()) {
            assert!((x - y).abs() < 1e-4, "{:?} != {:?}", a, b);
        }
    }

    fn distance(ours: Mat4, theirs: Matrix4<f32>) -> f32 {
        (Matrix4::from(ours) - theirs).norm()
    }

    fn sample_matrices() -> Vec<Mat4> {
        vec![
            Mat4::translation(1.0, -2.0, 3.5),
            Mat4::scale(2.0, 0.5, 4.0),
            Mat4::rotation_y(0.7),
            Mat4::perspective(1.0, 1.5, 0.1, 100.0),
            Mat4::look_at(Vec3::new(0.0, 3.0, 12.0), Vec3::ZERO, Vec3::UNIT_Y),
            Mat4::translation(4.0, 0.0, 1.0) * Mat4::rotation_y(2.0) * Mat4::scale(1.3, 1.3, 1.3),
        ]
    }

    #[test]
    fn test_identity_is_neutral() {
        let identity = Mat4::identity();
        for m in sample_matrices() {
            assert_close(&(identity * m), &m);
            assert_close(&(m * identity), &m);
        }
    }

    #[test]
    fn test_multiplication_is_associative() {
        let ms = sample_matrices();
        for a in &ms {
            for b in &ms {
                for c in &ms {
                    assert_close(&((*a * *b) * *c), &(*a * (*b * *c)));
                }
            }
        }
    }

    #[test]
    fn test_multiplication_is_not_commutative() {
        let t = Mat4::translation(5.0, 0.0, 0.0);
        let r = Mat4::rotation_y(1.0);
        assert_ne!(t * r, r * t);
    }

    #[test]
    fn test_column_major_layout() {
        let t = Mat4::translation(1.0, 2.0, 3.0);
        assert_eq!(t.get(3, 0), 1.0);
        assert_eq!(t.get(3, 1), 2.0);
        assert_eq!(t.get(3, 2), 3.0);
        assert_eq!(t.as_array()[12], 1.0);
    }

    #[test]
    fn test_rotation_y_turns_x_toward_z() {
        let p = Mat4::rotation_y(std::f32::consts::FRAC_PI_2).transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!(p[0].abs() < 1e-6);
        assert!((p[2] - 1.0).abs() < 1e-6);
        assert_eq!(p[3], 1.0);
    }

    #[test]
    fn test_look_at_rotation_is_orthonormal() {
        let cases = [
            (Vec3::new(0.0, 3.0, 12.0), Vec3::ZERO, Vec3::UNIT_Y),
            (Vec3::new(-5.0, 1.0, 2.0), Vec3::new(3.0, 4.0, -1.0), Vec3::UNIT_Y),
            (Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, 0.0, 1.01), Vec3::new(0.3, 1.0, 0.1)),
        ];
        for (eye, center, up) in cases {
            let view = Mat4::look_at(eye, center, up);
            let rows: Vec<Vec3> = (0..3)
                .map(|row| Vec3::new(view.get(0, row), view.get(1, row), view.get(2, row)))
                .collect();
            for i in 0..3 {
                assert!((rows[i].length() - 1.0).abs() < 1e-5);
                for j in (i + 1)..3 {
                    assert!(rows[i].dot(rows[j]).abs() < 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let eye = Vec3::new(2.0, 3.0, -4.0);
        let view = Mat4::look_at(eye, Vec3::new(0.0, 0.0, 0.0), Vec3::UNIT_Y);
        let p = view.transform_point(eye);
        assert!(p[0].abs() < 1e-5 && p[1].abs() < 1e-5 && p[2].abs() < 1e-5);
    }

    #[test]
    fn test_matches_nalgebra_constructions() {
        assert!(distance(Mat4::translation(1.0, 2.0, 3.0), Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0))) < 1e-6);
        assert!(distance(Mat4::scale(2.0, 3.0, 4.0), Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 3.0, 4.0))) < 1e-6);
        assert!(distance(Mat4::rotation_y(0.4), Matrix4::from_axis_angle(&Vector3::y_axis(), -0.4)) < 1e-5);
        assert!(
            distance(
                Mat4::perspective(1.0472, 4.0 / 3.0, 0.1, 1000.0),
                Matrix4::new_perspective(4.0 / 3.0, 1.0472, 0.1, 1000.0)
            ) < 1e-3
        );

        let eye = Vec3::new(0.0, 3.0, 12.0);
        let center = Vec3::new(1.0, 2.0, 0.0);
        let theirs = Matrix4::look_at_rh(
            &Point3::new(eye.x, eye.y, eye.z),
            &Point3::new(center.x, center.y, center.z),
            &Vector3::y(),
        );
        assert!(distance(Mat4::look_at(eye, center, Vec3::UNIT_Y), theirs) < 1e-4);
    }
}
