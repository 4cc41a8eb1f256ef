//! Column-major 4×4 matrices.
//!
//! The element layout matches the classic fixed-function convention:
//! sixteen floats in column-major order, so the translation part of an
//! affine transform occupies elements 12–14.

use crate::math::vec::{vec4, Vec4};

/// A 4×4 matrix of `f32`, stored column-major.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(transparent)]
pub struct Mat4(pub [f32; 16]);

impl Mat4 {
    pub const IDENTITY: Self = Mat4([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    /// Returns the element at mathematical `row`, `col`.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.0[col * 4 + row]
    }

    /// Transforms `v` by the full 4×4 matrix.
    #[inline]
    pub fn apply(&self, v: &Vec4) -> Vec4 {
        let m = &self.0;
        vec4(
            m[0] * v.x() + m[4] * v.y() + m[8] * v.z() + m[12] * v.w(),
            m[1] * v.x() + m[5] * v.y() + m[9] * v.z() + m[13] * v.w(),
            m[2] * v.x() + m[6] * v.y() + m[10] * v.z() + m[14] * v.w(),
            m[3] * v.x() + m[7] * v.y() + m[11] * v.z() + m[15] * v.w(),
        )
    }

    /// Transforms `v` by the upper-left 3×3 part, yielding `w = 0`.
    ///
    /// Used for direction-like quantities such as normals, which are not
    /// subject to translation.
    #[inline]
    pub fn apply_linear(&self, v: &Vec4) -> Vec4 {
        let m = &self.0;
        vec4(
            m[0] * v.x() + m[4] * v.y() + m[8] * v.z(),
            m[1] * v.x() + m[5] * v.y() + m[9] * v.z(),
            m[2] * v.x() + m[6] * v.y() + m[10] * v.z(),
            0.0,
        )
    }

    /// Returns the 3×3 determinant of the minor formed by deleting
    /// `row` and `col`.
    fn minor(&self, row: usize, col: usize) -> f32 {
        let pick = |skip: usize| {
            let mut it = (0..4).filter(move |&i| i != skip);
            [it.next().unwrap(), it.next().unwrap(), it.next().unwrap()]
        };
        let (rs, cs) = (pick(row), pick(col));
        let m = |i: usize, j: usize| self.at(rs[i], cs[j]);

        m(0, 0) * (m(1, 1) * m(2, 2) - m(1, 2) * m(2, 1))
            - m(0, 1) * (m(1, 0) * m(2, 2) - m(1, 2) * m(2, 0))
            + m(0, 2) * (m(1, 0) * m(2, 1) - m(1, 1) * m(2, 0))
    }

    /// Returns the cofactor at `row`, `col`.
    #[inline]
    fn cofactor(&self, row: usize, col: usize) -> f32 {
        let minor = self.minor(row, col);
        if (row + col) % 2 == 0 { minor } else { -minor }
    }

    /// Returns the determinant, by cofactor expansion along column 0.
    pub fn determinant(&self) -> f32 {
        (0..4).map(|r| self.at(r, 0) * self.cofactor(r, 0)).sum()
    }

    /// Returns the transpose of the inverse of `self`, for transforming
    /// normals.
    ///
    /// If `self` is singular (determinant within `f32::MIN_POSITIVE` of
    /// zero) there is no inverse; the identity matrix is returned instead.
    /// This matches the reference fixed-function behavior rather than
    /// attempting any numerically fancier recovery.
    pub fn normal_matrix(&self) -> Mat4 {
        let det = self.determinant();
        if det.abs() <= f32::MIN_POSITIVE {
            return Self::IDENTITY;
        }
        // transpose(inverse(M)) is the cofactor matrix divided by det
        let recip = det.recip();
        let mut out = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                out[col * 4 + row] = self.cofactor(row, col) * recip;
            }
        }
        Mat4(out)
    }

    /// Returns a translation matrix.
    pub fn translate(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::IDENTITY;
        m.0[12] = x;
        m.0[13] = y;
        m.0[14] = z;
        m
    }

    /// Returns a rotation matrix about the x axis, angle in radians.
    pub fn rotate_x(a: f32) -> Self {
        let (sin, cos) = a.sin_cos();
        let mut m = Self::IDENTITY;
        m.0[5] = cos;
        m.0[6] = sin;
        m.0[9] = -sin;
        m.0[10] = cos;
        m
    }

    /// Returns a rotation matrix about the y axis, angle in radians.
    pub fn rotate_y(a: f32) -> Self {
        let (sin, cos) = a.sin_cos();
        let mut m = Self::IDENTITY;
        m.0[0] = cos;
        m.0[2] = -sin;
        m.0[8] = sin;
        m.0[10] = cos;
        m
    }

    /// Returns a perspective projection matrix.
    ///
    /// `fov_y` is the vertical field of view in radians; `near` and `far`
    /// are the distances to the clip planes, both positive.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = (fov_y * 0.5).tan().recip();
        let mut m = Mat4([0.0; 16]);
        m.0[0] = f / aspect;
        m.0[5] = f;
        m.0[10] = (far + near) / (near - far);
        m.0[11] = -1.0;
        m.0[14] = 2.0 * far * near / (near - far);
        m
    }

    /// Multiplies `self` by `other`, so that applying the result equals
    /// applying `other` first and `self` second.
    pub fn compose(&self, other: &Mat4) -> Mat4 {
        let mut out = [0.0; 16];
        for col in 0..4 {
            let c = other.col(col);
            let v = self.apply(&c);
            out[col * 4..col * 4 + 4].copy_from_slice(&v.0);
        }
        Mat4(out)
    }

    #[inline]
    fn col(&self, c: usize) -> Vec4 {
        vec4(self.0[c * 4], self.0[c * 4 + 1], self.0[c * 4 + 2], self.0[c * 4 + 3])
    }
}

impl From<[f32; 16]> for Mat4 {
    #[inline]
    fn from(els: [f32; 16]) -> Self {
        Self(els)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;
    use crate::math::vec::vec3;

    use super::*;

    #[test]
    fn identity_apply_is_noop() {
        let v = vec4(1.0, 2.0, 3.0, 4.0);
        assert_eq!(Mat4::IDENTITY.apply(&v), v);
    }

    #[test]
    fn translate_moves_points_not_directions() {
        let m = Mat4::translate(1.0, 2.0, 3.0);
        let p = vec4(0.0, 0.0, 0.0, 1.0);
        assert_eq!(m.apply(&p), vec4(1.0, 2.0, 3.0, 1.0));
        assert_eq!(m.apply_linear(&vec3(1.0, 0.0, 0.0)), vec3(1.0, 0.0, 0.0));
    }

    #[test]
    fn determinant_of_scale() {
        let mut m = Mat4::IDENTITY;
        m.0[0] = 2.0;
        m.0[5] = 3.0;
        assert_approx_eq!(m.determinant(), 6.0);
    }

    #[test]
    fn normal_matrix_of_rotation_is_rotation() {
        let m = Mat4::rotate_y(0.7);
        let n = m.normal_matrix();
        for i in 0..16 {
            assert_approx_eq!(n.0[i], m.0[i]);
        }
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let mut m = Mat4::IDENTITY;
        m.0[0] = 2.0;
        // A normal along x on a surface squashed in x must stay along x
        // but be rescaled by 1/2.
        let n = m.normal_matrix().apply_linear(&vec3(1.0, 0.0, 0.0));
        assert_approx_eq!(n.x(), 0.5);
        assert_approx_eq!(n.y(), 0.0);
    }

    #[test]
    fn singular_falls_back_to_identity() {
        let m = Mat4([0.0; 16]);
        assert_eq!(m.normal_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn compose_applies_right_to_left() {
        let t = Mat4::translate(1.0, 0.0, 0.0);
        let r = Mat4::rotate_y(core::f32::consts::FRAC_PI_2);
        // Rotate first, then translate.
        let m = t.compose(&r);
        let v = m.apply(&vec4(0.0, 0.0, -1.0, 1.0));
        assert_approx_eq!(v.x(), 0.0, eps = 1e-6);
        assert_approx_eq!(v.z(), 0.0, eps = 1e-6);
    }
}
