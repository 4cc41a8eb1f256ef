//! Four-component float vectors.
//!
//! Every quantity flowing through the pipeline, be it a position, a normal,
//! a color, or a texture coordinate, is carried as a [`Vec4`]. Operations
//! are plain value-type arithmetic with no hidden state.

use core::ops::{Add, Index, Mul, Neg, Sub};

/// A vector of four `f32` components.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[repr(transparent)]
pub struct Vec4(pub [f32; 4]);

/// Returns a vector with the given components.
#[inline]
pub const fn vec4(x: f32, y: f32, z: f32, w: f32) -> Vec4 {
    Vec4([x, y, z, w])
}

/// Returns a direction-like vector with `w = 0`.
#[inline]
pub const fn vec3(x: f32, y: f32, z: f32) -> Vec4 {
    Vec4([x, y, z, 0.0])
}

impl Vec4 {
    pub const ZERO: Self = vec4(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub fn x(&self) -> f32 {
        self.0[0]
    }
    #[inline]
    pub fn y(&self) -> f32 {
        self.0[1]
    }
    #[inline]
    pub fn z(&self) -> f32 {
        self.0[2]
    }
    #[inline]
    pub fn w(&self) -> f32 {
        self.0[3]
    }

    /// Returns `self` with the `w` component replaced by `w`.
    #[inline]
    pub fn with_w(self, w: f32) -> Self {
        vec4(self.x(), self.y(), self.z(), w)
    }

    /// Returns the four-component dot product of `self` and `other`.
    #[inline]
    pub fn dot(&self, other: &Self) -> f32 {
        self.0[0] * other.0[0]
            + self.0[1] * other.0[1]
            + self.0[2] * other.0[2]
            + self.0[3] * other.0[3]
    }

    /// Returns the dot product of the `xyz` parts of `self` and `other`.
    #[inline]
    pub fn dot3(&self, other: &Self) -> f32 {
        self.0[0] * other.0[0]
            + self.0[1] * other.0[1]
            + self.0[2] * other.0[2]
    }

    /// Returns the cross product of the `xyz` parts, with `w = 0`.
    #[inline]
    pub fn cross(&self, other: &Self) -> Self {
        let [ax, ay, az, _] = self.0;
        let [bx, by, bz, _] = other.0;
        vec3(ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx)
    }

    /// Returns the Euclidean length of the `xyz` part.
    #[inline]
    pub fn len3(&self) -> f32 {
        self.dot3(self).sqrt()
    }

    /// Returns the `xyz` part scaled to unit length, `w` left as is.
    ///
    /// A vector whose squared length does not exceed `f32::MIN_POSITIVE`
    /// is returned unchanged rather than scaled by a non-finite factor.
    #[inline]
    pub fn normalize(&self) -> Self {
        let len_sq = self.dot3(self);
        if len_sq > f32::MIN_POSITIVE {
            let s = len_sq.sqrt().recip();
            vec4(self.0[0] * s, self.0[1] * s, self.0[2] * s, self.0[3])
        } else {
            *self
        }
    }

    /// Multiplies `self` and `other` component-wise.
    #[inline]
    pub fn mul_elem(&self, other: &Self) -> Self {
        Vec4([
            self.0[0] * other.0[0],
            self.0[1] * other.0[1],
            self.0[2] * other.0[2],
            self.0[3] * other.0[3],
        ])
    }

    /// Linearly interpolates between `self` (at `t = 0`) and `other`
    /// (at `t = 1`).
    #[inline]
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        *self + (*other - *self) * t
    }
}

impl Add for Vec4 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Vec4([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
            self.0[3] + rhs.0[3],
        ])
    }
}

impl Sub for Vec4 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Vec4([
            self.0[0] - rhs.0[0],
            self.0[1] - rhs.0[1],
            self.0[2] - rhs.0[2],
            self.0[3] - rhs.0[3],
        ])
    }
}

impl Mul<f32> for Vec4 {
    type Output = Self;
    #[inline]
    fn mul(self, s: f32) -> Self {
        Vec4([self.0[0] * s, self.0[1] * s, self.0[2] * s, self.0[3] * s])
    }
}

impl Neg for Vec4 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Vec4([-self.0[0], -self.0[1], -self.0[2], -self.0[3]])
    }
}

impl Index<usize> for Vec4 {
    type Output = f32;
    #[inline]
    fn index(&self, i: usize) -> &f32 {
        &self.0[i]
    }
}

impl From<[f32; 4]> for Vec4 {
    #[inline]
    fn from(els: [f32; 4]) -> Self {
        Self(els)
    }
}

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;

    use super::*;

    #[test]
    fn arithmetic() {
        let a = vec4(1.0, 2.0, 3.0, 4.0);
        let b = vec4(4.0, 3.0, 2.0, 1.0);

        assert_eq!(a + b, vec4(5.0, 5.0, 5.0, 5.0));
        assert_eq!(a - b, vec4(-3.0, -1.0, 1.0, 3.0));
        assert_eq!(a * 2.0, vec4(2.0, 4.0, 6.0, 8.0));
        assert_eq!(-a, vec4(-1.0, -2.0, -3.0, -4.0));
        assert_eq!(a.dot(&b), 20.0);
        assert_eq!(a.dot3(&b), 16.0);
    }

    #[test]
    fn cross_of_axes() {
        let x = vec3(1.0, 0.0, 0.0);
        let y = vec3(0.0, 1.0, 0.0);
        assert_eq!(x.cross(&y), vec3(0.0, 0.0, 1.0));
        assert_eq!(y.cross(&x), vec3(0.0, 0.0, -1.0));
    }

    #[test]
    fn normalize_keeps_w() {
        let v = vec4(3.0, 0.0, 4.0, 9.0).normalize();
        assert_approx_eq!(v.x(), 0.6);
        assert_approx_eq!(v.z(), 0.8);
        assert_eq!(v.w(), 9.0);
    }

    #[test]
    fn normalize_of_zero_is_zero() {
        assert_eq!(Vec4::ZERO.normalize(), Vec4::ZERO);
    }

    #[test]
    fn lerp_midpoint() {
        let a = vec4(0.0, 0.0, 0.0, 0.0);
        let b = vec4(2.0, 4.0, 6.0, 8.0);
        assert_eq!(a.lerp(&b, 0.5), vec4(1.0, 2.0, 3.0, 4.0));
    }
}
