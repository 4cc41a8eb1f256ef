//! Packed 4-channel colors.
//!
//! Inside the pipeline, colors are carried as [`Vec4`]s with normalized
//! `[0, 1]` channels; the packed 8-bit form exists only in framebuffer
//! and texture storage, and conversion happens exactly once per fragment
//! at the final write.

use crate::math::vec::{vec4, Vec4};

/// A packed RGBA color, one byte per channel.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[repr(transparent)]
pub struct Color4(pub [u8; 4]);

/// Returns a packed color with the given channel values.
#[inline]
pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color4 {
    Color4([r, g, b, a])
}

impl Color4 {
    pub const BLACK: Self = rgba(0, 0, 0, 0xFF);
    pub const WHITE: Self = rgba(0xFF, 0xFF, 0xFF, 0xFF);

    #[inline]
    pub fn r(&self) -> u8 {
        self.0[0]
    }
    #[inline]
    pub fn g(&self) -> u8 {
        self.0[1]
    }
    #[inline]
    pub fn b(&self) -> u8 {
        self.0[2]
    }
    #[inline]
    pub fn a(&self) -> u8 {
        self.0[3]
    }

    /// Unpacks to a float color with channels in `[0, 1]`.
    #[inline]
    pub fn to_vec4(self) -> Vec4 {
        const S: f32 = 1.0 / 255.0;
        vec4(
            self.0[0] as f32 * S,
            self.0[1] as f32 * S,
            self.0[2] as f32 * S,
            self.0[3] as f32 * S,
        )
    }

    /// Packs a float color, clamping each channel to `[0, 1]`.
    #[inline]
    pub fn from_vec4(c: Vec4) -> Self {
        let pack = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        Color4([pack(c.x()), pack(c.y()), pack(c.z()), pack(c.w())])
    }

    /// Packs to a `0x00RRGGBB` value, the format display frontends expect.
    #[inline]
    pub fn to_rgb_u32(self) -> u32 {
        (self.0[0] as u32) << 16 | (self.0[1] as u32) << 8 | self.0[2] as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let c = rgba(0, 51, 102, 255);
        assert_eq!(Color4::from_vec4(c.to_vec4()), c);
    }

    #[test]
    fn from_vec4_clamps() {
        let c = Color4::from_vec4(vec4(-1.0, 2.0, 0.5, 1.0));
        assert_eq!(c, rgba(0, 255, 128, 255));
    }

    #[test]
    fn rgb_u32_layout() {
        assert_eq!(rgba(0x12, 0x34, 0x56, 0xFF).to_rgb_u32(), 0x123456);
    }
}
