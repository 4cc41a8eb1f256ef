//! Textures and texel sampling.

use crate::math::color::Color4;
use crate::math::vec::Vec4;
use crate::util::buf::Buf2;

/// A fixed-size 2D array of packed texels.
///
/// Sampling is nearest-neighbor with clamping: the normalized coordinate
/// is scaled by the texture dimensions, floored, and clamped to the valid
/// texel range. There is no filtering and no wrapping.
#[derive(Clone, Debug)]
pub struct Texture {
    data: Buf2<Color4>,
}

impl Texture {
    /// Creates a `width` × `height` texture filled with opaque black.
    ///
    /// # Panics
    /// If either dimension is zero.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "texture dimensions must be nonzero");
        Self {
            data: Buf2::new_with(width, height, |_, _| Color4::BLACK),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.data.width()
    }
    #[inline]
    pub fn height(&self) -> u32 {
        self.data.height()
    }

    /// Returns the texel storage.
    #[inline]
    pub fn data(&self) -> &Buf2<Color4> {
        &self.data
    }
    /// Returns the texel storage for writing.
    #[inline]
    pub fn data_mut(&mut self) -> &mut Buf2<Color4> {
        &mut self.data
    }

    /// Samples the texel nearest to the normalized coordinates `(s, t)`,
    /// unpacked to a float color.
    ///
    /// Coordinates outside `[0, 1]` clamp to the edge texels.
    #[inline]
    pub fn sample(&self, s: f32, t: f32) -> Vec4 {
        let w = self.width();
        let h = self.height();
        let x = if s < 0.0 { 0 } else { (s * w as f32) as u32 };
        let y = if t < 0.0 { 0 } else { (t * h as f32) as u32 };
        let x = x.min(w - 1);
        let y = y.min(h - 1);
        self.data[y as usize][x as usize].to_vec4()
    }
}

impl From<Buf2<Color4>> for Texture {
    fn from(data: Buf2<Color4>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use crate::math::color::rgba;

    use super::*;

    fn checker() -> Texture {
        Texture::from(Buf2::from_vec(
            2,
            2,
            vec![
                rgba(0xFF, 0, 0, 0xFF),
                rgba(0, 0xFF, 0, 0xFF),
                rgba(0, 0, 0xFF, 0xFF),
                rgba(0xFF, 0xFF, 0xFF, 0xFF),
            ],
        ))
    }

    #[test]
    fn nearest_lookup() {
        let t = checker();
        assert_eq!(t.sample(0.0, 0.0).x(), 1.0);
        assert_eq!(t.sample(0.6, 0.0).y(), 1.0);
        assert_eq!(t.sample(0.0, 0.6).z(), 1.0);
    }

    #[test]
    #[should_panic]
    fn zero_dimensions_rejected() {
        let _ = Texture::new(0, 4);
    }

    #[test]
    fn out_of_range_clamps() {
        let t = checker();
        assert_eq!(t.sample(-1.0, -1.0), t.sample(0.0, 0.0));
        assert_eq!(t.sample(2.0, 2.0), t.sample(0.9, 0.9));
    }
}
