//! Render targets.

use crate::math::color::Color4;
use crate::util::buf::Buf2;

/// A framebuffer: a color buffer and a depth buffer of equal size.
///
/// Depth values are stored in `[0, 1]`, 1.0 being the far plane. The
/// buffer is not cleared implicitly; call [`clear`][Self::clear] and
/// [`clear_depth`][Self::clear_depth] between frames as needed.
#[derive(Clone, Debug)]
pub struct Framebuf {
    color: Buf2<Color4>,
    depth: Buf2<f32>,
}

impl Framebuf {
    /// Creates a `width` × `height` framebuffer, color set to opaque
    /// black and depth to 1.0.
    ///
    /// # Panics
    /// If either dimension is zero.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(
            width > 0 && height > 0,
            "framebuffer dimensions must be nonzero"
        );
        Self {
            color: Buf2::new_with(width, height, |_, _| Color4::BLACK),
            depth: Buf2::new_with(width, height, |_, _| 1.0),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.color.width()
    }
    #[inline]
    pub fn height(&self) -> u32 {
        self.color.height()
    }

    #[inline]
    pub fn color(&self) -> &Buf2<Color4> {
        &self.color
    }
    #[inline]
    pub fn color_mut(&mut self) -> &mut Buf2<Color4> {
        &mut self.color
    }
    #[inline]
    pub fn depth(&self) -> &Buf2<f32> {
        &self.depth
    }
    #[inline]
    pub fn depth_mut(&mut self) -> &mut Buf2<f32> {
        &mut self.depth
    }

    /// Sets every color buffer element to `c`.
    pub fn clear(&mut self, c: Color4) {
        self.color.fill(c);
    }

    /// Sets every depth buffer element to `val`.
    pub fn clear_depth(&mut self, val: f32) {
        self.depth.fill(val);
    }
}
