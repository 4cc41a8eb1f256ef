//! The canonical vertex record.
//!
//! A vertex is a fixed set of attribute slots, each a [`Vec4`], plus a
//! bitmask telling which slots actually carry data. Stages only ever touch
//! slots whose bit is set; everything else keeps its neutral default.

use bitflags::bitflags;

use crate::math::vec::{vec4, Vec4};

/// Number of attribute slots in a vertex.
pub const ATTR_COUNT: usize = 7;

/// Identifies one attribute slot of a [`Vertex`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(usize)]
pub enum Attr {
    /// Position; in clip space after the vertex stage, in screen space
    /// (with `w` holding 1/w) inside the rasterizer.
    Position = 0,
    /// Surface normal, `w = 0`.
    Normal = 1,
    /// Vertex color.
    Color = 2,
    /// Texture coordinates, layer 0.
    Tex0 = 3,
    /// Texture coordinates, layer 1.
    Tex1 = 4,
    /// Scratch slot; per-pixel shading keeps the view-space position here.
    Usr0 = 5,
    /// Scratch slot; per-pixel shading keeps its base color here.
    Usr1 = 6,
}

bitflags! {
    /// Bitmask of populated attribute slots, one bit per [`Attr`].
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    pub struct AttrMask: u8 {
        const POSITION = 1 << Attr::Position as usize;
        const NORMAL = 1 << Attr::Normal as usize;
        const COLOR = 1 << Attr::Color as usize;
        const TEX0 = 1 << Attr::Tex0 as usize;
        const TEX1 = 1 << Attr::Tex1 as usize;
        const USR0 = 1 << Attr::Usr0 as usize;
        const USR1 = 1 << Attr::Usr1 as usize;
    }
}

impl Attr {
    /// The mask bit corresponding to this slot.
    #[inline]
    pub fn mask(self) -> AttrMask {
        AttrMask::from_bits_truncate(1 << self as usize)
    }
}

/// A vertex record of [`ATTR_COUNT`] attribute slots and their "used" mask.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub attribs: [Vec4; ATTR_COUNT],
    pub used: AttrMask,
}

impl Vertex {
    /// Returns a vertex with every slot at its neutral default and no
    /// slot marked used: position at the origin (`w = 1`), opaque white
    /// color, zero normal and texture coordinates.
    pub fn new() -> Self {
        let mut attribs = [Vec4::ZERO; ATTR_COUNT];
        attribs[Attr::Position as usize] = vec4(0.0, 0.0, 0.0, 1.0);
        attribs[Attr::Color as usize] = vec4(1.0, 1.0, 1.0, 1.0);
        Self { attribs, used: AttrMask::empty() }
    }

    #[inline]
    pub fn attr(&self, a: Attr) -> Vec4 {
        self.attribs[a as usize]
    }

    /// Stores `v` in slot `a` and marks the slot used.
    #[inline]
    pub fn set(&mut self, a: Attr, v: Vec4) {
        self.attribs[a as usize] = v;
        self.used |= a.mask();
    }

    #[inline]
    pub fn pos(&self) -> Vec4 {
        self.attribs[Attr::Position as usize]
    }

    /// Computes `(a - b) * scale` over the slots used by both vertices.
    ///
    /// This is the slope computation of the rasterizer's edge walk.
    pub(crate) fn diff_scaled(a: &Self, b: &Self, scale: f32) -> Self {
        let mut out = Self::new();
        out.used = a.used & b.used;
        for i in 0..ATTR_COUNT {
            if out.used.bits() & (1 << i) != 0 {
                out.attribs[i] = (a.attribs[i] - b.attribs[i]) * scale;
            }
        }
        out
    }

    /// Computes `a + b * scale` over the slots used by both vertices.
    pub(crate) fn add_scaled(a: &Self, b: &Self, scale: f32) -> Self {
        let mut out = Self::new();
        out.used = a.used & b.used;
        for i in 0..ATTR_COUNT {
            if out.used.bits() & (1 << i) != 0 {
                out.attribs[i] = a.attribs[i] + b.attribs[i] * scale;
            }
        }
        out
    }

    /// Scales every used slot by `s`.
    pub(crate) fn scale_used(&mut self, s: f32) {
        for i in 0..ATTR_COUNT {
            if self.used.bits() & (1 << i) != 0 {
                self.attribs[i] = self.attribs[i] * s;
            }
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new()
    }
}
