//! Input assembly: raw buffer decoding, draw calls, immediate mode.
//!
//! A draw call walks a caller-provided byte buffer, decoding one
//! [`Vertex`] per stride according to the active [`VertexFormat`], and
//! feeds whole triangles through the vertex stage and the rasterizer.
//! Counts are rounded down to a multiple of three; a triangle
//! referencing an out-of-range index is skipped entirely.
//!
//! Indexed draws keep a small direct-mapped cache of already-shaded
//! vertices keyed by `index % CACHE_SIZE`, because adjacent triangles in
//! a typical mesh share vertices and re-shading dominates the per-vertex
//! cost. The cache is invalidated at the start of every indexed draw.

use bitflags::bitflags;
use log::{trace, warn};

use crate::math::vec::{vec3, vec4};
use crate::render::ctx::{Context, ShadeModel, CACHE_SIZE, MAX_TEXTURES};
use crate::render::raster;
use crate::render::target::Framebuf;
use crate::render::tl;
use crate::render::vertex::{Attr, Vertex};

bitflags! {
    /// Describes the byte layout of one vertex in a raw buffer.
    ///
    /// The position and color groups are mutually exclusive; if several
    /// bits of a group are set, the lowest-valued one wins.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
    pub struct VertexFormat: u16 {
        /// Two-component float position.
        const POSITION_F2 = 0x0001;
        /// Three-component float position.
        const POSITION_F3 = 0x0002;
        /// Four-component float position.
        const POSITION_F4 = 0x0004;

        /// Three-component float normal.
        const NORMAL_F3 = 0x0010;

        /// Three-component float color.
        const COLOR_F3 = 0x0100;
        /// Four-component float color.
        const COLOR_F4 = 0x0200;
        /// Three-component byte color, scaled from [0,255] to [0,1].
        const COLOR_UB3 = 0x0400;
        /// Four-component byte color, scaled from [0,255] to [0,1].
        const COLOR_UB4 = 0x0800;

        /// Two-component float texture coordinates, layer 0.
        const TEX0 = 0x1000;
    }
}

impl VertexFormat {
    /// Size of one vertex in bytes.
    pub fn stride(self) -> usize {
        const F: usize = 4;
        let mut n = 0;

        if self.contains(Self::POSITION_F2) {
            n += 2 * F;
        } else if self.contains(Self::POSITION_F3) {
            n += 3 * F;
        } else if self.contains(Self::POSITION_F4) {
            n += 4 * F;
        }

        if self.contains(Self::NORMAL_F3) {
            n += 3 * F;
        }

        if self.contains(Self::COLOR_F3) {
            n += 3 * F;
        } else if self.contains(Self::COLOR_F4) {
            n += 4 * F;
        } else if self.contains(Self::COLOR_UB3) {
            n += 3;
        } else if self.contains(Self::COLOR_UB4) {
            n += 4;
        }

        if self.contains(Self::TEX0) {
            n += 2 * F;
        }
        n
    }
}

/// Reads scalars off the front of a byte slice.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn f32(&mut self) -> f32 {
        let p = self.pos;
        self.pos += 4;
        f32::from_ne_bytes([
            self.buf[p],
            self.buf[p + 1],
            self.buf[p + 2],
            self.buf[p + 3],
        ])
    }

    fn u8(&mut self) -> u8 {
        let b = self.buf[self.pos];
        self.pos += 1;
        b
    }
}

/// Decodes one vertex from `bytes`, which must hold at least
/// `format.stride()` bytes. Attributes absent from the format keep
/// their defaults; the position slot is always marked used.
pub(crate) fn decode_vertex(format: VertexFormat, bytes: &[u8]) -> Vertex {
    let mut cur = Cursor::new(bytes);
    let mut v = Vertex::new();

    if format.contains(VertexFormat::POSITION_F2) {
        v.set(Attr::Position, vec4(cur.f32(), cur.f32(), 0.0, 1.0));
    } else if format.contains(VertexFormat::POSITION_F3) {
        v.set(Attr::Position, vec4(cur.f32(), cur.f32(), cur.f32(), 1.0));
    } else if format.contains(VertexFormat::POSITION_F4) {
        v.set(
            Attr::Position,
            vec4(cur.f32(), cur.f32(), cur.f32(), cur.f32()),
        );
    } else {
        v.used |= Attr::Position.mask();
    }

    if format.contains(VertexFormat::NORMAL_F3) {
        v.set(Attr::Normal, vec3(cur.f32(), cur.f32(), cur.f32()));
    }

    if format.contains(VertexFormat::COLOR_F3) {
        v.set(Attr::Color, vec4(cur.f32(), cur.f32(), cur.f32(), 1.0));
    } else if format.contains(VertexFormat::COLOR_F4) {
        v.set(Attr::Color, vec4(cur.f32(), cur.f32(), cur.f32(), cur.f32()));
    } else if format.contains(VertexFormat::COLOR_UB3) {
        const S: f32 = 1.0 / 255.0;
        v.set(
            Attr::Color,
            vec4(
                cur.u8() as f32 * S,
                cur.u8() as f32 * S,
                cur.u8() as f32 * S,
                1.0,
            ),
        );
    } else if format.contains(VertexFormat::COLOR_UB4) {
        const S: f32 = 1.0 / 255.0;
        v.set(
            Attr::Color,
            vec4(
                cur.u8() as f32 * S,
                cur.u8() as f32 * S,
                cur.u8() as f32 * S,
                cur.u8() as f32 * S,
            ),
        );
    }

    if format.contains(VertexFormat::TEX0) {
        v.set(Attr::Tex0, vec4(cur.f32(), cur.f32(), 0.0, 0.0));
    }

    v
}

impl Context {
    /// Draws `count` vertices (rounded down to a multiple of three)
    /// from the raw buffer `verts`, three consecutive vertices per
    /// triangle. A no-op inside an immediate-mode bracket or if the
    /// buffer runs out of bytes.
    pub fn draw_triangles(
        &mut self,
        fb: &mut Framebuf,
        verts: &[u8],
        count: usize,
    ) {
        if self.imm.active {
            return;
        }
        let stride = self.vertex_format.stride();
        let count = count - count % 3;
        trace!("draw_triangles: {count} vertices, stride {stride}");

        let mut off = 0;
        for _ in 0..count / 3 {
            let mut tri = [Vertex::new(); 3];
            for v in &mut tri {
                if off + stride > verts.len() {
                    warn!(
                        "vertex buffer ends short of {count} vertices, \
                         stopping at byte {off}"
                    );
                    return;
                }
                *v = decode_vertex(self.vertex_format, &verts[off..off + stride]);
                off += stride;
            }
            let [a, b, c] = tri;
            tl::shade_triangle(self, fb, a, b, c);
        }
    }

    /// Draws the triangle list in `indices` (rounded down to a multiple
    /// of three) against `vertex_count` vertices in `verts`. A triangle
    /// with any index out of range, or whose vertex data lies beyond
    /// the end of the buffer, is skipped whole.
    pub fn draw_triangles_indexed(
        &mut self,
        fb: &mut Framebuf,
        verts: &[u8],
        vertex_count: usize,
        indices: &[u16],
    ) {
        if self.imm.active {
            return;
        }
        let stride = self.vertex_format.stride();
        let count = indices.len() - indices.len() % 3;
        trace!("draw_triangles_indexed: {count} indices, stride {stride}");

        // Vertex data or transforms may have changed since the last
        // draw; start from an empty cache.
        self.tl_cache = [None; CACHE_SIZE];

        // Flat shading is evaluated per triangle, so its vertices
        // cannot be shaded ahead of time and cached.
        let cacheable = self.shade_model != ShadeModel::Flat;

        'tri: for tri in indices[..count].chunks_exact(3) {
            let mut staged = [Vertex::new(); 3];

            for (slot, &index) in staged.iter_mut().zip(tri) {
                if index as usize >= vertex_count {
                    warn!("index {index} out of range, skipping triangle");
                    continue 'tri;
                }
                let off = index as usize * stride;
                if off + stride > verts.len() {
                    warn!("vertex {index} beyond buffer end, skipping triangle");
                    continue 'tri;
                }

                if cacheable {
                    let key = index as usize % CACHE_SIZE;
                    *slot = match self.tl_cache[key] {
                        Some((i, v)) if i == index => v,
                        _ => {
                            let mut v = decode_vertex(
                                self.vertex_format,
                                &verts[off..off + stride],
                            );
                            tl::vertex_stage(self, &mut v);
                            self.tl_cache[key] = Some((index, v));
                            v
                        }
                    };
                } else {
                    *slot =
                        decode_vertex(self.vertex_format, &verts[off..off + stride]);
                }
            }

            let [a, b, c] = staged;
            if cacheable {
                raster::rasterize(self, fb, &a, &b, &c);
            } else {
                tl::shade_triangle(self, fb, a, b, c);
            }
        }
    }

    /// Opens an immediate-mode bracket. Buffer draw calls are ignored
    /// until [`end`][Self::end].
    pub fn begin(&mut self) {
        if !self.imm.active {
            self.imm.next = Vertex::new();
            self.imm.count = 0;
            self.imm.active = true;
        }
    }

    /// Submits one vertex with the pending attribute state. Every third
    /// call flushes a triangle through the pipeline.
    pub fn vertex(&mut self, fb: &mut Framebuf, x: f32, y: f32, z: f32, w: f32) {
        if !self.imm.active {
            return;
        }
        self.imm.next.set(Attr::Position, vec4(x, y, z, w));
        self.imm.verts[self.imm.count] = self.imm.next;
        self.imm.count += 1;

        if self.imm.count == 3 {
            self.imm.count = 0;
            let [a, b, c] = self.imm.verts;
            tl::shade_triangle(self, fb, a, b, c);
        }
    }

    /// Sets the pending color, applied to every subsequent
    /// [`vertex`][Self::vertex] until overwritten.
    pub fn color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        if self.imm.active {
            self.imm.next.set(Attr::Color, vec4(r, g, b, a));
        }
    }

    /// Sets the pending normal.
    pub fn normal(&mut self, x: f32, y: f32, z: f32) {
        if self.imm.active {
            self.imm.next.set(Attr::Normal, vec3(x, y, z));
        }
    }

    /// Sets the pending texture coordinates for `layer`.
    pub fn texcoord(&mut self, layer: usize, s: f32, t: f32) {
        if self.imm.active && layer < MAX_TEXTURES {
            let attr = if layer == 0 { Attr::Tex0 } else { Attr::Tex1 };
            self.imm.next.set(attr, vec4(s, t, 0.0, 0.0));
        }
    }

    /// Closes the immediate-mode bracket, discarding any vertices of an
    /// unfinished triangle.
    pub fn end(&mut self) {
        if self.imm.active {
            self.imm.next = Vertex::new();
            self.imm.count = 0;
            self.imm.active = false;
        }
    }
}
