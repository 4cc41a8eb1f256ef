//! The pipeline state aggregate.
//!
//! All configurable pipeline state lives in a caller-owned [`Context`]:
//! matrices, lights, material, flags, viewport, texture bindings, the
//! shading model, and the scratch state of indexed and immediate-mode
//! draws. The draw operations (`render::input`) borrow the context and a
//! target framebuffer; nothing is global.

use std::rc::Rc;

use bitflags::bitflags;

use crate::math::mat::Mat4;
use crate::math::vec::{vec4, Vec4};
use crate::render::input::VertexFormat;
use crate::render::target::Framebuf;
use crate::render::tex::Texture;
use crate::render::vertex::Vertex;

/// Number of light sources a context carries.
pub const MAX_LIGHTS: usize = 8;

/// Number of texture layers a context carries.
pub const MAX_TEXTURES: usize = 2;

/// Number of slots in the post-transform vertex cache of indexed draws.
pub const CACHE_SIZE: usize = 31;

bitflags! {
    /// Pipeline on/off state.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct Flags: u32 {
        /// Discard fragments whose mapped depth lies outside the
        /// depth range.
        const DEPTH_CLIP = 0x0001;
        /// Write fragment depth to the depth buffer.
        const DEPTH_WRITE = 0x0002;
        /// Test fragment depth with the depth comparison function.
        const DEPTH_TEST = 0x0004;
        const WRITE_RED = 0x0008;
        const WRITE_GREEN = 0x0010;
        const WRITE_BLUE = 0x0020;
        const WRITE_ALPHA = 0x0040;
        /// All four color channel write bits.
        const WRITE_COLOR = 0x0078;
        /// Counter-clockwise screen-space winding is front-facing.
        const FRONT_CCW = 0x0080;
        const CULL_FRONT = 0x0100;
        const CULL_BACK = 0x0200;
        /// Alpha-blend fragments with the framebuffer contents.
        const BLEND = 0x0400;
    }
}

/// Depth test comparison function.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DepthFn {
    #[default]
    Always,
    Never,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl DepthFn {
    /// Compares an incoming fragment depth against the stored depth.
    #[inline]
    pub fn test(self, frag: f32, stored: f32) -> bool {
        use DepthFn::*;
        match self {
            Always => true,
            Never => false,
            Equal => frag == stored,
            NotEqual => frag != stored,
            Less => frag < stored,
            LessEqual => frag <= stored,
            Greater => frag > stored,
            GreaterEqual => frag >= stored,
        }
    }
}

/// Selects how triangles are shaded.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ShadeModel {
    /// Transform only; no lighting, normals stripped.
    Unlit,
    /// Light the provoking vertex once, use the result for the whole
    /// triangle.
    Flat,
    /// Light every vertex, interpolate colors across the triangle.
    #[default]
    Gouraud,
    /// Interpolate normals and evaluate lighting per covered pixel.
    Phong,
}

/// A single light source. Positions are in view space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Light {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub position: Vec4,
    pub attenuation_constant: f32,
    pub attenuation_linear: f32,
    pub attenuation_quadratic: f32,
    pub enabled: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            ambient: vec4(0.0, 0.0, 0.0, 1.0),
            diffuse: vec4(0.0, 0.0, 0.0, 1.0),
            specular: vec4(0.0, 0.0, 0.0, 1.0),
            position: vec4(0.0, 0.0, 0.0, 1.0),
            attenuation_constant: 1.0,
            attenuation_linear: 0.0,
            attenuation_quadratic: 0.0,
            enabled: false,
        }
    }
}

/// Surface material parameters for lighting.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub emission: Vec4,
    pub shininess: i32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: vec4(1.0, 1.0, 1.0, 1.0),
            diffuse: vec4(1.0, 1.0, 1.0, 1.0),
            specular: vec4(1.0, 1.0, 1.0, 1.0),
            emission: vec4(0.0, 0.0, 0.0, 1.0),
            shininess: 0,
        }
    }
}

/// The viewport rectangle that normalized device coordinates map onto.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// The writable pixel rectangle, inclusive on both ends.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DrawArea {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

/// Immediate-mode accumulation state.
#[derive(Clone, Debug, Default)]
pub(crate) struct Immediate {
    pub verts: [Vertex; 3],
    pub next: Vertex,
    pub count: usize,
    pub active: bool,
}

/// All mutable state of the rendering pipeline.
///
/// Most fields are plain public state the caller mutates between draws.
/// The matrices and the viewport go through setters because they have
/// derived state: setting the model-view matrix recomputes the normal
/// matrix, and setting the viewport recomputes the draw area clamped to
/// the bounds of the given target.
#[derive(Clone, Debug)]
pub struct Context {
    pub flags: Flags,
    pub depth_fn: DepthFn,
    pub shade_model: ShadeModel,
    /// Which triangle vertex (0-2) flat shading lights. Triangles are
    /// silently skipped while this holds any other value.
    pub provoking_vertex: usize,
    pub lights: [Light; MAX_LIGHTS],
    pub material: Material,
    pub textures: [Option<Rc<Texture>>; MAX_TEXTURES],
    pub texture_enable: [bool; MAX_TEXTURES],
    /// Depth value the near end of the depth range maps to.
    pub depth_near: f32,
    /// Depth value the far end of the depth range maps to.
    pub depth_far: f32,
    /// Layout of the raw vertex buffers passed to draw calls.
    pub vertex_format: VertexFormat,

    modelview: Mat4,
    projection: Mat4,
    normal_matrix: Mat4,
    viewport: Viewport,
    draw_area: DrawArea,

    pub(crate) tl_cache: [Option<(u16, Vertex)>; CACHE_SIZE],
    pub(crate) imm: Immediate,
}

impl Context {
    /// Creates a context with default state: gouraud shading, depth
    /// clip and write on, all color channels writable, front faces
    /// counter-clockwise, depth test off (always passes), light 0 set
    /// up as a white diffuse/specular light but disabled.
    ///
    /// The viewport starts out empty; call
    /// [`set_viewport`][Self::set_viewport] before drawing.
    pub fn new() -> Self {
        let mut lights = [Light::default(); MAX_LIGHTS];
        lights[0].diffuse = vec4(1.0, 1.0, 1.0, 1.0);
        lights[0].specular = vec4(1.0, 1.0, 1.0, 1.0);

        Self {
            flags: Flags::DEPTH_CLIP
                | Flags::DEPTH_WRITE
                | Flags::WRITE_COLOR
                | Flags::FRONT_CCW,
            depth_fn: DepthFn::Always,
            shade_model: ShadeModel::Gouraud,
            provoking_vertex: 0,
            lights,
            material: Material::default(),
            textures: [None, None],
            texture_enable: [false; MAX_TEXTURES],
            depth_near: 0.0,
            depth_far: 1.0,
            vertex_format: VertexFormat::empty(),
            modelview: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            normal_matrix: Mat4::IDENTITY,
            viewport: Viewport::default(),
            draw_area: DrawArea::default(),
            tl_cache: [None; CACHE_SIZE],
            imm: Immediate::default(),
        }
    }

    /// Sets the model-view matrix and recomputes the derived normal
    /// matrix (identity if the model-view is singular).
    pub fn set_modelview(&mut self, m: Mat4) {
        self.normal_matrix = m.normal_matrix();
        self.modelview = m;
    }

    pub fn set_projection(&mut self, m: Mat4) {
        self.projection = m;
    }

    #[inline]
    pub fn modelview(&self) -> &Mat4 {
        &self.modelview
    }
    #[inline]
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }
    #[inline]
    pub fn normal_matrix(&self) -> &Mat4 {
        &self.normal_matrix
    }
    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
    #[inline]
    pub fn draw_area(&self) -> DrawArea {
        self.draw_area
    }

    /// Sets the viewport and recomputes the draw area: the viewport
    /// rectangle clamped to the bounds of `target`. Pixels outside the
    /// draw area are never written.
    pub fn set_viewport(
        &mut self,
        target: &Framebuf,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) {
        self.viewport = Viewport { x, y, width, height };

        let clamp = |v: i32, max: i32| v.clamp(0, max.max(0));
        let max_x = target.width() as i32 - 1;
        let max_y = target.height() as i32 - 1;

        self.draw_area = DrawArea {
            min_x: clamp(x, max_x),
            min_y: clamp(y, max_y),
            max_x: clamp(x + width as i32 - 1, max_x),
            max_y: clamp(y + height as i32 - 1, max_y),
        };
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let ctx = Context::new();
        assert_eq!(
            ctx.flags,
            Flags::DEPTH_CLIP
                | Flags::DEPTH_WRITE
                | Flags::WRITE_COLOR
                | Flags::FRONT_CCW
        );
        assert_eq!(ctx.depth_fn, DepthFn::Always);
        assert_eq!(ctx.depth_far, 1.0);
        assert!(!ctx.lights[0].enabled);
        assert_eq!(ctx.lights[0].diffuse, vec4(1.0, 1.0, 1.0, 1.0));
        assert_eq!(ctx.lights[1].diffuse, vec4(0.0, 0.0, 0.0, 1.0));
        // An unset viewport must reject every draw.
        let a = ctx.draw_area();
        assert!(a.min_x >= a.max_x && a.min_y >= a.max_y);
    }

    #[test]
    fn viewport_clamps_to_target() {
        let fb = Framebuf::new(64, 32);
        let mut ctx = Context::new();

        ctx.set_viewport(&fb, -8, 4, 128, 128);
        let a = ctx.draw_area();
        assert_eq!((a.min_x, a.min_y), (0, 4));
        assert_eq!((a.max_x, a.max_y), (63, 31));

        // The viewport itself keeps the requested values.
        assert_eq!(ctx.viewport().x, -8);
        assert_eq!(ctx.viewport().width, 128);
    }

    #[test]
    fn modelview_updates_normal_matrix() {
        let mut ctx = Context::new();
        let mut m = Mat4::IDENTITY;
        m.0[0] = 2.0;
        ctx.set_modelview(m);
        assert!((ctx.normal_matrix().at(0, 0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn depth_fn_modes() {
        use DepthFn::*;
        assert!(Always.test(5.0, 1.0));
        assert!(!Never.test(1.0, 1.0));
        assert!(Equal.test(1.0, 1.0) && !Equal.test(1.0, 2.0));
        assert!(NotEqual.test(1.0, 2.0));
        assert!(Less.test(0.5, 1.0) && !Less.test(1.0, 1.0));
        assert!(LessEqual.test(1.0, 1.0));
        assert!(Greater.test(2.0, 1.0));
        assert!(GreaterEqual.test(1.0, 1.0));
    }
}
