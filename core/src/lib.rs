//! Core functionality of the `rasterine` project.
//!
//! A fixed-function software 3D rendering pipeline in the style of the
//! early accelerator APIs: flag-driven vertex formats, modelview and
//! projection transforms, Blinn-Phong lighting with flat, per-vertex,
//! and per-pixel shading, and a perspective-correct scanline rasterizer
//! with depth testing, texturing, and alpha blending.
//!
//! The crate has three top-level modules:
//!
//! * [`math`]: vectors, matrices, and colors;
//! * [`render`]: the pipeline itself, driven through
//!   [`render::Context`];
//! * [`util`]: pixel buffers and the 3DS mesh loader.

pub mod math;
pub mod render;
pub mod util;

pub mod prelude {
    pub use crate::math::{
        color::{rgba, Color4},
        mat::Mat4,
        vec::{vec3, vec4, Vec4},
    };

    pub use crate::render::{
        Context, DepthFn, Flags, Framebuf, Light, Material, ShadeModel,
        Texture, VertexFormat,
    };

    pub use crate::util::buf::Buf2;
    pub use crate::util::t3ds::{load_3ds, Mesh};
}
