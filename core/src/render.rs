//! The fixed-function rendering pipeline.
//!
//! All pipeline state lives in a [`Context`]: transforms, lights,
//! material, bound textures, and the [`Flags`] word controlling depth
//! testing, culling, blending, and write masks. Draw calls take the
//! context and a [`Framebuf`] and run raw vertex data through
//! [input assembly][input], [transform and lighting][self], and
//! [scan conversion][self] down to shaded, depth-tested pixels.

pub mod ctx;
pub mod input;
pub(crate) mod raster;
pub mod target;
pub mod tex;
pub(crate) mod tl;
pub mod vertex;

pub use ctx::{
    Context, DepthFn, DrawArea, Flags, Light, Material, ShadeModel, Viewport,
    MAX_LIGHTS, MAX_TEXTURES,
};
pub use input::VertexFormat;
pub use target::Framebuf;
pub use tex::Texture;
pub use vertex::{Attr, AttrMask, Vertex};
