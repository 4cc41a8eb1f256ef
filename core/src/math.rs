//! Vector, matrix, and color primitives used throughout the pipeline.

pub mod approx;
pub mod color;
pub mod mat;
pub mod vec;

pub use color::{rgba, Color4};
pub use mat::Mat4;
pub use vec::{vec3, vec4, Vec4};
