//! CPU scanline rasterizer
//!
//! Features:
//! - Row-vector world/view/projection pipeline (`v' = v * M`)
//! - Whole-primitive clip rejection, no polygon clipping
//! - Column-wise scanline triangle fill with a z-buffer
//! - Linear (screen-space) depth, UV and vertex color interpolation
//! - Point, wireframe and filled draw modes

mod math;
mod types;
mod camera;
mod mesh;
mod framebuffer;
mod project;
mod render;

pub use math::*;
pub use types::*;
pub use camera::*;
pub use mesh::*;
pub use framebuffer::*;
pub use project::*;
pub use render::*;

/// Default viewport dimensions
pub const WIDTH: usize = 800;
pub const HEIGHT: usize = 600;
