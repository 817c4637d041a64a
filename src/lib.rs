//! softraster: CPU-only 3D rasterizer
//!
//! Transforms a mesh through world, view and projection matrices and
//! scanline-fills the resulting triangles straight into a BGR pixel buffer
//! with depth testing.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod rasterizer;
pub mod scene;
