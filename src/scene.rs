//! Scene loading and saving
//!
//! A scene bundles the viewport size, camera, mesh buffers, raster settings
//! and texture source. Uses RON (Rusty Object Notation) for human-readable
//! scene files.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::rasterizer::{
    Camera, Color, DrawMode, FrameDelta, IndexLayout, Mesh, MeshError, Orientation,
    RasterSettings, Texture, Vec4, VertexLayout, HEIGHT, WIDTH,
};

/// Error type for scene loading
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("Invalid mesh: {0}")]
    Mesh(#[from] MeshError),

    #[error("Texture error: {0}")]
    Texture(#[from] image::ImageError),

    #[error("Invalid viewport size {width}x{height}")]
    ViewportSize { width: usize, height: usize },
}

/// Where the triangle texture comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextureSource {
    /// Generated two-color checkerboard
    Checkerboard { size: usize, cell: usize },
    /// Image file, relative paths resolve against the working directory
    File(PathBuf),
}

impl Default for TextureSource {
    fn default() -> Self {
        TextureSource::Checkerboard { size: 256, cell: 32 }
    }
}

/// Mesh buffers and starting pose as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub vertex_layout: VertexLayout,
    pub index_layout: IndexLayout,
    pub vertices: Vec<f32>,
    pub indices: Vec<usize>,
    pub draw_mode: DrawMode,
    pub position: [f32; 3],
    pub orientation: Orientation,
}

impl Default for MeshConfig {
    fn default() -> Self {
        let cube = Mesh::unit_cube();
        Self {
            vertex_layout: cube.vertex_layout(),
            index_layout: cube.index_layout(),
            vertices: cube.vertices().to_vec(),
            indices: cube.indices().to_vec(),
            draw_mode: DrawMode::Triangle,
            position: [0.0; 3],
            orientation: Orientation::default(),
        }
    }
}

/// Everything needed to render frames without a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub width: usize,
    pub height: usize,
    pub camera: Camera,
    pub mesh: MeshConfig,
    pub settings: RasterSettings,
    pub texture: TextureSource,
    /// Movement applied every frame when rendering unattended
    pub spin: FrameDelta,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            camera: Camera::default(),
            mesh: MeshConfig::default(),
            settings: RasterSettings::default(),
            texture: TextureSource::default(),
            spin: FrameDelta::default(),
        }
    }
}

impl Scene {
    /// Check dimensions and mesh buffers without building anything else
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::ViewportSize { width: self.width, height: self.height });
        }
        self.build_mesh()?;
        Ok(())
    }

    /// Build the mesh with the camera and starting pose applied
    pub fn build_mesh(&self) -> Result<Mesh, SceneError> {
        let cfg = &self.mesh;
        let mut mesh = Mesh::new(
            cfg.vertices.clone(),
            cfg.vertex_layout,
            cfg.indices.clone(),
            cfg.index_layout,
        )?
        .with_draw_mode(cfg.draw_mode)
        .with_camera(&self.camera);

        let [x, y, z] = cfg.position;
        mesh.set_pose(Vec4::new(x, y, z), cfg.orientation);
        Ok(mesh)
    }

    /// Load or generate the texture
    pub fn build_texture(&self) -> Result<Texture, SceneError> {
        match &self.texture {
            TextureSource::Checkerboard { size, cell } => {
                Ok(Texture::checkerboard(*size, *cell, Color::WHITE, Color::BLACK))
            }
            TextureSource::File(path) => Ok(Texture::from_file(path)?),
        }
    }
}

/// Load a scene from a RON file
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneError> {
    let contents = fs::read_to_string(path)?;
    load_scene_from_str(&contents)
}

/// Save a scene to a RON file
pub fn save_scene<P: AsRef<Path>>(scene: &Scene, path: P) -> Result<(), SceneError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(scene, config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Load a scene from a RON string (for embedded scenes or testing)
pub fn load_scene_from_str(s: &str) -> Result<Scene, SceneError> {
    let scene: Scene = ron::from_str(s)?;
    scene.validate()?;
    Ok(scene)
}
