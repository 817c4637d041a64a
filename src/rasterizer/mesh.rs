//! Mesh buffers and the world/view/projection transform chain
//!
//! Vertex and index conventions are fixed configuration, never inferred:
//! - `VertexLayout::Position`: 3 floats per vertex (x, y, z)
//! - `VertexLayout::PositionColor`: 6 floats per vertex (x, y, z, r, g, b),
//!   color channels in `[0, 1]`
//! - `IndexLayout::Quads`: 4 indices per quad, split into triangles
//!   (0, 1, 2) and (0, 2, 3) with UVs (0,0) (1,0) (1,1) (0,1)
//! - `IndexLayout::Triangles`: 3 indices per triangle, UVs (0,0) (1,0) (1,1)

use serde::{Serialize, Deserialize};
use thiserror::Error;
use super::camera::Camera;
use super::math::{Mat4, Orientation, Vec4};
use super::types::DrawMode;

/// Per-vertex float layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VertexLayout {
    #[default]
    Position,
    PositionColor,
}

impl VertexLayout {
    pub fn stride(self) -> usize {
        match self {
            VertexLayout::Position => 3,
            VertexLayout::PositionColor => 6,
        }
    }
}

/// How consecutive indices group into primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndexLayout {
    #[default]
    Quads,
    Triangles,
}

impl IndexLayout {
    pub fn group_size(self) -> usize {
        match self {
            IndexLayout::Quads => 4,
            IndexLayout::Triangles => 3,
        }
    }
}

/// Mesh construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("vertex buffer length {len} is not a multiple of the stride {stride}")]
    VertexStride { len: usize, stride: usize },

    #[error("index count {len} is not a multiple of the primitive size {group}")]
    IndexGrouping { len: usize, group: usize },

    #[error("index {index} at position {position} is out of range ({vertex_count} vertices)")]
    IndexOutOfRange { index: usize, position: usize, vertex_count: usize },
}

/// Translation and rotation increments for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameDelta {
    pub translate: [f32; 3],
    pub rotate: [f32; 3],
}

impl FrameDelta {
    pub fn translation(dx: f32, dy: f32, dz: f32) -> Self {
        Self { translate: [dx, dy, dz], ..Self::default() }
    }

    pub fn rotation(rx: f32, ry: f32, rz: f32) -> Self {
        Self { rotate: [rx, ry, rz], ..Self::default() }
    }

    pub fn is_zero(&self) -> bool {
        self.translate.iter().chain(&self.rotate).all(|v| *v == 0.0)
    }
}

/// A vertex pulled out of the flat buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: Vec4,
    /// RGB in `[0, 1]`, white when the layout carries no color
    pub color: [f32; 3],
}

/// Vertex/index buffers plus the transform chain that places them
#[derive(Debug, Clone)]
pub struct Mesh {
    pub draw_mode: DrawMode,
    vertex_layout: VertexLayout,
    index_layout: IndexLayout,
    vertices: Vec<f32>,
    indices: Vec<usize>,
    pub world: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    position: Vec4,
    orientation: Orientation,
}

impl Mesh {
    /// Validate and wrap raw buffers
    pub fn new(
        vertices: Vec<f32>,
        vertex_layout: VertexLayout,
        indices: Vec<usize>,
        index_layout: IndexLayout,
    ) -> Result<Self, MeshError> {
        let stride = vertex_layout.stride();
        if vertices.len() % stride != 0 {
            return Err(MeshError::VertexStride { len: vertices.len(), stride });
        }

        let group = index_layout.group_size();
        if indices.len() % group != 0 {
            return Err(MeshError::IndexGrouping { len: indices.len(), group });
        }

        let vertex_count = vertices.len() / stride;
        if let Some((position, &index)) = indices.iter().enumerate().find(|&(_, &i)| i >= vertex_count) {
            return Err(MeshError::IndexOutOfRange { index, position, vertex_count });
        }

        Ok(Self {
            draw_mode: DrawMode::Triangle,
            vertex_layout,
            index_layout,
            vertices,
            indices,
            world: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            position: Vec4::ZERO,
            orientation: Orientation::default(),
        })
    }

    pub fn with_draw_mode(mut self, draw_mode: DrawMode) -> Self {
        self.draw_mode = draw_mode;
        self
    }

    /// Take view and projection from a camera
    pub fn with_camera(mut self, camera: &Camera) -> Self {
        self.set_camera(camera);
        self
    }

    pub fn set_camera(&mut self, camera: &Camera) {
        self.view = camera.view_matrix();
        self.projection = camera.projection_matrix();
    }

    pub fn vertex_layout(&self) -> VertexLayout {
        self.vertex_layout
    }

    pub fn index_layout(&self) -> IndexLayout {
        self.index_layout
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.vertex_layout.stride()
    }

    /// Number of triangles after quad expansion
    pub fn triangle_count(&self) -> usize {
        match self.index_layout {
            IndexLayout::Quads => self.indices.len() / 4 * 2,
            IndexLayout::Triangles => self.indices.len() / 3,
        }
    }

    pub fn vertex(&self, index: usize) -> Option<MeshVertex> {
        let stride = self.vertex_layout.stride();
        let raw = self.vertices.get(index * stride..(index + 1) * stride)?;
        let color = match self.vertex_layout {
            VertexLayout::Position => [1.0, 1.0, 1.0],
            VertexLayout::PositionColor => [raw[3], raw[4], raw[5]],
        };
        Some(MeshVertex {
            position: Vec4::new(raw[0], raw[1], raw[2]),
            color,
        })
    }

    /// Accumulated translation
    pub fn position(&self) -> Vec4 {
        self.position
    }

    /// Accumulated rotation
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Set an absolute pose and rebuild the world matrix
    pub fn set_pose(&mut self, position: Vec4, orientation: Orientation) {
        self.position = position;
        self.orientation = orientation;
        self.rebuild_world();
    }

    /// Accumulate one frame of movement and rebuild the world matrix.
    ///
    /// The rotation matrix is regenerated from the angle triple every time
    /// rather than composed onto the previous matrix, so it stays
    /// orthonormal however many frames go by.
    pub fn apply_delta(&mut self, delta: &FrameDelta) {
        let [dx, dy, dz] = delta.translate;
        self.position = self.position + Vec4::new(dx, dy, dz);
        let [rx, ry, rz] = delta.rotate;
        self.orientation.accumulate(rx, ry, rz);
        self.rebuild_world();
    }

    fn rebuild_world(&mut self) {
        self.world = self.orientation.to_matrix()
            * Mat4::translation(self.position.x, self.position.y, self.position.z);
    }

    pub fn world_view_projection(&self) -> Mat4 {
        self.world * self.view * self.projection
    }

    /// Unit cube centered at the origin: 8 corners, 6 quads
    pub fn unit_cube() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            -0.5, -0.5, -0.5,
             0.5, -0.5, -0.5,
             0.5,  0.5, -0.5,
            -0.5,  0.5, -0.5,
            -0.5, -0.5,  0.5,
             0.5, -0.5,  0.5,
             0.5,  0.5,  0.5,
            -0.5,  0.5,  0.5,
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2, 3, // bottom
            4, 5, 6, 7, // top
            0, 1, 5, 4,
            3, 2, 6, 7,
            1, 2, 6, 5, // +X, faces the default camera
            0, 3, 7, 4,
        ];
        Self::from_parts(vertices, VertexLayout::Position, indices, IndexLayout::Quads)
    }

    /// Unit cube with a distinct color per corner
    pub fn color_cube() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            -0.5, -0.5, -0.5,  0.0, 0.0, 0.0,
             0.5, -0.5, -0.5,  1.0, 0.0, 0.0,
             0.5,  0.5, -0.5,  1.0, 1.0, 0.0,
            -0.5,  0.5, -0.5,  0.0, 1.0, 0.0,
            -0.5, -0.5,  0.5,  0.0, 0.0, 1.0,
             0.5, -0.5,  0.5,  1.0, 0.0, 1.0,
             0.5,  0.5,  0.5,  1.0, 1.0, 1.0,
            -0.5,  0.5,  0.5,  0.0, 1.0, 1.0,
        ];
        let indices = Self::unit_cube().indices;
        Self::from_parts(vertices, VertexLayout::PositionColor, indices, IndexLayout::Quads)
    }

    // Built-in geometry is known to be consistent.
    fn from_parts(
        vertices: Vec<f32>,
        vertex_layout: VertexLayout,
        indices: Vec<usize>,
        index_layout: IndexLayout,
    ) -> Self {
        Self {
            draw_mode: DrawMode::Triangle,
            vertex_layout,
            index_layout,
            vertices,
            indices,
            world: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            position: Vec4::ZERO,
            orientation: Orientation::default(),
        }
    }
}
