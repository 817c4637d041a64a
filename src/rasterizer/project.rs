//! Clip test, perspective divide and viewport mapping

use super::math::{Mat4, Vec4};
use super::mesh::Mesh;
use super::types::ClipPolicy;

/// Screen-space `w` of a point that passed the clip test
pub const VISIBLE: f32 = 1.0;
/// Screen-space `w` of a point that failed it
pub const EXCLUDED: f32 = -1.0;

/// Standard clip-volume containment: `0 <= z <= w`, `|x| <= w`, `|y| <= w`
pub fn in_clip(pos: &Vec4) -> bool {
    pos.z >= 0.0
        && pos.z <= pos.w
        && pos.x >= -pos.w
        && pos.x <= pos.w
        && pos.y >= -pos.w
        && pos.y <= pos.w
}

/// In front of the near plane, ignoring the side and far planes
pub fn in_front(pos: &Vec4) -> bool {
    pos.w > 0.0 && pos.z >= 0.0
}

/// Maps clip space onto a `width` x `height` pixel grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
    pub clip_policy: ClipPolicy,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, clip_policy: ClipPolicy::default() }
    }

    pub fn with_clip_policy(mut self, clip_policy: ClipPolicy) -> Self {
        self.clip_policy = clip_policy;
        self
    }

    fn accepts(&self, clip: &Vec4) -> bool {
        match self.clip_policy {
            ClipPolicy::RejectOnAnyClipFail => in_clip(clip),
            ClipPolicy::RejectBehindCamera => in_front(clip),
        }
    }

    /// Project a model-space point through the mesh's world-view-projection
    pub fn project(&self, mesh: &Mesh, world_pos: Vec4) -> (Vec4, bool) {
        self.project_with(&mesh.world_view_projection(), world_pos)
    }

    /// Project with a precomputed world-view-projection matrix.
    ///
    /// Returns screen `(x, y)` in pixels, `z/w` as depth, and `w` replaced
    /// by [`VISIBLE`] or [`EXCLUDED`]. Texture coordinates pass through.
    pub fn project_with(&self, wvp: &Mat4, world_pos: Vec4) -> (Vec4, bool) {
        let clip = world_pos * *wvp;
        let visible = self.accepts(&clip);
        let (x, y) = self.ndc_to_screen(clip.x / clip.w, clip.y / clip.w);

        let screen = Vec4 {
            x,
            y,
            z: clip.z / clip.w,
            w: if visible { VISIBLE } else { EXCLUDED },
            u: clip.u,
            v: clip.v,
        };
        (screen, visible)
    }

    pub fn ndc_to_screen(&self, ndc_x: f32, ndc_y: f32) -> (f32, f32) {
        (
            (ndc_x + 1.0) * self.width as f32 / 2.0,
            (1.0 - ndc_y) * self.height as f32 / 2.0,
        )
    }

    /// Inverse of the viewport mapping
    pub fn screen_to_ndc(&self, sx: f32, sy: f32) -> (f32, f32) {
        (
            sx * 2.0 / self.width as f32 - 1.0,
            1.0 - sy * 2.0 / self.height as f32,
        )
    }
}
