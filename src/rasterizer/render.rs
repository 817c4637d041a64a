//! Core rendering functions
//! Point, wireframe and scanline-filled triangle drawing with a z-buffer

use super::framebuffer::Framebuffer;
use super::math::{interpolate, Vec4};
use super::mesh::{FrameDelta, IndexLayout, Mesh, VertexLayout};
use super::project::{Viewport, EXCLUDED, VISIBLE};
use super::types::{Color, DrawMode, FillMode, RasterSettings, Texture};

/// UVs handed to the corners of every quad
const QUAD_UVS: [(f32, f32); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

/// Screen-space vertex: pixel position, depth, clip marker, UV and color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    pub pos: Vec4,
    /// RGB in `[0, 1]`
    pub color: [f32; 3],
}

impl ScreenVertex {
    /// A visible white vertex at pixel `(x, y)` with depth `z`
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            pos: Vec4::with_w(x, y, z, VISIBLE),
            color: [1.0, 1.0, 1.0],
        }
    }

    /// A vertex that failed the clip test
    pub fn excluded() -> Self {
        Self {
            pos: Vec4::with_w(0.0, 0.0, 0.0, EXCLUDED),
            color: [1.0, 1.0, 1.0],
        }
    }

    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.pos.u = u;
        self.pos.v = v;
        self
    }

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn is_visible(&self) -> bool {
        self.pos.is_visible()
    }

    /// Linear blend of position and attributes; `t` is clamped to `[0, 1]`
    pub fn lerp(&self, other: &ScreenVertex, t: f32) -> ScreenVertex {
        let (a, b) = (&self.pos, &other.pos);
        ScreenVertex {
            pos: Vec4 {
                x: interpolate(a.x, b.x, t),
                y: interpolate(a.y, b.y, t),
                z: interpolate(a.z, b.z, t),
                w: a.w,
                u: interpolate(a.u, b.u, t),
                v: interpolate(a.v, b.v, t),
            },
            color: [
                interpolate(self.color[0], other.color[0], t),
                interpolate(self.color[1], other.color[1], t),
                interpolate(self.color[2], other.color[2], t),
            ],
        }
    }

    fn has_finite_position(&self) -> bool {
        self.pos.x.is_finite() && self.pos.y.is_finite()
    }
}

/// Color source for the pixels of one draw call
#[derive(Debug, Clone, Copy)]
pub enum Paint<'a> {
    Solid(Color),
    Textured(&'a Texture),
    VertexColor,
}

impl Paint<'_> {
    fn shade(&self, v: &ScreenVertex) -> Color {
        match self {
            Paint::Solid(color) => *color,
            Paint::Textured(texture) => texture.sample(v.pos.u, v.pos.v),
            Paint::VertexColor => Color::from_unit(v.color[0], v.color[1], v.color[2]),
        }
    }
}

/// Per-call counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Points, segments or triangles considered
    pub primitives: usize,
    pub drawn: usize,
    /// Rejected by the clip marker
    pub dropped: usize,
    pub pixels_written: usize,
}

fn plot(fb: &mut Framebuffer, x: i32, y: i32, v: &ScreenVertex, paint: Paint) -> bool {
    fb.set_pixel_with_depth(x, y, v.pos.z, paint.shade(v))
}

/// Integer steps from `ceil(min)` to `floor(max)`, trimmed to `[0, extent)`
fn walk_range(a: f32, b: f32, extent: usize) -> std::ops::RangeInclusive<i32> {
    let lo = a.min(b).ceil().max(0.0);
    let hi = a.max(b).floor().min(extent as f32 - 1.0);
    (lo as i32)..=(hi as i32)
}

/// Single depth-tested pixel
pub fn draw_point(fb: &mut Framebuffer, v: &ScreenVertex, color: Color) -> bool {
    if !v.has_finite_position() {
        return false;
    }
    fb.set_pixel_with_depth(v.pos.x.floor() as i32, v.pos.y.floor() as i32, v.pos.z, color)
}

/// Depth-tested line with linear attribute interpolation.
///
/// Walks the dominant axis one pixel at a time, covering every integer
/// position between the endpoints inclusive. Returns pixels written.
pub fn draw_line(fb: &mut Framebuffer, start: &ScreenVertex, end: &ScreenVertex, paint: Paint) -> usize {
    if !start.has_finite_position() || !end.has_finite_position() {
        return 0;
    }
    let (s, e) = (start.pos, end.pos);

    if s.x == e.x && s.y == e.y {
        return plot(fb, s.x.floor() as i32, s.y.floor() as i32, start, paint) as usize;
    }

    let mut written = 0;

    if s.x == e.x {
        // Vertical
        let x = s.x.floor() as i32;
        for y in walk_range(s.y, e.y, fb.height()) {
            let t = (y as f32 - s.y) / (e.y - s.y);
            written += plot(fb, x, y, &start.lerp(end, t), paint) as usize;
        }
    } else if s.y == e.y {
        // Horizontal
        let y = s.y.floor() as i32;
        for x in walk_range(s.x, e.x, fb.width()) {
            let t = (x as f32 - s.x) / (e.x - s.x);
            written += plot(fb, x, y, &start.lerp(end, t), paint) as usize;
        }
    } else if (e.x - s.x).abs() >= (e.y - s.y).abs() {
        let slope = (e.y - s.y) / (e.x - s.x);
        for x in walk_range(s.x, e.x, fb.width()) {
            let y = slope * (x as f32 - s.x) + s.y;
            let t = (x as f32 - s.x) / (e.x - s.x);
            written += plot(fb, x, y.floor() as i32, &start.lerp(end, t), paint) as usize;
        }
    } else {
        let slope = (e.x - s.x) / (e.y - s.y);
        for y in walk_range(s.y, e.y, fb.height()) {
            let x = slope * (y as f32 - s.y) + s.x;
            let t = (y as f32 - s.y) / (e.y - s.y);
            written += plot(fb, x.floor() as i32, y, &start.lerp(end, t), paint) as usize;
        }
    }

    written
}

/// Where the edge `start`-`end` crosses the vertical line at `x`.
///
/// Only reports inside the edge's own x-span; vertical edges never report.
/// Depth, UV and color are interpolated by the fractional x position.
fn edge_crossing(start: &ScreenVertex, end: &ScreenVertex, x: f32) -> Option<ScreenVertex> {
    let (sx, ex) = (start.pos.x, end.pos.x);
    if sx == ex || x < sx.min(ex) || x > sx.max(ex) {
        return None;
    }

    let (left, right) = if sx < ex { (start, end) } else { (end, start) };
    let slope = (left.pos.y - right.pos.y) / (left.pos.x - right.pos.x);
    let rate = (x - left.pos.x) / (right.pos.x - left.pos.x);

    let mut point = left.lerp(right, rate);
    point.pos.x = x;
    point.pos.y = slope * (x - right.pos.x) + right.pos.y;
    point.pos.w = VISIBLE;
    Some(point)
}

/// Vertical span of the triangle at column `x`, top and bottom ends.
///
/// The edge that does not reach `x` is ignored and the other two bound the
/// span. When all three edges report (a column through a vertex, or a
/// degenerate triangle) the span runs from the lowest to the highest of the
/// three crossings.
pub fn scan_column(
    p1: &ScreenVertex,
    p2: &ScreenVertex,
    p3: &ScreenVertex,
    x: f32,
) -> Option<(ScreenVertex, ScreenVertex)> {
    let min_x = p1.pos.x.min(p2.pos.x).min(p3.pos.x);
    let max_x = p1.pos.x.max(p2.pos.x).max(p3.pos.x);
    if x < min_x || x > max_x {
        return None;
    }

    let c1 = edge_crossing(p1, p2, x);
    let c2 = edge_crossing(p2, p3, x);
    let c3 = edge_crossing(p3, p1, x);

    match (c1, c2, c3) {
        (None, Some(a), Some(b)) => Some((a, b)),
        (Some(b), None, Some(a)) => Some((a, b)),
        (Some(a), Some(b), None) => Some((a, b)),
        (Some(a), Some(b), Some(c)) => {
            let top = [b, c].into_iter().fold(a, |m, p| if p.pos.y < m.pos.y { p } else { m });
            let bottom = [b, c].into_iter().fold(a, |m, p| if p.pos.y > m.pos.y { p } else { m });
            Some((top, bottom))
        }
        _ => None,
    }
}

/// Scanline-fill a triangle column by column. Returns pixels written.
pub fn fill_triangle(
    fb: &mut Framebuffer,
    p1: &ScreenVertex,
    p2: &ScreenVertex,
    p3: &ScreenVertex,
    paint: Paint,
) -> usize {
    if ![p1, p2, p3].iter().all(|p| p.has_finite_position()) {
        return 0;
    }

    let min_x = p1.pos.x.min(p2.pos.x).min(p3.pos.x);
    let max_x = p1.pos.x.max(p2.pos.x).max(p3.pos.x);
    let first = (min_x - 0.5).floor().max(0.0) as i32;
    let last = (max_x + 0.5).ceil().min(fb.width() as f32 - 1.0) as i32;

    let mut written = 0;
    for x in first..=last {
        if let Some((top, bottom)) = scan_column(p1, p2, p3, x as f32) {
            written += draw_line(fb, &top, &bottom, paint);
        }
    }
    written
}

/// Group screen vertices into triangles, attaching the fixed UV pattern
fn assemble(screen: &[ScreenVertex], layout: IndexLayout) -> Vec<[ScreenVertex; 3]> {
    let uv = |v: &ScreenVertex, corner: usize| {
        let (u, v_) = QUAD_UVS[corner];
        v.with_uv(u, v_)
    };

    match layout {
        IndexLayout::Quads => screen
            .chunks_exact(4)
            .flat_map(|q| {
                let (a, b, c, d) = (uv(&q[0], 0), uv(&q[1], 1), uv(&q[2], 2), uv(&q[3], 3));
                [[a, b, c], [a, c, d]]
            })
            .collect(),
        IndexLayout::Triangles => screen
            .chunks_exact(3)
            .map(|t| [uv(&t[0], 0), uv(&t[1], 1), uv(&t[2], 2)])
            .collect(),
    }
}

/// Project every index of the mesh into screen space
pub fn project_mesh(viewport: &Viewport, mesh: &Mesh) -> Vec<ScreenVertex> {
    let wvp = mesh.world_view_projection();
    mesh.indices()
        .iter()
        .map(|&i| match mesh.vertex(i) {
            Some(vertex) => {
                let (pos, _) = viewport.project_with(&wvp, vertex.position);
                ScreenVertex { pos, color: vertex.color }
            }
            None => ScreenVertex::excluded(),
        })
        .collect()
}

/// Render a mesh to the framebuffer in its draw mode
pub fn render_mesh(
    fb: &mut Framebuffer,
    viewport: &Viewport,
    mesh: &Mesh,
    texture: Option<&Texture>,
    settings: &RasterSettings,
) -> DrawStats {
    let screen = project_mesh(viewport, mesh);
    let solid = Paint::Solid(settings.color);
    let mut stats = DrawStats::default();

    match mesh.draw_mode {
        DrawMode::Point => {
            for v in &screen {
                stats.primitives += 1;
                if !v.is_visible() {
                    stats.dropped += 1;
                    continue;
                }
                stats.drawn += 1;
                stats.pixels_written += draw_point(fb, v, settings.color) as usize;
            }
        }
        DrawMode::Line => {
            for tri in assemble(&screen, mesh.index_layout()) {
                for i in 0..3 {
                    let (a, b) = (&tri[i], &tri[(i + 1) % 3]);
                    stats.primitives += 1;
                    if !a.is_visible() || !b.is_visible() {
                        stats.dropped += 1;
                        continue;
                    }
                    stats.drawn += 1;
                    stats.pixels_written += draw_line(fb, a, b, solid);
                }
            }
        }
        DrawMode::Triangle => {
            let paint = match settings.fill {
                FillMode::Solid => solid,
                FillMode::Textured => texture.map_or(solid, Paint::Textured),
                FillMode::VertexColor if mesh.vertex_layout() == VertexLayout::PositionColor => {
                    Paint::VertexColor
                }
                FillMode::VertexColor => solid,
            };
            for [a, b, c] in assemble(&screen, mesh.index_layout()) {
                stats.primitives += 1;
                // Whole-primitive rejection, no geometric clipping
                if !a.is_visible() || !b.is_visible() || !c.is_visible() {
                    stats.dropped += 1;
                    continue;
                }
                stats.drawn += 1;
                stats.pixels_written += fill_triangle(fb, &a, &b, &c, paint);
            }
        }
    }

    log::debug!(
        "{:?}: {} primitives, {} drawn, {} dropped, {} pixels",
        mesh.draw_mode,
        stats.primitives,
        stats.drawn,
        stats.dropped,
        stats.pixels_written
    );

    stats
}

/// Owns the frame buffers and drives one frame at a time
pub struct Rasterizer {
    framebuffer: Framebuffer,
    viewport: Viewport,
    texture: Option<Texture>,
    settings: RasterSettings,
}

impl Rasterizer {
    pub fn new(width: usize, height: usize, settings: RasterSettings) -> Self {
        Self {
            framebuffer: Framebuffer::with_background(width, height, settings.background),
            viewport: Viewport::new(width, height).with_clip_policy(settings.clip_policy),
            texture: None,
            settings,
        }
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn set_texture(&mut self, texture: Option<Texture>) {
        self.texture = texture;
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    pub fn settings(&self) -> &RasterSettings {
        &self.settings
    }

    /// Replace the settings; a new background shows from the next reset
    pub fn set_settings(&mut self, settings: RasterSettings) {
        self.viewport.clip_policy = settings.clip_policy;
        self.framebuffer.set_background(settings.background);
        self.settings = settings;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Recreate the buffers for new viewport dimensions
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.viewport.width || height != self.viewport.height {
            log::debug!("Resizing framebuffer to {}x{}", width, height);
        }
        self.framebuffer.resize(width, height);
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Reset pixels and depths without presenting
    pub fn clear(&mut self) {
        self.framebuffer.clear();
    }

    /// Draw a mesh into the current frame
    pub fn draw_arrays(&mut self, mesh: &Mesh) -> DrawStats {
        render_mesh(
            &mut self.framebuffer,
            &self.viewport,
            mesh,
            self.texture.as_ref(),
            &self.settings,
        )
    }

    /// Apply this frame's movement to the mesh, then draw it
    pub fn render_frame(&mut self, mesh: &mut Mesh, delta: &FrameDelta) -> DrawStats {
        mesh.apply_delta(delta);
        self.draw_arrays(mesh)
    }

    /// Hand the finished frame to `sink`, then reset for the next one
    pub fn present<F: FnOnce(&Framebuffer)>(&mut self, sink: F) {
        sink(&self.framebuffer);
        self.framebuffer.clear();
    }

    /// Render `frames` frames (at least one), moving the mesh by `delta`
    /// before each. Only the last frame reaches `sink`.
    pub fn run_frames<F: FnOnce(&Framebuffer)>(
        &mut self,
        mesh: &mut Mesh,
        delta: &FrameDelta,
        frames: usize,
        sink: F,
    ) -> DrawStats {
        for _ in 1..frames {
            self.render_frame(mesh, delta);
            self.present(|_| {});
        }
        let stats = self.render_frame(mesh, delta);
        self.present(sink);
        stats
    }
}
