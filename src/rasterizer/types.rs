//! Core types for the rasterizer

use serde::{Serialize, Deserialize};

/// RGB color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255 };
    /// Dark grey the framebuffer is cleared to
    pub const BACKGROUND: Color = Color { r: 45, g: 45, b: 45 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from floating point channels in `[0, 1]`
    pub fn from_unit(r: f32, g: f32, b: f32) -> Self {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { r: channel(r), g: channel(g), b: channel(b) }
    }

    /// Unpack from `0x00RRGGBB`
    pub fn from_packed(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    pub fn to_packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// Byte order used by the framebuffer
    pub fn to_bgr(self) -> [u8; 3] {
        [self.b, self.g, self.r]
    }
}

/// Packed-color texture addressed by normalized (u, v)
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub texels: Vec<u32>,
    pub name: String,
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            texels: vec![Color::WHITE.to_packed(); width * height],
            name: String::new(),
        }
    }

    /// Load a texture from an image file (PNG, JPEG or BMP)
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, image::ImageError> {
        let path = path.as_ref();
        let img = image::open(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::from_image(img, name))
    }

    /// Load a texture from encoded image bytes
    pub fn from_bytes(bytes: &[u8], name: String) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_image(img, name))
    }

    fn from_image(img: image::DynamicImage, name: String) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let texels = rgb
            .pixels()
            .map(|p| Color::new(p[0], p[1], p[2]).to_packed())
            .collect();

        Self {
            width: width as usize,
            height: height as usize,
            texels,
            name,
        }
    }

    /// Checkerboard of `cell`-sized squares
    pub fn checkerboard(size: usize, cell: usize, color1: Color, color2: Color) -> Self {
        let cell = cell.max(1);
        let mut texels = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                let odd = ((x / cell) + (y / cell)) & 1 == 1;
                texels.push(if odd { color1 } else { color2 }.to_packed());
            }
        }
        Self { width: size, height: size, texels, name: "checkerboard".to_string() }
    }

    /// Nearest-texel sample at `floor(u * width), floor(v * height)`.
    /// Coordinates outside `[0, 1)` are clamped to the edge texel.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.texels.is_empty() {
            return Color::BLACK;
        }
        let tx = Self::texel_index(u, self.width);
        let ty = Self::texel_index(v, self.height);
        self.texels
            .get(ty * self.width + tx)
            .map_or(Color::BLACK, |&t| Color::from_packed(t))
    }

    fn texel_index(t: f32, extent: usize) -> usize {
        let i = (t * extent as f32).floor();
        if i.is_nan() || i < 0.0 || extent == 0 {
            0
        } else {
            (i as usize).min(extent - 1)
        }
    }
}

impl Default for Texture {
    /// 256x256 black/white checkerboard with 32 texel cells
    fn default() -> Self {
        Self::checkerboard(256, 32, Color::WHITE, Color::BLACK)
    }
}

/// Primitive assembly mode for a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawMode {
    Point,
    Line,
    #[default]
    Triangle,
}

/// Where filled-triangle pixels take their color from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillMode {
    /// `RasterSettings::color` everywhere
    Solid,
    /// Sample the texture with interpolated (u, v)
    #[default]
    Textured,
    /// Interpolate the mesh's per-vertex colors
    VertexColor,
}

/// How primitives that touch the clip volume boundary are treated.
///
/// There is no geometric clipping; a primitive is drawn whole or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClipPolicy {
    /// Drop a primitive if any vertex fails the full clip-volume test
    #[default]
    RejectOnAnyClipFail,
    /// Drop only primitives with a vertex behind the near plane; pixels
    /// beyond the side planes are dropped by the framebuffer bounds check
    RejectBehindCamera,
}

/// Rasterizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterSettings {
    /// Color for points, wireframe lines and solid fills
    pub color: Color,
    /// Color the framebuffer is reset to each frame
    pub background: Color,
    /// Triangle fill source
    pub fill: FillMode,
    /// Whole-primitive clip rejection rule
    pub clip_policy: ClipPolicy,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            background: Color::BACKGROUND,
            fill: FillMode::Textured,
            clip_policy: ClipPolicy::RejectOnAnyClipFail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_round_trip() {
        let c = Color::new(0x12, 0x34, 0x56);
        assert_eq!(c.to_packed(), 0x123456);
        assert_eq!(Color::from_packed(0x123456), c);
    }

    #[test]
    fn test_bgr_order() {
        assert_eq!(Color::new(1, 2, 3).to_bgr(), [3, 2, 1]);
    }

    #[test]
    fn test_from_unit_clamps() {
        assert_eq!(Color::from_unit(1.5, 0.5, -1.0), Color::new(255, 128, 0));
    }

    #[test]
    fn test_checkerboard_cells() {
        let tex = Texture::checkerboard(64, 32, Color::WHITE, Color::BLACK);
        assert_eq!(tex.sample(0.0, 0.0), Color::BLACK);
        assert_eq!(tex.sample(0.6, 0.0), Color::WHITE);
        assert_eq!(tex.sample(0.6, 0.6), Color::BLACK);
    }

    #[test]
    fn test_sample_edges_clamped() {
        let tex = Texture::checkerboard(64, 32, Color::WHITE, Color::BLACK);
        // u == 1.0 lands exactly one past the last texel
        assert_eq!(tex.sample(1.0, 0.0), Color::WHITE);
        assert_eq!(tex.sample(-0.5, 0.0), Color::BLACK);
        assert_eq!(tex.sample(f32::NAN, 0.0), Color::BLACK);
    }

    #[test]
    fn test_from_bytes() {
        let mut png = Vec::new();
        let img = image::RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 { image::Rgb([255, 0, 0]) } else { image::Rgb([0, 0, 255]) }
        });
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png).unwrap();

        let tex = Texture::from_bytes(&png, "strip".to_string()).unwrap();
        assert_eq!((tex.width, tex.height), (2, 1));
        assert_eq!(tex.sample(0.2, 0.5), Color::RED);
        assert_eq!(tex.sample(0.7, 0.5), Color::BLUE);
    }

    #[test]
    fn test_short_texel_buffer_samples_black() {
        let tex = Texture { width: 4, height: 4, texels: vec![Color::WHITE.to_packed(); 4], name: String::new() };
        assert_eq!(tex.sample(0.9, 0.0), Color::WHITE);
        assert_eq!(tex.sample(0.9, 0.9), Color::BLACK);
        let empty_row = Texture { width: 0, height: 2, texels: vec![0; 2], name: String::new() };
        assert_eq!(empty_row.sample(0.5, 0.5), Color::BLACK);
    }

    #[test]
    fn test_blank_texture_is_white() {
        let tex = Texture::new(4, 2);
        assert_eq!(tex.texels.len(), 8);
        assert_eq!(tex.sample(0.9, 0.9), Color::WHITE);
    }

    #[test]
    fn test_default_texture() {
        let tex = Texture::default();
        assert_eq!((tex.width, tex.height), (256, 256));
        assert_eq!(tex.texels.len(), 256 * 256);
    }
}
