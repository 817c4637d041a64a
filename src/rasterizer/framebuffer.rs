//! Packed BGR pixel buffer with a parallel depth buffer

use std::path::Path;
use super::types::Color;

/// Depth every pixel is reset to; any finite depth beats it
pub const DEPTH_CLEAR: f32 = f32::INFINITY;

/// Bit depth of the packed pixel buffer
pub const BITS_PER_PIXEL: usize = 24;

const BYTES_PER_PIXEL: usize = BITS_PER_PIXEL / 8;

/// Framebuffer for software rendering
///
/// Pixels are interleaved B, G, R bytes in top-to-bottom row order, the
/// layout a 24-bit DIB or similar surface takes verbatim.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    pixels: Vec<u8>,
    zbuffer: Vec<f32>,
    width: usize,
    height: usize,
    background: Color,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_background(width, height, Color::BACKGROUND)
    }

    pub fn with_background(width: usize, height: usize, background: Color) -> Self {
        let mut fb = Self {
            pixels: vec![0; width * height * BYTES_PER_PIXEL],
            zbuffer: vec![DEPTH_CLEAR; width * height],
            width,
            height,
            background,
        };
        fb.clear();
        fb
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw packed BGR bytes
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn depths(&self) -> &[f32] {
        &self.zbuffer
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    /// Reset every pixel to the background and every depth to the sentinel
    pub fn clear(&mut self) {
        let bgr = self.background.to_bgr();
        for px in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&bgr);
        }
        self.zbuffer.fill(DEPTH_CLEAR);
    }

    /// Reallocate for new dimensions. The contents are cleared whenever the
    /// size actually changes; a same-size call is a no-op.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width * height * BYTES_PER_PIXEL];
        self.zbuffer = vec![DEPTH_CLEAR; width * height];
        self.clear();
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    /// Depth-tested write.
    ///
    /// Out-of-bounds coordinates are dropped silently. The pixel is written
    /// only if `z` is strictly nearer than what is stored; returns whether
    /// it was.
    pub fn set_pixel_with_depth(&mut self, x: i32, y: i32, z: f32, color: Color) -> bool {
        let Some(idx) = self.index(x, y) else {
            return false;
        };
        if z < self.zbuffer[idx] {
            self.zbuffer[idx] = z;
            let offset = idx * BYTES_PER_PIXEL;
            self.pixels[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&color.to_bgr());
            return true;
        }
        false
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        let offset = self.index(x, y)? * BYTES_PER_PIXEL;
        let px = &self.pixels[offset..offset + BYTES_PER_PIXEL];
        Some(Color::new(px[2], px[1], px[0]))
    }

    pub fn depth(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|idx| self.zbuffer[idx])
    }

    /// Whether a pixel has been written since the last clear
    pub fn is_covered(&self, x: i32, y: i32) -> bool {
        self.depth(x, y).is_some_and(|z| z < DEPTH_CLEAR)
    }

    /// Number of pixels written since the last clear
    pub fn covered_count(&self) -> usize {
        self.zbuffer.iter().filter(|z| **z < DEPTH_CLEAR).count()
    }

    /// Expand to RGBA bytes for surfaces that want 4 channels
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * self.height * 4);
        for px in self.pixels.chunks_exact(BYTES_PER_PIXEL) {
            out.extend_from_slice(&[px[2], px[1], px[0], 255]);
        }
        out
    }

    fn to_rgb(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len());
        for px in self.pixels.chunks_exact(BYTES_PER_PIXEL) {
            out.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        out
    }

    /// Write the frame out as a PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        image::save_buffer_with_format(
            path,
            &self.to_rgb(),
            self.width as u32,
            self.height as u32,
            image::ExtendedColorType::Rgb8,
            image::ImageFormat::Png,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_cleared() {
        let fb = Framebuffer::new(4, 3);
        assert_eq!(fb.pixels().len(), 4 * 3 * 3);
        assert_eq!(fb.pixel(3, 2), Some(Color::BACKGROUND));
        assert_eq!(fb.depth(0, 0), Some(DEPTH_CLEAR));
        assert_eq!(fb.covered_count(), 0);
    }

    #[test]
    fn test_nearer_write_wins() {
        let mut fb = Framebuffer::new(8, 8);
        assert!(fb.set_pixel_with_depth(2, 3, 0.8, Color::RED));
        assert!(fb.set_pixel_with_depth(2, 3, 0.4, Color::GREEN));
        assert_eq!(fb.pixel(2, 3), Some(Color::GREEN));
        assert_eq!(fb.depth(2, 3), Some(0.4));
    }

    #[test]
    fn test_farther_write_ignored() {
        let mut fb = Framebuffer::new(8, 8);
        fb.set_pixel_with_depth(2, 3, 0.4, Color::GREEN);
        assert!(!fb.set_pixel_with_depth(2, 3, 0.9, Color::RED));
        assert!(!fb.set_pixel_with_depth(2, 3, 0.4, Color::RED));
        assert_eq!(fb.pixel(2, 3), Some(Color::GREEN));
        assert_eq!(fb.depth(2, 3), Some(0.4));
    }

    #[test]
    fn test_nan_depth_never_writes() {
        let mut fb = Framebuffer::new(2, 2);
        assert!(!fb.set_pixel_with_depth(0, 0, f32::NAN, Color::RED));
        assert!(!fb.is_covered(0, 0));
    }

    #[test]
    fn test_out_of_bounds_is_noop() {
        let mut fb = Framebuffer::new(4, 4);
        let before = fb.pixels().to_vec();
        assert!(!fb.set_pixel_with_depth(-1, 0, 0.0, Color::RED));
        assert!(!fb.set_pixel_with_depth(4, 0, 0.0, Color::RED));
        assert!(!fb.set_pixel_with_depth(0, 4, 0.0, Color::RED));
        assert_eq!(fb.pixels(), &before[..]);
        assert_eq!(fb.pixel(4, 0), None);
    }

    #[test]
    fn test_bgr_layout() {
        let mut fb = Framebuffer::new(2, 2);
        fb.set_pixel_with_depth(1, 1, 0.5, Color::new(10, 20, 30));
        let offset = (1 * 2 + 1) * 3;
        assert_eq!(&fb.pixels()[offset..offset + 3], &[30, 20, 10]);
        let rgba = fb.to_rgba();
        assert_eq!(&rgba[12..16], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_clear_resets() {
        let mut fb = Framebuffer::new(4, 4);
        fb.set_pixel_with_depth(1, 1, 0.5, Color::RED);
        fb.clear();
        assert_eq!(fb.pixel(1, 1), Some(Color::BACKGROUND));
        assert!(!fb.is_covered(1, 1));
    }

    #[test]
    fn test_resize() {
        let mut fb = Framebuffer::new(4, 4);
        fb.set_pixel_with_depth(1, 1, 0.5, Color::RED);
        fb.resize(4, 4);
        assert!(fb.is_covered(1, 1));
        fb.resize(10, 5);
        assert_eq!((fb.width(), fb.height()), (10, 5));
        assert_eq!(fb.pixels().len(), 150);
        assert_eq!(fb.depths().len(), 50);
        assert_eq!(fb.covered_count(), 0);
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut fb = Framebuffer::new(3, 2);
        fb.set_pixel_with_depth(0, 0, 0.1, Color::RED);
        fb.save_png(&path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
    }
}
