//! CPU pixel buffers and the per-pixel transforms that run on them.
//!
//! This is the one place colors exist as bytes. Everything above this module
//! works with [`Color`] (`f32` channels in `[0, 1]`); conversion happens through
//! [`Color::to_rgba8`] / [`Color::from_rgba8`] whenever a buffer is read or
//! written. Color-key comparisons are done on bytes after converting the key.

use bytemuck::{Pod, Zeroable};

use crate::paint::Color;

/// One RGBA8 pixel, straight alpha.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const TRANSPARENT: Rgba8 = Rgba8 { r: 0, g: 0, b: 0, a: 0 };

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub fn to_color(self) -> Color {
        Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    #[inline]
    pub fn same_rgb(self, other: Rgba8) -> bool {
        self.r == other.r && self.g == other.g && self.b == other.b
    }
}

impl From<Color> for Rgba8 {
    fn from(c: Color) -> Self {
        let [r, g, b, a] = c.to_rgba8();
        Rgba8 { r, g, b, a }
    }
}

/// Row-major RGBA8 image, origin top-left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba8::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, px: Rgba8) -> Self {
        Self { width, height, pixels: vec![px; width as usize * height as usize] }
    }

    /// Wraps tightly packed RGBA bytes. Returns `None` when the length does not
    /// match `width * height * 4`.
    pub fn from_rgba_bytes(width: u32, height: u32, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != width as usize * height as usize * 4 {
            return None;
        }
        let pixels: &[Rgba8] = bytemuck::try_cast_slice(bytes).ok()?;
        Some(Self { width, height, pixels: pixels.to_vec() })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba8> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Writes one pixel; out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, px: Rgba8) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = px;
        }
    }

    pub fn fill(&mut self, px: Rgba8) {
        self.pixels.fill(px);
    }

    /// Moves each color channel `intensity` of the way toward the pixel's
    /// luminance `0.3 r + 0.59 g + 0.11 b`. Alpha is untouched.
    ///
    /// `intensity` is clamped to `[0, 1]`.
    pub fn greyscale(&mut self, intensity: f32) {
        let t = intensity.clamp(0.0, 1.0);
        for px in &mut self.pixels {
            let (r, g, b) = (px.r as f32, px.g as f32, px.b as f32);
            let lum = 0.3 * r + 0.59 * g + 0.11 * b;
            let toward = |c: f32| (c + (lum - c) * t).round().clamp(0.0, 255.0) as u8;
            px.r = toward(r);
            px.g = toward(g);
            px.b = toward(b);
        }
    }

    /// Replaces every pixel whose RGB matches `from` with `to`, keeping the
    /// original alpha. Returns the number of replaced pixels.
    pub fn replace_color(&mut self, from: Color, to: Color) -> usize {
        let (key, repl) = (Rgba8::from(from), Rgba8::from(to));
        let mut n = 0;
        for px in &mut self.pixels {
            if px.same_rgb(key) {
                *px = Rgba8 { a: px.a, ..repl };
                n += 1;
            }
        }
        n
    }

    /// Makes every pixel whose RGB matches `key` fully transparent.
    pub fn apply_color_key(&mut self, key: Color) -> usize {
        let key = Rgba8::from(key);
        let mut n = 0;
        for px in &mut self.pixels {
            if px.same_rgb(key) {
                px.a = 0;
                n += 1;
            }
        }
        n
    }

    /// Copies a `w × h` sub-image starting at `(x, y)`, clamped to the buffer.
    pub fn region(&self, x: u32, y: u32, w: u32, h: u32) -> PixelBuffer {
        let x1 = x.saturating_add(w).min(self.width);
        let y1 = y.saturating_add(h).min(self.height);
        let (x0, y0) = (x.min(x1), y.min(y1));
        let mut out = PixelBuffer::new(x1 - x0, y1 - y0);
        for row in y0..y1 {
            let src = self.index(x0, row).unwrap_or(0);
            let dst = (row - y0) as usize * out.width as usize;
            let len = (x1 - x0) as usize;
            out.pixels[dst..dst + len].copy_from_slice(&self.pixels[src..src + len]);
        }
        out
    }

    pub fn to_image(&self) -> image::RgbaImage {
        let mut img = image::RgbaImage::new(self.width, self.height);
        img.copy_from_slice(self.as_bytes());
        img
    }
}

impl From<image::RgbaImage> for PixelBuffer {
    fn from(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = bytemuck::cast_slice::<u8, Rgba8>(img.as_raw()).to_vec();
        Self { width, height, pixels }
    }
}
