//! CPU reference backend.
//!
//! Rasterizes triangles with edge functions at pixel centers (top-left fill
//! rule, so shared edges are covered once) and runs every fragment through
//! clip planes, scissor, stencil, blending and the color mask.

use crate::coords::{ClipPlane, ClipSlot, Rect, Vec2};
use crate::paint::Color;
use crate::pixels::{PixelBuffer, Rgba8};

use super::raster::{PipelineState, Vertex};
use super::{
    Backend, BlendFactor, ColorMask, CompareFunc, PrimitiveKind, StencilOp, TextureHandle,
};

/// Frame buffer setup for [`SoftwareBackend`].
#[derive(Debug, Clone)]
pub struct SoftwareConfig {
    pub width: u32,
    pub height: u32,
    /// Color the frame buffer starts with and returns to on [`SoftwareBackend::clear`].
    pub clear: Color,
}

impl Default for SoftwareConfig {
    fn default() -> Self {
        Self { width: 640, height: 480, clear: Color::BLACK }
    }
}

pub struct SoftwareBackend {
    state: PipelineState,
    frame: PixelBuffer,
    stencil: Vec<u8>,
    textures: Vec<PixelBuffer>,
    clear: Color,
}

impl SoftwareBackend {
    pub fn new(config: SoftwareConfig) -> Self {
        let SoftwareConfig { width, height, clear } = config;
        log::debug!("software backend {width}x{height}");
        Self {
            state: PipelineState::new(width, height),
            frame: PixelBuffer::filled(width, height, Rgba8::from(clear)),
            stencil: vec![0; width as usize * height as usize],
            textures: Vec::new(),
            clear,
        }
    }

    /// Resets the frame buffer to the configured clear color. Stencil is kept.
    pub fn clear(&mut self) {
        self.frame.fill(Rgba8::from(self.clear));
    }

    pub fn clear_to(&mut self, color: Color) {
        self.frame.fill(Rgba8::from(color));
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        self.frame.get(x, y)
    }

    #[inline]
    pub fn stencil_at(&self, x: u32, y: u32) -> Option<u8> {
        let (w, h) = (self.frame.width(), self.frame.height());
        (x < w && y < h).then(|| self.stencil[(y * w + x) as usize])
    }

    #[inline]
    pub fn frame(&self) -> &PixelBuffer {
        &self.frame
    }

    #[inline]
    pub fn stencil_buffer(&self) -> &[u8] {
        &self.stencil
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.state.color
    }

    #[inline]
    pub fn texturing_enabled(&self) -> bool {
        self.state.texturing
    }

    #[inline]
    pub fn stencil_test_enabled(&self) -> bool {
        self.state.stencil.test_enabled
    }

    #[inline]
    pub fn clip_plane_enabled(&self, slot: ClipSlot) -> bool {
        self.state.planes_enabled[slot.offset()]
    }

    #[inline]
    pub fn color_write_mask(&self) -> ColorMask {
        self.state.color_mask
    }

    fn sample(&self, handle: TextureHandle, uv: Vec2) -> Color {
        let Some(tex) = self.textures.get(handle.0 as usize) else {
            return Color::WHITE;
        };
        let (w, h) = (tex.width(), tex.height());
        if w == 0 || h == 0 {
            return Color::WHITE;
        }
        let tx = ((uv.x * w as f32).floor() as i64).clamp(0, w as i64 - 1) as u32;
        let ty = ((uv.y * h as f32).floor() as i64).clamp(0, h as i64 - 1) as u32;
        tex.get(tx, ty).map(Rgba8::to_color).unwrap_or(Color::WHITE)
    }

    fn raster_triangle(&mut self, tri: &[Vertex; 3]) {
        let [a, mut b, mut c] = *tri;
        let mut area = edge(a.pos, b.pos, c.pos);
        if !(area.abs() > f32::EPSILON) {
            return;
        }
        if area < 0.0 {
            std::mem::swap(&mut b, &mut c);
            area = -area;
        }

        let (w, h) = (self.frame.width() as f32, self.frame.height() as f32);
        let min_x = a.pos.x.min(b.pos.x).min(c.pos.x).floor().max(0.0);
        let min_y = a.pos.y.min(b.pos.y).min(c.pos.y).floor().max(0.0);
        let max_x = a.pos.x.max(b.pos.x).max(c.pos.x).ceil().min(w);
        let max_y = a.pos.y.max(b.pos.y).max(c.pos.y).ceil().min(h);
        if max_x <= min_x || max_y <= min_y {
            return;
        }

        let texture = self.state.textured();
        // Interpolating a constant drifts by an ulp on shared edges.
        let flat = (a.color == b.color && b.color == c.color).then_some(a.color);
        for py in min_y as u32..max_y as u32 {
            for px in min_x as u32..max_x as u32 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let w0 = edge(b.pos, c.pos, p);
                let w1 = edge(c.pos, a.pos, p);
                let w2 = edge(a.pos, b.pos, p);
                if !covers(w0, b.pos, c.pos) || !covers(w1, c.pos, a.pos) || !covers(w2, a.pos, b.pos) {
                    continue;
                }
                let (l0, l1, l2) = (w0 / area, w1 / area, w2 / area);
                let mut color = flat.unwrap_or_else(|| {
                    Color::new(
                        a.color.r * l0 + b.color.r * l1 + c.color.r * l2,
                        a.color.g * l0 + b.color.g * l1 + c.color.g * l2,
                        a.color.b * l0 + b.color.b * l1 + c.color.b * l2,
                        a.color.a * l0 + b.color.a * l1 + c.color.a * l2,
                    )
                });
                if let Some(handle) = texture {
                    let uv = a.uv * l0 + b.uv * l1 + c.uv * l2;
                    let texel = self.sample(handle, uv);
                    color = Color::new(color.r * texel.r, color.g * texel.g, color.b * texel.b, color.a * texel.a);
                }
                self.fragment(px, py, color);
            }
        }
    }

    /// Per-fragment operations in pipeline order.
    fn fragment(&mut self, px: u32, py: u32, src: Color) {
        let center = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
        if !self.state.clip_keeps(center) || !self.state.scissor_keeps(center) {
            return;
        }

        let idx = (py * self.frame.width() + px) as usize;
        let (passed, next) = self.state.stencil.evaluate(self.stencil[idx]);
        self.stencil[idx] = next;
        if !passed {
            return;
        }

        let mask = self.state.color_mask;
        if !mask.any() {
            return;
        }
        let Some(dst_px) = self.frame.get(px, py) else { return };
        let dst = dst_px.to_color();
        let out = blend(self.state.blend.src, self.state.blend.dst, src.clamped(), dst);
        let out = Rgba8::from(out);
        let merged = Rgba8 {
            r: if mask.r { out.r } else { dst_px.r },
            g: if mask.g { out.g } else { dst_px.g },
            b: if mask.b { out.b } else { dst_px.b },
            a: if mask.a { out.a } else { dst_px.a },
        };
        self.frame.set(px, py, merged);
    }

    fn raster_all(&mut self, tris: &[[Vertex; 3]]) {
        for tri in tris {
            self.raster_triangle(tri);
        }
    }
}

#[inline]
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Top-left rule for a positively oriented triangle in +Y-down space.
#[inline]
fn covers(w: f32, from: Vec2, to: Vec2) -> bool {
    if w > 0.0 {
        return true;
    }
    w == 0.0 && ((from.y == to.y && to.x > from.x) || to.y < from.y)
}

fn blend(src_f: BlendFactor, dst_f: BlendFactor, src: Color, dst: Color) -> Color {
    let factor = |f: BlendFactor| match f {
        BlendFactor::Zero => 0.0,
        BlendFactor::One => 1.0,
        BlendFactor::SrcAlpha => src.a,
        BlendFactor::OneMinusSrcAlpha => 1.0 - src.a,
        BlendFactor::DstAlpha => dst.a,
        BlendFactor::OneMinusDstAlpha => 1.0 - dst.a,
    };
    let (s, d) = (factor(src_f), factor(dst_f));
    Color::new(
        src.r * s + dst.r * d,
        src.g * s + dst.g * d,
        src.b * s + dst.b * d,
        src.a * s + dst.a * d,
    )
    .clamped()
}

impl Backend for SoftwareBackend {
    fn reset_transform(&mut self) {
        self.state.transform = crate::coords::Affine::IDENTITY;
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state.transform.translate(x, y);
    }

    fn rotate(&mut self, degrees: f32) {
        self.state.transform.rotate(degrees);
    }

    fn set_texturing_enabled(&mut self, enabled: bool) {
        self.state.texturing = enabled;
    }

    fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.state.set_blend(src, dst);
    }

    fn set_color_write_mask(&mut self, mask: ColorMask) {
        self.state.color_mask = mask;
    }

    fn set_color(&mut self, color: Color) {
        self.state.color = color;
    }

    fn begin_primitive(&mut self, kind: PrimitiveKind) {
        self.state.begin(kind);
    }

    fn emit_vertex(&mut self, x: f32, y: f32) {
        self.state.vertex(x, y);
    }

    fn set_tex_coord(&mut self, u: f32, v: f32) {
        self.state.tex_coord = Vec2::new(u, v);
    }

    fn end_primitive(&mut self) {
        let tris = self.state.end();
        self.raster_all(&tris);
    }

    fn draw_filled_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let tris = self.state.rect(x, y, w, h);
        self.raster_all(&tris);
    }

    fn set_stencil_mask(&mut self, mask: u8) {
        self.state.stencil.write_mask = mask;
    }

    fn set_stencil_func(&mut self, func: CompareFunc, reference: u8, mask: u8) {
        self.state.set_stencil_func(func, reference, mask);
    }

    fn set_stencil_op(&mut self, fail: StencilOp, zfail: StencilOp, pass: StencilOp) {
        self.state.set_stencil_op(fail, zfail, pass);
    }

    fn set_stencil_test_enabled(&mut self, enabled: bool) {
        self.state.stencil.test_enabled = enabled;
    }

    fn clear_stencil(&mut self, value: u8) {
        self.stencil.fill(value);
    }

    fn set_scissor_test_enabled(&mut self, enabled: bool) {
        self.state.scissor_enabled = enabled;
    }

    fn set_scissor(&mut self, rect: Rect) {
        self.state.scissor = rect.normalized();
    }

    fn set_clip_plane(&mut self, slot: ClipSlot, plane: ClipPlane) {
        self.state.set_clip_plane(slot, plane);
    }

    fn set_clip_plane_enabled(&mut self, slot: ClipSlot, enabled: bool) {
        self.state.set_clip_plane_enabled(slot, enabled);
    }

    fn upload_texture(&mut self, pixels: &PixelBuffer) -> TextureHandle {
        self.textures.push(pixels.clone());
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        self.state.texture = texture;
    }

    fn read_pixels(&mut self, rect: Rect) -> PixelBuffer {
        match rect.pixel_span(self.frame.width(), self.frame.height()) {
            Some((x0, y0, x1, y1)) => self.frame.region(x0, y0, x1 - x0, y1 - y0),
            None => PixelBuffer::new(0, 0),
        }
    }

    fn write_pixels(&mut self, x: i32, y: i32, pixels: &PixelBuffer) {
        let (fw, fh) = (self.frame.width() as i64, self.frame.height() as i64);
        for row in 0..pixels.height() {
            let py = y as i64 + row as i64;
            if py < 0 || py >= fh {
                continue;
            }
            for col in 0..pixels.width() {
                let px = x as i64 + col as i64;
                if px < 0 || px >= fw {
                    continue;
                }
                if let Some(src) = pixels.get(col, row) {
                    self.fragment(px as u32, py as u32, src.to_color());
                }
            }
        }
    }

    fn viewport(&self) -> (u32, u32) {
        (self.frame.width(), self.frame.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(w: u32, h: u32) -> SoftwareBackend {
        SoftwareBackend::new(SoftwareConfig { width: w, height: h, clear: Color::BLACK })
    }

    const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);
    const BLACK: Rgba8 = Rgba8::new(0, 0, 0, 255);

    // ── coverage ───────────────────────────────────────────────────────────

    #[test]
    fn rect_covers_exactly_its_pixel_centers() {
        let mut b = backend(8, 8);
        b.set_color(Color::rgb(1.0, 0.0, 0.0));
        b.draw_filled_rect(2.0, 2.0, 3.0, 2.0);
        assert_eq!(b.pixel(2, 2), Some(RED));
        assert_eq!(b.pixel(4, 3), Some(RED));
        assert_eq!(b.pixel(5, 2), Some(BLACK));
        assert_eq!(b.pixel(2, 4), Some(BLACK));
        assert_eq!(b.pixel(1, 2), Some(BLACK));
    }

    #[test]
    fn shared_diagonal_is_blended_once() {
        let mut b = backend(10, 10);
        b.set_color(Color::new(1.0, 1.0, 1.0, 0.5));
        b.draw_filled_rect(0.0, 0.0, 10.0, 10.0);
        let first = b.pixel(0, 0).unwrap();
        assert!(b.frame().pixels().iter().all(|p| *p == first));
    }

    #[test]
    fn rotated_rect_follows_transform() {
        let mut b = backend(20, 20);
        b.set_color(Color::rgb(1.0, 0.0, 0.0));
        b.translate(10.0, 0.0);
        b.rotate(90.0);
        // (0..10) along +X becomes (0..10) along +Y; (0..4) along +Y becomes -X.
        b.draw_filled_rect(0.0, 0.0, 10.0, 4.0);
        assert_eq!(b.pixel(8, 5), Some(RED));
        assert_eq!(b.pixel(11, 5), Some(BLACK));
    }

    // ── fragment state ─────────────────────────────────────────────────────

    #[test]
    fn clip_plane_discards_fragments() {
        let mut b = backend(10, 10);
        b.set_clip_plane(ClipSlot::Second, ClipPlane::new(-1.0, 0.0, 0.0, 5.0));
        b.set_clip_plane_enabled(ClipSlot::Second, true);
        b.set_color(Color::rgb(1.0, 0.0, 0.0));
        b.draw_filled_rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(b.pixel(4, 0), Some(RED));
        assert_eq!(b.pixel(5, 0), Some(BLACK));
    }

    #[test]
    fn scissor_limits_writes() {
        let mut b = backend(10, 10);
        b.set_scissor(Rect::new(0.0, 0.0, 3.0, 3.0));
        b.set_scissor_test_enabled(true);
        b.set_color(Color::rgb(1.0, 0.0, 0.0));
        b.draw_filled_rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(b.pixel(2, 2), Some(RED));
        assert_eq!(b.pixel(3, 3), Some(BLACK));
    }

    #[test]
    fn stencil_paint_then_enforce() {
        let mut b = backend(10, 10);
        b.set_stencil_test_enabled(true);
        b.set_stencil_mask(1);
        b.set_stencil_func(CompareFunc::Always, 1, 1);
        b.set_stencil_op(StencilOp::Replace, StencilOp::Replace, StencilOp::Replace);
        b.set_color_write_mask(ColorMask::NONE);
        b.draw_filled_rect(0.0, 0.0, 5.0, 10.0);
        b.set_color_write_mask(ColorMask::ALL);
        assert_eq!(b.pixel(0, 0), Some(BLACK));
        assert_eq!(b.stencil_at(0, 0), Some(1));

        b.set_stencil_func(CompareFunc::Equal, 1, 1);
        b.set_stencil_op(StencilOp::Keep, StencilOp::Keep, StencilOp::Keep);
        b.set_color(Color::rgb(1.0, 0.0, 0.0));
        b.draw_filled_rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(b.pixel(4, 4), Some(RED));
        assert_eq!(b.pixel(5, 4), Some(BLACK));
    }

    #[test]
    fn texture_modulates_color() {
        let mut b = backend(4, 4);
        let tex = b.upload_texture(&PixelBuffer::filled(1, 1, Rgba8::new(0, 255, 0, 255)));
        b.bind_texture(Some(tex));
        b.set_color(Color::WHITE);
        b.draw_filled_rect(0.0, 0.0, 4.0, 4.0);
        assert_eq!(b.pixel(1, 1), Some(Rgba8::new(0, 255, 0, 255)));

        b.set_texturing_enabled(false);
        b.draw_filled_rect(0.0, 0.0, 4.0, 4.0);
        assert_eq!(b.pixel(1, 1), Some(Rgba8::new(255, 255, 255, 255)));
    }

    // ── pixels ─────────────────────────────────────────────────────────────

    #[test]
    fn write_pixels_respects_stencil() {
        let mut b = backend(4, 1);
        b.set_stencil_test_enabled(true);
        b.set_stencil_func(CompareFunc::Equal, 1, 1);
        b.set_stencil_op(StencilOp::Keep, StencilOp::Keep, StencilOp::Keep);
        b.stencil[1] = 1;
        b.write_pixels(0, 0, &PixelBuffer::filled(4, 1, RED));
        assert_eq!(b.pixel(0, 0), Some(BLACK));
        assert_eq!(b.pixel(1, 0), Some(RED));
    }

    #[test]
    fn read_pixels_clamps_to_viewport() {
        let mut b = backend(4, 4);
        let buf = b.read_pixels(Rect::new(2.0, 2.0, 10.0, 10.0));
        assert_eq!((buf.width(), buf.height()), (2, 2));
        assert_eq!(b.read_pixels(Rect::new(10.0, 10.0, 2.0, 2.0)).width(), 0);
    }
}
