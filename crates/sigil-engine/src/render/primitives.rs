//! Primitive drawer.
//!
//! Every call starts from an identity transform, translates to the shape's
//! origin (rotating about the shape's own center when asked), draws solid
//! shapes with texturing off, and leaves the backend with texturing on and an
//! opaque white current color.

use crate::backend::{PrimitiveKind, TextureHandle};
use crate::coords::{Rect, Vec2};
use crate::paint::{Color, Gradient};

use super::error::{check_finite, check_radius, check_width, rejected};
use super::{GeometryError, RenderContext};

/// Upper bound on segments per arc; finer steps are rejected.
const MAX_ARC_SEGMENTS: f32 = 65_536.0;

/// Angular range of a circle or arc, in degrees.
///
/// Angle 0 points at 3 o'clock and angles grow clockwise on screen. The range
/// is tessellated in `step`-degree segments.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ArcSpan {
    pub start: f32,
    pub end: f32,
    pub step: f32,
}

impl ArcSpan {
    #[inline]
    pub const fn new(start: f32, end: f32, step: f32) -> Self {
        Self { start, end, step }
    }

    /// Whole circle.
    #[inline]
    pub const fn full(step: f32) -> Self {
        Self::new(0.0, 360.0, step)
    }

    pub fn validate(self) -> Result<(), GeometryError> {
        check_finite(self.start.is_finite() && self.end.is_finite(), "arc angle")?;
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(rejected(GeometryError::InvalidStep(self.step)));
        }
        if self.end < self.start {
            return Err(rejected(GeometryError::InvalidSweep { start: self.start, end: self.end }));
        }
        if (self.end - self.start) / self.step > MAX_ARC_SEGMENTS {
            return Err(rejected(GeometryError::InvalidStep(self.step)));
        }
        Ok(())
    }

    /// `ceil((end - start) / step)`.
    #[inline]
    pub fn segment_count(self) -> usize {
        ((self.end - self.start) / self.step).ceil().max(0.0) as usize
    }

    /// `(trailing, leading)` angle of every segment. The last leading angle is
    /// clamped to `end`.
    pub fn segments(self) -> impl Iterator<Item = (f32, f32)> {
        let ArcSpan { start, end, step } = self;
        (0..self.segment_count()).map(move |k| {
            let t0 = start + k as f32 * step;
            (t0, (t0 + step).min(end))
        })
    }

    #[inline]
    pub fn is_full_circle(self) -> bool {
        self.end - self.start >= 360.0
    }
}

/// Which way a triangle points.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

#[inline]
fn on_circle(radius: f32, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees) * radius
}

fn checked_rect(rect: Rect) -> Result<Rect, GeometryError> {
    check_finite(rect.is_finite(), "rectangle")?;
    Ok(rect.normalized())
}

fn checked_colors(colors: &[Color]) -> Result<(), GeometryError> {
    check_finite(colors.iter().all(|c| c.is_finite()), "color")
}

/// Rotation that turns +X onto the direction from `from` to `to`.
pub(crate) fn line_angle(from: Vec2, to: Vec2) -> f32 {
    let (x1, y1, x2, y2) = (from.x, from.y, to.x, to.y);
    let base = if x2 <= x1 && y2 > y1 {
        90.0
    } else if x2 < x1 && y2 <= y1 {
        180.0
    } else if x2 >= x1 && y2 < y1 {
        270.0
    } else {
        0.0
    };
    let dx = (x2 - x1).abs();
    let dy = (y2 - y1).abs();
    let mut angle = 0.0;
    if dx != 0.0 {
        angle = (dy / dx).atan().to_degrees();
        if base == 90.0 || base == 270.0 {
            angle = 90.0 - angle;
        }
    }
    base + angle
}

impl RenderContext<'_> {
    /// Identity transform, translate to `origin`, texturing off, `color` current.
    fn begin_solid(&mut self, origin: Vec2, color: Color) {
        let b = self.backend();
        b.set_texturing_enabled(false);
        b.reset_transform();
        b.translate(origin.x, origin.y);
        b.set_color(color);
    }

    fn end_solid(&mut self) {
        let b = self.backend();
        b.set_texturing_enabled(true);
        b.set_color(Color::WHITE);
    }

    /// Rotates about the center of a `size` box whose origin is the current translation.
    fn rotate_about_center(&mut self, size: Vec2, degrees: f32) {
        if degrees == 0.0 {
            return;
        }
        let b = self.backend();
        b.translate(size.x / 2.0, size.y / 2.0);
        b.rotate(degrees);
        b.translate(-size.x / 2.0, -size.y / 2.0);
    }

    // ── rectangles ─────────────────────────────────────────────────────────

    pub fn draw_rect(&mut self, rect: Rect, color: Color) -> Result<(), GeometryError> {
        self.draw_rotated_rect(rect, color, 0.0)
    }

    /// Rectangle rotated by `degrees` about its own center.
    pub fn draw_rotated_rect(&mut self, rect: Rect, color: Color, degrees: f32) -> Result<(), GeometryError> {
        let rect = checked_rect(rect)?;
        checked_colors(&[color])?;
        check_finite(degrees.is_finite(), "angle")?;

        self.begin_solid(rect.origin, color);
        self.rotate_about_center(rect.size, degrees);
        self.backend().draw_filled_rect(0.0, 0.0, rect.width(), rect.height());
        self.end_solid();
        Ok(())
    }

    /// Four `frame_size`-wide bands along the inside of `rect`.
    pub fn draw_rect_frame(&mut self, rect: Rect, color: Color, frame_size: f32) -> Result<(), GeometryError> {
        let rect = checked_rect(rect)?;
        checked_colors(&[color])?;
        check_finite(frame_size.is_finite(), "frame size")?;

        let (w, h, f) = (rect.width(), rect.height(), frame_size.max(0.0));
        self.begin_solid(rect.origin, color);
        let b = self.backend();
        b.draw_filled_rect(0.0, 0.0, w, f);
        b.draw_filled_rect(w - f, 0.0, f, h);
        b.draw_filled_rect(0.0, h - f, w, f);
        b.draw_filled_rect(0.0, 0.0, f, h);
        self.end_solid();
        Ok(())
    }

    /// Rectangle with a two-stop gradient, one color per edge pair.
    pub fn draw_rect_gradient(&mut self, rect: Rect, gradient: &Gradient) -> Result<(), GeometryError> {
        let rect = checked_rect(rect)?;
        checked_colors(&[gradient.from, gradient.to])?;

        let (w, h) = (rect.width(), rect.height());
        let [tl, tr, bl, br] = gradient.corners();
        self.begin_solid(rect.origin, tl);
        let b = self.backend();
        b.begin_primitive(PrimitiveKind::QuadStrip);
        for (color, x, y) in [(bl, 0.0, h), (tl, 0.0, 0.0), (br, w, h), (tr, w, 0.0)] {
            b.set_color(color);
            b.emit_vertex(x, y);
        }
        b.end_primitive();
        self.end_solid();
        Ok(())
    }

    // ── circles and arcs ───────────────────────────────────────────────────

    /// Filled fan over `arc`.
    pub fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color, arc: ArcSpan) -> Result<(), GeometryError> {
        self.fan(center, radius, arc, |_| color, color)
    }

    /// Fan blending `from` into `to` with factor `(1 + cos θ) / 2`.
    ///
    /// The hub takes the channel average and `from`'s alpha; the rim takes
    /// `to`'s alpha.
    pub fn draw_circle_gradient(
        &mut self,
        center: Vec2,
        radius: f32,
        from: Color,
        to: Color,
        arc: ArcSpan,
    ) -> Result<(), GeometryError> {
        checked_colors(&[from, to])?;
        let hub = from.lerp(to, 0.5).with_alpha(from.a);
        self.fan(
            center,
            radius,
            arc,
            |deg| {
                let t = (1.0 + deg.to_radians().cos()) / 2.0;
                from.lerp(to, t).with_alpha(to.a)
            },
            hub,
        )
    }

    /// Fan with `inner` at the center and `outer` on the rim.
    pub fn draw_circle_radial_gradient(
        &mut self,
        center: Vec2,
        radius: f32,
        inner: Color,
        outer: Color,
        arc: ArcSpan,
    ) -> Result<(), GeometryError> {
        self.fan(center, radius, arc, |_| outer, inner)
    }

    fn fan(
        &mut self,
        center: Vec2,
        radius: f32,
        arc: ArcSpan,
        rim: impl Fn(f32) -> Color,
        hub: Color,
    ) -> Result<(), GeometryError> {
        check_finite(center.is_finite(), "center")?;
        check_radius(radius)?;
        arc.validate()?;
        checked_colors(&[hub, rim(arc.start)])?;

        self.begin_solid(center, hub);
        let b = self.backend();
        b.begin_primitive(PrimitiveKind::TriangleFan);
        b.emit_vertex(0.0, 0.0);
        for (t0, t1) in arc.segments() {
            for deg in [t0, t1] {
                let p = on_circle(radius, deg);
                b.set_color(rim(deg));
                b.emit_vertex(p.x, p.y);
            }
        }
        b.end_primitive();
        log::trace!("fan r={radius} {arc:?}: {} pairs", arc.segment_count());
        self.end_solid();
        Ok(())
    }

    /// One-pixel outline through the arc's segment boundaries.
    pub fn draw_circle_outline(&mut self, center: Vec2, radius: f32, color: Color, arc: ArcSpan) -> Result<(), GeometryError> {
        check_finite(center.is_finite(), "center")?;
        check_radius(radius)?;
        arc.validate()?;
        checked_colors(&[color])?;

        self.begin_solid(center, color);
        let b = self.backend();
        b.begin_primitive(PrimitiveKind::LineLoop);
        for (t0, _) in arc.segments() {
            let p = on_circle(radius, t0);
            b.emit_vertex(p.x, p.y);
        }
        if !arc.is_full_circle() {
            let p = on_circle(radius, arc.end);
            b.emit_vertex(p.x, p.y);
        }
        b.end_primitive();
        self.end_solid();
        Ok(())
    }

    /// Ring segment between `radius - thickness` and `radius`.
    pub fn draw_radial_arc(
        &mut self,
        center: Vec2,
        radius: f32,
        thickness: f32,
        color: Color,
        arc: ArcSpan,
    ) -> Result<(), GeometryError> {
        check_finite(center.is_finite(), "center")?;
        check_radius(radius)?;
        check_width(thickness)?;
        arc.validate()?;
        checked_colors(&[color])?;

        let inner = (radius - thickness).max(0.0);
        self.begin_solid(center, color);
        let b = self.backend();
        b.begin_primitive(PrimitiveKind::QuadStrip);
        let mut emit = |deg: f32| {
            let (pi, po) = (on_circle(inner, deg), on_circle(radius, deg));
            b.emit_vertex(pi.x, pi.y);
            b.emit_vertex(po.x, po.y);
        };
        let mut last = None;
        for (t0, t1) in arc.segments() {
            emit(t0);
            last = Some(t1);
        }
        if let Some(t1) = last {
            emit(t1);
        }
        b.end_primitive();
        self.end_solid();
        Ok(())
    }

    // ── lines and triangles ────────────────────────────────────────────────

    /// Line drawn as a filled `length × thickness` rectangle rotated from `from`
    /// toward `to`. The band lies on the clockwise side of the line.
    pub fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color, thickness: f32) -> Result<(), GeometryError> {
        check_finite(from.is_finite() && to.is_finite(), "line endpoint")?;
        check_finite(thickness.is_finite(), "line thickness")?;
        checked_colors(&[color])?;

        let length = (to - from).length();
        self.begin_solid(from, color);
        let b = self.backend();
        b.rotate(line_angle(from, to));
        b.draw_filled_rect(0.0, 0.0, length, thickness);
        self.end_solid();
        Ok(())
    }

    /// Isosceles triangle inscribed in `rect`, optionally with a one-pixel border.
    pub fn draw_triangle(
        &mut self,
        rect: Rect,
        color: Color,
        border: Option<Color>,
        direction: Direction,
    ) -> Result<(), GeometryError> {
        let rect = checked_rect(rect)?;
        checked_colors(&[color, border.unwrap_or(color)])?;

        let (w, h) = (rect.width(), rect.height());
        let corners = |pad: f32| match direction {
            Direction::Up => [(-pad, h + pad), (w / 2.0, -pad), (w + pad, h + pad)],
            Direction::Right => [(-pad, -pad), (-pad, h + pad), (w + pad, h / 2.0)],
            Direction::Down => [(-pad, -pad), (w / 2.0, h + pad), (w + pad, -pad)],
            Direction::Left => [(w + pad, -pad), (w + pad, h + pad), (-pad, h / 2.0)],
        };

        self.begin_solid(rect.origin, color);
        let passes = border.map(|c| (c, 1.0)).into_iter().chain(std::iter::once((color, 0.0)));
        for (c, pad) in passes {
            let b = self.backend();
            b.set_color(c);
            b.begin_primitive(PrimitiveKind::TriangleStrip);
            for (x, y) in corners(pad) {
                b.emit_vertex(x, y);
            }
            b.end_primitive();
        }
        self.end_solid();
        Ok(())
    }

    // ── textures ───────────────────────────────────────────────────────────

    /// Whole texture stretched over `rect`, modulated by `tint`.
    pub fn draw_texture(&mut self, texture: TextureHandle, rect: Rect, tint: Color) -> Result<(), GeometryError> {
        self.draw_texture_region(texture, rect, Rect::new(0.0, 0.0, 1.0, 1.0), tint, 0.0)
    }

    /// Sub-rectangle `uv` (normalized, top-left origin) of a texture over `rect`,
    /// rotated by `degrees` about the rectangle's center.
    pub fn draw_texture_region(
        &mut self,
        texture: TextureHandle,
        rect: Rect,
        uv: Rect,
        tint: Color,
        degrees: f32,
    ) -> Result<(), GeometryError> {
        let rect = checked_rect(rect)?;
        check_finite(uv.is_finite(), "texture coordinates")?;
        check_finite(degrees.is_finite(), "angle")?;
        checked_colors(&[tint])?;
        self.textured_quad(texture, rect, uv, degrees, [tint; 4]);
        Ok(())
    }

    /// Whole texture over `rect`, modulated by a gradient.
    pub fn draw_texture_gradient(
        &mut self,
        texture: TextureHandle,
        rect: Rect,
        gradient: &Gradient,
    ) -> Result<(), GeometryError> {
        let rect = checked_rect(rect)?;
        checked_colors(&[gradient.from, gradient.to])?;
        self.textured_quad(texture, rect, Rect::new(0.0, 0.0, 1.0, 1.0), 0.0, gradient.corners());
        Ok(())
    }

    /// `colors` in `[top_left, top_right, bottom_left, bottom_right]` order.
    fn textured_quad(&mut self, texture: TextureHandle, rect: Rect, uv: Rect, degrees: f32, colors: [Color; 4]) {
        let (w, h) = (rect.width(), rect.height());
        let (u0, v0, u1, v1) = (uv.x(), uv.y(), uv.x() + uv.width(), uv.y() + uv.height());
        let [tl, tr, bl, br] = colors;

        let b = self.backend();
        b.set_texturing_enabled(true);
        b.bind_texture(Some(texture));
        b.reset_transform();
        b.translate(rect.x(), rect.y());
        self.rotate_about_center(rect.size, degrees);

        let b = self.backend();
        b.begin_primitive(PrimitiveKind::QuadStrip);
        for (color, u, v, x, y) in [
            (bl, u0, v1, 0.0, h),
            (tl, u0, v0, 0.0, 0.0),
            (br, u1, v1, w, h),
            (tr, u1, v0, w, 0.0),
        ] {
            b.set_color(color);
            b.set_tex_coord(u, v);
            b.emit_vertex(x, y);
        }
        b.end_primitive();
        b.set_color(Color::WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        BackendCall, DrawShape, RecordingBackend, SoftwareBackend, SoftwareConfig,
    };
    use crate::coords::ClipSlot;
    use crate::pixels::{PixelBuffer, Rgba8};

    const RED: Color = Color::rgb(1.0, 0.0, 0.0);

    fn software(w: u32, h: u32) -> SoftwareBackend {
        SoftwareBackend::new(SoftwareConfig { width: w, height: h, clear: Color::BLACK })
    }

    fn assert_restored(b: &SoftwareBackend) {
        assert_eq!(b.color(), Color::WHITE);
        assert!(b.texturing_enabled());
        assert!(!b.stencil_test_enabled());
        for slot in ClipSlot::ALL {
            assert!(!b.clip_plane_enabled(slot));
        }
    }

    // ── arc tessellation ───────────────────────────────────────────────────

    #[test]
    fn segment_count_is_ceiling_of_sweep_over_step() {
        assert_eq!(ArcSpan::new(0.0, 90.0, 10.0).segment_count(), 9);
        assert_eq!(ArcSpan::new(0.0, 90.0, 20.0).segment_count(), 5);
        assert_eq!(ArcSpan::new(30.0, 31.0, 7.0).segment_count(), 1);
        assert_eq!(ArcSpan::new(45.0, 45.0, 5.0).segment_count(), 0);
    }

    #[test]
    fn last_segment_stops_at_end() {
        let segs: Vec<_> = ArcSpan::new(0.0, 50.0, 20.0).segments().collect();
        assert_eq!(segs, vec![(0.0, 20.0), (20.0, 40.0), (40.0, 50.0)]);
    }

    #[test]
    fn fan_emits_one_vertex_pair_per_segment() {
        for (arc, pairs) in [
            (ArcSpan::new(0.0, 360.0, 5.0), 72),
            (ArcSpan::new(10.0, 100.0, 7.0), 13),
            (ArcSpan::new(180.0, 270.0, 10.0), 9),
        ] {
            let mut b = RecordingBackend::new(100, 100);
            let mut ctx = RenderContext::new(&mut b);
            ctx.draw_circle(Vec2::new(50.0, 50.0), 20.0, RED, arc).unwrap();
            drop(ctx);
            assert_eq!(
                b.draws().last().map(|d| d.shape),
                Some(DrawShape::Primitive { kind: PrimitiveKind::TriangleFan, vertices: 1 + 2 * pairs })
            );
        }
    }

    #[test]
    fn bad_arcs_are_rejected_before_any_call() {
        let mut b = RecordingBackend::new(10, 10);
        let mut ctx = RenderContext::new(&mut b);
        let c = Vec2::new(5.0, 5.0);
        assert_eq!(
            ctx.draw_circle(c, 4.0, RED, ArcSpan::new(0.0, 90.0, 0.0)),
            Err(GeometryError::InvalidStep(0.0))
        );
        assert!(matches!(
            ctx.draw_circle(c, 4.0, RED, ArcSpan::new(90.0, 0.0, 5.0)),
            Err(GeometryError::InvalidSweep { .. })
        ));
        assert_eq!(
            ctx.draw_circle(c, -1.0, RED, ArcSpan::full(5.0)),
            Err(GeometryError::InvalidRadius(-1.0))
        );
        assert!(ctx.draw_circle(c, 4.0, RED, ArcSpan::new(0.0, 360.0, 1e-6)).is_err());
        drop(ctx);
        assert!(b.draws().is_empty());
    }

    // ── state restoration ──────────────────────────────────────────────────

    #[test]
    fn every_primitive_restores_default_state() {
        let mut b = software(64, 64);
        let tex = {
            use crate::backend::Backend;
            b.upload_texture(&PixelBuffer::filled(2, 2, Rgba8::new(255, 255, 255, 255)))
        };
        let mut ctx = RenderContext::new(&mut b);
        let r = Rect::new(4.0, 4.0, 20.0, 10.0);
        let c = Vec2::new(32.0, 32.0);
        let g = Gradient::vertical(RED, Color::BLACK);
        ctx.draw_rect(r, RED).unwrap();
        ctx.draw_rotated_rect(r, RED, 30.0).unwrap();
        ctx.draw_rect_frame(r, RED, 2.0).unwrap();
        ctx.draw_rect_gradient(r, &g).unwrap();
        ctx.draw_circle(c, 10.0, RED, ArcSpan::full(5.0)).unwrap();
        ctx.draw_circle_gradient(c, 10.0, RED, Color::BLACK, ArcSpan::full(5.0)).unwrap();
        ctx.draw_circle_radial_gradient(c, 10.0, RED, Color::BLACK, ArcSpan::full(5.0)).unwrap();
        ctx.draw_circle_outline(c, 10.0, RED, ArcSpan::new(0.0, 180.0, 10.0)).unwrap();
        ctx.draw_radial_arc(c, 10.0, 3.0, RED, ArcSpan::new(0.0, 90.0, 10.0)).unwrap();
        ctx.draw_line(Vec2::new(1.0, 1.0), Vec2::new(40.0, 20.0), RED, 2.0).unwrap();
        ctx.draw_triangle(r, RED, Some(Color::BLACK), Direction::Down).unwrap();
        ctx.draw_texture(tex, r, RED).unwrap();
        ctx.draw_texture_region(tex, r, Rect::new(0.0, 0.0, 0.5, 0.5), RED, 45.0).unwrap();
        ctx.draw_texture_gradient(tex, r, &g).unwrap();
        drop(ctx);
        assert_restored(&b);
    }

    #[test]
    fn solid_shapes_draw_with_texturing_off() {
        let mut b = RecordingBackend::new(32, 32);
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_rect(Rect::new(0.0, 0.0, 4.0, 4.0), RED).unwrap();
        drop(ctx);
        let draw = b.draws().last().copied().unwrap();
        assert!(!draw.texturing);
        assert_eq!(draw.color, RED);
        assert!(b.calls().contains(&BackendCall::ResetTransform));
    }

    // ── pixels ─────────────────────────────────────────────────────────────

    #[test]
    fn rotated_rect_turns_about_its_center() {
        let mut b = software(40, 40);
        let mut ctx = RenderContext::new(&mut b);
        // 20x4 bar centered at (20, 20), turned upright.
        ctx.draw_rotated_rect(Rect::new(10.0, 18.0, 20.0, 4.0), RED, 90.0).unwrap();
        drop(ctx);
        assert_eq!(b.pixel(20, 12), Some(Rgba8::new(255, 0, 0, 255)));
        assert_eq!(b.pixel(12, 20), Some(Rgba8::new(0, 0, 0, 255)));
    }

    #[test]
    fn vertical_gradient_runs_top_to_bottom() {
        let mut b = software(10, 100);
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_rect_gradient(Rect::new(0.0, 0.0, 10.0, 100.0), &Gradient::vertical(Color::WHITE, Color::BLACK))
            .unwrap();
        drop(ctx);
        let top = b.pixel(5, 0).unwrap();
        let bottom = b.pixel(5, 99).unwrap();
        assert!(top.r > 250 && bottom.r < 5);
        let mid = b.pixel(5, 50).unwrap();
        assert!((mid.r as i32 - 126).abs() <= 2);
    }

    #[test]
    fn horizontal_gradient_runs_left_to_right() {
        let mut b = software(100, 4);
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_rect_gradient(Rect::new(0.0, 0.0, 100.0, 4.0), &Gradient::horizontal(RED, Color::BLACK))
            .unwrap();
        drop(ctx);
        assert!(b.pixel(0, 2).unwrap().r > 250);
        assert!(b.pixel(99, 2).unwrap().r < 5);
    }

    #[test]
    fn line_angles_follow_the_sign_pattern() {
        let a = |x: f32, y: f32| line_angle(Vec2::zero(), Vec2::new(x, y));
        assert_eq!(a(10.0, 0.0), 0.0);
        assert_eq!(a(0.0, 10.0), 90.0);
        assert_eq!(a(-10.0, 0.0), 180.0);
        assert_eq!(a(0.0, -10.0), 270.0);
        assert!((a(10.0, 10.0) - 45.0).abs() < 1e-4);
        assert!((a(-10.0, 10.0) - 135.0).abs() < 1e-4);
        assert!((a(-10.0, -10.0) - 225.0).abs() < 1e-4);
        assert!((a(10.0, -10.0) - 315.0).abs() < 1e-4);
    }

    #[test]
    fn line_covers_its_path() {
        let mut b = software(50, 50);
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_line(Vec2::new(10.0, 40.0), Vec2::new(40.0, 10.0), RED, 3.0).unwrap();
        drop(ctx);
        // Midpoint of the diagonal, nudged to the band's side.
        assert_eq!(b.pixel(26, 25), Some(Rgba8::new(255, 0, 0, 255)));
        assert_eq!(b.pixel(10, 10), Some(Rgba8::new(0, 0, 0, 255)));
    }

    #[test]
    fn circle_fills_inside_only() {
        let mut b = software(40, 40);
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_circle(Vec2::new(20.0, 20.0), 10.0, RED, ArcSpan::full(5.0)).unwrap();
        drop(ctx);
        assert_eq!(b.pixel(20, 20), Some(Rgba8::new(255, 0, 0, 255)));
        assert_eq!(b.pixel(20, 12), Some(Rgba8::new(255, 0, 0, 255)));
        assert_eq!(b.pixel(28, 28), Some(Rgba8::new(0, 0, 0, 255)));
    }

    #[test]
    fn circle_gradient_eases_with_cosine() {
        let mut b = software(100, 100);
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_circle_gradient(Vec2::new(50.0, 50.0), 40.0, Color::BLACK, Color::WHITE, ArcSpan::full(5.0))
            .unwrap();
        drop(ctx);
        // 0° (east) is all `to`, 180° (west) all `from`, 90° (south) halfway.
        let east = b.pixel(88, 50).unwrap();
        let west = b.pixel(11, 50).unwrap();
        let south = b.pixel(50, 88).unwrap();
        assert!(east.r > 240, "{east:?}");
        assert!(west.r < 15, "{west:?}");
        assert!((south.r as i32 - 128).abs() <= 10, "{south:?}");
        let hub = b.pixel(50, 50).unwrap();
        assert!((hub.r as i32 - 128).abs() <= 6, "{hub:?}");
        assert_eq!((east.g, east.b), (east.r, east.r));
    }

    #[test]
    fn texture_region_samples_requested_quarter() {
        let mut tex = PixelBuffer::new(2, 2);
        tex.set(0, 0, Rgba8::new(255, 0, 0, 255));
        tex.set(1, 0, Rgba8::new(0, 255, 0, 255));
        tex.set(0, 1, Rgba8::new(0, 0, 255, 255));
        tex.set(1, 1, Rgba8::new(255, 255, 255, 255));
        let mut b = software(8, 8);
        let handle = {
            use crate::backend::Backend;
            b.upload_texture(&tex)
        };
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_texture_region(handle, Rect::new(0.0, 0.0, 8.0, 8.0), Rect::new(0.5, 0.0, 0.5, 0.5), Color::WHITE, 0.0)
            .unwrap();
        drop(ctx);
        assert_eq!(b.pixel(4, 4), Some(Rgba8::new(0, 255, 0, 255)));
    }
}
