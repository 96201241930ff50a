//! Rounded rectangles, frames and panels.

use crate::backend::ColorMask;
use crate::coords::{Rect, Vec2};
use crate::paint::{Color, Fill, Gradient};

use super::error::{check_finite, check_width, rejected};
use super::{ArcSpan, GeometryError, RenderContext, StencilMode};

/// Corner arcs in circle angles, listed NW, NE, SE, SW.
const CORNER_ARCS: [(f32, f32); 4] = [(180.0, 270.0), (270.0, 360.0), (0.0, 90.0), (90.0, 180.0)];

/// Centers of the four corner arcs, in the same order as [`CORNER_ARCS`].
fn corner_centers(rect: Rect, radius: f32) -> [Vec2; 4] {
    let (x0, y0) = (rect.x() + radius, rect.y() + radius);
    let (x1, y1) = (rect.x() + rect.width() - radius, rect.y() + rect.height() - radius);
    [Vec2::new(x0, y0), Vec2::new(x1, y0), Vec2::new(x1, y1), Vec2::new(x0, y1)]
}

/// Validates the rectangle and corner radius, returning the normalized rectangle.
fn checked_rounded(rect: Rect, radius: f32) -> Result<Rect, GeometryError> {
    check_finite(rect.is_finite(), "rectangle")?;
    let rect = rect.normalized();
    if !radius.is_finite() || radius < 0.0 {
        return Err(rejected(GeometryError::InvalidRadius(radius)));
    }
    let max = rect.width().min(rect.height()) / 2.0;
    if radius > max {
        return Err(rejected(GeometryError::RadiusTooLarge { radius, max }));
    }
    Ok(rect)
}

/// Appearance of a rounded panel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PanelStyle {
    pub fill: Fill,
    pub radius: f32,
    /// Border color and width.
    pub border: Option<(Color, f32)>,
    /// Inner shadow color and width, drawn just inside the border.
    pub shadow: Option<(Color, f32)>,
}

impl Default for PanelStyle {
    fn default() -> Self {
        Self { fill: Fill::Solid(Color::WHITE), radius: 5.0, border: None, shadow: None }
    }
}

impl RenderContext<'_> {
    /// Filled rectangle with circular corners of `radius`.
    pub fn draw_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color) -> Result<(), GeometryError> {
        let rect = checked_rounded(rect, radius)?;
        check_finite(color.is_finite(), "color")?;
        if radius == 0.0 {
            return self.draw_rect(rect, color);
        }

        let step = self.config().corner_step;
        ArcSpan::full(step).validate()?;
        for (center, (start, end)) in corner_centers(rect, radius).into_iter().zip(CORNER_ARCS) {
            self.draw_circle(center, radius, color, ArcSpan::new(start, end, step))?;
        }

        let (x, y, w, h, r) = (rect.x(), rect.y(), rect.width(), rect.height(), radius);
        for band in [
            Rect::new(x + r, y, w - 2.0 * r, r),
            Rect::new(x + r, y + h - r, w - 2.0 * r, r),
            Rect::new(x, y + r, r, h - 2.0 * r),
            Rect::new(x + w - r, y + r, r, h - 2.0 * r),
            Rect::new(x + r, y + r, w - 2.0 * r, h - 2.0 * r),
        ] {
            if !band.is_empty() {
                self.draw_rect(band, color)?;
            }
        }
        Ok(())
    }

    /// `border`-wide outline following a rounded rectangle's edge.
    pub fn draw_rounded_rect_frame(
        &mut self,
        rect: Rect,
        radius: f32,
        color: Color,
        border: f32,
    ) -> Result<(), GeometryError> {
        let rect = checked_rounded(rect, radius)?;
        check_finite(color.is_finite(), "color")?;
        check_width(border)?;
        if radius == 0.0 {
            return self.draw_rect_frame(rect, color, border);
        }

        let step = self.config().corner_step;
        ArcSpan::full(step).validate()?;
        for (center, (start, end)) in corner_centers(rect, radius).into_iter().zip(CORNER_ARCS) {
            self.draw_radial_arc(center, radius, border, color, ArcSpan::new(start, end, step))?;
        }

        let (x, y, w, h, r) = (rect.x(), rect.y(), rect.width(), rect.height(), radius);
        for band in [
            Rect::new(x + r, y, w - 2.0 * r, border),
            Rect::new(x + r, y + h - border, w - 2.0 * r, border),
            Rect::new(x, y + r, border, h - 2.0 * r),
            Rect::new(x + w - border, y + r, border, h - 2.0 * r),
        ] {
            if !band.is_empty() {
                self.draw_rect(band, color)?;
            }
        }
        Ok(())
    }

    /// Rounded rectangle filled with a gradient.
    ///
    /// The rounded footprint is stamped into the stencil with color writes off,
    /// then a single gradient rectangle is drawn where the stamp landed.
    pub fn draw_rounded_rect_gradient(
        &mut self,
        rect: Rect,
        radius: f32,
        gradient: &Gradient,
    ) -> Result<(), GeometryError> {
        let rect = checked_rounded(rect, radius)?;
        check_finite(gradient.is_finite(), "color")?;
        ArcSpan::full(self.config().corner_step).validate()?;

        // The mask is private to this call, so a caller's lock does not apply.
        let mut g = self.guard();
        g.zero_stencil_region(rect);

        g.write_stencil_fields(StencilMode::Painting);
        g.backend().set_color_write_mask(ColorMask::NONE);
        g.draw_rounded_rect(rect, radius, Color::WHITE)?;
        g.backend().set_color_write_mask(ColorMask::ALL);

        g.write_stencil_fields(StencilMode::EnforcePaintedOnly);
        g.draw_rect_gradient(rect, gradient)?;
        log::debug!("rounded gradient {rect:?} r={radius}");
        Ok(())
    }

    /// Rounded panel: fill, then the optional border, then the optional inner
    /// shadow just inside the border.
    pub fn draw_rounded_panel(&mut self, rect: Rect, style: &PanelStyle) -> Result<(), GeometryError> {
        let rect = checked_rounded(rect, style.radius)?;
        check_finite(style.fill.is_finite(), "color")?;

        match style.fill {
            Fill::Solid(color) => self.draw_rounded_rect(rect, style.radius, color)?,
            Fill::Gradient(gradient) => self.draw_rounded_rect_gradient(rect, style.radius, &gradient)?,
        }

        let Some((border_color, border)) = style.border else {
            return Ok(());
        };
        self.draw_rounded_rect_frame(rect, style.radius, border_color, border)?;

        if let Some((shadow_color, shadow)) = style.shadow {
            let inner = rect.inset(border);
            if inner.is_empty() {
                return Ok(());
            }
            let radius = style.radius.min(inner.width().min(inner.height()) / 2.0);
            self.draw_rounded_rect_frame(inner, radius, shadow_color, shadow)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawShape, PrimitiveKind, RecordingBackend, SoftwareBackend, SoftwareConfig};
    use crate::pixels::Rgba8;

    const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    fn software(w: u32, h: u32) -> SoftwareBackend {
        SoftwareBackend::new(SoftwareConfig { width: w, height: h, clear: Color::BLACK })
    }

    fn fans(b: &RecordingBackend) -> usize {
        b.draws()
            .iter()
            .filter(|d| matches!(d.shape, DrawShape::Primitive { kind: PrimitiveKind::TriangleFan, .. }))
            .count()
    }

    // ── solid ──────────────────────────────────────────────────────────────

    #[test]
    fn rounded_rect_is_four_fans_and_five_bands() {
        let mut b = RecordingBackend::new(100, 100);
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_rounded_rect(Rect::new(10.0, 10.0, 60.0, 40.0), 8.0, BLUE).unwrap();
        drop(ctx);
        assert_eq!(fans(&b), 4);
        assert_eq!(b.draws().len(), 9);
        assert!(b.is_default_state());
    }

    #[test]
    fn zero_radius_is_a_plain_rect() {
        let mut b = RecordingBackend::new(100, 100);
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_rounded_rect(Rect::new(0.0, 0.0, 20.0, 20.0), 0.0, BLUE).unwrap();
        drop(ctx);
        assert_eq!(b.draws().len(), 1);
        assert!(matches!(b.draws()[0].shape, DrawShape::Rect { .. }));
    }

    #[test]
    fn radius_past_half_the_short_side_is_rejected() {
        let mut b = RecordingBackend::new(100, 100);
        let mut ctx = RenderContext::new(&mut b);
        let r = Rect::new(0.0, 0.0, 60.0, 20.0);
        assert_eq!(
            ctx.draw_rounded_rect(r, 10.5, BLUE),
            Err(GeometryError::RadiusTooLarge { radius: 10.5, max: 10.0 })
        );
        assert!(ctx.draw_rounded_rect(r, -1.0, BLUE).is_err());
        assert!(ctx.draw_rounded_rect_gradient(r, 11.0, &Gradient::vertical(BLUE, Color::WHITE)).is_err());
        drop(ctx);
        assert!(b.draws().is_empty());
    }

    #[test]
    fn rounded_rect_cuts_its_corners() {
        let mut b = software(100, 100);
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_rounded_rect(Rect::new(0.0, 0.0, 100.0, 100.0), 20.0, BLUE).unwrap();
        drop(ctx);
        let blue = Rgba8::new(0, 0, 255, 255);
        assert_eq!(b.pixel(1, 1), Some(Rgba8::new(0, 0, 0, 255)));
        assert_eq!(b.pixel(98, 98), Some(Rgba8::new(0, 0, 0, 255)));
        assert_eq!(b.pixel(10, 10), Some(blue));
        assert_eq!(b.pixel(50, 1), Some(blue));
        assert_eq!(b.pixel(50, 50), Some(blue));
    }

    // ── frame ──────────────────────────────────────────────────────────────

    #[test]
    fn frame_rejects_a_bad_border_width() {
        let mut b = RecordingBackend::new(100, 100);
        let mut ctx = RenderContext::new(&mut b);
        let err = ctx.draw_rounded_rect_frame(Rect::new(0.0, 0.0, 60.0, 40.0), 6.0, BLUE, 0.0);
        assert_eq!(err, Err(GeometryError::InvalidWidth(0.0)));
        drop(ctx);
        assert!(b.draws().is_empty());
    }

    #[test]
    fn frame_is_four_arcs_and_four_bands() {
        let mut b = RecordingBackend::new(100, 100);
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_rounded_rect_frame(Rect::new(0.0, 0.0, 80.0, 50.0), 10.0, BLUE, 2.0).unwrap();
        drop(ctx);
        let arcs = b
            .draws()
            .iter()
            .filter(|d| matches!(d.shape, DrawShape::Primitive { kind: PrimitiveKind::QuadStrip, .. }))
            .count();
        assert_eq!(arcs, 4);
        assert_eq!(b.draws().len(), 8);
    }

    #[test]
    fn frame_leaves_the_inside_alone() {
        let mut b = software(100, 100);
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_rounded_rect_frame(Rect::new(0.0, 0.0, 100.0, 100.0), 10.0, BLUE, 3.0).unwrap();
        drop(ctx);
        assert_eq!(b.pixel(50, 1), Some(Rgba8::new(0, 0, 255, 255)));
        assert_eq!(b.pixel(50, 50), Some(Rgba8::new(0, 0, 0, 255)));
    }

    // ── gradient ───────────────────────────────────────────────────────────

    fn gradient_panel(b: &mut SoftwareBackend) {
        let mut ctx = RenderContext::new(b);
        ctx.draw_rounded_rect_gradient(
            Rect::new(0.0, 0.0, 200.0, 80.0),
            10.0,
            &Gradient::vertical(Color::WHITE, Color::BLACK),
        )
        .unwrap();
    }

    #[test]
    fn gradient_corner_is_shaped_and_interpolated() {
        let mut b = SoftwareBackend::new(SoftwareConfig { width: 200, height: 80, clear: BLUE });
        gradient_panel(&mut b);
        // Outside the rounded corner the background survives.
        assert_eq!(b.pixel(0, 0), Some(Rgba8::new(0, 0, 255, 255)));
        // 255 * (1 - 4.5 / 80) ≈ 241
        let px = b.pixel(4, 4).unwrap();
        assert!((px.r as i32 - 241).abs() <= 2, "{px:?}");
        assert_eq!((px.r, px.g, px.b), (px.r, px.r, px.r));
        let low = b.pixel(100, 70).unwrap();
        assert!(low.r < 40, "{low:?}");
    }

    #[test]
    fn gradient_compositor_is_idempotent() {
        let mut b = software(200, 80);
        gradient_panel(&mut b);
        let (frame, stencil) = (b.frame().clone(), b.stencil_buffer().to_vec());
        gradient_panel(&mut b);
        assert_eq!(b.frame(), &frame);
        assert_eq!(b.stencil_buffer(), &stencil[..]);
    }

    #[test]
    fn gradient_compositor_restores_state() {
        let mut b = RecordingBackend::new(200, 80);
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_rounded_rect_gradient(Rect::new(0.0, 0.0, 200.0, 80.0), 10.0, &Gradient::horizontal(BLUE, Color::WHITE))
            .unwrap();
        assert_eq!(ctx.stencil_mode(), StencilMode::Idle);
        drop(ctx);
        assert!(b.is_default_state());
        // The footprint pass draws nothing visible.
        let hidden = b.draws().iter().filter(|d| d.color_mask == ColorMask::NONE).count();
        assert_eq!(hidden, 1 + 4 + 5);
    }

    #[test]
    fn gradient_keeps_its_corners_under_a_locked_stencil() {
        let mut b = SoftwareBackend::new(SoftwareConfig { width: 200, height: 80, clear: BLUE });
        let mut ctx = RenderContext::new(&mut b);
        ctx.set_stencil_mode(StencilMode::EnforceUnpaintedOnly);
        ctx.lock_stencil();
        ctx.draw_rounded_rect_gradient(
            Rect::new(0.0, 0.0, 200.0, 80.0),
            10.0,
            &Gradient::vertical(Color::WHITE, Color::BLACK),
        )
        .unwrap();
        assert_eq!(ctx.stencil_mode(), StencilMode::EnforceUnpaintedOnly);
        assert!(ctx.is_stencil_locked());
        drop(ctx);

        assert_eq!(b.pixel(0, 0), Some(Rgba8::new(0, 0, 255, 255)));
        assert_eq!(b.pixel(199, 79), Some(Rgba8::new(0, 0, 255, 255)));
        let px = b.pixel(4, 4).unwrap();
        assert!((px.r as i32 - 241).abs() <= 2, "{px:?}");
        // The locked mode is back in force on the backend.
        assert!(b.stencil_test_enabled());
    }

    // ── panel ──────────────────────────────────────────────────────────────

    #[test]
    fn panel_with_border_and_shadow() {
        let mut b = RecordingBackend::new(100, 100);
        let mut ctx = RenderContext::new(&mut b);
        let style = PanelStyle {
            fill: Fill::Solid(BLUE),
            radius: 6.0,
            border: Some((Color::WHITE, 2.0)),
            shadow: Some((Color::BLACK, 1.0)),
        };
        ctx.draw_rounded_panel(Rect::new(0.0, 0.0, 60.0, 40.0), &style).unwrap();
        drop(ctx);
        // fill 9, border 8, shadow 8
        assert_eq!(b.draws().len(), 25);
        assert!(b.is_default_state());
    }

    #[test]
    fn shadow_without_border_is_skipped() {
        let mut b = RecordingBackend::new(100, 100);
        let mut ctx = RenderContext::new(&mut b);
        let style = PanelStyle { shadow: Some((Color::BLACK, 1.0)), ..PanelStyle::default() };
        ctx.draw_rounded_panel(Rect::new(0.0, 0.0, 60.0, 40.0), &style).unwrap();
        drop(ctx);
        assert_eq!(b.draws().len(), 9);
    }
}
