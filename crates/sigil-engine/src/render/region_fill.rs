//! Clock-style partial fills.
//!
//! A fill amount is split into whole quadrants, drawn directly, plus at most
//! one partial quadrant drawn through three clip planes from
//! [`sector_clip_planes`]. Quadrants run clockwise from 12 o'clock.

use crate::coords::{ClipSlot, Rect, Vec2};
use crate::paint::Color;

use super::error::{check_finite, check_radius, rejected};
use super::sector::{sector_clip_planes, Quadrant};
use super::{GeometryError, RenderContext};

/// Outline being filled.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FillShape {
    Rect(Rect),
    /// `accuracy` is the fan tessellation step in degrees; `None` uses the
    /// context's `circle_step`.
    Circle { center: Vec2, radius: f32, accuracy: Option<f32> },
}

/// How much of the shape is filled.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FillAmount {
    /// Clock sweep in `[0, 360]`.
    Degrees(f32),
    /// Share of the full sweep in `[0, 100]`.
    Percent(f32),
}

impl FillAmount {
    /// Sweep in degrees, or an error when the value is out of range.
    pub fn degrees(self) -> Result<f32, GeometryError> {
        let (value, max, scale) = match self {
            FillAmount::Degrees(d) => (d, 360.0, 1.0),
            FillAmount::Percent(p) => (p, 100.0, 3.6),
        };
        if !(0.0..=max).contains(&value) {
            return Err(rejected(GeometryError::FillOutOfRange { value, max }));
        }
        Ok(value * scale)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FillSpec {
    pub shape: FillShape,
    pub amount: FillAmount,
}

impl FillSpec {
    #[inline]
    pub fn rect(rect: Rect, amount: FillAmount) -> Self {
        Self { shape: FillShape::Rect(rect), amount }
    }

    #[inline]
    pub fn circle(center: Vec2, radius: f32, amount: FillAmount) -> Self {
        Self { shape: FillShape::Circle { center, radius, accuracy: None }, amount }
    }
}

/// What a fill actually drew.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct FillReport {
    pub full_quadrants: usize,
    pub partial: Option<Quadrant>,
}

/// Quadrant decomposition of a sweep.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct FillPlan {
    pub full: usize,
    /// Quadrant and the angle swept inside it.
    pub partial: Option<(Quadrant, f32)>,
}

impl FillPlan {
    pub fn new(degrees: f32) -> Self {
        let full = ((degrees / 90.0).floor() as usize).min(4);
        let rest = degrees - 90.0 * full as f32;
        let partial = if rest > 0.0 { Quadrant::from_index(full).map(|q| (q, rest)) } else { None };
        Self { full, partial }
    }

    pub fn full_quadrants(&self) -> impl Iterator<Item = Quadrant> {
        Quadrant::ALL.into_iter().take(self.full)
    }

    pub fn report(&self) -> FillReport {
        FillReport { full_quadrants: self.full, partial: self.partial.map(|(q, _)| q) }
    }
}

impl RenderContext<'_> {
    /// Fills the part of `spec.shape` swept so far with `color`.
    pub fn fill_region(&mut self, spec: &FillSpec, color: Color) -> Result<FillReport, GeometryError> {
        let degrees = spec.amount.degrees()?;
        check_finite(color.is_finite(), "color")?;
        let plan = FillPlan::new(degrees);

        match spec.shape {
            FillShape::Rect(rect) => {
                check_finite(rect.is_finite(), "rectangle")?;
                self.clock_rect(rect.normalized(), color, &plan)?;
            }
            FillShape::Circle { center, radius, accuracy } => {
                check_finite(center.is_finite(), "center")?;
                check_radius(radius)?;
                let step = accuracy.unwrap_or(self.config().circle_step);
                super::ArcSpan::full(step).validate()?;
                self.clock_circle(center, radius, step, color, &plan)?;
            }
        }

        let report = plan.report();
        log::debug!("region fill {degrees}deg: {report:?}");
        Ok(report)
    }

    /// Rectangular clock fill of `degrees` in `[0, 360]`.
    pub fn draw_clock_rect(&mut self, rect: Rect, color: Color, degrees: f32) -> Result<FillReport, GeometryError> {
        self.fill_region(&FillSpec::rect(rect, FillAmount::Degrees(degrees)), color)
    }

    /// Circular clock fill of `degrees` in `[0, 360]`.
    pub fn draw_clock_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        color: Color,
        degrees: f32,
    ) -> Result<FillReport, GeometryError> {
        self.fill_region(&FillSpec::circle(center, radius, FillAmount::Degrees(degrees)), color)
    }

    fn clock_rect(&mut self, rect: Rect, color: Color, plan: &FillPlan) -> Result<(), GeometryError> {
        for q in plan.full_quadrants() {
            self.draw_rect(q.rect_in(rect), color)?;
        }
        let Some((q, angle)) = plan.partial else { return Ok(()) };

        let mut g = self.guard();
        g.set_sector_planes(rect.center(), q, angle, rect.width() / 2.0, rect.height() / 2.0);
        g.draw_rect(q.rect_in(rect), color)?;
        g.enable_clip_planes(false);
        Ok(())
    }

    fn clock_circle(
        &mut self,
        center: Vec2,
        radius: f32,
        step: f32,
        color: Color,
        plan: &FillPlan,
    ) -> Result<(), GeometryError> {
        for q in plan.full_quadrants() {
            self.draw_circle(center, radius, color, q.arc(step))?;
        }
        let Some((q, angle)) = plan.partial else { return Ok(()) };

        let mut g = self.guard();
        g.set_sector_planes(center, q, angle, radius, radius);
        g.draw_circle(center, radius, color, q.arc(step))?;
        g.enable_clip_planes(false);
        Ok(())
    }

    /// Loads and enables the three sector planes in a frame centered on `center`.
    pub(super) fn set_sector_planes(&mut self, center: Vec2, q: Quadrant, angle: f32, half_w: f32, half_h: f32) {
        let planes = sector_clip_planes(q, angle, half_w, half_h);
        let b = self.backend();
        b.reset_transform();
        b.translate(center.x, center.y);
        for (slot, plane) in ClipSlot::ALL.into_iter().zip(planes) {
            b.set_clip_plane(slot, plane);
        }
        self.enable_clip_planes(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawShape, RecordingBackend, SoftwareBackend, SoftwareConfig};
    use crate::pixels::Rgba8;

    const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    const RED8: Rgba8 = Rgba8::new(255, 0, 0, 255);
    const BG8: Rgba8 = Rgba8::new(0, 0, 0, 255);

    fn record(degrees: f32) -> (FillReport, RecordingBackend) {
        let mut b = RecordingBackend::new(200, 200);
        let mut ctx = RenderContext::new(&mut b);
        let report = ctx.draw_clock_rect(Rect::new(0.0, 0.0, 100.0, 100.0), RED, degrees).unwrap();
        drop(ctx);
        (report, b)
    }

    fn paint(rect: Rect, degrees: f32) -> SoftwareBackend {
        let mut b = SoftwareBackend::new(SoftwareConfig { width: 100, height: 100, clear: Color::BLACK });
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_clock_rect(rect, RED, degrees).unwrap();
        drop(ctx);
        b
    }

    // ── decomposition ──────────────────────────────────────────────────────

    #[test]
    fn multiples_of_ninety_draw_whole_quadrants_only() {
        for d in [0.0, 90.0, 180.0, 270.0, 360.0] {
            let (report, b) = record(d);
            let expected = (d / 90.0) as usize;
            assert_eq!(report, FillReport { full_quadrants: expected, partial: None });
            assert_eq!(b.draws().len(), expected, "{d}");
            assert!(b.draws().iter().all(|e| e.active_clip_planes == 0));
        }
    }

    #[test]
    fn other_angles_add_one_clipped_draw_and_release_planes() {
        for d in [1.0, 45.0, 89.5, 91.0, 135.0, 200.0, 269.0, 300.0, 359.0] {
            let (report, b) = record(d);
            let full = (d / 90.0).floor() as usize;
            assert_eq!(report.full_quadrants, full);
            assert_eq!(report.partial, Quadrant::from_index(full));

            let clipped: Vec<_> = b.draws().iter().filter(|e| e.is_clipped()).collect();
            assert_eq!(b.draws().len(), full + 1, "{d}");
            assert_eq!(clipped.len(), 1);
            assert_eq!(clipped[0].active_clip_planes, 3);
            assert!(!b.any_clip_plane_enabled());
            assert!(b.is_default_state());
        }
    }

    #[test]
    fn out_of_range_amounts_are_rejected() {
        let mut b = RecordingBackend::new(10, 10);
        let mut ctx = RenderContext::new(&mut b);
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(matches!(ctx.draw_clock_rect(r, RED, 361.0), Err(GeometryError::FillOutOfRange { .. })));
        assert!(ctx.draw_clock_rect(r, RED, -1.0).is_err());
        assert!(ctx.fill_region(&FillSpec::rect(r, FillAmount::Percent(100.5)), RED).is_err());
        assert!(ctx.draw_clock_circle(Vec2::new(5.0, 5.0), 0.0, RED, 90.0).is_err());
        drop(ctx);
        assert!(b.draws().is_empty());
    }

    #[test]
    fn percent_maps_onto_degrees() {
        let (a, _) = record(90.0);
        let mut b = RecordingBackend::new(10, 10);
        let mut ctx = RenderContext::new(&mut b);
        let spec = FillSpec::rect(Rect::new(0.0, 0.0, 10.0, 10.0), FillAmount::Percent(25.0));
        assert_eq!(ctx.fill_region(&spec, RED).unwrap(), a);
    }

    // ── pixels ─────────────────────────────────────────────────────────────

    #[test]
    fn forty_five_degrees_fills_first_half_of_north_east() {
        let b = paint(Rect::new(0.0, 0.0, 100.0, 100.0), 45.0);
        // Between 12 o'clock and the 45° cut.
        assert_eq!(b.pixel(60, 10), Some(RED8));
        assert_eq!(b.pixel(52, 40), Some(RED8));
        // Past the cut, still in the north-east quadrant.
        assert_eq!(b.pixel(90, 40), Some(BG8));
        // Other quadrants stay empty.
        assert_eq!(b.pixel(75, 75), Some(BG8));
        assert_eq!(b.pixel(25, 75), Some(BG8));
        assert_eq!(b.pixel(25, 25), Some(BG8));
    }

    #[test]
    fn one_hundred_thirty_five_degrees_adds_half_of_south_east() {
        let b = paint(Rect::new(0.0, 0.0, 100.0, 100.0), 135.0);
        assert_eq!(b.pixel(75, 25), Some(RED8));
        // South-east: cut runs from the center toward (100, 100).
        assert_eq!(b.pixel(90, 60), Some(RED8));
        assert_eq!(b.pixel(60, 90), Some(BG8));
        assert_eq!(b.pixel(25, 75), Some(BG8));
    }

    #[test]
    fn partial_in_north_west_leaves_the_rest() {
        let b = paint(Rect::new(0.0, 0.0, 100.0, 100.0), 315.0);
        assert_eq!(b.pixel(75, 25), Some(RED8));
        assert_eq!(b.pixel(75, 75), Some(RED8));
        assert_eq!(b.pixel(25, 75), Some(RED8));
        // North-west is swept from 9 o'clock up to the diagonal.
        assert_eq!(b.pixel(10, 40), Some(RED8));
        assert_eq!(b.pixel(40, 10), Some(BG8));
    }

    #[test]
    fn circle_fill_uses_quadrant_fans() {
        let mut b = RecordingBackend::new(100, 100);
        let mut ctx = RenderContext::new(&mut b);
        let report = ctx.draw_clock_circle(Vec2::new(50.0, 50.0), 40.0, RED, 200.0).unwrap();
        drop(ctx);
        assert_eq!(report, FillReport { full_quadrants: 2, partial: Some(Quadrant::SouthWest) });
        assert_eq!(b.draws().len(), 3);
        assert!(b.draws().iter().all(|d| matches!(d.shape, DrawShape::Primitive { .. })));
        assert_eq!(b.draws()[2].active_clip_planes, 3);
        assert!(b.is_default_state());
    }

    #[test]
    fn circle_partial_pixels() {
        let mut b = SoftwareBackend::new(SoftwareConfig { width: 100, height: 100, clear: Color::BLACK });
        let mut ctx = RenderContext::new(&mut b);
        ctx.draw_clock_circle(Vec2::new(50.0, 50.0), 40.0, RED, 30.0).unwrap();
        drop(ctx);
        // 15° past 12 o'clock is filled, 60° is not.
        assert_eq!(b.pixel(55, 25), Some(RED8));
        assert_eq!(b.pixel(75, 35), Some(BG8));
    }
}
