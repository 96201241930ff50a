//! Read-modify-write pixel effects.
//!
//! Effects read the frame back, transform the pixels on the CPU and write them
//! to the same spot. The write passes through the backend's fragment tests, so
//! active clip planes, scissor and stencil all limit what changes.

use crate::coords::Rect;

use super::error::{check_finite, check_intensity};
use super::region_fill::{FillAmount, FillPlan, FillReport};
use super::{GeometryError, RenderContext};

impl RenderContext<'_> {
    /// Desaturates the pixels under `rect` by `intensity` in `[0, 1]`.
    pub fn apply_greyscale(&mut self, rect: Rect, intensity: f32) -> Result<(), GeometryError> {
        check_finite(rect.is_finite(), "rectangle")?;
        check_intensity(intensity)?;
        self.greyscale_pixels(rect, intensity);
        Ok(())
    }

    /// Clock-style greyscale: only the part of `rect` swept by `degrees` in
    /// `[0, 360]`, clockwise from 12 o'clock, is desaturated.
    pub fn apply_radial_greyscale(
        &mut self,
        rect: Rect,
        intensity: f32,
        degrees: f32,
    ) -> Result<FillReport, GeometryError> {
        let degrees = FillAmount::Degrees(degrees).degrees()?;
        check_finite(rect.is_finite(), "rectangle")?;
        check_intensity(intensity)?;

        let rect = rect.normalized();
        let plan = FillPlan::new(degrees);
        for q in plan.full_quadrants() {
            self.greyscale_pixels(q.rect_in(rect), intensity);
        }
        if let Some((q, angle)) = plan.partial {
            let mut g = self.guard();
            g.set_sector_planes(rect.center(), q, angle, rect.width() / 2.0, rect.height() / 2.0);
            g.greyscale_pixels(q.rect_in(rect), intensity);
        }
        Ok(plan.report())
    }

    fn greyscale_pixels(&mut self, rect: Rect, intensity: f32) {
        let (w, h) = self.viewport();
        let Some((x0, y0, _, _)) = rect.pixel_span(w, h) else {
            return;
        };
        let b = self.backend();
        let mut pixels = b.read_pixels(rect);
        pixels.greyscale(intensity);
        b.write_pixels(x0 as i32, y0 as i32, &pixels);
        log::trace!("greyscale {}x{} at ({x0}, {y0})", pixels.width(), pixels.height());
    }
}
