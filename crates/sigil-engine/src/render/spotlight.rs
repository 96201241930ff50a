//! Spotlight overlay: darkens everything except a circular opening.

use crate::coords::{Rect, Vec2};
use crate::paint::Color;

use super::error::{check_finite, check_radius};
use super::{ArcSpan, GeometryError, RenderContext, StencilMode};

impl RenderContext<'_> {
    /// Draws a radial gradient from `inner` at `center` to `outer` at `radius`
    /// over `arc`, then covers the rest of the viewport with `outer`.
    pub fn draw_spotlight(
        &mut self,
        center: Vec2,
        radius: f32,
        inner: Color,
        outer: Color,
        arc: ArcSpan,
    ) -> Result<(), GeometryError> {
        check_finite(center.is_finite(), "center")?;
        check_radius(radius)?;
        arc.validate()?;
        check_finite(inner.is_finite() && outer.is_finite(), "color")?;

        let (w, h) = self.viewport();
        let mut g = self.guard();
        g.backend().clear_stencil(0);
        g.write_stencil_fields(StencilMode::Painting);
        g.draw_circle_radial_gradient(center, radius, inner, outer, arc)?;
        g.write_stencil_fields(StencilMode::EnforceUnpaintedOnly);
        g.draw_rect(Rect::new(0.0, 0.0, w as f32, h as f32), outer)?;
        log::debug!("spotlight at {center:?} r={radius}");
        Ok(())
    }
}
