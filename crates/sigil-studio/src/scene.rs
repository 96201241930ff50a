//! Demo scene exercising every compositor.

use anyhow::Result;

use sigil_engine::coords::{Rect, Vec2};
use sigil_engine::paint::{Color, Fill, Gradient, GradientDirection};
use sigil_engine::pixels::{PixelBuffer, Rgba8};
use sigil_engine::render::{ArcSpan, Direction, FillAmount, FillSpec, PanelStyle, RenderContext};

const PANEL: Color = Color::rgb(0.16, 0.18, 0.22);
const ACCENT: Color = Color::rgb(0.95, 0.62, 0.18);
const TEAL: Color = Color::rgb(0.2, 0.7, 0.65);

/// 8×8 checkerboard with the dark squares keyed out to transparent.
fn checker() -> PixelBuffer {
    let mut px = PixelBuffer::new(8, 8);
    for y in 0..8 {
        for x in 0..8 {
            let c = if (x + y) % 2 == 0 { Rgba8::new(230, 230, 230, 255) } else { Rgba8::new(255, 0, 255, 255) };
            px.set(x, y, c);
        }
    }
    px.apply_color_key(Color::rgb(1.0, 0.0, 1.0));
    px
}

/// Draws the scene with clock fills at `progress` degrees.
pub fn draw(ctx: &mut RenderContext<'_>, progress: f32) -> Result<()> {
    let (w, h) = ctx.viewport();
    let (w, h) = (w as f32, h as f32);

    ctx.draw_rect_gradient(
        Rect::new(0.0, 0.0, w, h),
        &Gradient::vertical(Color::rgb(0.08, 0.09, 0.12), Color::rgb(0.02, 0.02, 0.04)),
    )?;

    // Header panel.
    ctx.draw_rounded_panel(
        Rect::new(16.0, 16.0, w - 32.0, 56.0),
        &PanelStyle {
            fill: Fill::Gradient(Gradient::new(PANEL, Color::rgb(0.24, 0.27, 0.33), GradientDirection::Right)),
            radius: 10.0,
            border: Some((Color::rgb(0.35, 0.38, 0.45), 2.0)),
            shadow: Some((Color::rgb(0.05, 0.05, 0.07), 1.0)),
        },
    )?;
    ctx.draw_triangle(Rect::new(32.0, 34.0, 14.0, 20.0), ACCENT, Some(Color::BLACK), Direction::Right)?;
    ctx.draw_line(Vec2::new(60.0, 60.0), Vec2::new(w - 40.0, 60.0), ACCENT, 2.0)?;

    // Cooldown tiles: clock fill over a texture, radial greyscale over another.
    let icon = ctx.backend().upload_texture(&checker());
    let tile = Rect::new(24.0, 96.0, 96.0, 96.0);
    ctx.draw_texture(icon, tile, Color::WHITE)?;
    ctx.fill_region(&FillSpec::rect(tile, FillAmount::Degrees(progress)), Color::new(0.0, 0.0, 0.0, 0.55))?;
    ctx.draw_rect_frame(tile, Color::rgb(0.4, 0.4, 0.45), 1.0)?;

    let greyed = tile.translated(112.0, 0.0);
    ctx.draw_texture_gradient(icon, greyed, &Gradient::horizontal(TEAL, Color::WHITE))?;
    ctx.apply_radial_greyscale(greyed, 1.0, progress)?;

    // Circular gauge.
    let center = Vec2::new(310.0, 144.0);
    ctx.draw_circle(center, 48.0, PANEL, ArcSpan::full(ctx.config().circle_step))?;
    ctx.draw_clock_circle(center, 44.0, TEAL, progress)?;
    ctx.draw_radial_arc(center, 48.0, 4.0, ACCENT, ArcSpan::new(-90.0, progress - 90.0, 5.0))?;
    ctx.draw_circle_outline(center, 50.0, Color::rgb(0.4, 0.4, 0.45), ArcSpan::full(5.0))?;

    // Scrolling list clipped to its panel.
    let list = Rect::new(24.0, 210.0, w - 48.0, 90.0);
    ctx.draw_rounded_rect(list, 6.0, PANEL)?;
    ctx.push_scissor(list.inset(4.0));
    for (i, y) in (0..6).map(|i| (i, 200.0 + i as f32 * 22.0)) {
        let row = Rect::new(32.0, y, w - 64.0, 18.0);
        let from = if i % 2 == 0 { ACCENT } else { TEAL };
        ctx.draw_rounded_rect_gradient(row, 4.0, &Gradient::horizontal(from, PANEL))?;
    }
    ctx.pop_scissor();

    ctx.draw_circle_gradient(Vec2::new(w - 60.0, 144.0), 30.0, ACCENT, TEAL, ArcSpan::full(5.0))?;

    // Spotlight on the gauge last: it darkens everything else.
    ctx.draw_spotlight(
        center,
        70.0,
        Color::TRANSPARENT,
        Color::new(0.0, 0.0, 0.0, 0.45),
        ArcSpan::full(ctx.config().circle_step),
    )?;
    Ok(())
}
