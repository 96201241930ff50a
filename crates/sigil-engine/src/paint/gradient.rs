use super::Color;

/// Direction a two-stop gradient travels across its rectangle.
///
/// `Right` puts `from` on the left edge and `to` on the right edge; `Down` puts
/// `from` on the top edge and `to` on the bottom edge. `Left` and `Up` are the
/// mirrored variants.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum GradientDirection {
    #[default]
    Right,
    Left,
    Down,
    Up,
}

/// Two-stop linear gradient aligned to a rectangle's axes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Gradient {
    pub from: Color,
    pub to: Color,
    pub direction: GradientDirection,
}

impl Gradient {
    #[inline]
    pub const fn new(from: Color, to: Color, direction: GradientDirection) -> Self {
        Self { from, to, direction }
    }

    #[inline]
    pub const fn horizontal(from: Color, to: Color) -> Self {
        Self::new(from, to, GradientDirection::Right)
    }

    #[inline]
    pub const fn vertical(from: Color, to: Color) -> Self {
        Self::new(from, to, GradientDirection::Down)
    }

    /// Corner colors in `[top_left, top_right, bottom_left, bottom_right]` order.
    pub fn corners(&self) -> [Color; 4] {
        let (a, b) = (self.from, self.to);
        match self.direction {
            GradientDirection::Right => [a, b, a, b],
            GradientDirection::Left => [b, a, b, a],
            GradientDirection::Down => [a, a, b, b],
            GradientDirection::Up => [b, b, a, a],
        }
    }

    /// Color at normalized position `(u, v)` inside the rectangle.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        let t = match self.direction {
            GradientDirection::Right => u,
            GradientDirection::Left => 1.0 - u,
            GradientDirection::Down => v,
            GradientDirection::Up => 1.0 - v,
        };
        self.from.lerp(self.to, t.clamp(0.0, 1.0))
    }

    pub fn is_finite(&self) -> bool {
        self.from.is_finite() && self.to.is_finite()
    }
}
