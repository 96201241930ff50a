//! Paint model shared between the compositors and the backends.
//!
//! Scope:
//! - color representation (straight alpha, `f32` channels in `[0, 1]`)
//! - two-stop axis-aligned gradients
//!
//! Geometry types remain in `coords`.

pub mod color;
pub mod gradient;

pub use color::Color;
pub use gradient::{Gradient, GradientDirection};

/// Fill source for shapes that accept either a flat color or a gradient.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Fill {
    Solid(Color),
    Gradient(Gradient),
}

impl Fill {
    #[inline]
    pub fn solid(color: Color) -> Self {
        Fill::Solid(color)
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        match self {
            Fill::Solid(c) => c.a >= 1.0,
            Fill::Gradient(g) => g.from.a >= 1.0 && g.to.a >= 1.0,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        match self {
            Fill::Solid(c) => c.is_finite(),
            Fill::Gradient(g) => g.is_finite(),
        }
    }
}

impl From<Color> for Fill {
    fn from(c: Color) -> Self {
        Fill::Solid(c)
    }
}

impl From<Gradient> for Fill {
    fn from(g: Gradient) -> Self {
        Fill::Gradient(g)
    }
}
