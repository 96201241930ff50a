//! Coordinate and geometry types shared by the backends and the compositors.
//!
//! Canonical CPU space:
//! - Screen pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! Angles are in degrees. Rotation by a positive angle turns +X toward +Y,
//! which reads as clockwise on screen.

mod plane;
mod rect;
mod transform;
mod vec2;

pub use plane::{ClipPlane, ClipSlot};
pub use rect::Rect;
pub use transform::Affine;
pub use vec2::Vec2;
