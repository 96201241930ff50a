//! Compositing layer.
//!
//! Everything here draws through a [`RenderContext`], which owns the only
//! mutable borrow of a [`Backend`](crate::backend::Backend) for its lifetime.
//!
//! Convention:
//! - geometry is in pixels (top-left origin, +Y down)
//! - angles are degrees; circle angle 0 points at 3 o'clock and grows clockwise
//! - clock fills start at 12 o'clock and sweep clockwise
//! - every operation leaves the backend in its default state

mod ctx;
mod effects;
mod error;
mod primitives;
mod region_fill;
mod rounded;
mod scissor;
mod sector;
mod spotlight;
mod stencil;

pub use ctx::{RenderConfig, RenderContext, StateGuard};
pub use error::GeometryError;
pub use primitives::{ArcSpan, Direction};
pub use region_fill::{FillAmount, FillReport, FillShape, FillSpec};
pub use rounded::PanelStyle;
pub use sector::{sector_clip_planes, sector_contains, Quadrant};
pub use stencil::{ClipPause, StencilMode};
