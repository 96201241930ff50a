//! Sigil engine crate.
//!
//! Region-clipped 2D compositing on top of a fixed-function style backend:
//! clock fills, rounded gradient panels, spotlights and radial greyscale,
//! built from a small primitive drawer, a stencil protocol and three user clip
//! planes.
//!
//! Layers:
//! - `backend`: the [`Backend`](backend::Backend) capability trait plus the
//!   software, recording and (feature `gpu`) wgpu implementations
//! - `render`: [`RenderContext`](render::RenderContext) and every compositor
//! - `coords`, `paint`, `pixels`: value types shared by both

pub mod backend;
pub mod coords;
#[cfg(feature = "gpu")]
pub mod device;
pub mod logging;
pub mod paint;
pub mod pixels;
pub mod render;
