//! Graphics backend capability set.
//!
//! The compositors in `render` only ever talk to a [`Backend`]. The trait
//! mirrors a fixed-function pipeline: a current transform, a current color,
//! begin/emit/end vertex streams, an 8-bit stencil buffer, three user clip
//! planes and a scissor rectangle.
//!
//! Conventions:
//! - screen space is in pixels, origin top-left, +Y down
//! - a positive rotation turns +X toward +Y (clockwise on screen)
//! - clip planes are given in the local frame of the current transform and are
//!   fixed in screen space at the moment they are set
//! - stencil operations only run while the stencil test is enabled
//!
//! Backend calls are infallible.

mod raster;
pub mod recording;
pub mod software;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use recording::{BackendCall, DrawEvent, DrawShape, RecordingBackend};
pub use software::{SoftwareBackend, SoftwareConfig};

#[cfg(feature = "gpu")]
pub use gpu::GpuBackend;

use crate::coords::{ClipPlane, ClipSlot, Rect};
use crate::paint::Color;
use crate::pixels::PixelBuffer;

/// Vertex stream topology for `begin_primitive`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveKind {
    /// Pairs of vertices; each new pair closes a quad with the previous pair.
    QuadStrip,
    /// First vertex is shared by every triangle.
    TriangleFan,
    TriangleStrip,
    /// Closed one-pixel outline through every vertex.
    LineLoop,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Source/destination factors applied to every channel, alpha included.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlendMode {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendMode {
    pub const ALPHA: BlendMode =
        BlendMode { src: BlendFactor::SrcAlpha, dst: BlendFactor::OneMinusSrcAlpha };
    pub const REPLACE: BlendMode = BlendMode { src: BlendFactor::One, dst: BlendFactor::Zero };
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::ALPHA
    }
}

/// Stencil comparison. The test passes when `(reference & mask) FUNC (stored & mask)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CompareFunc {
    Never,
    Always,
    Less,
    LessEqual,
    Equal,
    NotEqual,
    GreaterEqual,
    Greater,
}

impl CompareFunc {
    #[inline]
    pub fn test(self, reference: u8, stored: u8, mask: u8) -> bool {
        let (r, s) = (reference & mask, stored & mask);
        match self {
            CompareFunc::Never => false,
            CompareFunc::Always => true,
            CompareFunc::Less => r < s,
            CompareFunc::LessEqual => r <= s,
            CompareFunc::Equal => r == s,
            CompareFunc::NotEqual => r != s,
            CompareFunc::GreaterEqual => r >= s,
            CompareFunc::Greater => r > s,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
}

impl StencilOp {
    /// New stencil value before the write mask is applied.
    #[inline]
    pub fn apply(self, stored: u8, reference: u8) -> u8 {
        match self {
            StencilOp::Keep => stored,
            StencilOp::Zero => 0,
            StencilOp::Replace => reference,
            StencilOp::IncrementClamp => stored.saturating_add(1),
            StencilOp::DecrementClamp => stored.saturating_sub(1),
            StencilOp::Invert => !stored,
        }
    }
}

/// Per-channel color write enables.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ColorMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl ColorMask {
    pub const ALL: ColorMask = ColorMask { r: true, g: true, b: true, a: true };
    pub const NONE: ColorMask = ColorMask { r: false, g: false, b: false, a: false };

    #[inline]
    pub fn any(self) -> bool {
        self.r || self.g || self.b || self.a
    }
}

impl Default for ColorMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Opaque backend-owned texture id.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureHandle(pub u32);

/// Full stencil configuration as seen by the backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct StencilState {
    pub test_enabled: bool,
    pub write_mask: u8,
    pub compare: CompareFunc,
    pub reference: u8,
    pub compare_mask: u8,
    pub fail_op: StencilOp,
    pub zfail_op: StencilOp,
    pub pass_op: StencilOp,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            test_enabled: false,
            write_mask: 0xff,
            compare: CompareFunc::Always,
            reference: 0,
            compare_mask: 0xff,
            fail_op: StencilOp::Keep,
            zfail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
        }
    }
}

impl StencilState {
    /// Runs the stencil test against `stored` and returns `(passed, new_value)`.
    ///
    /// With the test disabled every fragment passes and the buffer is untouched.
    #[inline]
    pub fn evaluate(&self, stored: u8) -> (bool, u8) {
        if !self.test_enabled {
            return (true, stored);
        }
        let passed = self.compare.test(self.reference, stored, self.compare_mask);
        let op = if passed { self.pass_op } else { self.fail_op };
        let next = op.apply(stored, self.reference);
        let merged = (stored & !self.write_mask) | (next & self.write_mask);
        (passed, merged)
    }
}

/// The capability set the compositors consume.
pub trait Backend {
    // ── transform ──────────────────────────────────────────────────────────
    fn reset_transform(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn rotate(&mut self, degrees: f32);

    // ── toggles ────────────────────────────────────────────────────────────
    fn set_texturing_enabled(&mut self, enabled: bool);
    fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor);
    fn set_color_write_mask(&mut self, mask: ColorMask);

    /// Current color, applied to every vertex emitted afterwards.
    fn set_color(&mut self, color: Color);

    // ── geometry ───────────────────────────────────────────────────────────
    fn begin_primitive(&mut self, kind: PrimitiveKind);
    fn emit_vertex(&mut self, x: f32, y: f32);
    /// Texture coordinate for the next emitted vertex.
    fn set_tex_coord(&mut self, u: f32, v: f32);
    fn end_primitive(&mut self);
    /// Filled rectangle `(x, y)..(x + w, y + h)` in the current local frame.
    fn draw_filled_rect(&mut self, x: f32, y: f32, w: f32, h: f32);

    // ── stencil ────────────────────────────────────────────────────────────
    fn set_stencil_mask(&mut self, mask: u8);
    fn set_stencil_func(&mut self, func: CompareFunc, reference: u8, mask: u8);
    fn set_stencil_op(&mut self, fail: StencilOp, zfail: StencilOp, pass: StencilOp);
    fn set_stencil_test_enabled(&mut self, enabled: bool);
    /// Sets every stencil value to `value`, ignoring masks and tests.
    fn clear_stencil(&mut self, value: u8);

    // ── scissor ────────────────────────────────────────────────────────────
    fn set_scissor_test_enabled(&mut self, enabled: bool);
    /// Scissor rectangle in screen pixels.
    fn set_scissor(&mut self, rect: Rect);

    // ── clipping ───────────────────────────────────────────────────────────
    fn set_clip_plane(&mut self, slot: ClipSlot, plane: ClipPlane);
    fn set_clip_plane_enabled(&mut self, slot: ClipSlot, enabled: bool);

    // ── textures ───────────────────────────────────────────────────────────
    /// Uploads an RGBA image and returns its handle.
    fn upload_texture(&mut self, pixels: &PixelBuffer) -> TextureHandle;
    /// Binds a texture for sampling; `None` unbinds.
    fn bind_texture(&mut self, texture: Option<TextureHandle>);

    // ── pixels ─────────────────────────────────────────────────────────────
    /// Reads the frame buffer inside `rect`, clamped to the viewport.
    fn read_pixels(&mut self, rect: Rect) -> PixelBuffer;
    /// Writes `pixels` with its top-left corner at screen `(x, y)`.
    ///
    /// Every pixel is a fragment: it is subject to clip planes, scissor,
    /// stencil, blending and the color mask.
    fn write_pixels(&mut self, x: i32, y: i32, pixels: &PixelBuffer);

    /// Frame buffer size in pixels.
    fn viewport(&self) -> (u32, u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_applies_mask_to_both_sides() {
        assert!(CompareFunc::Equal.test(1, 0b11, 0b01));
        assert!(!CompareFunc::Equal.test(1, 0b10, 0b01));
        assert!(CompareFunc::NotEqual.test(1, 0, 1));
    }

    #[test]
    fn write_mask_merges_old_and_new_bits() {
        let st = StencilState {
            test_enabled: true,
            write_mask: 0x01,
            pass_op: StencilOp::Zero,
            ..StencilState::default()
        };
        // Only bit 0 may change.
        assert_eq!(st.evaluate(0b1011), (true, 0b1010));
    }

    #[test]
    fn disabled_test_never_writes() {
        let st = StencilState { pass_op: StencilOp::Replace, reference: 1, ..Default::default() };
        assert_eq!(st.evaluate(0), (true, 0));
    }

    #[test]
    fn failing_fragments_use_fail_op() {
        let st = StencilState {
            test_enabled: true,
            compare: CompareFunc::Never,
            fail_op: StencilOp::IncrementClamp,
            ..Default::default()
        };
        assert_eq!(st.evaluate(255), (false, 255));
        assert_eq!(st.evaluate(3), (false, 4));
    }
}
