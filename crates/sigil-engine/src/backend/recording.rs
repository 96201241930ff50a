//! Backend that records every call instead of drawing.
//!
//! Used to check call ordering and the state that was active when geometry was
//! submitted. Pixel reads return transparent buffers.

use crate::coords::{ClipPlane, ClipSlot, Rect};
use crate::paint::Color;
use crate::pixels::PixelBuffer;

use super::raster::PipelineState;
use super::{
    Backend, BlendFactor, BlendMode, ColorMask, CompareFunc, PrimitiveKind, StencilOp,
    StencilState, TextureHandle,
};

/// One call on the [`Backend`] trait.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    ResetTransform,
    Translate(f32, f32),
    Rotate(f32),
    SetTexturingEnabled(bool),
    SetBlend(BlendFactor, BlendFactor),
    SetColorWriteMask(ColorMask),
    SetColor(Color),
    BeginPrimitive(PrimitiveKind),
    EmitVertex(f32, f32),
    SetTexCoord(f32, f32),
    EndPrimitive,
    DrawFilledRect(f32, f32, f32, f32),
    SetStencilMask(u8),
    SetStencilFunc(CompareFunc, u8, u8),
    SetStencilOp(StencilOp, StencilOp, StencilOp),
    SetStencilTestEnabled(bool),
    ClearStencil(u8),
    SetScissorTestEnabled(bool),
    SetScissor(Rect),
    SetClipPlane(ClipSlot, ClipPlane),
    SetClipPlaneEnabled(ClipSlot, bool),
    UploadTexture(u32, u32),
    BindTexture(Option<TextureHandle>),
    ReadPixels(Rect),
    WritePixels(i32, i32, u32, u32),
}

/// What a draw submitted.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DrawShape {
    Primitive { kind: PrimitiveKind, vertices: usize },
    Rect { x: f32, y: f32, w: f32, h: f32 },
    Pixels { x: i32, y: i32, w: u32, h: u32 },
}

/// A geometry submission together with the state it was drawn under.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawEvent {
    pub shape: DrawShape,
    pub color: Color,
    pub active_clip_planes: usize,
    pub stencil: StencilState,
    pub color_mask: ColorMask,
    pub blend: BlendMode,
    pub texturing: bool,
    pub scissor: Option<Rect>,
}

impl DrawEvent {
    #[inline]
    pub fn is_clipped(&self) -> bool {
        self.active_clip_planes > 0
    }
}

pub struct RecordingBackend {
    state: PipelineState,
    viewport: (u32, u32),
    calls: Vec<BackendCall>,
    draws: Vec<DrawEvent>,
    open: Option<(PrimitiveKind, usize)>,
    next_texture: u32,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: PipelineState::new(width, height),
            viewport: (width, height),
            calls: Vec::new(),
            draws: Vec::new(),
            open: None,
            next_texture: 0,
        }
    }

    #[inline]
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    #[inline]
    pub fn draws(&self) -> &[DrawEvent] {
        &self.draws
    }

    /// Forgets recorded calls and draws; tracked state is kept.
    pub fn clear_log(&mut self) {
        self.calls.clear();
        self.draws.clear();
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.state.color
    }

    #[inline]
    pub fn texturing_enabled(&self) -> bool {
        self.state.texturing
    }

    #[inline]
    pub fn stencil(&self) -> StencilState {
        self.state.stencil
    }

    #[inline]
    pub fn color_write_mask(&self) -> ColorMask {
        self.state.color_mask
    }

    #[inline]
    pub fn scissor_test_enabled(&self) -> bool {
        self.state.scissor_enabled
    }

    #[inline]
    pub fn clip_plane_enabled(&self, slot: ClipSlot) -> bool {
        self.state.planes_enabled[slot.offset()]
    }

    pub fn any_clip_plane_enabled(&self) -> bool {
        self.state.planes_enabled.iter().any(|on| *on)
    }

    /// True when every piece of state matches what a fresh backend starts with.
    pub fn is_default_state(&self) -> bool {
        self.state.color == Color::WHITE
            && self.state.texturing
            && !self.any_clip_plane_enabled()
            && !self.state.stencil.test_enabled
            && self.state.color_mask == ColorMask::ALL
            && self.state.blend == BlendMode::ALPHA
    }

    fn record_draw(&mut self, shape: DrawShape) {
        self.draws.push(DrawEvent {
            shape,
            color: self.state.color,
            active_clip_planes: self.state.planes_enabled.iter().filter(|on| **on).count(),
            stencil: self.state.stencil,
            color_mask: self.state.color_mask,
            blend: self.state.blend,
            texturing: self.state.texturing,
            scissor: self.state.scissor_enabled.then_some(self.state.scissor),
        });
    }
}

impl Backend for RecordingBackend {
    fn reset_transform(&mut self) {
        self.calls.push(BackendCall::ResetTransform);
        self.state.transform = crate::coords::Affine::IDENTITY;
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.calls.push(BackendCall::Translate(x, y));
        self.state.transform.translate(x, y);
    }

    fn rotate(&mut self, degrees: f32) {
        self.calls.push(BackendCall::Rotate(degrees));
        self.state.transform.rotate(degrees);
    }

    fn set_texturing_enabled(&mut self, enabled: bool) {
        self.calls.push(BackendCall::SetTexturingEnabled(enabled));
        self.state.texturing = enabled;
    }

    fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.calls.push(BackendCall::SetBlend(src, dst));
        self.state.set_blend(src, dst);
    }

    fn set_color_write_mask(&mut self, mask: ColorMask) {
        self.calls.push(BackendCall::SetColorWriteMask(mask));
        self.state.color_mask = mask;
    }

    fn set_color(&mut self, color: Color) {
        self.calls.push(BackendCall::SetColor(color));
        self.state.color = color;
    }

    fn begin_primitive(&mut self, kind: PrimitiveKind) {
        self.calls.push(BackendCall::BeginPrimitive(kind));
        self.state.begin(kind);
        self.open = Some((kind, 0));
    }

    fn emit_vertex(&mut self, x: f32, y: f32) {
        self.calls.push(BackendCall::EmitVertex(x, y));
        self.state.vertex(x, y);
        if let Some((_, n)) = &mut self.open {
            *n += 1;
        }
    }

    fn set_tex_coord(&mut self, u: f32, v: f32) {
        self.calls.push(BackendCall::SetTexCoord(u, v));
    }

    fn end_primitive(&mut self) {
        self.calls.push(BackendCall::EndPrimitive);
        self.state.end();
        if let Some((kind, vertices)) = self.open.take() {
            self.record_draw(DrawShape::Primitive { kind, vertices });
        }
    }

    fn draw_filled_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.calls.push(BackendCall::DrawFilledRect(x, y, w, h));
        self.record_draw(DrawShape::Rect { x, y, w, h });
    }

    fn set_stencil_mask(&mut self, mask: u8) {
        self.calls.push(BackendCall::SetStencilMask(mask));
        self.state.stencil.write_mask = mask;
    }

    fn set_stencil_func(&mut self, func: CompareFunc, reference: u8, mask: u8) {
        self.calls.push(BackendCall::SetStencilFunc(func, reference, mask));
        self.state.set_stencil_func(func, reference, mask);
    }

    fn set_stencil_op(&mut self, fail: StencilOp, zfail: StencilOp, pass: StencilOp) {
        self.calls.push(BackendCall::SetStencilOp(fail, zfail, pass));
        self.state.set_stencil_op(fail, zfail, pass);
    }

    fn set_stencil_test_enabled(&mut self, enabled: bool) {
        self.calls.push(BackendCall::SetStencilTestEnabled(enabled));
        self.state.stencil.test_enabled = enabled;
    }

    fn clear_stencil(&mut self, value: u8) {
        self.calls.push(BackendCall::ClearStencil(value));
    }

    fn set_scissor_test_enabled(&mut self, enabled: bool) {
        self.calls.push(BackendCall::SetScissorTestEnabled(enabled));
        self.state.scissor_enabled = enabled;
    }

    fn set_scissor(&mut self, rect: Rect) {
        self.calls.push(BackendCall::SetScissor(rect));
        self.state.scissor = rect;
    }

    fn set_clip_plane(&mut self, slot: ClipSlot, plane: ClipPlane) {
        self.calls.push(BackendCall::SetClipPlane(slot, plane));
        self.state.set_clip_plane(slot, plane);
    }

    fn set_clip_plane_enabled(&mut self, slot: ClipSlot, enabled: bool) {
        self.calls.push(BackendCall::SetClipPlaneEnabled(slot, enabled));
        self.state.set_clip_plane_enabled(slot, enabled);
    }

    fn upload_texture(&mut self, pixels: &PixelBuffer) -> TextureHandle {
        self.calls.push(BackendCall::UploadTexture(pixels.width(), pixels.height()));
        let handle = TextureHandle(self.next_texture);
        self.next_texture += 1;
        handle
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) {
        self.calls.push(BackendCall::BindTexture(texture));
        self.state.texture = texture;
    }

    fn read_pixels(&mut self, rect: Rect) -> PixelBuffer {
        self.calls.push(BackendCall::ReadPixels(rect));
        match rect.pixel_span(self.viewport.0, self.viewport.1) {
            Some((x0, y0, x1, y1)) => PixelBuffer::new(x1 - x0, y1 - y0),
            None => PixelBuffer::new(0, 0),
        }
    }

    fn write_pixels(&mut self, x: i32, y: i32, pixels: &PixelBuffer) {
        let (w, h) = (pixels.width(), pixels.height());
        self.calls.push(BackendCall::WritePixels(x, y, w, h));
        self.record_draw(DrawShape::Pixels { x, y, w, h });
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_capture_active_planes() {
        let mut b = RecordingBackend::new(10, 10);
        b.set_clip_plane(ClipSlot::First, ClipPlane::PASS_ALL);
        b.set_clip_plane_enabled(ClipSlot::First, true);
        b.set_clip_plane_enabled(ClipSlot::Third, true);
        b.draw_filled_rect(0.0, 0.0, 1.0, 1.0);
        b.begin_primitive(PrimitiveKind::TriangleFan);
        b.emit_vertex(0.0, 0.0);
        b.emit_vertex(1.0, 0.0);
        b.emit_vertex(1.0, 1.0);
        b.end_primitive();

        assert_eq!(b.draws().len(), 2);
        assert_eq!(b.draws()[0].active_clip_planes, 2);
        assert_eq!(
            b.draws()[1].shape,
            DrawShape::Primitive { kind: PrimitiveKind::TriangleFan, vertices: 3 }
        );
    }

    #[test]
    fn fresh_backend_is_in_default_state() {
        let mut b = RecordingBackend::new(1, 1);
        assert!(b.is_default_state());
        b.set_stencil_test_enabled(true);
        assert!(!b.is_default_state());
    }
}
