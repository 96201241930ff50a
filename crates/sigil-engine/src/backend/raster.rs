//! Backend-independent pipeline state and primitive tessellation.
//!
//! Both the software rasterizer and the wgpu backend keep a [`PipelineState`]
//! and turn finished primitives into screen-space triangles with
//! [`triangulate`]; only fragment processing differs between them.

use crate::coords::{Affine, ClipPlane, ClipSlot, Rect, Vec2};
use crate::paint::Color;

use super::{BlendFactor, BlendMode, ColorMask, CompareFunc, PrimitiveKind, StencilOp, StencilState, TextureHandle};

/// Screen-space vertex after the current transform has been applied.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Vertex {
    pub pos: Vec2,
    pub color: Color,
    pub uv: Vec2,
}

/// Current fixed-function state shared by every backend.
#[derive(Debug, Clone)]
pub(crate) struct PipelineState {
    pub transform: Affine,
    pub color: Color,
    pub tex_coord: Vec2,
    pub texturing: bool,
    pub texture: Option<TextureHandle>,
    pub blend: BlendMode,
    pub color_mask: ColorMask,
    pub stencil: StencilState,
    pub scissor_enabled: bool,
    pub scissor: Rect,
    /// Screen-space plane equations.
    pub planes: [ClipPlane; 3],
    pub planes_enabled: [bool; 3],
    open: Option<(PrimitiveKind, Vec<Vertex>)>,
}

impl PipelineState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            transform: Affine::IDENTITY,
            color: Color::WHITE,
            tex_coord: Vec2::zero(),
            texturing: true,
            texture: None,
            blend: BlendMode::ALPHA,
            color_mask: ColorMask::ALL,
            stencil: StencilState::default(),
            scissor_enabled: false,
            scissor: Rect::new(0.0, 0.0, width as f32, height as f32),
            planes: [ClipPlane::PASS_ALL; 3],
            planes_enabled: [false; 3],
            open: None,
        }
    }

    #[inline]
    pub fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.blend = BlendMode { src, dst };
    }

    #[inline]
    pub fn set_stencil_func(&mut self, func: CompareFunc, reference: u8, mask: u8) {
        self.stencil.compare = func;
        self.stencil.reference = reference;
        self.stencil.compare_mask = mask;
    }

    #[inline]
    pub fn set_stencil_op(&mut self, fail: StencilOp, zfail: StencilOp, pass: StencilOp) {
        self.stencil.fail_op = fail;
        self.stencil.zfail_op = zfail;
        self.stencil.pass_op = pass;
    }

    /// Stores `plane` (local frame) in screen space using the current transform.
    #[inline]
    pub fn set_clip_plane(&mut self, slot: ClipSlot, plane: ClipPlane) {
        self.planes[slot.offset()] = plane.to_screen(self.transform);
    }

    #[inline]
    pub fn set_clip_plane_enabled(&mut self, slot: ClipSlot, enabled: bool) {
        self.planes_enabled[slot.offset()] = enabled;
    }

    /// Enabled planes in slot order.
    pub fn active_planes(&self) -> impl Iterator<Item = ClipPlane> + '_ {
        self.planes
            .iter()
            .zip(self.planes_enabled.iter())
            .filter_map(|(p, on)| on.then_some(*p))
    }

    #[inline]
    pub fn clip_keeps(&self, p: Vec2) -> bool {
        self.active_planes().all(|plane| plane.keeps(p))
    }

    #[inline]
    pub fn scissor_keeps(&self, p: Vec2) -> bool {
        !self.scissor_enabled || self.scissor.contains(p)
    }

    pub fn begin(&mut self, kind: PrimitiveKind) {
        if self.open.is_some() {
            log::warn!("begin_primitive while a primitive is open; previous vertices dropped");
        }
        self.open = Some((kind, Vec::new()));
    }

    pub fn vertex(&mut self, x: f32, y: f32) {
        let v = Vertex {
            pos: self.transform.apply(Vec2::new(x, y)),
            color: self.color,
            uv: self.tex_coord,
        };
        match &mut self.open {
            Some((_, verts)) => verts.push(v),
            None => log::warn!("emit_vertex outside begin/end ignored"),
        }
    }

    /// Closes the open primitive and returns its triangles.
    pub fn end(&mut self) -> Vec<[Vertex; 3]> {
        match self.open.take() {
            Some((kind, verts)) => triangulate(kind, &verts),
            None => {
                log::warn!("end_primitive without begin_primitive");
                Vec::new()
            }
        }
    }

    /// Two triangles for a local-frame rectangle with the current color.
    pub fn rect(&self, x: f32, y: f32, w: f32, h: f32) -> [[Vertex; 3]; 2] {
        let v = |px: f32, py: f32, u: f32, t: f32| Vertex {
            pos: self.transform.apply(Vec2::new(px, py)),
            color: self.color,
            uv: Vec2::new(u, t),
        };
        let tl = v(x, y, 0.0, 0.0);
        let tr = v(x + w, y, 1.0, 0.0);
        let br = v(x + w, y + h, 1.0, 1.0);
        let bl = v(x, y + h, 0.0, 1.0);
        [[tl, tr, br], [tl, br, bl]]
    }

    #[inline]
    pub fn textured(&self) -> Option<TextureHandle> {
        if self.texturing { self.texture } else { None }
    }
}

/// Splits a vertex stream into triangles.
///
/// Line loops become one-pixel-wide quads along every edge, including the
/// closing edge back to the first vertex.
pub(crate) fn triangulate(kind: PrimitiveKind, verts: &[Vertex]) -> Vec<[Vertex; 3]> {
    let mut out = Vec::new();
    match kind {
        PrimitiveKind::TriangleFan => {
            if let Some((&hub, rim)) = verts.split_first() {
                for pair in rim.windows(2) {
                    out.push([hub, pair[0], pair[1]]);
                }
            }
        }
        // A quad strip shares the triangle strip's vertex order.
        PrimitiveKind::TriangleStrip | PrimitiveKind::QuadStrip => {
            for tri in verts.windows(3) {
                out.push([tri[0], tri[1], tri[2]]);
            }
        }
        PrimitiveKind::LineLoop => {
            let n = verts.len();
            if n < 2 {
                return out;
            }
            for i in 0..n {
                let (a, b) = (verts[i], verts[(i + 1) % n]);
                if n == 2 && i == 1 {
                    break;
                }
                line_quad(a, b, &mut out);
            }
        }
    }
    log::trace!("triangulated {kind:?}: {} vertices -> {} triangles", verts.len(), out.len());
    out
}

fn line_quad(a: Vertex, b: Vertex, out: &mut Vec<[Vertex; 3]>) {
    let d = b.pos - a.pos;
    let len = d.length();
    if len <= f32::EPSILON {
        return;
    }
    let n = Vec2::new(-d.y / len, d.x / len) * 0.5;
    let shift = |v: Vertex, off: Vec2| Vertex { pos: v.pos + off, ..v };
    let (a0, a1, b0, b1) = (shift(a, n), shift(a, -n), shift(b, n), shift(b, -n));
    out.push([a0, a1, b0]);
    out.push([a1, b1, b0]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32) -> Vertex {
        Vertex { pos: Vec2::new(x, y), color: Color::WHITE, uv: Vec2::zero() }
    }

    #[test]
    fn fan_shares_first_vertex() {
        let tris = triangulate(PrimitiveKind::TriangleFan, &[v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)]);
        assert_eq!(tris.len(), 2);
        assert!(tris.iter().all(|t| t[0].pos == Vec2::zero()));
    }

    #[test]
    fn quad_strip_of_two_quads_gives_four_triangles() {
        let verts = [v(0.0, 0.0), v(0.0, 1.0), v(1.0, 0.0), v(1.0, 1.0), v(2.0, 0.0), v(2.0, 1.0)];
        assert_eq!(triangulate(PrimitiveKind::QuadStrip, &verts).len(), 4);
    }

    #[test]
    fn line_loop_closes_back_to_start() {
        let verts = [v(0.0, 0.0), v(10.0, 0.0), v(10.0, 10.0)];
        // three edges, two triangles each
        assert_eq!(triangulate(PrimitiveKind::LineLoop, &verts).len(), 6);
    }

    #[test]
    fn clip_plane_is_frozen_at_set_time() {
        let mut st = PipelineState::new(100, 100);
        st.transform.translate(50.0, 0.0);
        st.set_clip_plane(ClipSlot::First, ClipPlane::new(1.0, 0.0, 0.0, 0.0));
        st.set_clip_plane_enabled(ClipSlot::First, true);
        st.transform = Affine::IDENTITY;
        assert!(st.clip_keeps(Vec2::new(55.0, 5.0)));
        assert!(!st.clip_keeps(Vec2::new(45.0, 5.0)));
    }
}
