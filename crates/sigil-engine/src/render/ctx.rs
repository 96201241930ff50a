use std::ops::{Deref, DerefMut};

use crate::backend::{Backend, BlendFactor, ColorMask};
use crate::coords::{ClipSlot, Rect};
use crate::paint::Color;

use super::stencil::StencilMode;

/// Tessellation defaults and target geometry for a [`RenderContext`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Degrees per fan segment for circles drawn without an explicit step.
    pub circle_step: f32,
    /// Degrees per fan segment for rounded-rectangle corners.
    pub corner_step: f32,
    /// Size of the render target. `None` uses the backend viewport.
    pub render_size: Option<(u32, u32)>,
    /// Logical screen inside the render target. `None` uses the render size.
    ///
    /// When smaller than the render size the screen is centered, and scissor
    /// rectangles are offset by the margin.
    pub screen_size: Option<(u32, u32)>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            circle_step: 5.0,
            corner_step: 10.0,
            render_size: None,
            screen_size: None,
        }
    }
}

/// Explicit drawing context over a mutably borrowed backend.
///
/// Every drawing operation in `render` is a method on this type. The context
/// shadows the stencil and scissor state it owns so that scoped suspensions
/// (`pause_clipping`) and composite passes can put it back exactly.
pub struct RenderContext<'a> {
    backend: &'a mut dyn Backend,
    config: RenderConfig,
    pub(super) stencil_mode: StencilMode,
    pub(super) stencil_locks: u32,
    pub(super) stencil_test: bool,
    pub(super) scissors: Vec<Rect>,
    pub(super) scissor_locks: u32,
    pub(super) scissor_test: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(backend: &'a mut dyn Backend) -> Self {
        Self::with_config(backend, RenderConfig::default())
    }

    /// Wraps `backend` and puts it into the default state.
    pub fn with_config(backend: &'a mut dyn Backend, config: RenderConfig) -> Self {
        let mut ctx = Self {
            backend,
            config,
            stencil_mode: StencilMode::Idle,
            stencil_locks: 0,
            stencil_test: false,
            scissors: Vec::new(),
            scissor_locks: 0,
            scissor_test: false,
        };
        ctx.backend.set_scissor_test_enabled(false);
        ctx.restore_defaults();
        ctx
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Direct access to the backend for calls the context does not wrap.
    #[inline]
    pub fn backend(&mut self) -> &mut dyn Backend {
        &mut *self.backend
    }

    #[inline]
    pub fn viewport(&self) -> (u32, u32) {
        self.backend.viewport()
    }

    pub fn render_size(&self) -> (u32, u32) {
        self.config.render_size.unwrap_or_else(|| self.viewport())
    }

    pub fn screen_size(&self) -> (u32, u32) {
        self.config.screen_size.unwrap_or_else(|| self.render_size())
    }

    /// Offset of the screen inside the render target.
    pub fn screen_margin(&self) -> (f32, f32) {
        let (rw, rh) = self.render_size();
        let (sw, sh) = self.screen_size();
        (((rw as f32 - sw as f32) / 2.0).max(0.0), ((rh as f32 - sh as f32) / 2.0).max(0.0))
    }

    /// Scope that restores the default backend state when dropped.
    #[inline]
    pub fn guard(&mut self) -> StateGuard<'_, 'a> {
        StateGuard { ctx: self }
    }

    /// Puts every piece of state composite operations touch back to its default:
    /// clip planes off, stencil idle, opaque white, texturing on, all color
    /// channels writable, alpha blending, identity transform.
    ///
    /// A locked stencil keeps its mode.
    pub(crate) fn restore_defaults(&mut self) {
        for slot in ClipSlot::ALL {
            self.backend.set_clip_plane_enabled(slot, false);
        }
        if self.stencil_locks == 0 {
            self.stencil_mode = StencilMode::Idle;
        }
        self.apply_stencil_mode();
        self.backend.set_color(Color::WHITE);
        self.backend.set_texturing_enabled(true);
        self.backend.set_color_write_mask(ColorMask::ALL);
        self.backend.set_blend(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        self.backend.reset_transform();
    }

    pub(super) fn enable_clip_planes(&mut self, enabled: bool) {
        for slot in ClipSlot::ALL {
            self.backend.set_clip_plane_enabled(slot, enabled);
        }
    }
}

/// Restores default backend state on drop.
///
/// Composite operations hold one for their whole duration, so no exit path
/// can leave a clip plane, a stencil mode or a color mask behind.
pub struct StateGuard<'g, 'a> {
    ctx: &'g mut RenderContext<'a>,
}

impl<'a> Deref for StateGuard<'_, 'a> {
    type Target = RenderContext<'a>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for StateGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for StateGuard<'_, '_> {
    fn drop(&mut self) {
        self.ctx.restore_defaults();
    }
}
