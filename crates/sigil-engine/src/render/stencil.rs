//! Stencil-buffer protocol.
//!
//! Callers never touch raw stencil fields; they pick a [`StencilMode`] and the
//! context applies its whole field set at once. Only bit 0 of the buffer is
//! used.

use std::ops::{Deref, DerefMut};

use crate::backend::{ColorMask, CompareFunc, StencilOp};
use crate::coords::Rect;

use super::RenderContext;

/// How draws interact with the stencil buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum StencilMode {
    /// Stencil test off.
    #[default]
    Idle,
    /// Draws render and stamp 1 under every touched pixel.
    Painting,
    /// Draws render and reset touched pixels to 0.
    Erasing,
    /// Draws appear only where the buffer holds 1. The buffer is not modified.
    EnforcePaintedOnly,
    /// Draws appear only where the buffer holds 0. The buffer is not modified.
    EnforceUnpaintedOnly,
}

impl<'a> RenderContext<'a> {
    #[inline]
    pub fn stencil_mode(&self) -> StencilMode {
        self.stencil_mode
    }

    /// Switches the stencil protocol. Ignored while the stencil is locked.
    pub fn set_stencil_mode(&mut self, mode: StencilMode) {
        if self.stencil_locks > 0 {
            log::debug!("stencil locked; ignoring switch to {mode:?}");
            return;
        }
        self.stencil_mode = mode;
        self.apply_stencil_mode();
    }

    /// Writes the full field set of the current mode to the backend.
    pub(super) fn apply_stencil_mode(&mut self) {
        self.write_stencil_fields(self.stencil_mode);
    }

    /// Writes `mode`'s field set to the backend without recording it as the
    /// current mode and regardless of any lock. Callers must run under a
    /// [`StateGuard`](super::StateGuard) so the recorded mode comes back.
    pub(super) fn write_stencil_fields(&mut self, mode: StencilMode) {
        let b = self.backend();
        let (func, op) = match mode {
            StencilMode::Idle => {
                b.set_stencil_test_enabled(false);
                self.stencil_test = false;
                return;
            }
            StencilMode::Painting => (CompareFunc::Always, StencilOp::Replace),
            StencilMode::Erasing => (CompareFunc::Always, StencilOp::Zero),
            StencilMode::EnforcePaintedOnly => (CompareFunc::Equal, StencilOp::Keep),
            StencilMode::EnforceUnpaintedOnly => (CompareFunc::NotEqual, StencilOp::Keep),
        };
        b.set_stencil_mask(0x1);
        b.set_stencil_func(func, 0x1, 0x1);
        b.set_stencil_op(op, op, op);
        b.set_stencil_test_enabled(true);
        self.stencil_test = true;
    }

    /// Zeroes the stencil buffer inside `rect` without touching the frame buffer,
    /// then re-applies the current mode. Ignored while locked.
    pub fn clear_stencil_region(&mut self, rect: Rect) {
        if self.stencil_locks > 0 {
            log::debug!("stencil locked; ignoring region clear");
            return;
        }
        self.zero_stencil_region(rect);
    }

    /// Region clear that ignores the lock.
    pub(super) fn zero_stencil_region(&mut self, rect: Rect) {
        let rect = rect.normalized();
        let b = self.backend();
        b.set_color_write_mask(ColorMask::NONE);
        b.set_stencil_mask(0x1);
        b.set_stencil_func(CompareFunc::Always, 0x0, 0x1);
        b.set_stencil_op(StencilOp::Zero, StencilOp::Zero, StencilOp::Zero);
        b.set_stencil_test_enabled(true);
        b.reset_transform();
        b.translate(rect.x(), rect.y());
        b.draw_filled_rect(0.0, 0.0, rect.width(), rect.height());
        b.set_color_write_mask(ColorMask::ALL);
        self.apply_stencil_mode();
    }

    /// Zeroes the whole stencil buffer. Ignored while locked.
    pub fn clear_stencil(&mut self) {
        if self.stencil_locks > 0 {
            log::debug!("stencil locked; ignoring clear");
            return;
        }
        self.backend().clear_stencil(0);
    }

    /// While locked, mode switches and clears are ignored. Locks nest.
    pub fn lock_stencil(&mut self) {
        self.stencil_locks += 1;
    }

    /// Releases one lock; extra unlocks are harmless.
    pub fn unlock_stencil(&mut self) {
        self.stencil_locks = self.stencil_locks.saturating_sub(1);
    }

    #[inline]
    pub fn is_stencil_locked(&self) -> bool {
        self.stencil_locks > 0
    }

    /// Suspends the scissor and stencil tests together.
    ///
    /// Both come back when the returned scope is resumed or dropped; a test
    /// that was off before the pause stays off.
    pub fn pause_clipping(&mut self) -> ClipPause<'_, 'a> {
        let prior_scissor = self.scissor_test;
        let prior_stencil = self.stencil_test;
        let b = self.backend();
        b.set_scissor_test_enabled(false);
        b.set_stencil_test_enabled(false);
        self.scissor_test = false;
        self.stencil_test = false;
        log::trace!("clipping paused (scissor={prior_scissor}, stencil={prior_stencil})");
        ClipPause { ctx: self, prior_scissor, prior_stencil }
    }
}

/// Scope returned by [`RenderContext::pause_clipping`].
pub struct ClipPause<'g, 'a> {
    ctx: &'g mut RenderContext<'a>,
    prior_scissor: bool,
    prior_stencil: bool,
}

impl ClipPause<'_, '_> {
    /// Re-enables the paused tests now.
    pub fn resume(self) {}
}

impl<'a> Deref for ClipPause<'_, 'a> {
    type Target = RenderContext<'a>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for ClipPause<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for ClipPause<'_, '_> {
    fn drop(&mut self) {
        if self.prior_stencil {
            self.ctx.backend().set_stencil_test_enabled(true);
            self.ctx.stencil_test = true;
        }
        if self.prior_scissor {
            self.ctx.backend().set_scissor_test_enabled(true);
            self.ctx.scissor_test = true;
        }
    }
}
