use crate::coords::Rect;

use super::RenderContext;

impl RenderContext<'_> {
    /// Narrows drawing to `rect` (screen coordinates) intersected with the
    /// current scissor. Disjoint rectangles yield an empty scissor that
    /// rejects everything. Ignored while the scissor is locked.
    pub fn push_scissor(&mut self, rect: Rect) {
        if self.scissor_locks > 0 {
            log::debug!("scissor locked; ignoring push");
            return;
        }
        let (mx, my) = self.screen_margin();
        let rect = rect.normalized().translated(mx, my);
        let next = match self.scissors.last() {
            Some(parent) => parent
                .intersect(rect)
                .unwrap_or_else(|| Rect::new(rect.x(), rect.y(), 0.0, 0.0)),
            None => rect,
        };
        self.scissors.push(next);
        self.backend().set_scissor(next);
        self.backend().set_scissor_test_enabled(true);
        self.scissor_test = true;
    }

    /// Drops the innermost scissor and returns it (margin included).
    ///
    /// With the stack empty afterwards the scissor covers the whole render
    /// target and the test is switched off.
    pub fn pop_scissor(&mut self) -> Option<Rect> {
        if self.scissor_locks > 0 {
            log::debug!("scissor locked; ignoring pop");
            return None;
        }
        let popped = self.scissors.pop();
        match self.scissors.last().copied() {
            Some(parent) => self.backend().set_scissor(parent),
            None => {
                let (w, h) = self.render_size();
                self.backend().set_scissor(Rect::new(0.0, 0.0, w as f32, h as f32));
                self.backend().set_scissor_test_enabled(false);
                self.scissor_test = false;
            }
        }
        popped
    }

    #[inline]
    pub fn scissor_depth(&self) -> usize {
        self.scissors.len()
    }

    pub fn lock_scissor(&mut self) {
        self.scissor_locks += 1;
    }

    pub fn unlock_scissor(&mut self) {
        self.scissor_locks = self.scissor_locks.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, RecordingBackend, SoftwareBackend, SoftwareConfig};
    use crate::paint::Color;
    use crate::pixels::Rgba8;
    use crate::render::RenderConfig;

    #[test]
    fn nested_scissor_intersects_parent() {
        let mut b = SoftwareBackend::new(SoftwareConfig { width: 20, height: 20, clear: Color::BLACK });
        let mut ctx = RenderContext::new(&mut b);
        ctx.push_scissor(Rect::new(0.0, 0.0, 10.0, 10.0));
        ctx.push_scissor(Rect::new(5.0, 5.0, 10.0, 10.0));
        ctx.draw_rect(Rect::new(0.0, 0.0, 20.0, 20.0), Color::WHITE).unwrap();
        assert_eq!(ctx.pop_scissor(), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        ctx.pop_scissor();
        drop(ctx);

        let white = Rgba8::new(255, 255, 255, 255);
        assert_eq!(b.pixel(7, 7), Some(white));
        assert_ne!(b.pixel(3, 3), Some(white));
        assert_ne!(b.pixel(12, 12), Some(white));
    }

    #[test]
    fn disjoint_scissor_rejects_everything() {
        let mut b = SoftwareBackend::new(SoftwareConfig { width: 20, height: 20, clear: Color::BLACK });
        let mut ctx = RenderContext::new(&mut b);
        ctx.push_scissor(Rect::new(0.0, 0.0, 5.0, 5.0));
        ctx.push_scissor(Rect::new(10.0, 10.0, 5.0, 5.0));
        ctx.draw_rect(Rect::new(0.0, 0.0, 20.0, 20.0), Color::WHITE).unwrap();
        drop(ctx);
        assert!(b.frame().pixels().iter().all(|p| *p == Rgba8::new(0, 0, 0, 255)));
    }

    #[test]
    fn scissor_is_offset_by_screen_margin() {
        let mut b = RecordingBackend::new(100, 100);
        let mut ctx = RenderContext::with_config(
            &mut b,
            RenderConfig { screen_size: Some((80, 60)), ..RenderConfig::default() },
        );
        ctx.push_scissor(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(ctx.pop_scissor(), Some(Rect::new(10.0, 20.0, 10.0, 10.0)));
        drop(ctx);
        assert!(!b.scissor_test_enabled());
        assert_eq!(b.viewport(), (100, 100));
    }

    #[test]
    fn locked_scissor_ignores_push_and_pop() {
        let mut b = RecordingBackend::new(10, 10);
        let mut ctx = RenderContext::new(&mut b);
        ctx.push_scissor(Rect::new(0.0, 0.0, 4.0, 4.0));
        ctx.lock_scissor();
        ctx.push_scissor(Rect::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(ctx.pop_scissor(), None);
        assert_eq!(ctx.scissor_depth(), 1);
        ctx.unlock_scissor();
        assert!(ctx.pop_scissor().is_some());
    }
}
