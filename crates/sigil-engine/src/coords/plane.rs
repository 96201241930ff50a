use super::{Affine, Vec2};

/// Clip plane equation `a·x + b·y + c·z + d`.
///
/// Points where the equation evaluates to a non-negative value are kept. In a
/// 2D pipeline `z` is always zero, so `c` only exists for parity with the
/// fixed-function plane layout.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ClipPlane {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
}

impl ClipPlane {
    #[inline]
    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self { a, b, c, d }
    }

    /// A plane that keeps everything.
    pub const PASS_ALL: ClipPlane = ClipPlane::new(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub fn eval(self, p: Vec2) -> f32 {
        self.a * p.x + self.b * p.y + self.d
    }

    #[inline]
    pub fn keeps(self, p: Vec2) -> bool {
        self.eval(p) >= 0.0
    }

    /// Re-expresses a plane given in `local` coordinates in the space `local` maps to.
    ///
    /// Falls back to [`ClipPlane::PASS_ALL`] for a singular transform.
    pub fn to_screen(self, local: Affine) -> ClipPlane {
        let Some(inv) = local.inverse() else {
            return ClipPlane::PASS_ALL;
        };
        ClipPlane {
            a: self.a * inv.sx + self.b * inv.shy,
            b: self.a * inv.shx + self.b * inv.sy,
            c: self.c,
            d: self.a * inv.tx + self.b * inv.ty + self.d,
        }
    }

    /// Unit-length normal, or `None` for a degenerate plane.
    pub fn normal(self) -> Option<Vec2> {
        let n = Vec2::new(self.a, self.b);
        let len = n.length();
        if len <= f32::EPSILON { None } else { Some(n * (1.0 / len)) }
    }

    #[inline]
    pub fn as_array(self) -> [f32; 4] {
        [self.a, self.b, self.c, self.d]
    }
}

/// One of the three user clip-plane slots (indices 1..=3).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ClipSlot {
    First,
    Second,
    Third,
}

impl ClipSlot {
    pub const ALL: [ClipSlot; 3] = [ClipSlot::First, ClipSlot::Second, ClipSlot::Third];

    /// 1-based slot index.
    #[inline]
    pub const fn index(self) -> u8 {
        match self {
            ClipSlot::First => 1,
            ClipSlot::Second => 2,
            ClipSlot::Third => 3,
        }
    }

    #[inline]
    pub(crate) const fn offset(self) -> usize {
        self.index() as usize - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_follows_translation() {
        // x >= 0 in a frame shifted right by 50 means x >= 50 on screen.
        let p = ClipPlane::new(1.0, 0.0, 0.0, 0.0).to_screen(Affine::translation(50.0, 0.0));
        assert!(p.keeps(Vec2::new(60.0, 0.0)));
        assert!(!p.keeps(Vec2::new(40.0, 0.0)));
    }

    #[test]
    fn plane_follows_rotation() {
        // y >= 0 rotated by 90 degrees turns into x <= 0.
        let p = ClipPlane::new(0.0, 1.0, 0.0, 0.0).to_screen(Affine::rotation(90.0));
        assert!(p.keeps(Vec2::new(-5.0, 0.0)));
        assert!(!p.keeps(Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn slot_indices_are_one_based() {
        let idx: Vec<u8> = ClipSlot::ALL.iter().map(|s| s.index()).collect();
        assert_eq!(idx, vec![1, 2, 3]);
    }
}
