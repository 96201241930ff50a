//! Angular sector clip planes shared by every clock-style operation.

use crate::coords::{ClipPlane, Rect, Vec2};

use super::ArcSpan;

/// A quarter of a shape, numbered clockwise from 12 o'clock.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Quadrant {
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] =
        [Quadrant::NorthEast, Quadrant::SouthEast, Quadrant::SouthWest, Quadrant::NorthWest];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Quadrant::NorthEast => 0,
            Quadrant::SouthEast => 1,
            Quadrant::SouthWest => 2,
            Quadrant::NorthWest => 3,
        }
    }

    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[inline]
    pub const fn is_east(self) -> bool {
        matches!(self, Quadrant::NorthEast | Quadrant::SouthEast)
    }

    #[inline]
    pub const fn is_south(self) -> bool {
        matches!(self, Quadrant::SouthEast | Quadrant::SouthWest)
    }

    /// This quadrant's quarter of `bounds`.
    pub fn rect_in(self, bounds: Rect) -> Rect {
        let (hw, hh) = (bounds.width() / 2.0, bounds.height() / 2.0);
        let x = if self.is_east() { bounds.x() + hw } else { bounds.x() };
        let y = if self.is_south() { bounds.y() + hh } else { bounds.y() };
        Rect::new(x, y, hw, hh)
    }

    /// The quadrant's 90° of arc in circle angles (0 at 3 o'clock, clockwise).
    #[inline]
    pub fn arc(self, step: f32) -> ArcSpan {
        let start = 90.0 * self.index() as f32 - 90.0;
        ArcSpan::new(start, start + 90.0, step)
    }
}

/// Clip planes that cut `quadrant` down to the wedge swept by `partial_angle`
/// degrees past the quadrant's first edge.
///
/// Planes are expressed in a frame centered on the shape with +Y down:
/// `[diagonal, east/west, north/south]`. The diagonal runs along the sweep's
/// leading edge and its normal points back toward the swept side; its
/// magnitude is the half-height (half-width in the north-west quadrant) so
/// the coefficients match the right-triangle legs `tan(a)` / `tan(90 - a)`.
pub fn sector_clip_planes(quadrant: Quadrant, partial_angle: f32, half_w: f32, half_h: f32) -> [ClipPlane; 3] {
    let sweep = 90.0 * quadrant.index() as f32 + partial_angle;
    let (s, c) = sweep.to_radians().sin_cos();
    let scale = if quadrant == Quadrant::NorthWest { half_w } else { half_h };
    let diagonal = ClipPlane::new(-c * scale, -s * scale, 0.0, 0.0);

    let east_west = if quadrant.is_east() {
        ClipPlane::new(1.0, 0.0, 0.0, 0.0)
    } else {
        ClipPlane::new(-1.0, 0.0, 0.0, 0.0)
    };
    let north_south = if quadrant.is_south() {
        ClipPlane::new(0.0, 1.0, 0.0, 0.0)
    } else {
        ClipPlane::new(0.0, -1.0, 0.0, 0.0)
    };
    [diagonal, east_west, north_south]
}

/// True when `p` (shape-centered frame) lies inside the sector.
pub fn sector_contains(planes: &[ClipPlane; 3], p: Vec2) -> bool {
    planes.iter().all(|plane| plane.keeps(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    /// Diagonal coefficients built directly from the right-triangle legs.
    fn leg_plane(q: Quadrant, a: f32, hw: f32, hh: f32) -> ClipPlane {
        let t = |deg: f32| deg.to_radians().tan();
        match q {
            Quadrant::NorthEast => ClipPlane::new(-t(90.0 - a) * hh, -hh, 0.0, 0.0),
            Quadrant::SouthEast => ClipPlane::new(t(a) * hh, -hh, 0.0, 0.0),
            Quadrant::SouthWest => ClipPlane::new(t(90.0 - a) * hh, hh, 0.0, 0.0),
            Quadrant::NorthWest => ClipPlane::new(-hw, t(90.0 - a) * hw, 0.0, 0.0),
        }
    }

    // ── tangent legs ───────────────────────────────────────────────────────

    #[test]
    fn diagonal_matches_tangent_legs_in_every_quadrant() {
        for q in Quadrant::ALL {
            for a in [1.0, 15.0, 30.0, 45.0, 60.0, 89.0] {
                let built = sector_clip_planes(q, a, 40.0, 25.0)[0].normal().unwrap();
                let legs = leg_plane(q, a, 40.0, 25.0).normal().unwrap();
                assert!(close(built, legs), "{q:?} at {a}: {built:?} vs {legs:?}");
            }
        }
    }

    // ── wedge membership ───────────────────────────────────────────────────

    #[test]
    fn wedge_contains_points_swept_so_far() {
        // Clock angle measured from 12 o'clock, clockwise; +Y is down.
        let at = |clock: f32| Vec2::new(clock.to_radians().sin(), -clock.to_radians().cos()) * 10.0;
        for q in Quadrant::ALL {
            let base = 90.0 * q.index() as f32;
            let planes = sector_clip_planes(q, 40.0, 10.0, 10.0);
            assert!(sector_contains(&planes, at(base + 5.0)), "{q:?}");
            assert!(sector_contains(&planes, at(base + 35.0)), "{q:?}");
            assert!(!sector_contains(&planes, at(base + 45.0)), "{q:?}");
            assert!(!sector_contains(&planes, at(base + 85.0)), "{q:?}");
            assert!(!sector_contains(&planes, at(base + 180.0)), "{q:?}");
        }
    }

    // ── quadrant geometry ──────────────────────────────────────────────────

    #[test]
    fn quadrant_rects_tile_the_bounds() {
        let b = Rect::new(10.0, 20.0, 100.0, 60.0);
        assert_eq!(Quadrant::NorthEast.rect_in(b), Rect::new(60.0, 20.0, 50.0, 30.0));
        assert_eq!(Quadrant::SouthEast.rect_in(b), Rect::new(60.0, 50.0, 50.0, 30.0));
        assert_eq!(Quadrant::SouthWest.rect_in(b), Rect::new(10.0, 50.0, 50.0, 30.0));
        assert_eq!(Quadrant::NorthWest.rect_in(b), Rect::new(10.0, 20.0, 50.0, 30.0));
    }

    #[test]
    fn quadrant_arcs_start_at_twelve() {
        assert_eq!(Quadrant::NorthEast.arc(5.0), ArcSpan::new(-90.0, 0.0, 5.0));
        assert_eq!(Quadrant::NorthWest.arc(5.0), ArcSpan::new(180.0, 270.0, 5.0));
    }
}
