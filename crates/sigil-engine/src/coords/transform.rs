use super::Vec2;

/// 2D affine transform in the fixed-function convention.
///
/// ```text
///   | sx  shx tx |
///   | shy  sy ty |
///   |  0    0  1 |
/// ```
///
/// `translate` and `rotate` post-multiply, so the most recent call applies
/// first to incoming vertices (the classic matrix-stack order).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine {
    pub sx: f32,
    pub shy: f32,
    pub shx: f32,
    pub sy: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Affine {
    pub const IDENTITY: Affine = Affine { sx: 1.0, shy: 0.0, shx: 0.0, sy: 1.0, tx: 0.0, ty: 0.0 };

    #[inline]
    pub fn translation(x: f32, y: f32) -> Self {
        Affine { tx: x, ty: y, ..Self::IDENTITY }
    }

    #[inline]
    pub fn rotation(degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Affine { sx: c, shy: s, shx: -s, sy: c, tx: 0.0, ty: 0.0 }
    }

    /// `self * rhs`.
    pub fn then(self, rhs: Affine) -> Affine {
        Affine {
            sx: self.sx * rhs.sx + self.shx * rhs.shy,
            shy: self.shy * rhs.sx + self.sy * rhs.shy,
            shx: self.sx * rhs.shx + self.shx * rhs.sy,
            sy: self.shy * rhs.shx + self.sy * rhs.sy,
            tx: self.sx * rhs.tx + self.shx * rhs.ty + self.tx,
            ty: self.shy * rhs.tx + self.sy * rhs.ty + self.ty,
        }
    }

    #[inline]
    pub fn translate(&mut self, x: f32, y: f32) {
        *self = self.then(Affine::translation(x, y));
    }

    #[inline]
    pub fn rotate(&mut self, degrees: f32) {
        *self = self.then(Affine::rotation(degrees));
    }

    #[inline]
    pub fn apply(self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x * self.sx + p.y * self.shx + self.tx,
            p.x * self.shy + p.y * self.sy + self.ty,
        )
    }

    #[inline]
    pub fn determinant(self) -> f32 {
        self.sx * self.sy - self.shy * self.shx
    }

    /// Inverse transform, or `None` for a singular matrix.
    pub fn inverse(self) -> Option<Affine> {
        let det = self.determinant();
        if det.abs() <= f32::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        let sx = self.sy * inv;
        let sy = self.sx * inv;
        let shy = -self.shy * inv;
        let shx = -self.shx * inv;
        Some(Affine {
            sx,
            shy,
            shx,
            sy,
            tx: -self.tx * sx - self.ty * shx,
            ty: -self.tx * shy - self.ty * sy,
        })
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn translate_then_rotate_applies_rotation_first() {
        let mut m = Affine::IDENTITY;
        m.translate(10.0, 20.0);
        m.rotate(90.0);
        // +X rotates onto +Y (clockwise on screen), then shifts by the translation.
        assert!(close(m.apply(Vec2::new(1.0, 0.0)), Vec2::new(10.0, 21.0)));
    }

    #[test]
    fn inverse_round_trips_a_point() {
        let mut m = Affine::IDENTITY;
        m.translate(-3.0, 7.5);
        m.rotate(33.0);
        m.translate(4.0, 1.0);
        let inv = m.inverse().unwrap();
        let p = Vec2::new(12.0, -5.0);
        assert!(close(inv.apply(m.apply(p)), p));
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Affine { sx: 0.0, sy: 0.0, ..Affine::IDENTITY };
        assert!(m.inverse().is_none());
    }
}
