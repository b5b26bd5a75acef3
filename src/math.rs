use glam::Vec2;

/// 2D vector helpers on top of `glam::Vec2`.
///
/// Everything here is total: degenerate inputs give zero vectors, never NaN.
pub trait Vec2Ext {
    /// Scalar pseudo-cross `a.x * b.y - a.y * b.x`.
    fn cross(self, rhs: Vec2) -> f32;
    /// Rotate by +90 degrees: `(-y, x)`.
    fn perpendicular(self) -> Vec2;
    /// Unit vector in the same direction, or zero for a zero-length input.
    fn unit_or_zero(self) -> Vec2;
}

impl Vec2Ext for Vec2 {
    #[inline]
    fn cross(self, rhs: Vec2) -> f32 {
        self.x * rhs.y - self.y * rhs.x
    }

    #[inline]
    fn perpendicular(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    #[inline]
    fn unit_or_zero(self) -> Vec2 {
        let len = self.length();
        if len > 0.0 { self / len } else { Vec2::ZERO }
    }
}

/// Linear velocity of an offset `r` on a body spinning at `spin` rad/tick.
#[inline]
pub fn spin_cross(spin: f32, r: Vec2) -> Vec2 {
    r.perpendicular() * spin
}
