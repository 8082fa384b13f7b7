//! Unit quaternions for composing globe rotations without gimbal lock.
//!
//! Components are stored scalar-first. Conversions to and from [`Rotation`]
//! use the same axis order as the orthographic projection, so a drag can be
//! accumulated here and only turned back into Euler angles for display.

use super::{Rotation, Vec3};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quat {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    pub fn from_rotation(r: Rotation) -> Self {
        let (sl, cl) = (0.5 * r.lambda.to_radians()).sin_cos();
        let (sp, cp) = (0.5 * r.phi.to_radians()).sin_cos();
        let (sg, cg) = (0.5 * r.gamma.to_radians()).sin_cos();
        Self::new(
            cl * cp * cg + sl * sp * sg,
            sl * cp * cg - cl * sp * sg,
            cl * sp * cg + sl * cp * sg,
            cl * cp * sg - sl * sp * cg,
        )
    }

    /// Back to Euler angles (degrees). Only done for the final projection update.
    pub fn to_rotation(self) -> Rotation {
        let Quat { w, x, y, z } = self;
        Rotation::new(
            (2.0 * (w * x + y * z))
                .atan2(1.0 - 2.0 * (x * x + y * y))
                .to_degrees(),
            (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin().to_degrees(),
            (2.0 * (w * z + x * y))
                .atan2(1.0 - 2.0 * (y * y + z * z))
                .to_degrees(),
        )
    }

    /// Rotation carrying unit vector `from` onto unit vector `to` along their
    /// great circle.
    ///
    /// Returns `None` when the two are parallel: there is no arc to follow and
    /// dividing by the cross-product length would not be finite.
    pub fn between(from: Vec3, to: Vec3) -> Option<Self> {
        let axis = from.cross(to);
        let len = axis.length();
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        let half = 0.5 * from.dot(to).clamp(-1.0, 1.0).acos();
        let s = half.sin() / len;
        Some(Self::new(half.cos(), axis.z * s, -axis.y * s, axis.x * s))
    }

    pub fn mul(self, o: Self) -> Self {
        Self::new(
            self.w * o.w - self.x * o.x - self.y * o.y - self.z * o.z,
            self.w * o.x + self.x * o.w + self.y * o.z - self.z * o.y,
            self.w * o.y - self.x * o.z + self.y * o.w + self.z * o.x,
            self.w * o.z + self.x * o.y - self.y * o.x + self.z * o.w,
        )
    }

    pub fn norm(self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Rescale to unit length; a degenerate quaternion becomes the identity.
    pub fn normalized(self) -> Self {
        let n = self.norm();
        if n > 1e-12 && n.is_finite() {
            Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
        } else {
            Self::IDENTITY
        }
    }
}

impl std::ops::Mul for Quat {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        Quat::mul(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::Quat;
    use crate::math::{LonLat, Rotation, Vec3};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn assert_quat_close(a: Quat, b: Quat) {
        assert_close(a.w, b.w, 1e-12);
        assert_close(a.x, b.x, 1e-12);
        assert_close(a.y, b.y, 1e-12);
        assert_close(a.z, b.z, 1e-12);
    }

    #[test]
    fn euler_round_trip() {
        for r in [
            Rotation::new(-40.0, -30.0, 0.0),
            Rotation::new(10.0, 20.0, 30.0),
            Rotation::new(170.0, -80.0, -45.0),
        ] {
            let back = Quat::from_rotation(r).to_rotation();
            assert_close(back.lambda, r.lambda, 1e-9);
            assert_close(back.phi, r.phi, 1e-9);
            assert_close(back.gamma, r.gamma, 1e-9);
        }
    }

    #[test]
    fn composition_is_associative() {
        let a = Quat::from_rotation(Rotation::new(10.0, 5.0, -3.0));
        let b = Quat::from_rotation(Rotation::new(-70.0, 33.0, 12.0));
        let c = Quat::from_rotation(Rotation::new(120.0, -60.0, 90.0));
        assert_quat_close((a * b) * c, a * (b * c));
    }

    #[test]
    fn composition_preserves_unit_norm() {
        let mut q = Quat::IDENTITY;
        for i in 0..200 {
            let step = Quat::from_rotation(Rotation::new(i as f64 * 1.7, -0.3, 0.9));
            q = q * step;
            assert_close(q.norm(), 1.0, 1e-9);
        }
    }

    #[test]
    fn between_parallel_vectors_is_none() {
        let v = LonLat::new(12.0, 34.0).to_unit_vector();
        assert!(Quat::between(v, v).is_none());
        assert!(Quat::between(Vec3::default(), v).is_none());
    }

    #[test]
    fn between_is_unit_and_half_angle() {
        let a = LonLat::new(0.0, 0.0).to_unit_vector();
        let b = LonLat::new(90.0, 0.0).to_unit_vector();
        let q = Quat::between(a, b).unwrap();
        assert_close(q.norm(), 1.0, 1e-12);
        assert_close(q.w, std::f64::consts::FRAC_PI_4.cos(), 1e-12);
    }

    #[test]
    fn degenerate_normalizes_to_identity() {
        assert_eq!(Quat::new(0.0, 0.0, 0.0, 0.0).normalized(), Quat::IDENTITY);
    }
}
