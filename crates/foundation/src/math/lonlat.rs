use super::Vec3;

/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Point on the unit sphere: `(cos φ cos λ, cos φ sin λ, sin φ)`.
    pub fn to_unit_vector(self) -> Vec3 {
        let lambda = self.lon.to_radians();
        let phi = self.lat.to_radians();
        let cos_phi = phi.cos();
        Vec3::new(cos_phi * lambda.cos(), cos_phi * lambda.sin(), phi.sin())
    }

    /// Inverse of [`LonLat::to_unit_vector`]. The input need not be normalized.
    pub fn from_vector(v: Vec3) -> Self {
        Self::new(
            v.y.atan2(v.x).to_degrees(),
            v.z.atan2(v.x.hypot(v.y)).to_degrees(),
        )
    }

    /// Flips the sign of every non-zero component, leaving zeros positive.
    pub fn negated_nonzero(self) -> Self {
        fn flip(v: f64) -> f64 {
            if v != 0.0 { -v } else { v }
        }
        Self::new(flip(self.lon), flip(self.lat))
    }

    /// Great-circle distance to `other` in radians.
    pub fn angular_distance(self, other: Self) -> f64 {
        self.to_unit_vector()
            .dot(other.to_unit_vector())
            .clamp(-1.0, 1.0)
            .acos()
    }

    pub fn as_array(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl From<[f64; 2]> for LonLat {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<LonLat> for [f64; 2] {
    fn from(v: LonLat) -> Self {
        v.as_array()
    }
}

#[cfg(test)]
mod tests {
    use super::LonLat;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn unit_vector_round_trip() {
        let p = LonLat::new(-122.4, 37.8);
        let v = p.to_unit_vector();
        assert_close(v.length(), 1.0, 1e-12);
        let back = LonLat::from_vector(v);
        assert_close(back.lon, p.lon, 1e-9);
        assert_close(back.lat, p.lat, 1e-9);
    }

    #[test]
    fn negation_keeps_zero_positive() {
        let n = LonLat::new(0.0, 12.5).negated_nonzero();
        assert_eq!(n, LonLat::new(0.0, -12.5));
        assert!(n.lon.is_sign_positive());
    }

    #[test]
    fn quarter_turn_distance() {
        let d = LonLat::new(0.0, 0.0).angular_distance(LonLat::new(90.0, 0.0));
        assert_close(d, std::f64::consts::FRAC_PI_2, 1e-12);
    }
}
