//! Three-axis spherical rotation, in the convention orthographic globe views use:
//! a shift of `lambda` about the polar axis followed by a tilt of `phi` and a
//! roll of `gamma`.

use std::f64::consts::PI;

use super::LonLat;

/// Euler rotation angles in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rotation {
    pub lambda: f64,
    pub phi: f64,
    pub gamma: f64,
}

impl Rotation {
    pub fn new(lambda: f64, phi: f64, gamma: f64) -> Self {
        Self { lambda, phi, gamma }
    }

    /// Rotation with no roll, as produced by two-angle focus targets.
    pub fn from_lon_lat(p: LonLat) -> Self {
        Self::new(p.lon, p.lat, 0.0)
    }

    /// The `(lambda, phi)` pair, which is what focus interpolation works on.
    pub fn yaw_pitch(self) -> LonLat {
        LonLat::new(self.lambda, self.phi)
    }

    pub fn is_finite(self) -> bool {
        self.lambda.is_finite() && self.phi.is_finite() && self.gamma.is_finite()
    }

    /// Rotate a geographic point into the view frame.
    pub fn apply(self, p: LonLat) -> LonLat {
        let lambda = wrap_pi(p.lon.to_radians() + self.lambda.to_radians());
        let (l, f) = self.tilt(lambda, p.lat.to_radians());
        LonLat::new(l.to_degrees(), f.to_degrees())
    }

    /// Undo [`Rotation::apply`].
    pub fn invert(self, p: LonLat) -> LonLat {
        let (l, f) = self.untilt(p.lon.to_radians(), p.lat.to_radians());
        let lambda = wrap_pi(l - self.lambda.to_radians());
        LonLat::new(lambda.to_degrees(), f.to_degrees())
    }

    fn tilt(self, lambda: f64, phi: f64) -> (f64, f64) {
        let (sin_dphi, cos_dphi) = self.phi.to_radians().sin_cos();
        let (sin_dgamma, cos_dgamma) = self.gamma.to_radians().sin_cos();
        let cos_phi = phi.cos();
        let x = lambda.cos() * cos_phi;
        let y = lambda.sin() * cos_phi;
        let z = phi.sin();
        let k = z * cos_dphi + x * sin_dphi;
        (
            (y * cos_dgamma - k * sin_dgamma).atan2(x * cos_dphi - z * sin_dphi),
            clamped_asin(k * cos_dgamma + y * sin_dgamma),
        )
    }

    fn untilt(self, lambda: f64, phi: f64) -> (f64, f64) {
        let (sin_dphi, cos_dphi) = self.phi.to_radians().sin_cos();
        let (sin_dgamma, cos_dgamma) = self.gamma.to_radians().sin_cos();
        let cos_phi = phi.cos();
        let x = lambda.cos() * cos_phi;
        let y = lambda.sin() * cos_phi;
        let z = phi.sin();
        let k = z * cos_dgamma - y * sin_dgamma;
        (
            (y * cos_dgamma + z * sin_dgamma).atan2(x * cos_dphi + k * sin_dphi),
            clamped_asin(k * cos_dphi - x * sin_dphi),
        )
    }
}

impl From<[f64; 3]> for Rotation {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<[f64; 2]> for Rotation {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1], 0.0)
    }
}

fn wrap_pi(lambda: f64) -> f64 {
    if lambda > PI {
        lambda - 2.0 * PI
    } else if lambda < -PI {
        lambda + 2.0 * PI
    } else {
        lambda
    }
}

fn clamped_asin(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).asin()
}
