//! Shortest-arc interpolation between two orientations.
//!
//! Both endpoints are lifted onto the unit sphere and blended with slerp
//! weights, which stays well behaved near the poles where tweening the two
//! angles independently would swing the globe the long way round.

use super::{LonLat, Vec3};

/// Angular distances below this are treated as "already there".
pub const MIN_ARC_RADIANS: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreatCircle {
    source: LonLat,
    target: LonLat,
    p0: Vec3,
    p1: Vec3,
    /// Angular distance in radians, computed once.
    distance: f64,
    /// `1 / sin(distance)`, or zero for coincident endpoints.
    k: f64,
    /// Unit tangent at `p0` used when the endpoints are antipodal.
    antipodal_axis: Option<Vec3>,
}

impl GreatCircle {
    pub fn new(source: LonLat, target: LonLat) -> Self {
        let p0 = source.to_unit_vector();
        let p1 = target.to_unit_vector();
        let distance = if source == target {
            0.0
        } else {
            p0.dot(p1).clamp(-1.0, 1.0).acos()
        };
        let sin_d = distance.sin();

        let (k, antipodal_axis) = if distance <= MIN_ARC_RADIANS {
            (0.0, None)
        } else if sin_d.abs() <= MIN_ARC_RADIANS {
            // Every meridian through p0 reaches the antipode; pick the one
            // through the pole nearest to the source.
            let pole = if p0.z >= 0.0 {
                Vec3::new(0.0, 0.0, 1.0)
            } else {
                Vec3::new(0.0, 0.0, -1.0)
            };
            let tangent = (pole - p0 * p0.dot(pole))
                .normalized()
                .unwrap_or(Vec3::new(0.0, 1.0, 0.0));
            (0.0, Some(tangent))
        } else {
            (1.0 / sin_d, None)
        };

        Self {
            source,
            target,
            p0,
            p1,
            distance,
            k,
            antipodal_axis,
        }
    }

    /// Interpolator from `source` to `target`, or `None` when the two already
    /// coincide and a transition would only produce non-finite values.
    pub fn non_degenerate(source: LonLat, target: LonLat) -> Option<Self> {
        let gc = Self::new(source, target);
        (gc.distance() > MIN_ARC_RADIANS).then_some(gc)
    }

    pub fn source(&self) -> LonLat {
        self.source
    }

    pub fn target(&self) -> LonLat {
        self.target
    }

    /// Cached angular distance between the endpoints, in radians.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Position at `t` in `[0, 1]` along the shortest arc.
    pub fn interpolate(&self, t: f64) -> LonLat {
        if t <= 0.0 {
            return self.source;
        }
        if t >= 1.0 {
            return self.target;
        }
        if self.distance <= MIN_ARC_RADIANS {
            return self.source;
        }

        let td = t * self.distance;
        let v = match self.antipodal_axis {
            Some(axis) => self.p0 * td.cos() + axis * td.sin(),
            None => {
                let a = (self.distance - td).sin() * self.k;
                let b = td.sin() * self.k;
                self.p0 * a + self.p1 * b
            }
        };
        LonLat::from_vector(v)
    }
}
