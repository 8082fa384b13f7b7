//! Planar centroid of feature geometry, treating lon/lat as flat x/y.
//!
//! Area-weighted over polygon rings when there is any area; otherwise
//! length-weighted over lines; otherwise the mean of the points. Holes wound
//! opposite to their shell subtract from the area sum.

use foundation::math::LonLat;

use crate::geojson::Geometry;

#[derive(Debug, Default)]
struct Accumulator {
    // points
    x0: f64,
    y0: f64,
    z0: f64,
    // lines
    x1: f64,
    y1: f64,
    z1: f64,
    // areas
    x2: f64,
    y2: f64,
    z2: f64,
}

impl Accumulator {
    fn point(&mut self, p: LonLat) {
        self.x0 += p.lon;
        self.y0 += p.lat;
        self.z0 += 1.0;
    }

    fn line(&mut self, pts: &[LonLat], closed: bool) {
        let Some(&first) = pts.first() else {
            return;
        };
        self.point(first);
        let mut prev = first;
        let tail = pts.iter().skip(1).copied();
        let closing = closed.then_some(first);
        for p in tail.chain(closing) {
            let dx = p.lon - prev.lon;
            let dy = p.lat - prev.lat;
            let z = dx.hypot(dy);
            self.x1 += z * (prev.lon + p.lon) / 2.0;
            self.y1 += z * (prev.lat + p.lat) / 2.0;
            self.z1 += z;
            if closed {
                let a = prev.lat * p.lon - prev.lon * p.lat;
                self.x2 += a * (prev.lon + p.lon);
                self.y2 += a * (prev.lat + p.lat);
                self.z2 += a * 3.0;
            }
            self.point(p);
            prev = p;
        }
    }

    fn geometry(&mut self, g: &Geometry) {
        match g {
            Geometry::Point(p) => self.point(*p),
            Geometry::MultiPoint(ps) => ps.iter().for_each(|p| self.point(*p)),
            Geometry::LineString(ps) => self.line(ps, false),
            Geometry::MultiLineString(lines) => lines.iter().for_each(|l| self.line(l, false)),
            Geometry::Polygon(rings) => rings.iter().for_each(|r| self.line(r, true)),
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .flatten()
                .for_each(|r| self.line(r, true)),
            Geometry::GeometryCollection(gs) => gs.iter().for_each(|g| self.geometry(g)),
        }
    }

    fn result(&self) -> Option<LonLat> {
        let c = if self.z2 != 0.0 {
            LonLat::new(self.x2 / self.z2, self.y2 / self.z2)
        } else if self.z1 != 0.0 {
            LonLat::new(self.x1 / self.z1, self.y1 / self.z1)
        } else if self.z0 != 0.0 {
            LonLat::new(self.x0 / self.z0, self.y0 / self.z0)
        } else {
            return None;
        };
        c.is_finite().then_some(c)
    }
}

/// Planar centroid, or `None` for empty geometry.
pub fn planar_centroid(geometry: &Geometry) -> Option<LonLat> {
    let mut acc = Accumulator::default();
    acc.geometry(geometry);
    acc.result()
}

/// Arithmetic mean of every position, used to aim at a trip route.
pub fn mean_position(points: &[LonLat]) -> Option<LonLat> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.lon, sy + p.lat));
    Some(LonLat::new(sx / n, sy / n))
}
