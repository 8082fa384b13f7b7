//! SVG path data for projected geometry.
//!
//! Lines are cut where they pass behind the horizon. Polygon rings are cut
//! the same way and the hidden stretch is replaced by an arc along the globe
//! silhouette, so a country straddling the horizon still fills its visible
//! part.

use std::f64::consts::{PI, TAU};
use std::fmt::Write;

use formats::Geometry;
use foundation::math::{GreatCircle, LonLat, Vec2, Vec3};

use crate::projection::Projection;

/// Radius of point markers, in pixels.
pub const POINT_RADIUS: f64 = 4.5;

/// Spacing of graticule lines, in degrees.
pub const GRATICULE_STEP: f64 = 10.0;

/// Great-circle resampling step for long edges, in degrees.
const RESAMPLE_DEG: f64 = 2.5;

/// Bisection steps when locating a horizon crossing.
const HORIZON_ITERATIONS: usize = 24;

/// Builds `d` attribute strings against one projection.
pub struct PathGenerator<'a> {
    projection: &'a Projection,
    point_radius: f64,
}

impl<'a> PathGenerator<'a> {
    pub fn new(projection: &'a Projection) -> Self {
        Self {
            projection,
            point_radius: POINT_RADIUS,
        }
    }

    pub fn with_point_radius(mut self, radius: f64) -> Self {
        self.point_radius = radius;
        self
    }

    /// Path data for `geometry`; empty when nothing of it is visible.
    pub fn geometry(&self, geometry: &Geometry) -> String {
        let mut d = String::new();
        self.write_geometry(&mut d, geometry);
        d
    }

    /// Outline of the globe.
    pub fn sphere(&self) -> String {
        let c = self.projection.translate();
        let r = self.projection.radius();
        let mut d = String::new();
        circle(&mut d, c, r);
        d
    }

    fn write_geometry(&self, d: &mut String, geometry: &Geometry) {
        match geometry {
            Geometry::Point(p) => self.point(d, *p),
            Geometry::MultiPoint(ps) => ps.iter().for_each(|p| self.point(d, *p)),
            Geometry::LineString(line) => self.line(d, line),
            Geometry::MultiLineString(lines) => lines.iter().for_each(|l| self.line(d, l)),
            Geometry::Polygon(rings) => rings.iter().for_each(|r| self.ring(d, r)),
            Geometry::MultiPolygon(polys) => polys.iter().flatten().for_each(|r| self.ring(d, r)),
            Geometry::GeometryCollection(gs) => gs.iter().for_each(|g| self.write_geometry(d, g)),
        }
    }

    fn point(&self, d: &mut String, p: LonLat) {
        if let Some(xy) = self.projection.project(p) {
            circle(d, xy, self.point_radius);
        }
    }

    fn line(&self, d: &mut String, line: &[LonLat]) {
        for run in self.visible_runs(&resample(line, false)) {
            if run.len() < 2 {
                continue;
            }
            polyline(d, &run, false);
        }
    }

    fn ring(&self, d: &mut String, ring: &[LonLat]) {
        let points = resample(ring, true);
        if points.len() < 3 {
            return;
        }
        let n = points.len();
        let visible: Vec<bool> = points.iter().map(|p| self.projection.is_visible(*p)).collect();

        let Some(start) = (0..n).find(|&i| !visible[(i + n - 1) % n] && visible[i]) else {
            if visible.iter().all(|v| *v) {
                let projected: Vec<Vec2> = points
                    .iter()
                    .map(|p| self.projection.project_unclipped(*p))
                    .collect();
                polyline(d, &projected, true);
            }
            // Fully hidden rings are dropped.
            return;
        };

        // Each run starts on an entry crossing and ends on the next exit.
        let mut runs: Vec<Vec<Vec2>> = Vec::new();
        let mut current: Vec<Vec2> = Vec::new();
        for k in 0..n {
            let i = (start + k) % n;
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;
            if !visible[i] {
                continue;
            }
            if !visible[prev] {
                current.push(self.horizon_point(points[i], points[prev]));
            }
            current.push(self.projection.project_unclipped(points[i]));
            if !visible[next] {
                current.push(self.horizon_point(points[i], points[next]));
                runs.push(std::mem::take(&mut current));
            }
        }

        // The interior is on the ring's left when seen from outside the
        // globe. Following the silhouette with the disc on the same side
        // means turning counter-clockwise on screen, i.e. decreasing angle
        // in y-down coordinates.
        let direction = if interior_is_left(&points) { -1.0 } else { 1.0 };
        let center = self.projection.translate();
        let r = self.projection.radius();
        let entries: Vec<f64> = runs.iter().map(|run| screen_angle(center, run[0])).collect();
        let mut used = vec![false; runs.len()];

        for first in 0..runs.len() {
            if used[first] {
                continue;
            }
            let _ = write!(d, "M{}", fmt_point(runs[first][0]));
            let mut idx = first;
            loop {
                used[idx] = true;
                let run = &runs[idx];
                for p in &run[1..] {
                    let _ = write!(d, "L{}", fmt_point(*p));
                }
                let exit = run[run.len() - 1];
                let exit_angle = screen_angle(center, exit);
                let gap = |j: &usize| (direction * (entries[*j] - exit_angle)).rem_euclid(TAU);
                let Some(next) = (0..runs.len()).min_by(|a, b| gap(a).total_cmp(&gap(b))) else {
                    break;
                };
                silhouette_arc(d, center, r, exit, runs[next][0], direction);
                if used[next] {
                    break;
                }
                idx = next;
            }
            d.push('Z');
        }
    }

    /// Screen point where the arc from `visible` to `hidden` meets the horizon.
    fn horizon_point(&self, visible: LonLat, hidden: LonLat) -> Vec2 {
        let arc = GreatCircle::new(visible, hidden);
        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..HORIZON_ITERATIONS {
            let mid = 0.5 * (lo + hi);
            if self.projection.is_visible(arc.interpolate(mid)) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let p = self.projection.project_unclipped(arc.interpolate(lo));
        let c = self.projection.translate();
        let v = p - c;
        let len = v.length();
        if len > 0.0 {
            c + v * (self.projection.radius() / len)
        } else {
            p
        }
    }

    fn visible_runs(&self, points: &[LonLat]) -> Vec<Vec<Vec2>> {
        let mut runs = Vec::new();
        let mut current: Vec<Vec2> = Vec::new();
        let mut prev: Option<(LonLat, bool)> = None;
        for &p in points {
            let visible = self.projection.is_visible(p);
            if let Some((q, was_visible)) = prev {
                if was_visible != visible {
                    if visible {
                        current.push(self.horizon_point(p, q));
                    } else {
                        current.push(self.horizon_point(q, p));
                        runs.push(std::mem::take(&mut current));
                    }
                }
            }
            if visible {
                current.push(self.projection.project_unclipped(p));
            }
            prev = Some((p, visible));
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }
}

/// Insert great-circle points so no edge is longer than [`RESAMPLE_DEG`].
/// Closed rings lose their repeated closing vertex.
fn resample(points: &[LonLat], closed: bool) -> Vec<LonLat> {
    let mut points = points.to_vec();
    if closed && points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    let Some(&first) = points.first() else {
        return points;
    };
    let mut out = vec![first];
    let closing = if closed { Some(first) } else { None };
    let mut prev = first;
    for p in points.iter().skip(1).copied().chain(closing) {
        let arc = GreatCircle::new(prev, p);
        let steps = (arc.distance().to_degrees() / RESAMPLE_DEG - 1e-9).ceil().max(1.0) as usize;
        for s in 1..steps {
            out.push(arc.interpolate(s as f64 / steps as f64));
        }
        out.push(p);
        prev = p;
    }
    if closed {
        out.pop();
    }
    out
}

/// Graticule every `step` degrees: meridians stop short of the poles
/// except every 90°, parallels are sampled at the meridian spacing.
pub fn graticule(step: f64) -> Geometry {
    let step = if step > 0.0 { step } else { GRATICULE_STEP };
    let mut lines = Vec::new();
    let mut lon: f64 = -180.0;
    while lon < 180.0 - 1e-9 {
        let extent = if (lon % 90.0).abs() < 1e-9 { 90.0 } else { 90.0 - step };
        lines.push(vec![LonLat::new(lon, -extent), LonLat::new(lon, 0.0), LonLat::new(lon, extent)]);
        lon += step;
    }
    let samples = (360.0 / step).ceil() as usize;
    let mut lat: f64 = -90.0 + step;
    while lat < 90.0 - 1e-9 {
        let parallel = (0..=samples)
            .map(|i| LonLat::new((-180.0 + step * i as f64).min(180.0), lat))
            .collect();
        lines.push(parallel);
        lat += step;
    }
    Geometry::MultiLineString(lines)
}

fn polyline(d: &mut String, points: &[Vec2], closed: bool) {
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd}{}", fmt_point(*p));
    }
    if closed {
        d.push('Z');
    }
}

fn circle(d: &mut String, c: Vec2, r: f64) {
    let _ = write!(
        d,
        "M{},{}a{r},{r} 0 1,1 0,{}a{r},{r} 0 1,1 0,{}Z",
        fmt_num(c.x),
        fmt_num(c.y - r),
        fmt_num(2.0 * r),
        fmt_num(-2.0 * r),
        r = fmt_num(r)
    );
}

/// Arc along the silhouette from `from` to `to`, turning by increasing
/// screen angle when `direction` is positive.
fn silhouette_arc(d: &mut String, c: Vec2, r: f64, from: Vec2, to: Vec2, direction: f64) {
    let span = (direction * (screen_angle(c, to) - screen_angle(c, from))).rem_euclid(TAU);
    if span < 1e-9 {
        let _ = write!(d, "L{}", fmt_point(to));
        return;
    }
    let sweep = if direction > 0.0 { 1 } else { 0 };
    let large = if span > PI { 1 } else { 0 };
    let rs = fmt_num(r);
    let _ = write!(d, "A{rs},{rs} 0 {large},{sweep} {}", fmt_point(to));
}

fn screen_angle(c: Vec2, p: Vec2) -> f64 {
    (p.y - c.y).atan2(p.x - c.x)
}

/// Whether a ring's interior lies to its left, taking the interior to be
/// the side smaller than a hemisphere.
///
/// By Gauss-Bonnet the region on the left has area `2π - T`, where `T` is
/// the total signed turning of the ring, so the left side is the smaller
/// one exactly when `T` is positive.
fn interior_is_left(points: &[LonLat]) -> bool {
    let n = points.len();
    let v: Vec<Vec3> = points.iter().map(|p| p.to_unit_vector()).collect();
    let turning: f64 = (0..n)
        .filter_map(|i| {
            let (a, b, c) = (v[(i + n - 1) % n], v[i], v[(i + 1) % n]);
            let t_in = (b * b.dot(a) - a).normalized()?;
            let t_out = (c - b * b.dot(c)).normalized()?;
            Some(b.dot(t_in.cross(t_out)).atan2(t_in.dot(t_out)))
        })
        .sum();
    turning >= 0.0
}

fn fmt_point(p: Vec2) -> String {
    format!("{},{}", fmt_num(p.x), fmt_num(p.y))
}

/// Three decimals, trailing zeros trimmed.
fn fmt_num(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{PathGenerator, fmt_num, graticule, resample};
    use crate::projection::Projection;
    use formats::Geometry;
    use foundation::math::{LonLat, Rotation, Vec2};

    fn proj() -> Projection {
        Projection::new(Rotation::new(0.0, 0.0, 0.0), 100.0, Vec2::new(200.0, 200.0), 90.0)
    }

    fn square(x0: f64, y0: f64, size: f64) -> Geometry {
        Geometry::Polygon(vec![vec![
            LonLat::new(x0, y0),
            LonLat::new(x0 + size, y0),
            LonLat::new(x0 + size, y0 + size),
            LonLat::new(x0, y0 + size),
            LonLat::new(x0, y0),
        ]])
    }

    #[test]
    fn number_format() {
        assert_eq!(fmt_num(1.0), "1");
        assert_eq!(fmt_num(1.25), "1.25");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(12.34567), "12.346");
    }

    #[test]
    fn visible_point_is_circle() {
        let p = proj();
        let d = PathGenerator::new(&p).geometry(&Geometry::Point(LonLat::new(0.0, 0.0)));
        assert_eq!(d, "M200,195.5a4.5,4.5 0 1,1 0,9a4.5,4.5 0 1,1 0,-9Z");
        assert!(PathGenerator::new(&p)
            .geometry(&Geometry::Point(LonLat::new(180.0, 0.0)))
            .is_empty());
    }

    #[test]
    fn sphere_outline() {
        let p = proj();
        assert_eq!(
            PathGenerator::new(&p).sphere(),
            "M200,100a100,100 0 1,1 0,200a100,100 0 1,1 0,-200Z"
        );
    }

    #[test]
    fn front_polygon_is_closed_path() {
        let p = proj();
        let d = PathGenerator::new(&p).geometry(&square(-5.0, -5.0, 10.0));
        assert!(d.starts_with('M'));
        assert!(d.ends_with('Z'));
        assert!(!d.contains('A'));
    }

    #[test]
    fn back_polygon_is_empty() {
        let p = proj();
        assert!(PathGenerator::new(&p).geometry(&square(170.0, -5.0, 10.0)).is_empty());
    }

    #[test]
    fn straddling_polygon_follows_silhouette() {
        let p = proj();
        let d = PathGenerator::new(&p).geometry(&square(80.0, -10.0, 20.0));
        assert!(d.starts_with('M'));
        assert!(d.contains('A'), "{d}");
        assert!(d.ends_with('Z'));
        assert!(!d.contains("NaN"));
    }

    #[test]
    fn line_is_cut_at_horizon() {
        let p = proj();
        let line = Geometry::LineString(vec![
            LonLat::new(0.0, 0.0),
            LonLat::new(120.0, 0.0),
            LonLat::new(170.0, 0.0),
        ]);
        let d = PathGenerator::new(&p).geometry(&line);
        assert_eq!(d.matches('M').count(), 1);
        // The last vertex drawn sits on the silhouette at the right edge.
        let last = d.rsplit('L').next().unwrap();
        let x: f64 = last.split(',').next().unwrap().parse().unwrap();
        assert!((x - 300.0).abs() < 1e-2, "{last}");
    }

    #[test]
    fn resample_limits_edge_length() {
        let pts = resample(&[LonLat::new(0.0, 0.0), LonLat::new(10.0, 0.0)], false);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts.last(), Some(&LonLat::new(10.0, 0.0)));
    }

    #[test]
    fn graticule_lines() {
        let Geometry::MultiLineString(lines) = graticule(10.0) else {
            panic!("graticule is a multi-line");
        };
        // 36 meridians and 17 parallels.
        assert_eq!(lines.len(), 53);
    }

    #[test]
    fn graticule_follows_step() {
        let Geometry::MultiLineString(lines) = graticule(30.0) else {
            panic!("graticule is a multi-line");
        };
        // 12 meridians, then parallels at -60..=60.
        assert_eq!(lines.len(), 17);
        let parallel = &lines[12];
        assert_eq!(parallel.len(), 13);
        assert_eq!(parallel[1], LonLat::new(-150.0, -60.0));
        assert_eq!(parallel.last(), Some(&LonLat::new(180.0, -60.0)));
    }

    /// Every vertex and arc endpoint of a path, in order.
    fn vertices(d: &str) -> Vec<(f64, f64)> {
        d.split(['M', 'L', 'A', 'Z'])
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.rsplit(' ').next())
            .map(|xy| {
                let (x, y) = xy.split_once(',').unwrap();
                (x.parse().unwrap(), y.parse().unwrap())
            })
            .collect()
    }

    fn arcs_are_short(d: &str) -> bool {
        d.split('A').skip(1).all(|seg| seg.starts_with("100,100 0 0,"))
    }

    #[test]
    fn wrap_around_band_draws_separate_slivers() {
        // Lat 0..10 running east from 50° to 310° through the back of the
        // globe, then back west along lat 10.
        let south = (5..=31).map(|i| LonLat::new(10.0 * i as f64, 0.0));
        let north = (5..=31).rev().map(|i| LonLat::new(10.0 * i as f64, 10.0));
        let mut ring: Vec<LonLat> = south.chain(north).collect();
        ring.push(ring[0]);

        let p = proj();
        let d = PathGenerator::new(&p).geometry(&Geometry::Polygon(vec![ring]));
        assert_eq!(d.matches('M').count(), 2, "{d}");
        assert_eq!(d.matches('Z').count(), 2, "{d}");
        assert!(arcs_are_short(&d), "{d}");
        for (x, _) in vertices(&d) {
            assert!(
                (99.9..=125.0).contains(&x) || (275.0..=300.1).contains(&x),
                "x={x} outside both slivers: {d}"
            );
        }
    }

    #[test]
    fn winding_does_not_change_clipped_fill() {
        let p = proj();
        let Geometry::Polygon(mut rings) = square(80.0, -10.0, 20.0) else {
            unreachable!()
        };
        let forward = PathGenerator::new(&p).geometry(&Geometry::Polygon(rings.clone()));
        rings[0].reverse();
        let reversed = PathGenerator::new(&p).geometry(&Geometry::Polygon(rings));
        for d in [&forward, &reversed] {
            assert_eq!(d.matches('M').count(), 1, "{d}");
            assert!(d.contains('A'), "{d}");
            assert!(arcs_are_short(d), "{d}");
            assert!(vertices(d).iter().all(|&(x, _)| x >= 290.0), "{d}");
        }
    }
}
