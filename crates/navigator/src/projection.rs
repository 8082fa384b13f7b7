//! Orthographic globe projection.
//!
//! Geographic points are first rotated into the view frame with
//! [`Rotation::apply`], then dropped onto the plane tangent to the view
//! center. Only the hemisphere within `clip_angle` of the center is visible.

use foundation::math::{LonLat, Rotation, Vec2};

use crate::config::NavigatorConfig;

/// Slack on the horizon test so points exactly on the silhouette stay drawn.
const HORIZON_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    rotation: Rotation,
    scale: f64,
    translate: Vec2,
    clip_angle_deg: f64,
}

impl Default for Projection {
    fn default() -> Self {
        Self::from_config(&NavigatorConfig::default())
    }
}

impl Projection {
    pub fn new(rotation: Rotation, scale: f64, translate: Vec2, clip_angle_deg: f64) -> Self {
        Self {
            rotation,
            scale,
            translate,
            clip_angle_deg,
        }
    }

    /// Initial projection: fit scale, centered, at the start-up rotation.
    pub fn from_config(config: &NavigatorConfig) -> Self {
        Self::new(
            config.initial_rotation(),
            config.fit_scale,
            Vec2::from(config.translate),
            config.clip_angle_deg,
        )
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Non-finite rotations are ignored so a bad frame never poisons the view.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        if rotation.is_finite() {
            self.rotation = rotation;
        } else {
            tracing::warn!(?rotation, "ignoring non-finite rotation");
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        } else {
            tracing::warn!(scale, "ignoring invalid scale");
        }
    }

    pub fn translate(&self) -> Vec2 {
        self.translate
    }

    pub fn clip_angle_deg(&self) -> f64 {
        self.clip_angle_deg
    }

    /// Screen radius of the globe silhouette.
    pub fn radius(&self) -> f64 {
        if self.clip_angle_deg >= 90.0 {
            self.scale
        } else {
            self.scale * self.clip_angle_deg.to_radians().sin()
        }
    }

    /// Whether `p` lies on the visible side of the horizon.
    pub fn is_visible(&self, p: LonLat) -> bool {
        self.view_cosine(self.rotation.apply(p)) > self.clip_angle_deg.to_radians().cos() - HORIZON_EPSILON
    }

    /// Screen position of `p`, or `None` when it is behind the horizon.
    pub fn project(&self, p: LonLat) -> Option<Vec2> {
        if !p.is_finite() {
            return None;
        }
        let view = self.rotation.apply(p);
        if self.view_cosine(view) <= self.clip_angle_deg.to_radians().cos() - HORIZON_EPSILON {
            return None;
        }
        Some(self.project_view(view))
    }

    /// Screen position ignoring the horizon. Hidden points land on the disc
    /// as if seen through the globe; path clipping uses this.
    pub fn project_unclipped(&self, p: LonLat) -> Vec2 {
        self.project_view(self.rotation.apply(p))
    }

    /// Geographic point under screen position `pt`, or `None` outside the
    /// silhouette.
    pub fn invert(&self, pt: Vec2) -> Option<LonLat> {
        let x = (pt.x - self.translate.x) / self.scale;
        let y = (self.translate.y - pt.y) / self.scale;
        let rho = x.hypot(y);
        if !rho.is_finite() || rho > 1.0 {
            return None;
        }
        let cos_c = (1.0 - rho * rho).max(0.0).sqrt();
        let lambda = (x * rho).atan2(rho * cos_c);
        let phi = y.clamp(-1.0, 1.0).asin();
        let view = LonLat::new(lambda.to_degrees(), phi.to_degrees());
        Some(self.rotation.invert(view))
    }

    fn view_cosine(&self, view: LonLat) -> f64 {
        view.lat.to_radians().cos() * view.lon.to_radians().cos()
    }

    fn project_view(&self, view: LonLat) -> Vec2 {
        let (sin_l, _) = view.lon.to_radians().sin_cos();
        let (sin_p, cos_p) = view.lat.to_radians().sin_cos();
        Vec2::new(
            self.translate.x + self.scale * cos_p * sin_l,
            self.translate.y - self.scale * sin_p,
        )
    }
}
