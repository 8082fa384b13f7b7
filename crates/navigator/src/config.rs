use std::collections::BTreeMap;

use foundation::math::{LonLat, Rotation};
use runtime::TransitionTiming;
use serde::Deserialize;

/// Tunables for the globe. Every field has a default, so a partial JSON
/// object (or none at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Side of the square view box, in pixels.
    pub viewport: f64,
    pub translate: [f64; 2],
    /// Scale at which the globe fits the view box.
    pub fit_scale: f64,
    pub clip_angle_deg: f64,
    /// Rotation at start-up; double-click returns here.
    pub initial_rotation: [f64; 2],
    /// Rotation target of the world view.
    pub world_rotation: [f64; 2],
    /// Zoom limits as multiples of `fit_scale`.
    pub scale_extent: [f64; 2],
    pub transition_delay_ms: f64,
    pub transition_duration_ms: f64,
    pub poll_interval_ms: f64,
    /// Element awaited before a country view is applied on start-up. Small
    /// countries are drawn late, so a large one stands in for "map ready".
    pub map_ready_sentinel: String,
    /// Fixed focus points keyed by country name, for countries whose
    /// centroid makes a poor view center.
    pub country_overrides: BTreeMap<String, [f64; 2]>,
    pub near_bottom_px: f64,
    pub wheel_sensitivity: f64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            viewport: 400.0,
            translate: [200.0, 200.0],
            fit_scale: 190.0,
            clip_angle_deg: 90.0,
            initial_rotation: [-40.0, -30.0],
            world_rotation: [-30.0, -40.0],
            scale_extent: [0.7, 10.0],
            transition_delay_ms: 500.0,
            transition_duration_ms: 2000.0,
            poll_interval_ms: 10.0,
            map_ready_sentinel: "AUS".to_string(),
            country_overrides: BTreeMap::from([("Russia".to_string(), [77.0, 60.0])]),
            near_bottom_px: 500.0,
            wheel_sensitivity: 0.002,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Json(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Json(msg) => write!(f, "config parse error: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl NavigatorConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(payload).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fit_scale > 0.0 && self.fit_scale.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "fit_scale must be positive, got {}",
                self.fit_scale
            )));
        }
        let [lo, hi] = self.scale_extent;
        if !(lo > 0.0 && lo <= hi && hi.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "scale_extent must be ordered and positive, got [{lo}, {hi}]"
            )));
        }
        for (name, v) in [
            ("transition_delay_ms", self.transition_delay_ms),
            ("transition_duration_ms", self.transition_duration_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ] {
            if !(v >= 0.0 && v.is_finite()) {
                return Err(ConfigError::Invalid(format!("{name} must be >= 0, got {v}")));
            }
        }
        if !(self.clip_angle_deg > 0.0 && self.clip_angle_deg <= 180.0) {
            return Err(ConfigError::Invalid(format!(
                "clip_angle_deg must be in (0, 180], got {}",
                self.clip_angle_deg
            )));
        }
        Ok(())
    }

    pub fn initial_rotation(&self) -> Rotation {
        Rotation::from(self.initial_rotation)
    }

    pub fn world_target(&self) -> LonLat {
        LonLat::from(self.world_rotation)
    }

    pub fn double_click_target(&self) -> LonLat {
        LonLat::from(self.initial_rotation)
    }

    pub fn min_scale(&self) -> f64 {
        self.scale_extent[0] * self.fit_scale
    }

    pub fn max_scale(&self) -> f64 {
        self.scale_extent[1] * self.fit_scale
    }

    pub fn transition_timing(&self) -> TransitionTiming {
        TransitionTiming::new(self.transition_delay_ms, self.transition_duration_ms)
    }

    pub fn country_override(&self, name: &str) -> Option<LonLat> {
        self.country_overrides.get(name).copied().map(LonLat::from)
    }
}
