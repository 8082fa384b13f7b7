//! View modes and what each one highlights and focuses on.

use formats::{WorldAtlas, mean_position, planar_centroid};
use foundation::math::LonLat;

use crate::config::NavigatorConfig;

/// The four mutually exclusive display modes.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewMode {
    World,
    Country { id: String },
    Location { id: String, coords: Option<LonLat> },
    Trip { name: String },
}

impl ViewMode {
    /// Mode requested at start-up: 1 world, 2 country, 3 location, 4 trip.
    /// Anything else is the world view.
    pub fn from_init(mode: i32, id: &str, coords: &[f64]) -> Self {
        match mode {
            2 => ViewMode::Country { id: id.to_string() },
            3 => ViewMode::Location {
                id: id.to_string(),
                coords: coords_from_slice(coords),
            },
            4 => ViewMode::Trip {
                name: id.to_string(),
            },
            1 => ViewMode::World,
            other => {
                tracing::debug!(mode = other, "unknown init mode, using world view");
                ViewMode::World
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ViewMode::World => "world",
            ViewMode::Country { .. } => "country",
            ViewMode::Location { .. } => "location",
            ViewMode::Trip { .. } => "trip",
        }
    }

    /// Element the mode highlights, if any.
    pub fn element_id(&self) -> Option<&str> {
        match self {
            ViewMode::World => None,
            ViewMode::Country { id } | ViewMode::Location { id, .. } => Some(id.as_str()),
            ViewMode::Trip { name } => Some(name.as_str()),
        }
    }
}

/// Coordinates from a host payload; only an exact `[lon, lat]` pair counts.
pub fn coords_from_slice(coords: &[f64]) -> Option<LonLat> {
    match coords {
        [lon, lat] => Some(LonLat::new(*lon, *lat)).filter(|p| p.is_finite()),
        _ => None,
    }
}

/// Highlight and visibility flags of the drawn map. At most one field is
/// set at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlights {
    /// Country drawn as selected.
    pub country: Option<String>,
    /// City drawn as selected and raised above the others.
    pub location: Option<String>,
    /// The one visible trip route; all routes are hidden when `None`.
    pub trip: Option<String>,
}

impl Highlights {
    pub fn flush_countries(&mut self) {
        self.country = None;
    }

    pub fn flush_locations(&mut self) {
        self.location = None;
    }

    pub fn flush_trips(&mut self) {
        self.trip = None;
    }

    pub fn flush_all(&mut self) {
        self.flush_countries();
        self.flush_locations();
        self.flush_trips();
    }

    pub fn active_count(&self) -> usize {
        [&self.country, &self.location, &self.trip]
            .into_iter()
            .filter(|h| h.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Clear every flag, then set the one `mode` asks for.
    pub fn select(&mut self, mode: &ViewMode) {
        self.flush_all();
        match mode {
            ViewMode::World => {}
            ViewMode::Country { id } => self.country = Some(id.clone()),
            ViewMode::Location { id, .. } => {
                if !id.is_empty() {
                    self.location = Some(id.clone());
                }
            }
            ViewMode::Trip { name } => self.trip = Some(name.clone()),
        }
    }
}

/// Geographic point a country view centers on.
///
/// Countries listed in the config overrides use their fixed point; all
/// others use the planar centroid of their outline.
pub fn country_focus(atlas: &WorldAtlas, id: &str, config: &NavigatorConfig) -> Option<LonLat> {
    let Some(feature) = atlas.country(id) else {
        tracing::warn!(country = %id, "country not found");
        return None;
    };
    if let Some(fixed) = feature.name().and_then(|name| config.country_override(name)) {
        return Some(fixed);
    }
    let focus = feature.geometry.as_ref().and_then(planar_centroid);
    if focus.is_none() {
        tracing::warn!(country = %id, "country has no centroid");
    }
    focus
}

/// Geographic point a trip view centers on: the mean of the route's vertices.
pub fn trip_focus(atlas: &WorldAtlas, name: &str) -> Option<LonLat> {
    let Some(feature) = atlas.trip(name) else {
        tracing::warn!(trip = %name, "trip not found");
        return None;
    };
    let positions = feature
        .geometry
        .as_ref()
        .map(|g| g.positions())
        .unwrap_or_default();
    let focus = mean_position(&positions);
    if focus.is_none() {
        tracing::warn!(trip = %name, "trip has no coordinates");
    }
    focus
}

/// Rotation target that brings `focus` to the view center. Zero components
/// stay zero rather than becoming negative zero.
pub fn rotation_target(focus: LonLat) -> LonLat {
    focus.negated_nonzero()
}

/// True once the page is scrolled within `threshold` pixels of its end.
pub fn is_near_bottom(inner_height: f64, page_y_offset: f64, body_height: f64, threshold: f64) -> bool {
    inner_height + page_y_offset + threshold >= body_height
}

#[cfg(test)]
mod tests {
    use super::{
        Highlights, ViewMode, coords_from_slice, country_focus, is_near_bottom, rotation_target,
        trip_focus,
    };
    use crate::config::NavigatorConfig;
    use formats::{Feature, FeatureCollection, Geometry, WorldAtlas};
    use foundation::math::LonLat;
    use pretty_assertions::assert_eq;

    fn square(x0: f64, y0: f64, size: f64) -> Geometry {
        Geometry::Polygon(vec![vec![
            LonLat::new(x0, y0),
            LonLat::new(x0 + size, y0),
            LonLat::new(x0 + size, y0 + size),
            LonLat::new(x0, y0 + size),
            LonLat::new(x0, y0),
        ]])
    }

    fn atlas() -> WorldAtlas {
        WorldAtlas {
            countries: FeatureCollection::new(vec![
                Feature::new(square(30.0, 41.0, 150.0))
                    .with_id("RUS")
                    .with_name("Russia"),
                Feature::new(square(0.0, 0.0, 10.0))
                    .with_id("SQR")
                    .with_name("Square"),
                Feature::new(square(0.0, 0.0, 0.0))
                    .with_id("NIL")
                    .with_name("Nil"),
            ]),
            cities: FeatureCollection::default(),
            trips: FeatureCollection::new(vec![
                Feature::new(Geometry::LineString(vec![
                    LonLat::new(10.0, 20.0),
                    LonLat::new(30.0, 40.0),
                ]))
                    .with_name("Epic Adventure"),
                Feature::default().with_name("Empty"),
            ]),
        }
    }

    #[test]
    fn override_beats_centroid() {
        let cfg = NavigatorConfig::default();
        let focus = country_focus(&atlas(), "RUS", &cfg).unwrap();
        assert_eq!(focus, LonLat::new(77.0, 60.0));
        assert_eq!(rotation_target(focus), LonLat::new(-77.0, -60.0));
    }

    #[test]
    fn centroid_for_ordinary_country() {
        let cfg = NavigatorConfig::default();
        let focus = country_focus(&atlas(), "SQR", &cfg).unwrap();
        assert!((focus.lon - 5.0).abs() < 1e-9 && (focus.lat - 5.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_or_degenerate_country_has_no_focus() {
        let cfg = NavigatorConfig::default();
        assert_eq!(country_focus(&atlas(), "XYZ", &cfg), None);
        assert!(country_focus(&atlas(), "NIL", &cfg).is_none_or(|p| p.is_finite()));
    }

    #[test]
    fn trip_focus_is_mean_then_negated() {
        let focus = trip_focus(&atlas(), "Epic Adventure").unwrap();
        assert_eq!(focus, LonLat::new(20.0, 30.0));
        assert_eq!(rotation_target(focus), LonLat::new(-20.0, -30.0));
        assert_eq!(trip_focus(&atlas(), "Empty"), None);
        assert_eq!(trip_focus(&atlas(), "Nowhere"), None);
    }

    #[test]
    fn negation_keeps_zero() {
        let t = rotation_target(LonLat::new(0.0, 12.0));
        assert!(t.lon.is_sign_positive());
        assert_eq!(t.lat, -12.0);
    }

    #[test]
    fn select_is_exclusive() {
        let mut h = Highlights::default();
        h.select(&ViewMode::Country { id: "AAA".into() });
        h.select(&ViewMode::Trip {
            name: "Epic Adventure".into(),
        });
        assert_eq!(
            h,
            Highlights {
                country: None,
                location: None,
                trip: Some("Epic Adventure".into()),
            }
        );
        h.select(&ViewMode::Location {
            id: "Port_Town".into(),
            coords: None,
        });
        assert_eq!(h.active_count(), 1);
        assert_eq!(h.location.as_deref(), Some("Port_Town"));
        h.select(&ViewMode::World);
        assert!(h.is_empty());
    }

    #[test]
    fn init_modes() {
        assert_eq!(
            ViewMode::from_init(3, "Port_Town", &[1.0, 2.0]),
            ViewMode::Location {
                id: "Port_Town".into(),
                coords: Some(LonLat::new(1.0, 2.0)),
            }
        );
        assert_eq!(ViewMode::from_init(2, "AAA", &[]), ViewMode::Country { id: "AAA".into() });
        assert_eq!(ViewMode::from_init(9, "AAA", &[]), ViewMode::World);
        assert_eq!(ViewMode::from_init(0, "", &[]), ViewMode::World);
    }

    #[test]
    fn coords_need_exactly_two() {
        assert_eq!(coords_from_slice(&[1.0]), None);
        assert_eq!(coords_from_slice(&[1.0, 2.0, 3.0]), None);
        assert_eq!(coords_from_slice(&[f64::NAN, 2.0]), None);
        assert_eq!(coords_from_slice(&[1.0, 2.0]), Some(LonLat::new(1.0, 2.0)));
    }

    #[test]
    fn near_bottom_threshold() {
        assert!(is_near_bottom(800.0, 1200.0, 2500.0, 500.0));
        assert!(!is_near_bottom(800.0, 1100.0, 2500.0, 500.0));
    }
}
