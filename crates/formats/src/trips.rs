//! Flatten the hand-maintained trip list into route geometry.
//!
//! Input is a list of trips naming the cities visited in order, plus a city
//! collection holding each city's point. Output is one `LineString` feature
//! per trip, named after the trip, ready to be folded into the world
//! topology as the `trips` layer.

use foundation::math::LonLat;
use serde::Deserialize;

use crate::geojson::{Feature, FeatureCollection, Geometry};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TripCities {
    pub trips: Vec<TripSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TripSpec {
    pub name: String,
    pub cities: Vec<String>,
}

#[derive(Debug)]
pub enum TripError {
    Json(String),
}

impl std::fmt::Display for TripError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripError::Json(msg) => write!(f, "trip list parse error: {msg}"),
        }
    }
}

impl std::error::Error for TripError {}

impl TripCities {
    pub fn from_json_str(payload: &str) -> Result<Self, TripError> {
        serde_json::from_str(payload).map_err(|e| TripError::Json(e.to_string()))
    }
}

/// Position of the city named `name`, if it is a point in `cities`.
pub fn city_position(cities: &FeatureCollection, name: &str) -> Option<LonLat> {
    match cities.find_by_name(name)?.geometry.as_ref()? {
        Geometry::Point(p) => Some(*p),
        _ => None,
    }
}

/// Build one route per trip. Cities that cannot be found are logged and
/// left out of the route.
pub fn build_trip_routes(trips: &TripCities, cities: &FeatureCollection) -> FeatureCollection {
    let features = trips
        .trips
        .iter()
        .map(|trip| {
            let route = trip
                .cities
                .iter()
                .filter_map(|city| {
                    let pos = city_position(cities, city);
                    if pos.is_none() {
                        tracing::warn!(trip = %trip.name, "Warning: '{city}' not found.");
                    }
                    pos
                })
                .collect();
            Feature::new(Geometry::LineString(route)).with_name(trip.name.clone())
        })
        .collect();
    FeatureCollection::new(features)
}

#[cfg(test)]
mod tests {
    use super::{TripCities, build_trip_routes};
    use crate::geojson::{FeatureCollection, Geometry};
    use foundation::math::LonLat;
    use pretty_assertions::assert_eq;

    const CITIES: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"Lisbon"},"geometry":{"type":"Point","coordinates":[-9.14,38.72]}},
        {"type":"Feature","properties":{"name":"Porto"},"geometry":{"type":"Point","coordinates":[-8.61,41.15]}}
    ]}"#;

    #[test]
    fn routes_follow_city_order() {
        let trips = TripCities::from_json_str(
            r#"{"trips":[{"name":"Iberia","cities":["Porto","Lisbon"]}]}"#,
        )
        .unwrap();
        let cities = FeatureCollection::from_geojson_str(CITIES).unwrap();
        let routes = build_trip_routes(&trips, &cities);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes.features[0].name(), Some("Iberia"));
        assert_eq!(
            routes.features[0].geometry,
            Some(Geometry::LineString(vec![
                LonLat::new(-8.61, 41.15),
                LonLat::new(-9.14, 38.72)
            ]))
        );
    }

    #[test]
    fn unknown_city_is_skipped() {
        let trips = TripCities::from_json_str(
            r#"{"trips":[{"name":"Lost","cities":["Lisbon","Atlantis"]}]}"#,
        )
        .unwrap();
        let cities = FeatureCollection::from_geojson_str(CITIES).unwrap();
        let routes = build_trip_routes(&trips, &cities);
        assert_eq!(
            routes.features[0].geometry,
            Some(Geometry::LineString(vec![LonLat::new(-9.14, 38.72)]))
        );
    }

    #[test]
    fn malformed_trip_list_is_an_error() {
        assert!(TripCities::from_json_str(r#"{"trips":[{"name":1}]}"#).is_err());
    }
}
