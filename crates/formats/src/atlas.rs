use crate::geojson::{Feature, FeatureCollection};
use crate::topojson::{Topology, TopologyError};

pub const COUNTRIES_OBJECT: &str = "countries";
pub const CITIES_OBJECT: &str = "cities";
pub const TRIPS_OBJECT: &str = "trips";

/// The three feature layers of the world document, decoded once and then
/// only read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldAtlas {
    pub countries: FeatureCollection,
    pub cities: FeatureCollection,
    pub trips: FeatureCollection,
}

impl WorldAtlas {
    pub fn from_topology(topology: &Topology) -> Result<Self, TopologyError> {
        Ok(Self {
            countries: topology.features(COUNTRIES_OBJECT)?,
            cities: topology.features(CITIES_OBJECT)?,
            trips: topology.features(TRIPS_OBJECT)?,
        })
    }

    pub fn from_topojson_str(payload: &str) -> Result<Self, TopologyError> {
        Self::from_topology(&Topology::from_json_str(payload)?)
    }

    pub fn country(&self, id: &str) -> Option<&Feature> {
        self.countries.find_by_id(id)
    }

    pub fn trip(&self, name: &str) -> Option<&Feature> {
        self.trips.find_by_name(name)
    }

    /// City looked up by its element id (its name with `_` for spaces).
    pub fn city(&self, element_id: &str) -> Option<&Feature> {
        self.cities
            .features
            .iter()
            .find(|f| f.name().map(city_element_id).as_deref() == Some(element_id))
    }

    /// Countries that are drawn as areas; point-only entries are skipped.
    pub fn drawable_countries(&self) -> impl Iterator<Item = &Feature> {
        self.countries
            .features
            .iter()
            .filter(|f| f.geometry.as_ref().is_some_and(|g| !g.is_point()))
    }

    /// Every element id the drawn map exposes: country ids, city ids and
    /// trip names.
    pub fn element_ids(&self) -> Vec<String> {
        let countries = self.drawable_countries().filter_map(|f| f.id.clone());
        let cities = self
            .cities
            .features
            .iter()
            .filter_map(|f| f.name().map(city_element_id));
        let trips = self
            .trips
            .features
            .iter()
            .filter_map(|f| f.name().map(str::to_string));
        countries.chain(cities).chain(trips).collect()
    }
}

/// Element id for a city: spaces become underscores.
pub fn city_element_id(name: &str) -> String {
    name.replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::{WorldAtlas, city_element_id};
    use crate::geojson::{Feature, FeatureCollection, Geometry};
    use foundation::math::LonLat;

    fn atlas() -> WorldAtlas {
        WorldAtlas {
            countries: FeatureCollection::new(vec![
                Feature::new(Geometry::Polygon(vec![vec![LonLat::new(0.0, 0.0)]])).with_id("AUS"),
                Feature::new(Geometry::Point(LonLat::new(1.0, 1.0))).with_id("VAT"),
            ]),
            cities: FeatureCollection::new(vec![
                Feature::new(Geometry::Point(LonLat::new(151.2, -33.9))).with_name("New York City"),
            ]),
            trips: FeatureCollection::new(vec![
                Feature::new(Geometry::LineString(vec![])).with_name("Epic Adventure"),
            ]),
        }
    }

    #[test]
    fn city_ids_replace_spaces() {
        assert_eq!(city_element_id("New York City"), "New_York_City");
        assert!(atlas().city("New_York_City").is_some());
        assert!(atlas().city("New York City").is_none());
    }

    #[test]
    fn point_countries_are_not_drawn() {
        let a = atlas();
        assert!(a.country("VAT").is_some());
        assert_eq!(
            a.element_ids(),
            vec!["AUS", "New_York_City", "Epic Adventure"]
        );
    }
}
