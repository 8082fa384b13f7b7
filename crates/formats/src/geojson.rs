use foundation::math::LonLat;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(LonLat),
    MultiPoint(Vec<LonLat>),
    LineString(Vec<LonLat>),
    MultiLineString(Vec<Vec<LonLat>>),
    Polygon(Vec<Vec<LonLat>>),
    MultiPolygon(Vec<Vec<Vec<LonLat>>>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::GeometryCollection(_) => "GeometryCollection",
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Point(_))
    }

    /// Every position in the geometry, in document order.
    pub fn positions(&self) -> Vec<LonLat> {
        let mut out = Vec::new();
        self.collect_positions(&mut out);
        out
    }

    fn collect_positions(&self, out: &mut Vec<LonLat>) {
        match self {
            Geometry::Point(p) => out.push(*p),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => out.extend_from_slice(ps),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.iter().for_each(|l| out.extend_from_slice(l))
            }
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .flatten()
                .for_each(|ring| out.extend_from_slice(ring)),
            Geometry::GeometryCollection(gs) => gs.iter().for_each(|g| g.collect_positions(out)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    /// `None` for features whose geometry is JSON `null`.
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: None,
            properties: Map::new(),
            geometry: Some(geometry),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.properties
            .insert("name".to_string(), Value::String(name.into()));
        self
    }

    /// `properties.name`, if it is a string.
    pub fn name(&self) -> Option<&str> {
        self.properties.get("name").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug)]
pub enum GeoJsonError {
    Json(String),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for GeoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoJsonError::Json(msg) => write!(f, "JSON parse error: {msg}"),
            GeoJsonError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            GeoJsonError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for GeoJsonError {}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// First feature whose `properties.name` equals `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name() == Some(name))
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id.as_deref() == Some(id))
    }

    pub fn from_geojson_str(payload: &str) -> Result<Self, GeoJsonError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| GeoJsonError::Json(e.to_string()))?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, GeoJsonError> {
        let obj = value.as_object().ok_or(GeoJsonError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(GeoJsonError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(GeoJsonError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(GeoJsonError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            let feat_obj = feat_val.as_object().ok_or(GeoJsonError::InvalidFeature {
                index,
                reason: "feature must be an object".to_string(),
            })?;

            let feat_type = feat_obj.get("type").and_then(|v| v.as_str()).ok_or(
                GeoJsonError::InvalidFeature {
                    index,
                    reason: "feature missing type".to_string(),
                },
            )?;
            if feat_type != "Feature" {
                return Err(GeoJsonError::InvalidFeature {
                    index,
                    reason: format!("unexpected feature type: {feat_type}"),
                });
            }

            let geometry = match feat_obj.get("geometry") {
                None | Some(Value::Null) => None,
                Some(g) => Some(
                    parse_geometry(g).map_err(|reason| GeoJsonError::InvalidFeature { index, reason })?,
                ),
            };

            features.push(Feature {
                id: parse_id(feat_obj.get("id")),
                properties: parse_properties(feat_obj.get("properties")),
                geometry,
            });
        }

        Ok(Self { features })
    }

    /// Emit as a GeoJSON FeatureCollection value. Property order is not preserved.
    pub fn to_geojson_value(&self) -> Value {
        let mut root = Map::new();
        root.insert(
            "type".to_string(),
            Value::String("FeatureCollection".to_string()),
        );

        let features = self
            .features
            .iter()
            .map(|feat| {
                let mut fobj = Map::new();
                fobj.insert("type".to_string(), Value::String("Feature".to_string()));
                if let Some(id) = &feat.id {
                    fobj.insert("id".to_string(), Value::String(id.clone()));
                }
                fobj.insert(
                    "properties".to_string(),
                    Value::Object(feat.properties.clone()),
                );
                fobj.insert(
                    "geometry".to_string(),
                    feat.geometry
                        .as_ref()
                        .map(geometry_to_geojson_value)
                        .unwrap_or(Value::Null),
                );
                Value::Object(fobj)
            })
            .collect();

        root.insert("features".to_string(), Value::Array(features));
        Value::Object(root)
    }

    pub fn to_geojson_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_geojson_value())
    }

    pub fn to_geojson_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_geojson_value())
    }
}

pub(crate) fn parse_id(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn parse_properties(value: Option<&Value>) -> Map<String, Value> {
    value
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default()
}

pub fn geometry_to_geojson_value(geom: &Geometry) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "type".to_string(),
        Value::String(geom.type_name().to_string()),
    );
    match geom {
        Geometry::Point(p) => {
            obj.insert("coordinates".to_string(), point_coords(p));
        }
        Geometry::MultiPoint(ps) | Geometry::LineString(ps) => {
            obj.insert("coordinates".to_string(), line_coords(ps));
        }
        Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
            let coords = lines.iter().map(|l| line_coords(l)).collect();
            obj.insert("coordinates".to_string(), Value::Array(coords));
        }
        Geometry::MultiPolygon(polys) => {
            let coords = polys
                .iter()
                .map(|poly| Value::Array(poly.iter().map(|r| line_coords(r)).collect()))
                .collect();
            obj.insert("coordinates".to_string(), Value::Array(coords));
        }
        Geometry::GeometryCollection(gs) => {
            obj.insert(
                "geometries".to_string(),
                Value::Array(gs.iter().map(geometry_to_geojson_value).collect()),
            );
        }
    }
    Value::Object(obj)
}

fn point_coords(p: &LonLat) -> Value {
    Value::Array(vec![Value::from(p.lon), Value::from(p.lat)])
}

fn line_coords(ps: &[LonLat]) -> Value {
    Value::Array(ps.iter().map(point_coords).collect())
}

pub fn parse_geometry(value: &Value) -> Result<Geometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    if ty == "GeometryCollection" {
        let geometries = obj
            .get("geometries")
            .and_then(|v| v.as_array())
            .ok_or("GeometryCollection missing geometries".to_string())?;
        return geometries
            .iter()
            .map(parse_geometry)
            .collect::<Result<Vec<_>, _>>()
            .map(Geometry::GeometryCollection);
    }

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Point" => Ok(Geometry::Point(parse_point(coords)?)),
        "MultiPoint" => Ok(Geometry::MultiPoint(parse_points(coords)?)),
        "LineString" => Ok(Geometry::LineString(parse_points(coords)?)),
        "MultiLineString" => Ok(Geometry::MultiLineString(parse_lines(coords)?)),
        "Polygon" => Ok(Geometry::Polygon(parse_lines(coords)?)),
        "MultiPolygon" => Ok(Geometry::MultiPolygon(parse_multi_polygon(coords)?)),
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

pub(crate) fn parse_point(coords: &Value) -> Result<LonLat, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok(LonLat::new(lon, lat))
}

fn parse_points(coords: &Value) -> Result<Vec<LonLat>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array".to_string())?;
    arr.iter().map(parse_point).collect()
}

fn parse_lines(coords: &Value) -> Result<Vec<Vec<LonLat>>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array of lines".to_string())?;
    arr.iter().map(parse_points).collect()
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Vec<Vec<LonLat>>>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    polys.iter().map(parse_lines).collect()
}

#[cfg(test)]
mod tests {
    use super::{FeatureCollection, GeoJsonError, Geometry};
    use foundation::math::LonLat;

    const TRIPS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "name": "Epic Adventure" },
              "geometry": { "type": "LineString", "coordinates": [[10, 20], [30, 40]] } },
            { "type": "Feature", "id": 7, "properties": null, "geometry": null }
        ]
    }"#;

    #[test]
    fn parses_named_line_and_null_geometry() {
        let fc = FeatureCollection::from_geojson_str(TRIPS).unwrap();
        assert_eq!(fc.len(), 2);
        let trip = fc.find_by_name("Epic Adventure").unwrap();
        assert_eq!(
            trip.geometry,
            Some(Geometry::LineString(vec![
                LonLat::new(10.0, 20.0),
                LonLat::new(30.0, 40.0)
            ]))
        );
        assert_eq!(fc.features[1].id.as_deref(), Some("7"));
        assert!(fc.features[1].geometry.is_none());
    }

    #[test]
    fn export_parses_back_to_same_collection() {
        let fc = FeatureCollection::from_geojson_str(TRIPS).unwrap();
        let text = fc.to_geojson_string().unwrap();
        assert_eq!(FeatureCollection::from_geojson_str(&text).unwrap(), fc);
    }

    #[test]
    fn rejects_wrong_root_type() {
        let err = FeatureCollection::from_geojson_str(r#"{"type":"Topology"}"#).unwrap_err();
        assert!(matches!(err, GeoJsonError::NotAFeatureCollection));
    }

    #[test]
    fn reports_bad_feature_index() {
        let payload = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[1]}}]}"#;
        let err = FeatureCollection::from_geojson_str(payload).unwrap_err();
        assert!(matches!(err, GeoJsonError::InvalidFeature { index: 0, .. }));
    }
}
