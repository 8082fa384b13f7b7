//! TopoJSON decoding.
//!
//! A topology stores shared boundaries once as delta-encoded, quantized arcs;
//! geometries reference arcs by index (a negative index `!i` means arc `i`
//! reversed). Decoding stitches the arcs back into ordinary GeoJSON
//! geometry so the rest of the crate never sees the topology encoding.

use foundation::math::LonLat;
use serde_json::{Map, Value};

use crate::geojson::{Feature, FeatureCollection, Geometry, parse_id, parse_properties};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl Transform {
    fn apply(&self, x: f64, y: f64) -> LonLat {
        LonLat::new(
            x * self.scale[0] + self.translate[0],
            y * self.scale[1] + self.translate[1],
        )
    }
}

#[derive(Debug)]
pub enum TopologyError {
    Json(String),
    NotATopology,
    MissingObject(String),
    BadArcIndex(i64),
    InvalidGeometry(String),
}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyError::Json(msg) => write!(f, "JSON parse error: {msg}"),
            TopologyError::NotATopology => write!(f, "expected a TopoJSON Topology"),
            TopologyError::MissingObject(name) => write!(f, "topology has no object {name:?}"),
            TopologyError::BadArcIndex(i) => write!(f, "arc index {i} out of range"),
            TopologyError::InvalidGeometry(msg) => write!(f, "invalid topology geometry: {msg}"),
        }
    }
}

impl std::error::Error for TopologyError {}

#[derive(Debug, Clone)]
pub struct Topology {
    transform: Option<Transform>,
    /// Arcs with deltas and quantization already resolved.
    arcs: Vec<Vec<LonLat>>,
    objects: Map<String, Value>,
}

impl Topology {
    pub fn from_json_str(payload: &str) -> Result<Self, TopologyError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| TopologyError::Json(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, TopologyError> {
        let Value::Object(mut root) = value else {
            return Err(TopologyError::NotATopology);
        };
        if root.get("type").and_then(|v| v.as_str()) != Some("Topology") {
            return Err(TopologyError::NotATopology);
        }

        let transform = match root.get("transform") {
            Some(t) => Some(parse_transform(t)?),
            None => None,
        };

        let arcs = root
            .get("arcs")
            .and_then(|v| v.as_array())
            .map(|raw| {
                raw.iter()
                    .map(|arc| decode_arc(arc, transform.as_ref()))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        let objects = match root.remove("objects") {
            Some(Value::Object(o)) => o,
            _ => return Err(TopologyError::NotATopology),
        };

        Ok(Self {
            transform,
            arcs,
            objects,
        })
    }

    pub fn transform(&self) -> Option<Transform> {
        self.transform
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// Decode the named object into features. A top-level
    /// `GeometryCollection` yields one feature per member geometry.
    pub fn features(&self, name: &str) -> Result<FeatureCollection, TopologyError> {
        let object = self
            .objects
            .get(name)
            .ok_or_else(|| TopologyError::MissingObject(name.to_string()))?;

        let obj = object
            .as_object()
            .ok_or_else(|| TopologyError::InvalidGeometry(format!("object {name} is not a map")))?;

        if obj.get("type").and_then(|v| v.as_str()) == Some("GeometryCollection") {
            let members = obj
                .get("geometries")
                .and_then(|v| v.as_array())
                .ok_or_else(|| TopologyError::InvalidGeometry("missing geometries".to_string()))?;
            let features = members
                .iter()
                .map(|g| self.feature(g))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(FeatureCollection::new(features));
        }

        Ok(FeatureCollection::new(vec![self.feature(object)?]))
    }

    fn feature(&self, value: &Value) -> Result<Feature, TopologyError> {
        let obj = value
            .as_object()
            .ok_or_else(|| TopologyError::InvalidGeometry("geometry must be an object".to_string()))?;
        Ok(Feature {
            id: parse_id(obj.get("id")),
            properties: parse_properties(obj.get("properties")),
            geometry: self.geometry(obj)?,
        })
    }

    fn geometry(&self, obj: &Map<String, Value>) -> Result<Option<Geometry>, TopologyError> {
        let ty = match obj.get("type") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(TopologyError::InvalidGeometry(format!(
                    "geometry type must be a string, got {other}"
                )));
            }
        };

        let geometry = match ty {
            "Point" => Geometry::Point(self.position(field(obj, "coordinates")?)?),
            "MultiPoint" => Geometry::MultiPoint(
                as_array(field(obj, "coordinates")?)?
                    .iter()
                    .map(|p| self.position(p))
                    .collect::<Result<_, _>>()?,
            ),
            "LineString" => Geometry::LineString(self.line(field(obj, "arcs")?)?),
            "MultiLineString" => Geometry::MultiLineString(
                as_array(field(obj, "arcs")?)?
                    .iter()
                    .map(|a| self.line(a))
                    .collect::<Result<_, _>>()?,
            ),
            "Polygon" => Geometry::Polygon(self.polygon(field(obj, "arcs")?)?),
            "MultiPolygon" => Geometry::MultiPolygon(
                as_array(field(obj, "arcs")?)?
                    .iter()
                    .map(|p| self.polygon(p))
                    .collect::<Result<_, _>>()?,
            ),
            "GeometryCollection" => {
                let mut out = Vec::new();
                for member in as_array(field(obj, "geometries")?)? {
                    let member = member.as_object().ok_or_else(|| {
                        TopologyError::InvalidGeometry("geometry must be an object".to_string())
                    })?;
                    if let Some(g) = self.geometry(member)? {
                        out.push(g);
                    }
                }
                Geometry::GeometryCollection(out)
            }
            other => {
                return Err(TopologyError::InvalidGeometry(format!(
                    "unsupported geometry type: {other}"
                )));
            }
        };
        Ok(Some(geometry))
    }

    /// Point coordinates are quantized but not delta-encoded.
    fn position(&self, value: &Value) -> Result<LonLat, TopologyError> {
        let [x, y] = pair(value)?;
        Ok(match &self.transform {
            Some(t) => t.apply(x, y),
            None => LonLat::new(x, y),
        })
    }

    fn line(&self, arcs: &Value) -> Result<Vec<LonLat>, TopologyError> {
        let mut points = self.stitch(arcs)?;
        if points.len() == 1 {
            points.push(points[0]);
        }
        Ok(points)
    }

    fn ring(&self, arcs: &Value) -> Result<Vec<LonLat>, TopologyError> {
        let mut points = self.stitch(arcs)?;
        if let Some(&first) = points.first() {
            while points.len() < 4 {
                points.push(first);
            }
        }
        Ok(points)
    }

    fn polygon(&self, rings: &Value) -> Result<Vec<Vec<LonLat>>, TopologyError> {
        as_array(rings)?.iter().map(|r| self.ring(r)).collect()
    }

    /// Join arcs end to start, dropping the duplicated joint vertex.
    fn stitch(&self, arcs: &Value) -> Result<Vec<LonLat>, TopologyError> {
        let mut points: Vec<LonLat> = Vec::new();
        for index in as_array(arcs)? {
            let i = index
                .as_i64()
                .ok_or_else(|| TopologyError::InvalidGeometry("arc index must be an integer".to_string()))?;
            let arc = self.arc(i)?;
            points.pop();
            if i < 0 {
                points.extend(arc.iter().rev());
            } else {
                points.extend_from_slice(arc);
            }
        }
        Ok(points)
    }

    fn arc(&self, i: i64) -> Result<&[LonLat], TopologyError> {
        let idx = if i < 0 { !i } else { i };
        usize::try_from(idx)
            .ok()
            .and_then(|idx| self.arcs.get(idx))
            .map(Vec::as_slice)
            .ok_or(TopologyError::BadArcIndex(i))
    }
}

fn parse_transform(value: &Value) -> Result<Transform, TopologyError> {
    let scale = value.get("scale").ok_or(TopologyError::NotATopology)?;
    let translate = value.get("translate").ok_or(TopologyError::NotATopology)?;
    Ok(Transform {
        scale: pair(scale)?,
        translate: pair(translate)?,
    })
}

fn decode_arc(value: &Value, transform: Option<&Transform>) -> Result<Vec<LonLat>, TopologyError> {
    let positions = as_array(value)?;
    let mut out = Vec::with_capacity(positions.len());
    let (mut x, mut y) = (0.0, 0.0);
    for p in positions {
        let [px, py] = pair(p)?;
        match transform {
            Some(t) => {
                x += px;
                y += py;
                out.push(t.apply(x, y));
            }
            None => out.push(LonLat::new(px, py)),
        }
    }
    Ok(out)
}

fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Value, TopologyError> {
    obj.get(key)
        .ok_or_else(|| TopologyError::InvalidGeometry(format!("geometry missing {key}")))
}

fn as_array(value: &Value) -> Result<&Vec<Value>, TopologyError> {
    value
        .as_array()
        .ok_or_else(|| TopologyError::InvalidGeometry("expected an array".to_string()))
}

fn pair(value: &Value) -> Result<[f64; 2], TopologyError> {
    let arr = as_array(value)?;
    match (arr.first().and_then(Value::as_f64), arr.get(1).and_then(Value::as_f64)) {
        (Some(x), Some(y)) => Ok([x, y]),
        _ => Err(TopologyError::InvalidGeometry(
            "position must have two numbers".to_string(),
        )),
    }
}
