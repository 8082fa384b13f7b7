//! SVG renderer: one `<path>` per drawn feature, re-projected in place.

use formats::{Geometry, WorldAtlas, city_element_id};
use foundation::math::LonLat;
use navigator::{GRATICULE_STEP, Highlights, PathGenerator, Projection, Renderer, graticule};
use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

const COUNTRY_CLASS: &str = "iglobe-countries";
const CITY_CLASS: &str = "iglobe-cities";
const ROUTE_CLASS: &str = "iglobe-route";
const SELECTED_CLASS: &str = "iglobe-selected";
const HIGHLIGHT_CLASS: &str = "iglobe-highlight";
const POINT_CLASS: &str = "iglobe-point";
const ZOOMING_CLASS: &str = "zooming";

enum Source {
    Sphere,
    Graticule(Geometry),
    Feature(Geometry),
}

struct DrawnPath {
    element: Element,
    source: Source,
}

pub struct SvgRenderer {
    container_id: String,
    viewport: f64,
    root: Option<Element>,
    foreground: Option<Element>,
    /// Marker for the point held by the current drag.
    grab: Option<(Element, LonLat)>,
    paths: Vec<DrawnPath>,
    countries: Vec<(String, Element)>,
    cities: Vec<(String, Element)>,
    routes: Vec<(String, Element)>,
}

impl SvgRenderer {
    pub fn new(container_id: impl Into<String>, viewport: f64) -> Self {
        Self {
            container_id: container_id.into(),
            viewport,
            root: None,
            foreground: None,
            grab: None,
            paths: Vec::new(),
            countries: Vec::new(),
            cities: Vec::new(),
            routes: Vec::new(),
        }
    }

    fn build(&mut self, atlas: Option<&WorldAtlas>, projection: &Projection) -> Result<(), JsValue> {
        let doc = document()?;
        let container = doc
            .get_element_by_id(&self.container_id)
            .ok_or_else(|| JsValue::from_str(&format!("missing #{}", self.container_id)))?;

        if let Some(old) = self.root.take() {
            old.remove();
        }
        self.foreground = None;
        self.grab = None;
        self.paths.clear();
        self.countries.clear();
        self.cities.clear();
        self.routes.clear();

        let svg = svg_element(&doc, "svg", None)?;
        svg.set_attribute("viewBox", &format!("0 0 {0} {0}", self.viewport))?;
        svg.set_attribute("preserveAspectRatio", "xMidYMid meet")?;
        svg.set_id("map");
        container.append_child(&svg)?;

        let background = svg_element(&doc, "path", Some("iglobe-background"))?;
        svg.append_child(&background)?;
        self.paths.push(DrawnPath {
            element: background,
            source: Source::Sphere,
        });

        let grid = svg_element(&doc, "path", Some("iglobe-graticule"))?;
        svg.append_child(&grid)?;
        self.paths.push(DrawnPath {
            element: grid,
            source: Source::Graticule(graticule(GRATICULE_STEP)),
        });

        if let Some(atlas) = atlas {
            let group = add_group(&doc, &svg, "countries")?;
            for feature in atlas.drawable_countries() {
                let (Some(id), Some(geometry)) = (feature.id.as_ref(), feature.geometry.as_ref()) else {
                    continue;
                };
                let el = self.feature_path(&doc, &group, id, COUNTRY_CLASS, geometry)?;
                self.countries.push((id.clone(), el));
            }

            let group = add_group(&doc, &svg, "routes")?;
            for feature in &atlas.trips.features {
                let (Some(name), Some(geometry)) = (feature.name(), feature.geometry.as_ref()) else {
                    continue;
                };
                let el = self.feature_path(&doc, &group, name, ROUTE_CLASS, geometry)?;
                el.set_attribute("visibility", "hidden")?;
                self.routes.push((name.to_string(), el));
            }

            let group = add_group(&doc, &svg, "cities")?;
            for feature in &atlas.cities.features {
                let (Some(name), Some(geometry)) = (feature.name(), feature.geometry.as_ref()) else {
                    continue;
                };
                let id = city_element_id(name);
                let el = self.feature_path(&doc, &group, &id, CITY_CLASS, geometry)?;
                self.cities.push((id, el));
            }
        }

        // Drawn last so it receives the pointer.
        let foreground = svg_element(&doc, "path", Some("iglobe-foreground"))?;
        svg.append_child(&foreground)?;
        self.paths.push(DrawnPath {
            element: foreground.clone(),
            source: Source::Sphere,
        });

        self.foreground = Some(foreground);
        self.root = Some(svg);
        self.redraw(projection);
        Ok(())
    }

    fn feature_path(
        &mut self,
        doc: &Document,
        parent: &Element,
        id: &str,
        class: &str,
        geometry: &Geometry,
    ) -> Result<Element, JsValue> {
        let el = svg_element(doc, "path", Some(class))?;
        el.set_id(id);
        parent.append_child(&el)?;
        self.paths.push(DrawnPath {
            element: el.clone(),
            source: Source::Feature(geometry.clone()),
        });
        Ok(el)
    }

    fn apply(&self, highlights: &Highlights) -> Result<(), JsValue> {
        for (id, el) in &self.countries {
            let on = highlights.country.as_deref() == Some(id.as_str());
            el.class_list().toggle_with_force(SELECTED_CLASS, on)?;
        }
        for (id, el) in &self.cities {
            let on = highlights.location.as_deref() == Some(id.as_str());
            el.class_list().toggle_with_force(HIGHLIGHT_CLASS, on)?;
            if on {
                // Raise above neighbouring cities.
                if let Some(parent) = el.parent_node() {
                    parent.append_child(el)?;
                }
            }
        }
        for (name, el) in &self.routes {
            let on = highlights.trip.as_deref() == Some(name.as_str());
            el.set_attribute("visibility", if on { "visible" } else { "hidden" })?;
        }
        Ok(())
    }

    fn start_grab(&mut self, point: Option<LonLat>, projection: &Projection) -> Result<(), JsValue> {
        self.end_grab()?;
        let (Some(root), Some(foreground)) = (&self.root, &self.foreground) else {
            return Ok(());
        };
        foreground.class_list().add_1(ZOOMING_CLASS)?;
        if let Some(point) = point {
            let el = svg_element(&document()?, "path", Some(POINT_CLASS))?;
            root.insert_before(&el, Some(foreground.as_ref()))?;
            el.set_attribute("d", &PathGenerator::new(projection).geometry(&Geometry::Point(point)))?;
            self.grab = Some((el, point));
        }
        Ok(())
    }

    fn end_grab(&mut self) -> Result<(), JsValue> {
        if let Some((el, _)) = self.grab.take() {
            el.remove();
        }
        if let Some(foreground) = &self.foreground {
            foreground.class_list().remove_1(ZOOMING_CLASS)?;
        }
        Ok(())
    }
}

impl Renderer for SvgRenderer {
    fn draw_map(&mut self, atlas: Option<&WorldAtlas>, projection: &Projection) {
        if let Err(err) = self.build(atlas, projection) {
            tracing::error!(error = ?err, "failed to build map");
        }
    }

    fn redraw(&mut self, projection: &Projection) {
        let generator = PathGenerator::new(projection);
        for path in &self.paths {
            let d = match &path.source {
                Source::Sphere => generator.sphere(),
                Source::Graticule(g) | Source::Feature(g) => generator.geometry(g),
            };
            if let Err(err) = path.element.set_attribute("d", &d) {
                tracing::warn!(error = ?err, "failed to update path");
            }
        }
        if let Some((el, point)) = &self.grab {
            let d = generator.geometry(&Geometry::Point(*point));
            if let Err(err) = el.set_attribute("d", &d) {
                tracing::warn!(error = ?err, "failed to update grab marker");
            }
        }
    }

    fn apply_highlights(&mut self, highlights: &Highlights) {
        if let Err(err) = self.apply(highlights) {
            tracing::warn!(error = ?err, "failed to apply highlights");
        }
    }

    fn has_element(&self, id: &str) -> bool {
        document()
            .ok()
            .and_then(|doc| doc.get_element_by_id(id))
            .is_some()
    }

    fn grab_started(&mut self, point: Option<LonLat>, projection: &Projection) {
        if let Err(err) = self.start_grab(point, projection) {
            tracing::warn!(error = ?err, "failed to mark grab");
        }
    }

    fn grab_ended(&mut self) {
        if let Err(err) = self.end_grab() {
            tracing::warn!(error = ?err, "failed to clear grab");
        }
    }
}

pub(crate) fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

fn svg_element(doc: &Document, tag: &str, class: Option<&str>) -> Result<Element, JsValue> {
    let el = doc.create_element_ns(Some(SVG_NS), tag)?;
    if let Some(class) = class {
        el.set_attribute("class", class)?;
    }
    Ok(el)
}

fn add_group(doc: &Document, svg: &Element, id: &str) -> Result<Element, JsValue> {
    let g = svg_element(doc, "g", None)?;
    g.set_id(id);
    svg.append_child(&g)?;
    Ok(g)
}
