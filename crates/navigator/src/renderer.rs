use formats::WorldAtlas;
use foundation::math::LonLat;

use crate::projection::Projection;
use crate::view::Highlights;

/// Narrow drawing surface the navigator drives.
///
/// Implementations own whatever retained scene they draw into (DOM nodes,
/// a canvas, a test log); the navigator only tells them when geometry must
/// be rebuilt, when it must be re-projected, and which flags to show.
pub trait Renderer {
    /// Rebuild the map. `atlas` is `None` until the world data has loaded, in
    /// which case only the sphere and graticule can be drawn.
    fn draw_map(&mut self, atlas: Option<&WorldAtlas>, projection: &Projection);

    /// Re-project every drawn path with the current projection.
    fn redraw(&mut self, projection: &Projection);

    /// Show exactly the flags in `highlights`, clearing all others.
    fn apply_highlights(&mut self, highlights: &Highlights);

    /// Whether the element with this id has been drawn yet.
    fn has_element(&self, id: &str) -> bool;

    /// A drag started. `point` is the grabbed location, `None` when the
    /// press landed off the globe.
    fn grab_started(&mut self, point: Option<LonLat>, projection: &Projection);

    /// The drag ended; remove whatever `grab_started` showed.
    fn grab_ended(&mut self);
}
