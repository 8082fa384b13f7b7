use gloo_net::http::Request;
use std::cell::RefCell;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use formats::WorldAtlas;
use foundation::math::Vec2;
use foundation::time::Time;
use navigator::{Navigator, NavigatorConfig, NavigatorEvent, ZoomEvent};

mod console;
mod svg;

use svg::SvgRenderer;

// Guard to prevent double-initialization of global state (relevant during hot reload).
static INITIALIZED: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK_SET: OnceLock<()> = OnceLock::new();

/// Element the globe's `<svg>` is appended to.
const MAP_CONTAINER_ID: &str = "iglobe";

/// Topology document with the countries, cities and trips objects.
const WORLD_URL: &str = "/assets/world.json";

struct WebState {
    navigator: Navigator<SvgRenderer>,
    world_requested: bool,
}

impl WebState {
    fn new(config: NavigatorConfig) -> Self {
        let renderer = SvgRenderer::new(MAP_CONTAINER_ID, config.viewport);
        Self {
            navigator: Navigator::new(config, renderer, now()),
            world_requested: false,
        }
    }
}

thread_local! {
    static STATE: RefCell<Option<WebState>> = const { RefCell::new(None) };
}

/// Safe TLS access helper that returns a default on teardown instead of panicking.
/// The navigator is created with the default config on first use.
fn with_state<F, R>(f: F) -> R
where
    F: FnOnce(&mut WebState) -> R,
    R: Default,
{
    STATE
        .try_with(|cell| {
            let Ok(mut slot) = cell.try_borrow_mut() else {
                tracing::warn!("re-entrant navigator access ignored");
                return R::default();
            };
            let state = slot.get_or_insert_with(|| WebState::new(NavigatorConfig::default()));
            f(state)
        })
        .unwrap_or_default()
}

fn init_panic_hook() {
    PANIC_HOOK_SET.get_or_init(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = info.to_string();
            web_sys::console::error_1(&JsValue::from_str(&msg));
        }));
    });
}

/// Monotonic host clock in milliseconds. Commands and `tick` must share it.
fn now() -> Time {
    let ms = web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now);
    Time(ms)
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Avoid double-initialization (can happen during hot-reload edge cases).
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    init_panic_hook();
    console::init_logging(tracing::Level::INFO);
    Ok(())
}

/// Replace the navigator with one built from a JSON config. Any view state
/// and loaded data are dropped.
#[wasm_bindgen]
pub fn configure(config_json: &str) -> Result<(), JsValue> {
    let config =
        NavigatorConfig::from_json_str(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    STATE
        .try_with(|cell| {
            *cell.borrow_mut() = Some(WebState::new(config));
        })
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Start-up view. `mode`: 1 world, 2 country, 3 location, 4 trip.
#[wasm_bindgen]
pub fn init_map(mode: i32, id: String, coords: Vec<f64>) {
    let time = now();
    with_state(|s| {
        s.navigator.init_map(mode, &id, &coords, time);
    });
    ensure_world_loaded();
}

#[wasm_bindgen]
pub fn draw_map() {
    let time = now();
    with_state(|s| {
        s.navigator.draw_map(time);
    });
    ensure_world_loaded();
}

#[wasm_bindgen]
pub fn view_all() {
    let time = now();
    with_state(|s| s.navigator.view_all(time));
}

#[wasm_bindgen]
pub fn view_country(country_id: String) {
    let time = now();
    with_state(|s| s.navigator.view_country(&country_id, time));
}

#[wasm_bindgen]
pub fn view_location(id: String, coords: Vec<f64>) {
    let time = now();
    with_state(|s| s.navigator.view_location(&id, &coords, time));
}

#[wasm_bindgen]
pub fn show_location(id: String, coords: Vec<f64>) {
    let time = now();
    with_state(|s| s.navigator.show_location(&id, &coords, time));
}

#[wasm_bindgen]
pub fn view_trip(name: String) {
    let time = now();
    with_state(|s| s.navigator.view_trip(&name, time));
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Pointer pressed on the globe, in view-box coordinates.
#[wasm_bindgen]
pub fn pointer_down(x: f64, y: f64) {
    with_state(|s| s.navigator.pointer_down(Vec2::new(x, y)));
}

#[wasm_bindgen]
pub fn pointer_move(x: f64, y: f64) {
    with_state(|s| s.navigator.pointer_move(Vec2::new(x, y)));
}

#[wasm_bindgen]
pub fn pointer_up() {
    with_state(|s| s.navigator.pointer_up());
}

/// Wheel zoom: positive `delta_y` zooms out.
#[wasm_bindgen]
pub fn wheel(delta_y: f64) {
    with_state(|s| s.navigator.wheel(delta_y));
}

#[wasm_bindgen]
pub fn pinch(factor: f64) {
    with_state(|s| s.navigator.pinch(factor));
}

#[wasm_bindgen]
pub fn double_click() {
    let time = now();
    with_state(|s| s.navigator.double_click(time));
}

/// Scroll handler. Returns true when the page is near its bottom, in which
/// case the host forwards `nearBottom`.
#[wasm_bindgen]
pub fn on_scroll() -> Result<bool, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let inner_height = window.inner_height()?.as_f64().unwrap_or(0.0);
    let page_y_offset = window.page_y_offset()?;
    let body_height = svg::document()?
        .body()
        .map(|b| f64::from(b.offset_height()))
        .unwrap_or(0.0);
    Ok(with_state(|s| {
        s.navigator.scroll(inner_height, page_y_offset, body_height)
    }))
}

// ---------------------------------------------------------------------------
// Frame loop
// ---------------------------------------------------------------------------

/// Advance flights and element waits. Call once per animation frame.
/// Returns true while there is still work pending.
#[wasm_bindgen]
pub fn tick() -> bool {
    let time = now();
    with_state(|s| {
        let summary = s.navigator.tick(time);
        s.navigator.is_animating() || summary.polls_pending > 0
    })
}

/// Events since the last call, as strings for the host.
#[wasm_bindgen]
pub fn take_events() -> js_sys::Array {
    let events = with_state(|s| s.navigator.drain_events());
    events
        .into_iter()
        .map(|e| JsValue::from_str(event_name(e)))
        .collect()
}

fn event_name(event: NavigatorEvent) -> &'static str {
    match event {
        NavigatorEvent::Zoom(ZoomEvent::ZoomStart) => "zoomstart",
        NavigatorEvent::Zoom(ZoomEvent::Zoom) => "zoom",
        NavigatorEvent::Zoom(ZoomEvent::ZoomEnd) => "zoomend",
        NavigatorEvent::NearBottom => "nearBottom",
    }
}

// ---------------------------------------------------------------------------
// World data
// ---------------------------------------------------------------------------

async fn fetch_world(url: &str) -> Result<WorldAtlas, JsValue> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let text = resp
        .text()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    WorldAtlas::from_topojson_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Fetch the world document once; the map is redrawn when it arrives.
fn ensure_world_loaded() {
    let needs_load = with_state(|s| {
        let needs = !s.world_requested && s.navigator.atlas().is_none();
        s.world_requested = true;
        needs
    });
    if !needs_load {
        return;
    }

    spawn_local(async move {
        match fetch_world(WORLD_URL).await {
            Ok(atlas) => with_state(|s| s.navigator.set_atlas(atlas)),
            Err(err) => {
                tracing::error!(error = ?err, url = WORLD_URL, "failed to load world data");
                // Allow a later draw to retry.
                with_state(|s| s.world_requested = false);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::event_name;
    use navigator::{NavigatorEvent, ZoomEvent};

    #[test]
    fn event_names_match_host_listeners() {
        assert_eq!(event_name(NavigatorEvent::Zoom(ZoomEvent::ZoomStart)), "zoomstart");
        assert_eq!(event_name(NavigatorEvent::Zoom(ZoomEvent::Zoom)), "zoom");
        assert_eq!(event_name(NavigatorEvent::Zoom(ZoomEvent::ZoomEnd)), "zoomend");
        assert_eq!(event_name(NavigatorEvent::NearBottom), "nearBottom");
    }
}
