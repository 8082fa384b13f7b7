//! The navigator: view commands from the host in, renderer calls and
//! host events out.
//!
//! All mutable view state lives in one [`NavigatorState`] owned by the
//! [`Navigator`]. Work that cannot happen right away (flights after their
//! delay, views waiting for map elements) is advanced by [`Navigator::tick`],
//! which the host calls once per animation frame.

use formats::WorldAtlas;
use foundation::math::{LonLat, Rotation, Vec2};
use foundation::time::Time;
use runtime::{EventBus, Frame, PollHandle, Scheduler};

use crate::animator::{AnimationTick, ViewAnimator};
use crate::config::NavigatorConfig;
use crate::projection::Projection;
use crate::renderer::Renderer;
use crate::view::{
    Highlights, ViewMode, coords_from_slice, country_focus, is_near_bottom, rotation_target,
    trip_focus,
};
use crate::zoom::{ZoomEvent, ZoomGesture};

/// Signals for the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorEvent {
    Zoom(ZoomEvent),
    /// The page is scrolled close to its end.
    NearBottom,
}

/// Inbound view commands, one per host port.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    InitMap { mode: i32, id: String, coords: Vec<f64> },
    DrawMap,
    ViewAll,
    ViewCountry(String),
    ViewLocation { id: String, coords: Vec<f64> },
    ShowLocation { id: String, coords: Vec<f64> },
    ViewTrip(String),
}

/// Everything that changes while the globe is on screen.
#[derive(Debug, Clone)]
pub struct NavigatorState {
    pub projection: Projection,
    /// `None` until the host has initialised the map.
    pub mode: Option<ViewMode>,
    /// Rotation target of the most recent view; a redraw snaps back to it.
    pub last_focus: LonLat,
    pub highlights: Highlights,
}

impl NavigatorState {
    pub fn new(config: &NavigatorConfig) -> Self {
        Self {
            projection: Projection::from_config(config),
            mode: None,
            last_focus: config.world_target(),
            highlights: Highlights::default(),
        }
    }
}

/// Work parked until a map element exists.
#[derive(Debug, Clone, PartialEq)]
enum Deferred {
    /// Run the full view, flight included.
    Show(ViewMode),
    /// Put the mode's highlight back after a redraw.
    Rehighlight(ViewMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub animation: AnimationTick,
    pub polls_ready: usize,
    pub polls_pending: usize,
}

pub struct Navigator<R: Renderer> {
    config: NavigatorConfig,
    state: NavigatorState,
    atlas: Option<WorldAtlas>,
    animator: ViewAnimator,
    gesture: ZoomGesture,
    polls: Scheduler<Deferred>,
    renderer: R,
    frame: Frame,
    events: EventBus<NavigatorEvent>,
}

impl<R: Renderer> Navigator<R> {
    pub fn new(config: NavigatorConfig, renderer: R, now: Time) -> Self {
        let animator = ViewAnimator::new(config.transition_timing(), config.fit_scale);
        let gesture = ZoomGesture::new(config.min_scale(), config.max_scale(), config.wheel_sensitivity);
        Self {
            state: NavigatorState::new(&config),
            config,
            atlas: None,
            animator,
            gesture,
            polls: Scheduler::new(),
            renderer,
            frame: Frame::first(now),
            events: EventBus::new(),
        }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn state(&self) -> &NavigatorState {
        &self.state
    }

    pub fn projection(&self) -> &Projection {
        &self.state.projection
    }

    pub fn atlas(&self) -> Option<&WorldAtlas> {
        self.atlas.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    /// Where the scheduled flight is headed, if one is scheduled.
    pub fn animator_target(&self) -> Option<LonLat> {
        self.animator.target()
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_dragging()
    }

    pub fn pending_polls(&self) -> usize {
        self.polls.job_count()
    }

    /// Readiness checks made so far for the oldest wait on `id`.
    pub fn poll_attempts(&self, id: &str) -> Option<u64> {
        self.polls.attempts(id)
    }

    /// Stop waiting for any element.
    pub fn cancel_polls(&mut self) {
        self.polls.cancel_all();
    }

    pub fn drain_events(&mut self) -> Vec<NavigatorEvent> {
        self.events.drain().into_iter().map(|e| e.event).collect()
    }

    /// World data finished loading: draw it and restore the highlights.
    pub fn set_atlas(&mut self, atlas: WorldAtlas) {
        tracing::debug!(
            countries = atlas.countries.len(),
            cities = atlas.cities.len(),
            trips = atlas.trips.len(),
            "world data loaded"
        );
        self.atlas = Some(atlas);
        self.draw();
        self.renderer.apply_highlights(&self.state.highlights);
    }

    pub fn dispatch(&mut self, command: Command, now: Time) -> Option<PollHandle> {
        tracing::debug!(?command, "view command");
        match command {
            Command::InitMap { mode, id, coords } => return self.init_map(mode, &id, &coords, now),
            Command::DrawMap => return self.draw_map(now),
            Command::ViewAll => self.view_all(now),
            Command::ViewCountry(id) => self.view_country(&id, now),
            Command::ViewLocation { id, coords } => self.view_location(&id, &coords, now),
            Command::ShowLocation { id, coords } => self.show_location(&id, &coords, now),
            Command::ViewTrip(name) => self.view_trip(&name, now),
        }
        None
    }

    /// First display of the map in the requested mode.
    ///
    /// Non-world modes wait until their element exists before flying there.
    /// Country views wait for a large sentinel country instead of their own,
    /// so small countries drawn late still get highlighted.
    pub fn init_map(&mut self, mode: i32, id: &str, coords: &[f64], now: Time) -> Option<PollHandle> {
        let view = ViewMode::from_init(mode, id, coords);
        self.state.mode = Some(view.clone());
        let wait_on = match &view {
            // Unknown modes fall back to the world view without drawing.
            ViewMode::World => {
                if mode == 1 {
                    self.draw();
                }
                return None;
            }
            ViewMode::Country { .. } => self.config.map_ready_sentinel.clone(),
            ViewMode::Location { id, coords } => {
                if let Some(c) = coords {
                    self.state.last_focus = *c;
                }
                id.clone()
            }
            ViewMode::Trip { name } => name.clone(),
        };
        self.draw();
        Some(self.wait_for(wait_on, now, Deferred::Show(view)))
    }

    /// Redraw in place: snap to the last focus at fit scale, draw, then
    /// restore the active mode's highlight once its element exists.
    pub fn draw_map(&mut self, now: Time) -> Option<PollHandle> {
        let mode = self.state.mode.clone();
        if mode.is_some() {
            self.state
                .projection
                .set_rotation(Rotation::from_lon_lat(self.state.last_focus));
            self.state.projection.set_scale(self.config.fit_scale);
        }
        self.draw();
        let mode = mode?;
        let id = mode.element_id()?.to_string();
        Some(self.wait_for(id, now, Deferred::Rehighlight(mode)))
    }

    pub fn view_all(&mut self, now: Time) {
        let mode = ViewMode::World;
        self.select(&mode);
        self.state.mode = Some(mode);
        self.state.last_focus = self.config.world_target();
        self.animator.goto_view(now, self.state.last_focus);
    }

    pub fn view_country(&mut self, id: &str, now: Time) {
        let mode = ViewMode::Country { id: id.to_string() };
        self.select(&mode);
        self.state.mode = Some(mode);
        let Some(atlas) = self.atlas.as_ref() else {
            tracing::warn!(country = %id, "world data not loaded yet");
            return;
        };
        if let Some(focus) = country_focus(atlas, id, &self.config) {
            self.fly_to(rotation_target(focus), now);
        }
    }

    pub fn view_location(&mut self, id: &str, coords: &[f64], now: Time) {
        self.view_location_at(id, coords_from_slice(coords), now);
    }

    /// Highlight a location and fly to it without leaving the current mode.
    pub fn show_location(&mut self, id: &str, coords: &[f64], now: Time) {
        let mode = ViewMode::Location {
            id: id.to_string(),
            coords: coords_from_slice(coords),
        };
        self.show(&mode, now);
    }

    pub fn view_trip(&mut self, name: &str, now: Time) {
        let mode = ViewMode::Trip {
            name: name.to_string(),
        };
        self.select(&mode);
        self.state.mode = Some(mode);
        let Some(atlas) = self.atlas.as_ref() else {
            tracing::warn!(trip = %name, "world data not loaded yet");
            return;
        };
        if let Some(focus) = trip_focus(atlas, name) {
            self.fly_to(rotation_target(focus), now);
        }
    }

    /// Grab the globe. Any flight in progress stops where it is.
    pub fn pointer_down(&mut self, pos: Vec2) {
        if self.animator.interrupt() {
            tracing::debug!("view transition interrupted by pointer");
        }
        let event = self.gesture.pointer_down(&self.state.projection, pos);
        let grabbed = self.state.projection.invert(pos);
        self.renderer.grab_started(grabbed, &self.state.projection);
        self.emit(NavigatorEvent::Zoom(event));
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        if let Some(event) = self.gesture.pointer_move(&mut self.state.projection, pos) {
            self.renderer.redraw(&self.state.projection);
            self.emit(NavigatorEvent::Zoom(event));
        }
    }

    pub fn pointer_up(&mut self) {
        if let Some(event) = self.gesture.pointer_up() {
            self.renderer.grab_ended();
            self.emit(NavigatorEvent::Zoom(event));
        }
    }

    pub fn wheel(&mut self, delta_y: f64) {
        let events = self.gesture.wheel(&mut self.state.projection, delta_y);
        self.zoomed(events);
    }

    pub fn pinch(&mut self, factor: f64) {
        let events = self.gesture.pinch(&mut self.state.projection, factor);
        self.zoomed(events);
    }

    /// Fly back to the start-up view.
    pub fn double_click(&mut self, now: Time) {
        self.animator.goto_view(now, self.config.double_click_target());
    }

    /// Page scroll position changed. Returns true when near the bottom.
    pub fn scroll(&mut self, inner_height: f64, page_y_offset: f64, body_height: f64) -> bool {
        let near = is_near_bottom(inner_height, page_y_offset, body_height, self.config.near_bottom_px);
        if near {
            self.emit(NavigatorEvent::NearBottom);
        }
        near
    }

    /// Advance flights and element waits to `now`.
    pub fn tick(&mut self, now: Time) -> TickSummary {
        self.frame = self.frame.next(now);

        let animation = self.animator.tick(now, &mut self.state.projection);
        if animation.moved() {
            self.renderer.redraw(&self.state.projection);
        }

        let renderer = &self.renderer;
        let summary = self.polls.run_due(now, |id| renderer.has_element(id));
        let polls_ready = summary.ready.len();
        for action in summary.ready {
            self.run_deferred(action, now);
        }
        TickSummary {
            animation,
            polls_ready,
            polls_pending: self.polls.job_count(),
        }
    }

    fn run_deferred(&mut self, action: Deferred, now: Time) {
        match action {
            Deferred::Show(ViewMode::World) => self.view_all(now),
            Deferred::Show(ViewMode::Country { id }) => self.view_country(&id, now),
            Deferred::Show(ViewMode::Location { id, coords }) => {
                self.view_location_at(&id, coords, now)
            }
            Deferred::Show(ViewMode::Trip { name }) => self.view_trip(&name, now),
            Deferred::Rehighlight(mode) => self.select(&mode),
        }
    }

    fn view_location_at(&mut self, id: &str, coords: Option<LonLat>, now: Time) {
        let mode = ViewMode::Location {
            id: id.to_string(),
            coords,
        };
        self.show(&mode, now);
        if let Some(c) = coords {
            self.state.last_focus = c;
        }
        self.state.mode = Some(mode);
    }

    fn show(&mut self, mode: &ViewMode, now: Time) {
        self.select(mode);
        if let ViewMode::Location {
            coords: Some(c), ..
        } = mode
        {
            self.animator.goto_view(now, *c);
        }
    }

    fn select(&mut self, mode: &ViewMode) {
        self.state.highlights.select(mode);
        self.renderer.apply_highlights(&self.state.highlights);
    }

    fn fly_to(&mut self, target: LonLat, now: Time) {
        self.state.last_focus = target;
        self.animator.goto_view(now, target);
    }

    fn draw(&mut self) {
        self.renderer
            .draw_map(self.atlas.as_ref(), &self.state.projection);
    }

    fn wait_for(&mut self, id: String, now: Time, action: Deferred) -> PollHandle {
        tracing::trace!(element = %id, "waiting for map element");
        self.polls
            .wait_for(id, now, self.config.poll_interval_ms, action)
    }

    fn zoomed(&mut self, events: Vec<ZoomEvent>) {
        if events.is_empty() {
            return;
        }
        self.renderer.redraw(&self.state.projection);
        for event in events {
            self.emit(NavigatorEvent::Zoom(event));
        }
    }

    fn emit(&mut self, event: NavigatorEvent) {
        self.events.emit(self.frame, event);
    }
}
