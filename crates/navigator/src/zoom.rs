//! Drag-to-rotate and wheel/pinch zoom.
//!
//! A drag grabs the geographic point under the pointer and keeps it under
//! the pointer: each move composes the current orientation with the
//! quaternion carrying the grabbed point onto the point now under the
//! cursor. Orientations are only turned back into Euler angles when they are
//! written into the projection, so the accumulated drag never meets gimbal
//! lock.
//!
//! Zoom changes the projection scale directly and does not care whether a
//! drag is in progress.

use foundation::math::{Quat, Vec2, Vec3};

use crate::projection::Projection;

/// Host-facing zoom events, mirroring the start/zoom/end triple of a
/// browser zoom behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomEvent {
    ZoomStart,
    Zoom,
    ZoomEnd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Dragging {
        /// Unit vector of the grabbed point. `None` while the pointer has not
        /// touched the globe yet.
        anchor: Option<Vec3>,
        /// Orientation accumulated so far in this drag.
        orientation: Quat,
    },
}

#[derive(Debug, Clone)]
pub struct ZoomGesture {
    state: GestureState,
    min_scale: f64,
    max_scale: f64,
    wheel_sensitivity: f64,
}

impl ZoomGesture {
    pub fn new(min_scale: f64, max_scale: f64, wheel_sensitivity: f64) -> Self {
        Self {
            state: GestureState::Idle,
            min_scale,
            max_scale,
            wheel_sensitivity,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    /// Idle -> Dragging.
    pub fn pointer_down(&mut self, projection: &Projection, pos: Vec2) -> ZoomEvent {
        let anchor = projection.invert(pos).map(|p| p.to_unit_vector());
        if anchor.is_none() {
            tracing::debug!(x = pos.x, y = pos.y, "pointer down outside the globe");
        }
        self.state = GestureState::Dragging {
            anchor,
            orientation: Quat::from_rotation(projection.rotation()),
        };
        ZoomEvent::ZoomStart
    }

    /// Rotate so the grabbed point follows the pointer.
    ///
    /// Returns `Some(ZoomEvent::Zoom)` when the projection changed. A pointer
    /// off the silhouette, or a move that does not change the point under it,
    /// leaves the rotation alone.
    pub fn pointer_move(&mut self, projection: &mut Projection, pos: Vec2) -> Option<ZoomEvent> {
        let GestureState::Dragging {
            anchor,
            orientation,
        } = &mut self.state
        else {
            return None;
        };
        let current = projection.invert(pos)?.to_unit_vector();
        let Some(grabbed) = *anchor else {
            // First contact with the globe in this drag: grab here.
            *anchor = Some(current);
            return None;
        };
        let delta = Quat::between(grabbed, current)?;
        let next = orientation.mul(delta).normalized();
        let rotation = next.to_rotation();
        if !rotation.is_finite() {
            tracing::warn!(?rotation, "dropping non-finite drag rotation");
            return None;
        }
        *orientation = next;
        projection.set_rotation(rotation);
        Some(ZoomEvent::Zoom)
    }

    /// Dragging -> Idle.
    pub fn pointer_up(&mut self) -> Option<ZoomEvent> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Dragging { .. } => {
                self.state = GestureState::Idle;
                Some(ZoomEvent::ZoomEnd)
            }
        }
    }

    /// Wheel input: positive `delta_y` zooms out.
    ///
    /// Outside a drag each step is its own gesture, reported as
    /// start/zoom/end. Nothing is reported when the scale is already at the
    /// end of its extent.
    pub fn wheel(&mut self, projection: &mut Projection, delta_y: f64) -> Vec<ZoomEvent> {
        if !delta_y.is_finite() {
            return Vec::new();
        }
        self.zoom_by(projection, (-delta_y * self.wheel_sensitivity).exp2())
    }

    /// Pinch input: `factor` is the ratio of current to previous finger spread.
    pub fn pinch(&mut self, projection: &mut Projection, factor: f64) -> Vec<ZoomEvent> {
        if !(factor.is_finite() && factor > 0.0) {
            return Vec::new();
        }
        self.zoom_by(projection, factor)
    }

    fn zoom_by(&mut self, projection: &mut Projection, factor: f64) -> Vec<ZoomEvent> {
        let scale = (projection.scale() * factor).clamp(self.min_scale, self.max_scale);
        if scale == projection.scale() {
            return Vec::new();
        }
        projection.set_scale(scale);
        if self.is_dragging() {
            // Already inside the drag's start/end pair.
            vec![ZoomEvent::Zoom]
        } else {
            vec![ZoomEvent::ZoomStart, ZoomEvent::Zoom, ZoomEvent::ZoomEnd]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GestureState, ZoomEvent, ZoomGesture};
    use crate::projection::Projection;
    use foundation::math::{LonLat, Rotation, Vec2};

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{a} != {b} (eps {eps})");
    }

    fn setup() -> (ZoomGesture, Projection) {
        (
            ZoomGesture::new(133.0, 1900.0, 0.002),
            Projection::new(Rotation::new(-40.0, -30.0, 0.0), 190.0, Vec2::new(200.0, 200.0), 90.0),
        )
    }

    #[test]
    fn grabbed_point_follows_pointer() {
        let (mut gesture, mut proj) = setup();
        let grabbed = LonLat::new(40.0, 30.0);
        assert_eq!(gesture.pointer_down(&proj, Vec2::new(200.0, 200.0)), ZoomEvent::ZoomStart);

        for pos in [
            Vec2::new(220.0, 190.0),
            Vec2::new(250.0, 180.0),
            Vec2::new(280.0, 150.0),
            Vec2::new(150.0, 260.0),
        ] {
            assert_eq!(gesture.pointer_move(&mut proj, pos), Some(ZoomEvent::Zoom));
            let under = proj.invert(pos).unwrap();
            assert_close(under.lon, grabbed.lon, 1e-6);
            assert_close(under.lat, grabbed.lat, 1e-6);
            let screen = proj.project(grabbed).unwrap();
            assert_close(screen.x, pos.x, 1e-6);
            assert_close(screen.y, pos.y, 1e-6);
        }
        assert_eq!(gesture.pointer_up(), Some(ZoomEvent::ZoomEnd));
        assert_eq!(gesture.state(), GestureState::Idle);
    }

    #[test]
    fn move_off_silhouette_leaves_rotation_unchanged() {
        let (mut gesture, mut proj) = setup();
        gesture.pointer_down(&proj, Vec2::new(200.0, 200.0));
        let before = proj.rotation();
        assert_eq!(gesture.pointer_move(&mut proj, Vec2::new(399.0, 5.0)), None);
        assert_eq!(proj.rotation(), before);
    }

    #[test]
    fn press_off_globe_grabs_on_first_contact() {
        let (mut gesture, mut proj) = setup();
        gesture.pointer_down(&proj, Vec2::new(2.0, 2.0));
        let before = proj.rotation();
        assert_eq!(gesture.pointer_move(&mut proj, Vec2::new(200.0, 200.0)), None);
        assert_eq!(proj.rotation(), before);
        assert_eq!(gesture.pointer_move(&mut proj, Vec2::new(230.0, 200.0)), Some(ZoomEvent::Zoom));
        assert_ne!(proj.rotation(), before);
    }

    #[test]
    fn move_without_press_is_ignored() {
        let (mut gesture, mut proj) = setup();
        let before = proj;
        assert_eq!(gesture.pointer_move(&mut proj, Vec2::new(250.0, 250.0)), None);
        assert_eq!(gesture.pointer_up(), None);
        assert_eq!(proj, before);
    }

    #[test]
    fn zero_move_is_noop() {
        let (mut gesture, mut proj) = setup();
        gesture.pointer_down(&proj, Vec2::new(210.0, 210.0));
        let before = proj.rotation();
        assert_eq!(gesture.pointer_move(&mut proj, Vec2::new(210.0, 210.0)), None);
        assert_eq!(proj.rotation(), before);
    }

    #[test]
    fn wheel_zooms_within_extent() {
        let (mut gesture, mut proj) = setup();
        assert_eq!(
            gesture.wheel(&mut proj, -500.0),
            vec![ZoomEvent::ZoomStart, ZoomEvent::Zoom, ZoomEvent::ZoomEnd]
        );
        assert_close(proj.scale(), 380.0, 1e-9);
        gesture.wheel(&mut proj, 500.0);
        assert_close(proj.scale(), 190.0, 1e-9);

        for _ in 0..20 {
            gesture.wheel(&mut proj, -1000.0);
        }
        assert_close(proj.scale(), 1900.0, 1e-9);
        assert!(gesture.wheel(&mut proj, -1000.0).is_empty());

        for _ in 0..20 {
            gesture.wheel(&mut proj, 1000.0);
        }
        assert_close(proj.scale(), 133.0, 1e-9);
    }

    #[test]
    fn wheel_works_mid_drag() {
        let (mut gesture, mut proj) = setup();
        gesture.pointer_down(&proj, Vec2::new(200.0, 200.0));
        assert_eq!(gesture.pinch(&mut proj, 2.0), vec![ZoomEvent::Zoom]);
        assert!(gesture.is_dragging());
        assert_close(proj.scale(), 380.0, 1e-9);
        assert!(gesture.pinch(&mut proj, f64::NAN).is_empty());
    }
}
