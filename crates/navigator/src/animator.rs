//! `gotoView`: delayed, eased flights of the projection toward a focus point.

use foundation::math::{GreatCircle, LonLat, Rotation};
use foundation::time::Time;
use runtime::{TransitionId, TransitionSlot, TransitionTiming};

use crate::projection::Projection;

#[derive(Debug, Clone)]
struct Flight {
    target: LonLat,
    tween: Option<Tween>,
}

/// Per-flight interpolators, built from the projection when the flight
/// starts rather than when it is requested.
#[derive(Debug, Clone, Copy)]
struct Tween {
    rotation: GreatCircle,
    scale_from: f64,
    scale_to: f64,
}

/// Result of advancing the animator by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTick {
    /// Nothing in flight, or still inside the delay.
    Idle,
    /// The projection moved and dependent paths need a redraw.
    Moved,
    /// Last frame of a flight; the projection may or may not have moved.
    Finished { moved: bool },
}

impl AnimationTick {
    pub fn moved(self) -> bool {
        matches!(self, AnimationTick::Moved | AnimationTick::Finished { moved: true })
    }
}

#[derive(Debug)]
pub struct ViewAnimator {
    slot: TransitionSlot<Flight>,
    timing: TransitionTiming,
    fit_scale: f64,
}

impl ViewAnimator {
    pub fn new(timing: TransitionTiming, fit_scale: f64) -> Self {
        Self {
            slot: TransitionSlot::new(),
            timing,
            fit_scale,
        }
    }

    /// Fly toward `target`, superseding any flight already scheduled.
    pub fn goto_view(&mut self, now: Time, target: LonLat) -> TransitionId {
        let (id, interrupted) = self.slot.schedule(
            now,
            self.timing,
            Flight {
                target,
                tween: None,
            },
        );
        if let Some(previous) = interrupted {
            tracing::debug!(
                from = ?previous.target,
                to = ?target,
                "view transition superseded"
            );
        }
        id
    }

    /// Drop the flight in flight (a pointer press grabs the globe).
    pub fn interrupt(&mut self) -> bool {
        self.slot.interrupt().is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.slot.is_active()
    }

    /// Target of the flight currently scheduled, if any.
    pub fn target(&self) -> Option<LonLat> {
        self.slot.current().map(|t| t.state.target)
    }

    pub fn current_id(&self) -> Option<TransitionId> {
        self.slot.current().map(|t| t.id)
    }

    pub fn tick(&mut self, now: Time, projection: &mut Projection) -> AnimationTick {
        let fit_scale = self.fit_scale;
        let out = self.slot.advance(now, |flight, step| {
            if step.started {
                let source = projection.rotation().yaw_pitch();
                flight.tween = GreatCircle::non_degenerate(source, flight.target).map(|rotation| Tween {
                    rotation,
                    scale_from: projection.scale(),
                    scale_to: fit_scale,
                });
                if flight.tween.is_none() {
                    tracing::debug!(target = ?flight.target, "already at view target");
                }
            }
            let moved = match flight.tween {
                Some(tween) => {
                    let t = step.eased;
                    projection.set_rotation(Rotation::from_lon_lat(tween.rotation.interpolate(t)));
                    projection.set_scale(tween.scale_from + (tween.scale_to - tween.scale_from) * t);
                    true
                }
                None => false,
            };
            (moved, step.finished)
        });
        match out {
            None => AnimationTick::Idle,
            Some((moved, true)) => AnimationTick::Finished { moved },
            Some((true, false)) => AnimationTick::Moved,
            Some((false, false)) => AnimationTick::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnimationTick, ViewAnimator};
    use crate::projection::Projection;
    use foundation::math::{LonLat, Rotation, Vec2};
    use foundation::time::Time;
    use runtime::TransitionTiming;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{a} != {b} (eps {eps})");
    }

    fn setup(rotation: [f64; 2]) -> (ViewAnimator, Projection) {
        (
            ViewAnimator::new(TransitionTiming::new(500.0, 2000.0), 190.0),
            Projection::new(Rotation::from(rotation), 190.0, Vec2::new(200.0, 200.0), 90.0),
        )
    }

    #[test]
    fn flies_to_target_after_delay() {
        let (mut anim, mut proj) = setup([-40.0, -30.0]);
        anim.goto_view(Time(0.0), LonLat::new(-77.0, -60.0));

        assert_eq!(anim.tick(Time(100.0), &mut proj), AnimationTick::Idle);
        assert_eq!(proj.rotation(), Rotation::new(-40.0, -30.0, 0.0));

        assert_eq!(anim.tick(Time(500.0), &mut proj), AnimationTick::Moved);
        assert_close(proj.rotation().lambda, -40.0, 1e-9);

        assert_eq!(anim.tick(Time(1500.0), &mut proj), AnimationTick::Moved);
        let mid = proj.rotation();
        assert!(mid.lambda < -40.0 && mid.phi < -30.0);

        assert_eq!(
            anim.tick(Time(2500.0), &mut proj),
            AnimationTick::Finished { moved: true }
        );
        assert_close(proj.rotation().lambda, -77.0, 1e-9);
        assert_close(proj.rotation().phi, -60.0, 1e-9);
        assert!(!anim.is_animating());
    }

    #[test]
    fn scale_returns_to_fit() {
        let (mut anim, mut proj) = setup([0.0, 0.0]);
        proj.set_scale(760.0);
        anim.goto_view(Time(0.0), LonLat::new(10.0, 0.0));
        anim.tick(Time(500.0), &mut proj);
        assert_close(proj.scale(), 760.0, 1e-9);
        anim.tick(Time(2500.0), &mut proj);
        assert_close(proj.scale(), 190.0, 1e-9);
    }

    #[test]
    fn same_target_changes_nothing() {
        let (mut anim, mut proj) = setup([-40.0, -30.0]);
        proj.set_scale(400.0);
        let before = proj;
        anim.goto_view(Time(0.0), LonLat::new(-40.0, -30.0));
        for t in [500.0, 900.0, 1700.0] {
            assert_eq!(anim.tick(Time(t), &mut proj), AnimationTick::Idle);
        }
        assert_eq!(
            anim.tick(Time(2500.0), &mut proj),
            AnimationTick::Finished { moved: false }
        );
        assert_eq!(proj, before);
    }

    #[test]
    fn last_caller_wins() {
        let (mut anim, mut proj) = setup([0.0, 0.0]);
        let first = anim.goto_view(Time(0.0), LonLat::new(50.0, 10.0));
        anim.tick(Time(600.0), &mut proj);
        let second = anim.goto_view(Time(700.0), LonLat::new(-20.0, -30.0));
        assert_ne!(first, second);
        assert_eq!(anim.current_id(), Some(second));

        anim.tick(Time(3200.0), &mut proj);
        assert_close(proj.rotation().lambda, -20.0, 1e-9);
        assert_close(proj.rotation().phi, -30.0, 1e-9);
        assert_eq!(anim.tick(Time(9000.0), &mut proj), AnimationTick::Idle);
    }

    #[test]
    fn tween_starts_from_rotation_at_start_time() {
        let (mut anim, mut proj) = setup([0.0, 0.0]);
        anim.goto_view(Time(0.0), LonLat::new(30.0, 0.0));
        // Moved by a drag during the delay.
        proj.set_rotation(Rotation::new(10.0, 0.0, 0.0));
        anim.tick(Time(500.0), &mut proj);
        assert_close(proj.rotation().lambda, 10.0, 1e-9);
    }

    #[test]
    fn interrupt_stops_flight() {
        let (mut anim, mut proj) = setup([0.0, 0.0]);
        anim.goto_view(Time(0.0), LonLat::new(30.0, 0.0));
        assert!(anim.interrupt());
        assert!(!anim.interrupt());
        assert_eq!(anim.tick(Time(1000.0), &mut proj), AnimationTick::Idle);
        assert_eq!(proj.rotation(), Rotation::new(0.0, 0.0, 0.0));
    }
}
