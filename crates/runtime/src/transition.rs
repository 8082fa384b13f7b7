//! Delayed, eased transitions with host-style interruption.
//!
//! A [`TransitionSlot`] holds at most one transition. Scheduling a new one
//! interrupts whatever was there, so the most recent caller always wins
//! without any cancellation bookkeeping on the caller's side.

use foundation::time::{Time, TimeSpan};

use crate::easing::Easing;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransitionTiming {
    pub delay_ms: f64,
    pub duration_ms: f64,
    pub easing: Easing,
}

impl TransitionTiming {
    pub fn new(delay_ms: f64, duration_ms: f64) -> Self {
        Self {
            delay_ms,
            duration_ms,
            easing: Easing::default(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// What a transition did on one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TransitionStep {
    /// True on the first frame past the delay; tweens are set up here.
    pub started: bool,
    /// Eased progress in `[0, 1]`.
    pub eased: f64,
    /// True on the frame that reaches the end.
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct Transition<T> {
    pub id: TransitionId,
    active: TimeSpan,
    easing: Easing,
    started: bool,
    pub state: T,
}

impl<T> Transition<T> {
    pub fn new(id: TransitionId, now: Time, timing: TransitionTiming, state: T) -> Self {
        let start = now.after(timing.delay_ms.max(0.0));
        Self {
            id,
            active: TimeSpan::new(start, timing.duration_ms),
            easing: timing.easing,
            started: false,
            state,
        }
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Advance to `now`. Returns `None` while still inside the delay.
    pub fn step(&mut self, now: Time) -> Option<TransitionStep> {
        if now < self.active.start {
            return None;
        }
        let started = !self.started;
        self.started = true;
        let t = self.active.progress(now);
        Some(TransitionStep {
            started,
            eased: self.easing.apply(t),
            finished: t >= 1.0,
        })
    }
}

/// Single-occupancy transition holder.
#[derive(Debug)]
pub struct TransitionSlot<T> {
    next_id: u64,
    current: Option<Transition<T>>,
}

impl<T> Default for TransitionSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TransitionSlot<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            current: None,
        }
    }

    /// Schedule a transition, interrupting any in flight.
    ///
    /// Returns the new id and the interrupted transition's state, if any.
    pub fn schedule(
        &mut self,
        now: Time,
        timing: TransitionTiming,
        state: T,
    ) -> (TransitionId, Option<T>) {
        let id = TransitionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let interrupted = self.current.take().map(|t| t.state);
        self.current = Some(Transition::new(id, now, timing, state));
        (id, interrupted)
    }

    /// Kill the transition in flight, returning its state.
    pub fn interrupt(&mut self) -> Option<T> {
        self.current.take().map(|t| t.state)
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&Transition<T>> {
        self.current.as_ref()
    }

    /// Step the current transition and hand its state to `f`.
    ///
    /// The slot is emptied once the transition finishes.
    pub fn advance<R>(
        &mut self,
        now: Time,
        f: impl FnOnce(&mut T, TransitionStep) -> R,
    ) -> Option<R> {
        let transition = self.current.as_mut()?;
        let step = transition.step(now)?;
        let out = f(&mut transition.state, step);
        if step.finished {
            self.current = None;
        }
        Some(out)
    }
}
