//! Fixed-interval readiness polling.
//!
//! Some host resources (elements created after an asynchronous data load)
//! have no "ready" notification. A job registered with [`Scheduler::wait_for`]
//! re-checks its key every `interval_ms` until the check passes or the job is
//! cancelled through its [`PollHandle`]. There is no attempt ceiling: a key
//! that never becomes ready keeps being polled.

use std::cell::Cell;
use std::rc::Rc;

use foundation::time::Time;

/// Cancellation handle for a polling job. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct PollHandle(Rc<Cell<bool>>);

impl PollHandle {
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug)]
struct PollJob<A> {
    key: String,
    interval_ms: f64,
    next_due: Time,
    attempts: u64,
    handle: PollHandle,
    action: A,
}

#[derive(Debug, PartialEq)]
pub struct PollRunSummary<A> {
    /// Actions whose key became ready, in registration order.
    pub ready: Vec<A>,
    /// Readiness checks performed during this run.
    pub attempts: usize,
    /// Jobs still waiting afterwards.
    pub pending: usize,
}

#[derive(Debug)]
pub struct Scheduler<A> {
    next_order: u64,
    jobs: Vec<(u64, PollJob<A>)>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            next_order: 0,
            jobs: Vec::new(),
        }
    }

    /// Poll `key` every `interval_ms`, starting one interval after `now`.
    pub fn wait_for(
        &mut self,
        key: impl Into<String>,
        now: Time,
        interval_ms: f64,
        action: A,
    ) -> PollHandle {
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);
        let interval_ms = interval_ms.max(1.0);
        let handle = PollHandle::default();
        self.jobs.push((
            order,
            PollJob {
                key: key.into(),
                interval_ms,
                next_due: now.after(interval_ms),
                attempts: 0,
                handle: handle.clone(),
                action,
            },
        ));
        handle
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Checks made so far for the oldest job waiting on `key`.
    pub fn attempts(&self, key: &str) -> Option<u64> {
        self.jobs
            .iter()
            .find(|(_, j)| j.key == key)
            .map(|(_, j)| j.attempts)
    }

    /// Drop every job without running its action.
    pub fn cancel_all(&mut self) {
        for (_, job) in &self.jobs {
            job.handle.cancel();
        }
        self.jobs.clear();
    }

    /// Run every check that has come due by `now`.
    ///
    /// A job is checked at most once per run. If it fell several intervals
    /// behind, its next check moves to the first interval boundary after
    /// `now` instead of replaying the missed ones.
    pub fn run_due(&mut self, now: Time, mut is_ready: impl FnMut(&str) -> bool) -> PollRunSummary<A> {
        let mut ready = Vec::new();
        let mut attempts = 0usize;
        let mut kept = Vec::with_capacity(self.jobs.len());

        for (order, mut job) in std::mem::take(&mut self.jobs) {
            if job.handle.is_cancelled() {
                continue;
            }
            let mut done = false;
            if job.next_due <= now {
                job.attempts += 1;
                attempts += 1;
                done = is_ready(&job.key);
                let missed = ((now.0 - job.next_due.0) / job.interval_ms).floor();
                job.next_due = job.next_due.after((missed + 1.0) * job.interval_ms);
            }
            if done {
                tracing::trace!(key = %job.key, attempts = job.attempts, "poll target ready");
                ready.push(job.action);
            } else {
                kept.push((order, job));
            }
        }

        kept.sort_by_key(|(order, _)| *order);
        self.jobs = kept;
        PollRunSummary {
            ready,
            attempts,
            pending: self.jobs.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Scheduler;
    use foundation::time::Time;

    #[test]
    fn missing_target_keeps_polling_at_fixed_interval() {
        let mut sched = Scheduler::new();
        sched.wait_for("XYZ", Time(0.0), 10.0, ());

        for n in 1..=50u64 {
            let summary = sched.run_due(Time(n as f64 * 10.0), |_| false);
            assert!(summary.ready.is_empty());
            assert_eq!(summary.pending, 1);
            assert_eq!(sched.attempts("XYZ"), Some(n));
        }
    }

    #[test]
    fn late_run_checks_once_and_realigns() {
        let mut sched = Scheduler::new();
        sched.wait_for("XYZ", Time(0.0), 10.0, ());
        let summary = sched.run_due(Time(75.0), |_| false);
        assert_eq!(summary.attempts, 1);
        assert_eq!(sched.attempts("XYZ"), Some(1));

        // Next boundary after 75 is 80.
        assert_eq!(sched.run_due(Time(79.0), |_| false).attempts, 0);
        assert_eq!(sched.run_due(Time(80.0), |_| false).attempts, 1);
    }

    #[test]
    fn hour_long_gap_costs_one_check() {
        let mut sched = Scheduler::new();
        sched.wait_for("XYZ", Time(0.0), 10.0, ());
        let mut checks = 0;
        let summary = sched.run_due(Time(3_600_000.0), |_| {
            checks += 1;
            false
        });
        assert_eq!(checks, 1);
        assert_eq!(summary.attempts, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(sched.run_due(Time(3_600_005.0), |_| false).attempts, 0);
        assert_eq!(sched.run_due(Time(3_600_010.0), |_| false).attempts, 1);
    }

    #[test]
    fn nothing_runs_before_first_interval() {
        let mut sched = Scheduler::new();
        sched.wait_for("AUS", Time(100.0), 10.0, 1);
        let summary = sched.run_due(Time(105.0), |_| true);
        assert_eq!(summary.attempts, 0);
        assert!(summary.ready.is_empty());
    }

    #[test]
    fn ready_jobs_fire_in_registration_order() {
        let mut sched = Scheduler::new();
        sched.wait_for("b", Time(0.0), 10.0, "second-registered-b");
        sched.wait_for("a", Time(0.0), 10.0, "a");
        sched.wait_for("never", Time(0.0), 10.0, "never");
        let summary = sched.run_due(Time(10.0), |k| k != "never");
        assert_eq!(summary.ready, vec!["second-registered-b", "a"]);
        assert_eq!(summary.pending, 1);
    }

    #[test]
    fn cancelled_job_is_dropped_silently() {
        let mut sched = Scheduler::new();
        let handle = sched.wait_for("XYZ", Time(0.0), 10.0, ());
        handle.cancel();
        let summary = sched.run_due(Time(100.0), |_| true);
        assert!(summary.ready.is_empty());
        assert_eq!(summary.attempts, 0);
        assert_eq!(sched.job_count(), 0);
    }
}
