/// Host timestamp in milliseconds, as delivered by animation-frame and timer
/// callbacks.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64);

impl Time {
    pub fn from_secs(s: f64) -> Self {
        Time(s * 1000.0)
    }

    pub fn millis(self) -> f64 {
        self.0
    }

    pub fn after(self, ms: f64) -> Self {
        Time(self.0 + ms)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeSpan {
    pub start: Time,
    pub end: Time,
}

impl TimeSpan {
    pub fn new(start: Time, duration_ms: f64) -> Self {
        Self {
            start,
            end: start.after(duration_ms.max(0.0)),
        }
    }

    pub fn instant(t: Time) -> Self {
        Self { start: t, end: t }
    }

    pub fn duration(&self) -> f64 {
        (self.end.0 - self.start.0).max(0.0)
    }

    pub fn contains(&self, t: Time) -> bool {
        t >= self.start && t <= self.end
    }

    /// Normalized position of `t` in the span, clamped to `[0, 1]`.
    /// A zero-length span is complete as soon as it starts.
    pub fn progress(&self, t: Time) -> f64 {
        let d = self.duration();
        if d <= 0.0 {
            return if t >= self.start { 1.0 } else { 0.0 };
        }
        ((t.0 - self.start.0) / d).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Time, TimeSpan};

    #[test]
    fn progress_is_clamped() {
        let span = TimeSpan::new(Time(500.0), 2000.0);
        assert_eq!(span.progress(Time(0.0)), 0.0);
        assert_eq!(span.progress(Time(1500.0)), 0.5);
        assert_eq!(span.progress(Time(9000.0)), 1.0);
        assert!(span.contains(Time(2500.0)));
    }

    #[test]
    fn zero_length_span_completes_at_start() {
        let span = TimeSpan::instant(Time(10.0));
        assert_eq!(span.progress(Time(9.0)), 0.0);
        assert_eq!(span.progress(Time(10.0)), 1.0);
    }
}
