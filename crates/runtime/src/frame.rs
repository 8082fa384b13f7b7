use foundation::time::Time;

/// Metadata for one host animation frame.
///
/// Frames are numbered from 0 and stamped with the host clock, so a run can
/// be replayed by feeding the same timestamps back in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Host timestamp for this frame.
    pub time: Time,
    /// Milliseconds since the previous frame (0 for the first).
    pub dt_ms: f64,
}

impl Frame {
    pub fn first(time: Time) -> Self {
        Self {
            index: 0,
            time,
            dt_ms: 0.0,
        }
    }

    pub fn next(self, time: Time) -> Self {
        Self {
            index: self.index + 1,
            time,
            dt_ms: (time.0 - self.time.0).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Time;

    #[test]
    fn frame_stamps_are_deterministic() {
        let a = Frame::first(Time(16.0)).next(Time(32.5));
        let b = Frame::first(Time(16.0)).next(Time(32.5));
        assert_eq!(a, b);
        assert_eq!(a.index, 1);
        assert_eq!(a.dt_ms, 16.5);
    }

    #[test]
    fn clock_going_backwards_clamps_dt() {
        let f = Frame::first(Time(100.0)).next(Time(90.0));
        assert_eq!(f.dt_ms, 0.0);
        assert_eq!(f.time, Time(90.0));
    }
}
