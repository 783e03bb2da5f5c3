use foundation::time::Time;

/// Frame metadata delivered by the host's redraw callback.
///
/// Unlike a fixed-step simulation, redraw callbacks arrive with whatever
/// timestamp the host reports, so `time` is carried explicitly rather than
/// derived from the index.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Host timestamp at the start of the frame.
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, time: Time) -> Self {
        Self { index, time }
    }

    pub fn first(time: Time) -> Self {
        Self::new(0, time)
    }

    /// The following frame, `dt_ms` later.
    pub fn next(self, dt_ms: f64) -> Self {
        Self::new(self.index + 1, self.time.after_ms(dt_ms))
    }
}
