/// Session time in milliseconds.
///
/// The runtime never reads a wall clock itself; hosts feed timestamps in
/// (frame callbacks, timer ticks) so playback stays replayable.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Time(pub f64); // milliseconds

impl Time {
    pub const ZERO: Time = Time(0.0);

    pub fn from_ms(ms: f64) -> Self {
        Time(ms)
    }

    pub fn as_ms(self) -> f64 {
        self.0
    }

    pub fn after_ms(self, ms: f64) -> Self {
        Time(self.0 + ms)
    }

    /// Milliseconds since `earlier`, clamped at zero.
    pub fn since(self, earlier: Time) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Time;

    #[test]
    fn since_never_goes_negative() {
        assert_eq!(Time(10.0).since(Time(4.0)), 6.0);
        assert_eq!(Time(4.0).since(Time(10.0)), 0.0);
    }

    #[test]
    fn after_ms_offsets() {
        assert_eq!(Time::ZERO.after_ms(1500.0), Time(1500.0));
    }
}
