//! Manual-interference detection.
//!
//! The widget reports the same events for its own flights and for user
//! gestures. Anything seen while the engine's programmatic-move flag is down
//! counts as manual; a zoom pauses at once, a pan only once it has carried
//! the center past a distance threshold, so rendering jitter never does.

use foundation::math::LatLng;
use runtime::FrameScheduler;
use tracing::debug;

use crate::engine::AnimationEngine;
use crate::viewport::ViewportEvent;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interruption {
    /// Pause playback.
    ManualZoom,
    /// Pause playback and force-stop any running animation.
    ManualPan { distance_m: f64 },
}

#[derive(Debug, Clone)]
pub struct InterruptionDetector {
    threshold_m: f64,
    baseline: Option<LatLng>,
}

impl InterruptionDetector {
    pub fn new(threshold_m: f64) -> Self {
        Self {
            threshold_m,
            baseline: None,
        }
    }

    pub fn baseline(&self) -> Option<LatLng> {
        self.baseline
    }

    /// Classifies one event. `center` is the viewport center at the time the
    /// event is handled.
    pub fn observe<S: FrameScheduler>(
        &mut self,
        event: &ViewportEvent,
        center: LatLng,
        playing: bool,
        engine: &AnimationEngine<S>,
    ) -> Option<Interruption> {
        let manual = playing && !engine.is_programmatic_move();
        match event {
            ViewportEvent::ZoomStart if manual => Some(Interruption::ManualZoom),
            ViewportEvent::MoveStart if manual => {
                self.baseline = Some(center);
                None
            }
            ViewportEvent::Move if manual => {
                let baseline = self.baseline?;
                let distance_m = baseline.distance_to(center);
                if distance_m > self.threshold_m {
                    self.baseline = None;
                    return Some(Interruption::ManualPan { distance_m });
                }
                None
            }
            ViewportEvent::MoveEnd { .. } => {
                if self.baseline.take().is_some() {
                    debug!("manual move ended below threshold");
                }
                None
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.baseline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{Interruption, InterruptionDetector};
    use crate::engine::AnimationEngine;
    use crate::sim::SimViewport;
    use crate::viewport::ViewportEvent;
    use foundation::math::LatLng;
    use foundation::time::Time;

    const ORIGIN: LatLng = LatLng {
        lat: 28.19,
        lon: 112.97,
    };

    /// Point roughly `meters` north of `ORIGIN`.
    fn north(meters: f64) -> LatLng {
        LatLng::new(ORIGIN.lat + meters / 111_195.0, ORIGIN.lon)
    }

    #[test]
    fn manual_zoom_pauses() {
        let engine = AnimationEngine::with_frame_requests(2000.0);
        let mut d = InterruptionDetector::new(500.0);
        let got = d.observe(&ViewportEvent::ZoomStart, ORIGIN, true, &engine);
        assert_eq!(got, Some(Interruption::ManualZoom));
    }

    #[test]
    fn nothing_fires_while_stopped() {
        let engine = AnimationEngine::with_frame_requests(2000.0);
        let mut d = InterruptionDetector::new(500.0);
        assert_eq!(d.observe(&ViewportEvent::ZoomStart, ORIGIN, false, &engine), None);
        assert_eq!(d.observe(&ViewportEvent::MoveStart, ORIGIN, false, &engine), None);
        assert_eq!(d.baseline(), None);
    }

    #[test]
    fn programmatic_moves_are_ignored() {
        let mut viewport = SimViewport::new(ORIGIN, 17.0);
        let mut engine = AnimationEngine::with_frame_requests(2000.0);
        let _flight = engine.fly_to(&mut viewport, Time::ZERO, north(5000.0), 17.0, 1000.0);
        assert!(engine.is_programmatic_move());

        let mut d = InterruptionDetector::new(500.0);
        assert_eq!(d.observe(&ViewportEvent::ZoomStart, ORIGIN, true, &engine), None);
        assert_eq!(d.observe(&ViewportEvent::MoveStart, ORIGIN, true, &engine), None);
        assert_eq!(d.observe(&ViewportEvent::Move, north(5000.0), true, &engine), None);
    }

    #[test]
    fn pan_under_threshold_never_pauses() {
        let engine = AnimationEngine::with_frame_requests(2000.0);
        let mut d = InterruptionDetector::new(500.0);
        d.observe(&ViewportEvent::MoveStart, ORIGIN, true, &engine);
        for step in 1..=40 {
            let got = d.observe(&ViewportEvent::Move, north(step as f64 * 12.0), true, &engine);
            assert_eq!(got, None, "step {step}");
        }
        d.observe(&ViewportEvent::MoveEnd { flight: None }, north(480.0), true, &engine);
        assert_eq!(d.baseline(), None);
    }

    #[test]
    fn pan_over_threshold_pauses_exactly_once() {
        let engine = AnimationEngine::with_frame_requests(2000.0);
        let mut d = InterruptionDetector::new(500.0);
        d.observe(&ViewportEvent::MoveStart, ORIGIN, true, &engine);

        let mut fired = 0;
        for step in 1..=30 {
            let got = d.observe(&ViewportEvent::Move, north(step as f64 * 100.0), true, &engine);
            if let Some(Interruption::ManualPan { distance_m }) = got {
                assert!(distance_m > 500.0);
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn move_without_baseline_is_ignored() {
        let engine = AnimationEngine::with_frame_requests(2000.0);
        let mut d = InterruptionDetector::new(500.0);
        assert_eq!(d.observe(&ViewportEvent::Move, north(9000.0), true, &engine), None);
    }
}
