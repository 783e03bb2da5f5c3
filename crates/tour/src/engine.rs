//! Programmatic viewport motion.
//!
//! The engine is the only component that mutates the viewport on its own
//! initiative, so it also owns the "programmatic move" flag the interruption
//! detector consults. Two kinds of operation exist:
//!
//! - flights, eased by the viewport widget and finished by its move-end;
//! - trajectories, driven frame by frame here so the dashed line and the
//!   map center advance together in pixel space.
//!
//! At most one operation is in flight. Every operation resolves its
//! [`Completion`] exactly once: naturally, through [`AnimationEngine::cancel`],
//! or by its safety timeout.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use foundation::ids::{FlightId, PolylineId};
use foundation::math::LatLng;
use foundation::time::Time;
use futures::channel::oneshot;
use runtime::{Frame, FrameHandle, FrameRequests, FrameScheduler, TimerId, TimerQueue};
use tracing::{debug, error, warn};

use crate::viewport::{Viewport, ViewportEvent};

/// Trajectories shorter than this (in pixels) resolve without a frame loop.
const MIN_TRAJECTORY_PX: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOutcome {
    Finished,
    Cancelled,
    TimedOut,
}

/// One-shot completion signal of an engine operation.
///
/// Poll it with [`Completion::try_outcome`] from a state machine, or
/// `.await` it.
#[derive(Debug)]
pub struct Completion {
    rx: Option<oneshot::Receiver<AnimationOutcome>>,
    outcome: Option<AnimationOutcome>,
}

impl Completion {
    fn pending() -> (oneshot::Sender<AnimationOutcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                rx: Some(rx),
                outcome: None,
            },
        )
    }

    fn ready(outcome: AnimationOutcome) -> Self {
        Self {
            rx: None,
            outcome: Some(outcome),
        }
    }

    pub fn try_outcome(&mut self) -> Option<AnimationOutcome> {
        if self.outcome.is_none()
            && let Some(rx) = self.rx.as_mut()
        {
            match rx.try_recv() {
                Ok(Some(outcome)) => self.outcome = Some(outcome),
                Ok(None) => {}
                // Engine dropped with the operation still live.
                Err(oneshot::Canceled) => self.outcome = Some(AnimationOutcome::Cancelled),
            }
        }
        self.outcome
    }

    pub fn is_resolved(&mut self) -> bool {
        self.try_outcome().is_some()
    }
}

impl Future for Completion {
    type Output = AnimationOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(outcome) = this.outcome {
            return Poll::Ready(outcome);
        }
        let Some(rx) = this.rx.as_mut() else {
            return Poll::Ready(AnimationOutcome::Cancelled);
        };
        match Pin::new(rx).poll(cx) {
            Poll::Ready(result) => {
                let outcome = result.unwrap_or(AnimationOutcome::Cancelled);
                this.outcome = Some(outcome);
                Poll::Ready(outcome)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(pub u64);

/// Live state of a line-drawing move.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub start: LatLng,
    pub target: LatLng,
    /// In `[0, 1]`.
    pub progress: f64,
    /// Set by the first delivered frame.
    pub started_at: Option<Time>,
    pub duration_ms: f64,
    pub line: PolylineId,
}

#[derive(Debug)]
enum OpKind {
    Flight(FlightId),
    Trajectory(Trajectory),
}

#[derive(Debug)]
struct ActiveOp {
    id: OpId,
    kind: OpKind,
    resolve: oneshot::Sender<AnimationOutcome>,
    safety_timer: TimerId,
    frame: Option<FrameHandle>,
}

#[derive(Debug)]
pub struct AnimationEngine<S: FrameScheduler = FrameRequests> {
    scheduler: S,
    safety: TimerQueue<OpId>,
    active: Option<ActiveOp>,
    programmatic_move: bool,
    grace_ms: f64,
    next_op: u64,
}

impl AnimationEngine<FrameRequests> {
    pub fn with_frame_requests(grace_ms: f64) -> Self {
        Self::new(FrameRequests::new(), grace_ms)
    }
}

impl<S: FrameScheduler> AnimationEngine<S> {
    pub fn new(scheduler: S, grace_ms: f64) -> Self {
        Self {
            scheduler,
            safety: TimerQueue::new(),
            active: None,
            programmatic_move: false,
            grace_ms,
            next_op: 0,
        }
    }

    /// True while a self-initiated viewport mutation is underway.
    pub fn is_programmatic_move(&self) -> bool {
        self.programmatic_move
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    pub fn trajectory(&self) -> Option<&Trajectory> {
        match self.active.as_ref().map(|op| &op.kind) {
            Some(OpKind::Trajectory(traj)) => Some(traj),
            _ => None,
        }
    }

    pub fn active_flight(&self) -> Option<FlightId> {
        match self.active.as_ref().map(|op| &op.kind) {
            Some(OpKind::Flight(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Earliest pending safety deadline.
    pub fn next_deadline(&self) -> Option<Time> {
        self.safety.next_deadline()
    }

    /// Eased flight performed by the widget.
    pub fn fly_to<V: Viewport>(
        &mut self,
        viewport: &mut V,
        now: Time,
        center: LatLng,
        zoom: f64,
        duration_ms: f64,
    ) -> Completion {
        self.cancel(viewport);

        let (resolve, completion) = Completion::pending();
        // Raised before the widget can emit its first event for this flight.
        self.programmatic_move = true;
        let flight = viewport.fly_to(center, zoom, duration_ms);

        let id = self.next_op_id();
        let safety_timer = self
            .safety
            .schedule(now.after_ms(duration_ms + self.grace_ms), id);
        debug!(
            op = id.0,
            zoom, duration_ms, "flight to ({:.6}, {:.6})", center.lat, center.lon
        );
        self.active = Some(ActiveOp {
            id,
            kind: OpKind::Flight(flight),
            resolve,
            safety_timer,
            frame: None,
        });
        completion
    }

    /// Pans from `from` to `to` at `px_per_s` while growing a dashed line
    /// behind the moving center.
    pub fn animate_trajectory<V: Viewport>(
        &mut self,
        viewport: &mut V,
        now: Time,
        from: LatLng,
        to: LatLng,
        px_per_s: f64,
    ) -> Completion {
        self.cancel(viewport);

        let pixel_distance = viewport.project(from).distance_to(viewport.project(to));
        if !pixel_distance.is_finite() {
            error!("viewport projection unavailable; trajectory not started");
            return Completion::ready(AnimationOutcome::Cancelled);
        }
        if pixel_distance < MIN_TRAJECTORY_PX {
            debug!("trajectory endpoints coincide; nothing to animate");
            return Completion::ready(AnimationOutcome::Finished);
        }

        let duration_ms = pixel_distance / px_per_s * 1000.0;
        let line = viewport.draw_polyline(&[from, from]);
        let (resolve, completion) = Completion::pending();
        self.programmatic_move = true;
        let frame = self.scheduler.schedule_frame();

        let id = self.next_op_id();
        let safety_timer = self
            .safety
            .schedule(now.after_ms(duration_ms + self.grace_ms), id);
        debug!(
            op = id.0,
            pixel_distance, duration_ms, "trajectory started"
        );
        self.active = Some(ActiveOp {
            id,
            kind: OpKind::Trajectory(Trajectory {
                start: from,
                target: to,
                progress: 0.0,
                started_at: None,
                duration_ms,
                line,
            }),
            resolve,
            safety_timer,
            frame: Some(frame),
        });
        completion
    }

    /// Advances the trajectory loop. Frames nobody asked for are ignored.
    pub fn on_frame<V: Viewport>(&mut self, viewport: &mut V, frame: Frame) {
        let Some(op) = self.active.as_mut() else {
            return;
        };
        let Some(handle) = op.frame.take() else {
            return;
        };
        let OpKind::Trajectory(traj) = &mut op.kind else {
            return;
        };

        let started = *traj.started_at.get_or_insert(frame.time);
        let progress = if traj.duration_ms > 0.0 {
            (frame.time.since(started) / traj.duration_ms).min(1.0)
        } else {
            1.0
        };
        traj.progress = progress;
        let (start, target, line) = (traj.start, traj.target, traj.line);
        self.scheduler.frame_delivered(handle);

        // Re-project every frame: pixel space shifts under zoom changes.
        let start_px = viewport.project(start);
        let target_px = viewport.project(target);
        let point = viewport.unproject(start_px.lerp(target_px, progress));
        if !(start_px.is_finite() && target_px.is_finite() && point.is_finite()) {
            error!(
                frame = frame.index,
                "trajectory coordinates unavailable; cancelling animation"
            );
            self.cancel(viewport);
            return;
        }

        viewport.pan_to(point);
        viewport.update_polyline(line, &[start, point]);

        if progress < 1.0 {
            let next = self.scheduler.schedule_frame();
            if let Some(op) = self.active.as_mut() {
                op.frame = Some(next);
            }
        } else {
            debug!(frame = frame.index, "trajectory finished");
            self.end_active(viewport, AnimationOutcome::Finished);
        }
    }

    /// Finishes the active flight when the widget reports its move-end.
    pub fn on_viewport_event<V: Viewport>(&mut self, viewport: &mut V, event: &ViewportEvent) {
        let ViewportEvent::MoveEnd {
            flight: Some(ended),
        } = *event
        else {
            return;
        };
        if self.active_flight() == Some(ended) {
            debug!(flight = ended.0, "flight finished");
            self.end_active(viewport, AnimationOutcome::Finished);
        }
    }

    /// Force-stops operations whose safety window has elapsed.
    pub fn poll_timeouts<V: Viewport>(&mut self, viewport: &mut V, now: Time) {
        while let Some((_, op_id)) = self.safety.pop_due(now) {
            if self.active.as_ref().is_some_and(|op| op.id == op_id) {
                warn!(
                    op = op_id.0,
                    "animation did not finish within its safety window; forcing stop"
                );
                self.end_active(viewport, AnimationOutcome::TimedOut);
            }
        }
    }

    /// Stops whatever is in flight: frame loop halted, line removed, flag
    /// cleared, completion resolved. Safe to call at any time.
    ///
    /// Returns `true` if an operation was running.
    pub fn cancel<V: Viewport>(&mut self, viewport: &mut V) -> bool {
        let ended = self.end_active(viewport, AnimationOutcome::Cancelled);
        if ended {
            debug!("animation cancelled");
        }
        ended
    }

    fn end_active<V: Viewport>(&mut self, viewport: &mut V, outcome: AnimationOutcome) -> bool {
        self.programmatic_move = false;
        let Some(op) = self.active.take() else {
            return false;
        };
        if let Some(handle) = op.frame {
            self.scheduler.cancel_frame(handle);
        }
        self.safety.cancel(op.safety_timer);
        if let OpKind::Trajectory(traj) = &op.kind {
            viewport.remove_polyline(traj.line);
        }
        // The waiting side may have been dropped; nothing to deliver then.
        let _ = op.resolve.send(outcome);
        true
    }

    fn next_op_id(&mut self) -> OpId {
        let id = OpId(self.next_op);
        self.next_op = self.next_op.wrapping_add(1);
        id
    }
}
