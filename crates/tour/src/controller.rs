//! Playback state machine.
//!
//! The controller owns the cursor, the dwell timer and the move stages of
//! the current waypoint. It never blocks: the host feeds it frames, viewport
//! events and clock ticks, and every entry point leaves the machine in a
//! settled state before returning. Entry points take the host's current
//! time; the clock never moves backwards. Commands posted through
//! [`PlaybackController::post`] are applied in order on the next tick.

use foundation::math::{LatLng, LatLngBounds, bounds_center, fit_bounds_zoom};
use foundation::ids::MarkerId;
use foundation::time::Time;
use runtime::{EventBus, Frame, FrameRequests, FrameScheduler, TimerId, TimerQueue};
use tracing::{debug, info, warn};

use crate::config::TourConfig;
use crate::engine::{AnimationEngine, AnimationOutcome, Completion};
use crate::error::TourError;
use crate::interruption::{Interruption, InterruptionDetector};
use crate::keyboard::{KeyCommand, KeyCooldowns, KeyOutcome};
use crate::sequencer::WaypointSequencer;
use crate::timeline::{self, TimelineSurface};
use crate::viewport::{Viewport, ViewportEvent};
use crate::waypoint::Waypoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    /// Stopped with the cursor kept.
    Paused,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    PlayFromYear(String),
    MarkerClicked { lat: f64, lon: f64 },
    GlobalView,
}

/// How a playback move reaches its waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan {
    /// One eased flight, no line.
    Direct,
    /// Dashed line then a flight back to playback zoom, optionally preceded
    /// by a zoom-out for context.
    Trajectory { zoom_out_first: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStage {
    Direct,
    ZoomOut,
    Trajectory,
    ZoomBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    User,
    ManualZoom,
    ManualPan,
    Reset,
    Seek,
    Overview,
    GlobalView,
}

/// What the controller did, in order. Hosts drain these for display and
/// tests assert on them.
#[derive(Debug, Clone, PartialEq)]
pub enum TourEvent {
    Started { index: usize },
    WaypointEntered { index: usize, year: Option<String> },
    StageStarted { index: usize, stage: MoveStage },
    Arrived { index: usize, popup: bool },
    Paused { reason: PauseReason },
    Reset,
    Seeked { index: usize, flew: bool },
    Finished,
    HelpToggled { visible: bool },
    Overview,
    GlobalView { zoom: f64 },
}

/// Chooses the move for a waypoint `distance_m` away from the current center.
/// The first waypoint of the sequence is always reached directly.
pub fn plan_move(first_waypoint: bool, distance_m: f64, config: &TourConfig) -> MovePlan {
    if first_waypoint || distance_m < config.near_threshold_m {
        MovePlan::Direct
    } else {
        MovePlan::Trajectory {
            zoom_out_first: distance_m > config.long_distance_threshold_m,
        }
    }
}

#[derive(Debug)]
enum Stage {
    Idle,
    Moving {
        stage: MoveStage,
        target: LatLng,
        completion: Completion,
    },
    Dwelling {
        timer: TimerId,
    },
}

#[derive(Debug)]
struct PendingSeek {
    index: usize,
    completion: Completion,
}

pub struct PlaybackController<V: Viewport, T: TimelineSurface, S: FrameScheduler = FrameRequests> {
    config: TourConfig,
    sequencer: WaypointSequencer,
    viewport: V,
    timeline: T,
    engine: AnimationEngine<S>,
    detector: InterruptionDetector,
    keys: KeyCooldowns,
    commands: EventBus<Command>,
    events: EventBus<TourEvent>,
    dwell: TimerQueue<usize>,
    state: PlaybackState,
    cursor: usize,
    stage: Stage,
    seek: Option<PendingSeek>,
    help_visible: bool,
    now: Time,
}

impl<V: Viewport, T: TimelineSurface> PlaybackController<V, T, FrameRequests> {
    pub fn new(
        config: TourConfig,
        sequencer: WaypointSequencer,
        viewport: V,
        timeline: T,
    ) -> Result<Self, TourError> {
        Self::with_scheduler(config, sequencer, viewport, timeline, FrameRequests::new())
    }
}

impl<V: Viewport, T: TimelineSurface, S: FrameScheduler> PlaybackController<V, T, S> {
    pub fn with_scheduler(
        config: TourConfig,
        sequencer: WaypointSequencer,
        viewport: V,
        timeline: T,
        scheduler: S,
    ) -> Result<Self, TourError> {
        config.validate()?;
        if sequencer.is_empty() {
            warn!("no waypoints loaded; playback is disabled");
        }
        Ok(Self {
            engine: AnimationEngine::new(scheduler, config.safety_grace_ms),
            detector: InterruptionDetector::new(config.manual_move_threshold_m),
            keys: KeyCooldowns::new(config.key_cooldown_ms),
            config,
            sequencer,
            viewport,
            timeline,
            commands: EventBus::new(),
            events: EventBus::new(),
            dwell: TimerQueue::new(),
            state: PlaybackState::Idle,
            cursor: 0,
            stage: Stage::Idle,
            seek: None,
            help_visible: false,
            now: Time::ZERO,
        })
    }

    // ---- queries ------------------------------------------------------

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// `None` once the sequence has been played through.
    pub fn current_waypoint(&self) -> Option<&Waypoint> {
        self.sequencer.get(self.cursor)
    }

    /// Stage of the move in progress, if any.
    pub fn move_stage(&self) -> Option<MoveStage> {
        match &self.stage {
            Stage::Moving { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn is_dwelling(&self) -> bool {
        matches!(self.stage, Stage::Dwelling { .. })
    }

    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    pub fn sequencer(&self) -> &WaypointSequencer {
        &self.sequencer
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn timeline(&self) -> &T {
        &self.timeline
    }

    pub fn engine(&self) -> &AnimationEngine<S> {
        &self.engine
    }

    pub fn help_visible(&self) -> bool {
        self.help_visible
    }

    pub fn now(&self) -> Time {
        self.now
    }

    /// Earliest time at which [`tick`](Self::tick) has timer work to do.
    pub fn next_deadline(&self) -> Option<Time> {
        match (self.dwell.next_deadline(), self.engine.next_deadline()) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        }
    }

    pub fn drain_events(&mut self) -> Vec<TourEvent> {
        self.events.drain().into_iter().map(|q| q.event).collect()
    }

    // ---- commands -----------------------------------------------------

    /// Queues a command for the next [`tick`](Self::tick).
    pub fn post(&mut self, command: Command) {
        self.commands.emit(command);
    }

    pub fn start(&mut self, now: Time) {
        self.advance_clock(now);
        if self.is_playing() {
            return;
        }
        if self.sequencer.is_empty() {
            warn!("start ignored: no waypoints");
            return;
        }
        if self.cursor >= self.sequencer.len() {
            self.cursor = 0;
            timeline::clear(&mut self.timeline);
        }
        self.seek = None;
        self.state = PlaybackState::Playing;
        info!(cursor = self.cursor, "playback started");
        self.events.emit(TourEvent::Started { index: self.cursor });
        self.begin_step();
        self.pump();
    }

    /// Idempotent.
    pub fn pause(&mut self, now: Time) {
        self.advance_clock(now);
        self.pause_with(PauseReason::User);
    }

    pub fn reset(&mut self, now: Time) {
        self.advance_clock(now);
        self.pause_with(PauseReason::Reset);
        self.engine.cancel(&mut self.viewport);
        self.seek = None;
        self.stage = Stage::Idle;
        self.dwell.clear();
        self.detector.reset();
        self.cursor = 0;
        self.state = PlaybackState::Idle;
        timeline::clear(&mut self.timeline);
        info!("playback reset");
        self.events.emit(TourEvent::Reset);
    }

    /// Jumps to the first waypoint of `year` and leaves playback paused.
    pub fn play_from_year(&mut self, year: &str, now: Time) {
        self.advance_clock(now);
        self.pause_with(PauseReason::Seek);
        match self.sequencer.index_of_year(year) {
            Some(index) => self.seek_to(index),
            None => warn!(year, "no waypoint for year"),
        }
    }

    /// Same as [`play_from_year`](Self::play_from_year) for the waypoint
    /// under a clicked marker.
    pub fn handle_marker_clicked(&mut self, lat: f64, lon: f64, now: Time) {
        self.advance_clock(now);
        self.pause_with(PauseReason::Seek);
        match self
            .sequencer
            .index_of_location(lat, lon, self.config.marker_epsilon_deg)
        {
            Some(index) => self.seek_to(index),
            None => warn!(lat, lon, "clicked marker is not a waypoint"),
        }
    }

    /// Pauses and fits every waypoint on screen.
    pub fn global_view(&mut self, now: Time) {
        self.advance_clock(now);
        self.pause_with(PauseReason::GlobalView);
        self.seek = None;
        let Some(bounds) = LatLngBounds::from_points(self.sequencer.iter().map(|wp| wp.location))
        else {
            warn!("global view ignored: no waypoints");
            return;
        };
        let zoom = fit_bounds_zoom(
            bounds,
            self.viewport.size(),
            self.config.global_view_padding_px,
            self.config.global_view_max_zoom,
        );
        let center = bounds_center(bounds);
        // Nobody waits on the global view flight either.
        let _ = self.engine.fly_to(
            &mut self.viewport,
            self.now,
            center,
            zoom,
            self.config.global_view_flight_ms,
        );
        info!(zoom, "showing all waypoints");
        self.events.emit(TourEvent::GlobalView { zoom });
    }

    pub fn handle_key(&mut self, key: char, text_input_focused: bool, now: Time) -> KeyOutcome {
        self.advance_clock(now);
        let outcome = self.keys.press(key, self.now, text_input_focused);
        match outcome {
            KeyOutcome::Accepted(KeyCommand::CancelPlayback) => {
                if self.is_playing() {
                    info!("playback cancelled from keyboard");
                    self.reset(self.now);
                }
            }
            KeyOutcome::Accepted(KeyCommand::ToggleHelp) => {
                self.help_visible = !self.help_visible;
                self.events.emit(TourEvent::HelpToggled {
                    visible: self.help_visible,
                });
            }
            KeyOutcome::Accepted(KeyCommand::Overview) => {
                self.pause_with(PauseReason::Overview);
                self.seek = None;
                let center = self.viewport.center();
                let zoom = self.viewport.min_zoom();
                // Nobody waits on the overview flight.
                let _ = self.engine.fly_to(
                    &mut self.viewport,
                    self.now,
                    center,
                    zoom,
                    self.config.overview_flight_ms,
                );
                self.events.emit(TourEvent::Overview);
            }
            KeyOutcome::Suppressed { command, remaining_secs } => {
                debug!(?command, remaining_secs, "key press suppressed by cooldown");
            }
            KeyOutcome::Ignored => {}
        }
        outcome
    }

    // ---- host callbacks -----------------------------------------------

    /// Applies queued commands and fires due timers.
    pub fn tick(&mut self, now: Time) {
        self.advance_clock(now);
        while let Some(queued) = self.commands.pop() {
            self.apply(queued.event);
        }
        self.engine.poll_timeouts(&mut self.viewport, self.now);
        self.pump();
        self.fire_dwell_timers();
        self.pump();
    }

    pub fn on_frame(&mut self, frame: Frame) {
        self.advance_clock(frame.time);
        self.engine.on_frame(&mut self.viewport, frame);
        self.tick(frame.time);
    }

    pub fn on_viewport_event(&mut self, event: ViewportEvent) {
        self.engine.on_viewport_event(&mut self.viewport, &event);
        if let ViewportEvent::PopupOpen(marker) = event {
            self.zoom_to_popup(marker);
        }
        let center = self.viewport.center();
        let playing = self.is_playing();
        match self.detector.observe(&event, center, playing, &self.engine) {
            Some(Interruption::ManualZoom) => {
                info!("manual zoom detected; pausing playback");
                self.pause_with(PauseReason::ManualZoom);
            }
            Some(Interruption::ManualPan { distance_m }) => {
                info!(
                    distance_m,
                    threshold_m = self.config.manual_move_threshold_m,
                    "manual pan detected; pausing playback"
                );
                self.pause_with(PauseReason::ManualPan);
                self.engine.cancel(&mut self.viewport);
            }
            None => {}
        }
        self.pump();
    }

    // ---- internals ----------------------------------------------------

    fn advance_clock(&mut self, now: Time) {
        if now.0 > self.now.0 {
            self.now = now;
        }
    }

    fn apply(&mut self, command: Command) {
        debug!(?command, "applying command");
        let now = self.now;
        match command {
            Command::Start => self.start(now),
            Command::Pause => self.pause(now),
            Command::Reset => self.reset(now),
            Command::PlayFromYear(year) => self.play_from_year(&year, now),
            Command::MarkerClicked { lat, lon } => self.handle_marker_clicked(lat, lon, now),
            Command::GlobalView => self.global_view(now),
        }
    }

    fn pause_with(&mut self, reason: PauseReason) {
        if !self.is_playing() {
            return;
        }
        self.state = PlaybackState::Paused;
        if let Stage::Dwelling { timer } = std::mem::replace(&mut self.stage, Stage::Idle) {
            self.dwell.cancel(timer);
        }
        self.engine.cancel(&mut self.viewport);
        info!(?reason, cursor = self.cursor, "playback paused");
        self.events.emit(TourEvent::Paused { reason });
    }

    fn begin_step(&mut self) {
        if !self.is_playing() {
            return;
        }
        let Some(waypoint) = self.sequencer.get(self.cursor).cloned() else {
            self.finish_sequence();
            return;
        };
        let index = self.cursor;
        self.show_year(waypoint.year.as_deref());
        self.events.emit(TourEvent::WaypointEntered {
            index,
            year: waypoint.year.clone(),
        });

        let distance_m = self.viewport.center().distance_to(waypoint.location);
        if distance_m < self.config.arrival_epsilon_m {
            debug!(index, distance_m, "already at waypoint; no move needed");
            self.engine.cancel(&mut self.viewport);
            self.arrive();
            return;
        }
        let plan = plan_move(index == 0, distance_m, &self.config);
        info!(index, name = %waypoint.name, distance_m, ?plan, "moving to waypoint");

        let first = match plan {
            MovePlan::Direct => MoveStage::Direct,
            MovePlan::Trajectory { zoom_out_first: true } => MoveStage::ZoomOut,
            MovePlan::Trajectory { zoom_out_first: false } => MoveStage::Trajectory,
        };
        self.begin_move(first, waypoint.location);
    }

    fn begin_move(&mut self, stage: MoveStage, target: LatLng) {
        let now = self.now;
        let completion = match stage {
            MoveStage::Direct => self.engine.fly_to(
                &mut self.viewport,
                now,
                target,
                self.config.playback_zoom,
                self.config.first_flight_ms,
            ),
            MoveStage::ZoomOut => {
                let center = self.viewport.center();
                self.engine.fly_to(
                    &mut self.viewport,
                    now,
                    center,
                    self.config.long_distance_zoom_out,
                    self.config.zoom_out_flight_ms,
                )
            }
            MoveStage::Trajectory => {
                let from = self.viewport.center();
                self.engine.animate_trajectory(
                    &mut self.viewport,
                    now,
                    from,
                    target,
                    self.config.line_speed_px_per_s,
                )
            }
            MoveStage::ZoomBack => self.engine.fly_to(
                &mut self.viewport,
                now,
                target,
                self.config.playback_zoom,
                self.config.zoom_back_flight_ms,
            ),
        };
        debug!(index = self.cursor, ?stage, "stage started");
        self.events.emit(TourEvent::StageStarted {
            index: self.cursor,
            stage,
        });
        self.stage = Stage::Moving {
            stage,
            target,
            completion,
        };
    }

    /// Moves resolved stages along. Safe to call at any time.
    fn pump(&mut self) {
        self.advance_stages();
        self.poll_seek();
    }

    fn advance_stages(&mut self) {
        loop {
            let Stage::Moving {
                stage,
                target,
                completion,
            } = &mut self.stage
            else {
                return;
            };
            let Some(outcome) = completion.try_outcome() else {
                return;
            };
            let (stage, target) = (*stage, *target);
            if !self.is_playing() {
                self.stage = Stage::Idle;
                return;
            }
            match outcome {
                AnimationOutcome::TimedOut => {
                    warn!(index = self.cursor, ?stage, "stage timed out; continuing playback")
                }
                AnimationOutcome::Cancelled => {
                    warn!(index = self.cursor, ?stage, "stage cancelled; continuing playback")
                }
                AnimationOutcome::Finished => {}
            }
            match stage {
                MoveStage::ZoomOut => self.begin_move(MoveStage::Trajectory, target),
                MoveStage::Trajectory => self.begin_move(MoveStage::ZoomBack, target),
                MoveStage::Direct | MoveStage::ZoomBack => {
                    self.arrive();
                    return;
                }
            }
        }
    }

    fn arrive(&mut self) {
        let index = self.cursor;
        let popup = self.open_popup_at(index);
        self.events.emit(TourEvent::Arrived { index, popup });
        let timer = self
            .dwell
            .schedule(self.now.after_ms(self.config.dwell_ms), index);
        debug!(index, dwell_ms = self.config.dwell_ms, "dwelling");
        self.stage = Stage::Dwelling { timer };
    }

    fn fire_dwell_timers(&mut self) {
        while let Some((id, index)) = self.dwell.pop_due(self.now) {
            let Stage::Dwelling { timer } = self.stage else {
                continue;
            };
            if timer != id || !self.is_playing() {
                continue;
            }
            self.stage = Stage::Idle;
            match self.sequencer.next_index_after_year_group(index) {
                Some(next) => {
                    self.cursor = next;
                    self.begin_step();
                    self.advance_stages();
                }
                None => self.finish_sequence(),
            }
        }
    }

    fn finish_sequence(&mut self) {
        self.state = PlaybackState::Idle;
        self.stage = Stage::Idle;
        self.cursor = self.sequencer.len();
        info!("all waypoints played");
        self.events.emit(TourEvent::Finished);
    }

    fn seek_to(&mut self, index: usize) {
        let Some(waypoint) = self.sequencer.get(index).cloned() else {
            return;
        };
        self.cursor = index;
        self.state = PlaybackState::Paused;
        self.stage = Stage::Idle;
        self.show_year(waypoint.year.as_deref());

        let distance_m = self.viewport.center().distance_to(waypoint.location);
        let zoom = self.viewport.zoom();
        let flew = distance_m > self.config.near_threshold_m || zoom < self.config.seek_min_zoom;
        if flew {
            let completion = self.engine.fly_to(
                &mut self.viewport,
                self.now,
                waypoint.location,
                self.config.seek_zoom,
                self.config.seek_flight_ms,
            );
            self.seek = Some(PendingSeek { index, completion });
        } else {
            self.seek = None;
            self.engine.cancel(&mut self.viewport);
            debug!(index, distance_m, zoom, "already at waypoint; no flight needed");
        }
        info!(index, name = %waypoint.name, flew, "seeked");
        self.events.emit(TourEvent::Seeked { index, flew });
        if !flew {
            let popup = self.open_popup_at(index);
            self.events.emit(TourEvent::Arrived { index, popup });
        }
    }

    fn poll_seek(&mut self) {
        let Some(seek) = self.seek.as_mut() else {
            return;
        };
        let Some(outcome) = seek.completion.try_outcome() else {
            return;
        };
        let index = seek.index;
        self.seek = None;
        if outcome == AnimationOutcome::Cancelled {
            debug!(index, "seek flight cancelled");
            return;
        }
        let popup = self.open_popup_at(index);
        self.events.emit(TourEvent::Arrived { index, popup });
    }

    fn open_popup_at(&mut self, index: usize) -> bool {
        let Some(location) = self.sequencer.get(index).map(|wp| wp.location) else {
            return false;
        };
        match self.viewport.find_marker_at(location.lat, location.lon) {
            Some(marker) => {
                self.viewport.open_popup(marker);
                true
            }
            None => {
                debug!(index, "no marker at waypoint; popup skipped");
                false
            }
        }
    }

    /// Flies in on a popup opened below popup zoom, unless a move is
    /// already running.
    fn zoom_to_popup(&mut self, marker: MarkerId) {
        if self.engine.is_animating() || self.viewport.zoom() >= self.config.popup_zoom {
            return;
        }
        let Some(location) = self.viewport.marker_location(marker) else {
            return;
        };
        debug!(zoom = self.config.popup_zoom, "zooming in on opened popup");
        let _ = self.engine.fly_to(
            &mut self.viewport,
            self.now,
            location,
            self.config.popup_zoom,
            self.config.popup_flight_ms,
        );
    }

    fn show_year(&mut self, year: Option<&str>) {
        match year {
            Some(year) => timeline::highlight(&mut self.timeline, year),
            None => timeline::clear(&mut self.timeline),
        }
    }
}
