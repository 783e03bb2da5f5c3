//! In-process stand-ins for the map widget and the timeline strip.
//!
//! `SimViewport` behaves like a slippy-map widget closely enough for the
//! playback engine: eased flights that finish with a move-end, synchronous
//! recenters, Web-Mercator projection, markers, popups and polylines. Time
//! only moves when the host calls [`SimViewport::advance`].

use std::collections::BTreeMap;

use foundation::ids::{FlightId, IdAllocator, MarkerId, PolylineId};
use foundation::math::{LatLng, Vec2, lerp_lat_lng, project_px, unproject_px};
use foundation::time::Time;
use runtime::{Frame, FrameScheduler};

use crate::controller::PlaybackController;
use crate::sequencer::WaypointSequencer;
use crate::timeline::{ContainerGeometry, EntryGeometry, TimelineSurface};
use crate::viewport::{Viewport, ViewportEvent};

pub const SIM_MAX_ZOOM: f64 = 19.0;
const MARKER_EPSILON_DEG: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightRecord {
    pub id: FlightId,
    pub from: LatLng,
    pub center: LatLng,
    pub from_zoom: f64,
    pub zoom: f64,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, Copy)]
struct SimFlight {
    record: FlightRecord,
    /// Stamped by the first `advance` after the flight was issued.
    started: Option<Time>,
}

#[derive(Debug)]
pub struct SimViewport {
    center: LatLng,
    zoom: f64,
    min_zoom: f64,
    size: Vec2,
    now: Time,
    flight: Option<SimFlight>,
    markers: Vec<(MarkerId, LatLng)>,
    popups: Vec<MarkerId>,
    polylines: BTreeMap<PolylineId, Vec<LatLng>>,
    polylines_drawn: usize,
    flights: Vec<FlightRecord>,
    pans: usize,
    events: Vec<ViewportEvent>,
    ids: IdAllocator,
    stall_flights: bool,
    layout_ready: bool,
}

impl SimViewport {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            min_zoom: 3.0,
            size: Vec2::new(1024.0, 768.0),
            now: Time::ZERO,
            flight: None,
            markers: Vec::new(),
            popups: Vec::new(),
            polylines: BTreeMap::new(),
            polylines_drawn: 0,
            flights: Vec::new(),
            pans: 0,
            events: Vec::new(),
            ids: IdAllocator::new(),
            stall_flights: false,
            layout_ready: true,
        }
    }

    /// One marker per waypoint, as the host map would have.
    pub fn with_markers(center: LatLng, zoom: f64, sequencer: &WaypointSequencer) -> Self {
        let mut viewport = Self::new(center, zoom);
        for wp in sequencer.iter() {
            viewport.add_marker(wp.location);
        }
        viewport
    }

    pub fn add_marker(&mut self, at: LatLng) -> MarkerId {
        let id = self.ids.marker();
        self.markers.push((id, at));
        id
    }

    pub fn set_min_zoom(&mut self, zoom: f64) {
        self.min_zoom = zoom;
    }

    /// Flights still move but never report their move-end.
    pub fn set_stall_flights(&mut self, stall: bool) {
        self.stall_flights = stall;
    }

    /// An unlaid-out widget cannot project.
    pub fn set_layout_ready(&mut self, ready: bool) {
        self.layout_ready = ready;
    }

    pub fn now(&self) -> Time {
        self.now
    }

    /// Steps the running flight to `now`.
    pub fn advance(&mut self, now: Time) {
        if now.0 > self.now.0 {
            self.now = now;
        }
        let now = self.now;
        let Some(flight) = self.flight.as_mut() else {
            return;
        };
        let r = flight.record;
        let started = *flight.started.get_or_insert(now);
        let t = if r.duration_ms > 0.0 {
            (now.since(started) / r.duration_ms).min(1.0)
        } else {
            1.0
        };
        let eased = t * t * (3.0 - 2.0 * t);
        self.center = lerp_lat_lng(r.from, r.center, eased);
        self.zoom = r.from_zoom + (r.zoom - r.from_zoom) * eased;
        self.events.push(ViewportEvent::Move);

        if t >= 1.0 {
            self.center = r.center;
            self.zoom = r.zoom;
            self.flight = None;
            if !self.stall_flights {
                self.events.push(ViewportEvent::MoveEnd {
                    flight: Some(r.id),
                });
            }
        }
    }

    pub fn take_events(&mut self) -> Vec<ViewportEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    pub fn flights(&self) -> &[FlightRecord] {
        &self.flights
    }

    pub fn pan_count(&self) -> usize {
        self.pans
    }

    pub fn polyline_count(&self) -> usize {
        self.polylines.len()
    }

    pub fn polylines_drawn(&self) -> usize {
        self.polylines_drawn
    }

    pub fn polyline(&self, id: PolylineId) -> Option<&[LatLng]> {
        self.polylines.get(&id).map(Vec::as_slice)
    }

    pub fn opened_popups(&self) -> &[MarkerId] {
        &self.popups
    }

    // ---- user gestures -------------------------------------------------

    pub fn begin_drag(&mut self) {
        self.flight = None;
        self.events.push(ViewportEvent::MoveStart);
    }

    /// Moves the view by a pixel delta.
    pub fn drag_by(&mut self, dx_px: f64, dy_px: f64) {
        let p = project_px(self.center, self.zoom);
        self.center = unproject_px(p + Vec2::new(dx_px, dy_px), self.zoom);
        self.events.push(ViewportEvent::Move);
    }

    pub fn end_drag(&mut self) {
        self.events.push(ViewportEvent::MoveEnd { flight: None });
    }

    pub fn scroll_zoom(&mut self, delta: f64) {
        self.flight = None;
        self.events.push(ViewportEvent::ZoomStart);
        self.events.push(ViewportEvent::MoveStart);
        self.zoom = (self.zoom + delta).clamp(self.min_zoom, SIM_MAX_ZOOM);
        self.events.push(ViewportEvent::Move);
        self.events.push(ViewportEvent::MoveEnd { flight: None });
    }
}

impl Viewport for SimViewport {
    fn center(&self) -> LatLng {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn fly_to(&mut self, center: LatLng, zoom: f64, duration_ms: f64) -> FlightId {
        let id = self.ids.flight();
        let zoom = zoom.clamp(self.min_zoom, SIM_MAX_ZOOM);
        let record = FlightRecord {
            id,
            from: self.center,
            center,
            from_zoom: self.zoom,
            zoom,
            duration_ms,
        };
        if zoom != self.zoom {
            self.events.push(ViewportEvent::ZoomStart);
        }
        self.events.push(ViewportEvent::MoveStart);
        self.flights.push(record);
        // A new flight silently replaces the previous one.
        self.flight = Some(SimFlight {
            record,
            started: None,
        });
        id
    }

    fn pan_to(&mut self, center: LatLng) {
        self.flight = None;
        self.center = center;
        self.pans += 1;
        self.events.push(ViewportEvent::MoveStart);
        self.events.push(ViewportEvent::Move);
        self.events.push(ViewportEvent::MoveEnd { flight: None });
    }

    fn project(&self, at: LatLng) -> Vec2 {
        if !self.layout_ready {
            return Vec2::new(f64::NAN, f64::NAN);
        }
        project_px(at, self.zoom)
    }

    fn unproject(&self, point: Vec2) -> LatLng {
        unproject_px(point, self.zoom)
    }

    fn draw_polyline(&mut self, points: &[LatLng]) -> PolylineId {
        let id = self.ids.polyline();
        self.polylines.insert(id, points.to_vec());
        self.polylines_drawn += 1;
        id
    }

    fn update_polyline(&mut self, line: PolylineId, points: &[LatLng]) {
        if let Some(existing) = self.polylines.get_mut(&line) {
            *existing = points.to_vec();
        }
    }

    fn remove_polyline(&mut self, line: PolylineId) {
        self.polylines.remove(&line);
    }

    fn find_marker_at(&self, lat: f64, lon: f64) -> Option<MarkerId> {
        let at = LatLng::new(lat, lon);
        self.markers
            .iter()
            .find(|(_, m)| m.approx_eq(at, MARKER_EPSILON_DEG))
            .map(|(id, _)| *id)
    }

    fn marker_location(&self, marker: MarkerId) -> Option<LatLng> {
        self.markers
            .iter()
            .find(|(m, _)| *m == marker)
            .map(|(_, at)| *at)
    }

    fn open_popup(&mut self, marker: MarkerId) {
        self.popups.push(marker);
        self.events.push(ViewportEvent::PopupOpen(marker));
    }
}

#[derive(Debug, Clone)]
struct StripEntry {
    year: String,
    active: bool,
}

/// Horizontal row of fixed-width year entries.
#[derive(Debug, Clone)]
pub struct TimelineStrip {
    entries: Vec<StripEntry>,
    entry_width: f64,
    gap: f64,
    container_width: f64,
    scroll_left: f64,
    scrolls: Vec<f64>,
}

impl TimelineStrip {
    pub fn new(years: Vec<String>) -> Self {
        Self {
            entries: years
                .into_iter()
                .map(|year| StripEntry {
                    year,
                    active: false,
                })
                .collect(),
            entry_width: 80.0,
            gap: 40.0,
            container_width: 400.0,
            scroll_left: 0.0,
            scrolls: Vec::new(),
        }
    }

    pub fn from_sequencer(sequencer: &WaypointSequencer) -> Self {
        Self::new(sequencer.years())
    }

    pub fn active_years(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.active)
            .map(|e| e.year.clone())
            .collect()
    }

    pub fn scroll_left(&self) -> f64 {
        self.scroll_left
    }

    pub fn scroll_history(&self) -> &[f64] {
        &self.scrolls
    }
}

impl TimelineSurface for TimelineStrip {
    fn years(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.year.clone()).collect()
    }

    fn entry_geometry(&self, year: &str) -> Option<EntryGeometry> {
        let idx = self.entries.iter().position(|e| e.year == year)?;
        // Positions are reported relative to the viewport, like a DOM rect.
        Some(EntryGeometry {
            left: idx as f64 * (self.entry_width + self.gap) - self.scroll_left,
            width: self.entry_width,
        })
    }

    fn container_geometry(&self) -> ContainerGeometry {
        ContainerGeometry {
            left: 0.0,
            width: self.container_width,
            scroll_left: self.scroll_left,
        }
    }

    fn set_active(&mut self, year: &str, active: bool) {
        for entry in self.entries.iter_mut().filter(|e| e.year == year) {
            entry.active = active;
        }
    }

    fn smooth_scroll_to(&mut self, scroll_left: f64) {
        let content = self.entries.len() as f64 * (self.entry_width + self.gap);
        let max = (content - self.container_width).max(0.0);
        self.scroll_left = scroll_left.clamp(0.0, max);
        self.scrolls.push(scroll_left);
    }
}

/// Fixed-step host loop around a controller driving a [`SimViewport`].
#[derive(Debug, Clone, Copy)]
pub struct SimDriver {
    frame: Frame,
    step_ms: f64,
}

impl SimDriver {
    pub fn new(start: Time, step_ms: f64) -> Self {
        Self {
            frame: Frame::first(start),
            step_ms,
        }
    }

    pub fn now(&self) -> Time {
        self.frame.time
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// One host iteration: advance the widget, deliver its events, deliver
    /// the redraw callback, deliver whatever that produced.
    pub fn step<T, S>(&mut self, controller: &mut PlaybackController<SimViewport, T, S>)
    where
        T: TimelineSurface,
        S: FrameScheduler,
    {
        let frame = self.frame;
        controller.viewport_mut().advance(frame.time);
        deliver_events(controller);
        controller.on_frame(frame);
        deliver_events(controller);
        self.frame = frame.next(self.step_ms);
    }

    pub fn run_for<T, S>(
        &mut self,
        controller: &mut PlaybackController<SimViewport, T, S>,
        ms: f64,
    ) where
        T: TimelineSurface,
        S: FrameScheduler,
    {
        let end = self.frame.time.after_ms(ms);
        while self.frame.time.0 < end.0 {
            self.step(controller);
        }
    }

    /// Steps until `done` holds or `max_ms` elapses. Returns whether `done`
    /// was reached.
    pub fn run_until<T, S, F>(
        &mut self,
        controller: &mut PlaybackController<SimViewport, T, S>,
        max_ms: f64,
        mut done: F,
    ) -> bool
    where
        T: TimelineSurface,
        S: FrameScheduler,
        F: FnMut(&PlaybackController<SimViewport, T, S>) -> bool,
    {
        let end = self.frame.time.after_ms(max_ms);
        while self.frame.time.0 < end.0 {
            if done(controller) {
                return true;
            }
            self.step(controller);
        }
        done(controller)
    }
}

pub fn deliver_events<T, S>(controller: &mut PlaybackController<SimViewport, T, S>)
where
    T: TimelineSurface,
    S: FrameScheduler,
{
    let events = controller.viewport_mut().take_events();
    for event in events {
        controller.on_viewport_event(event);
    }
}
