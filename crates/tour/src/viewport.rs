use foundation::ids::{FlightId, MarkerId, PolylineId};
use foundation::math::{LatLng, Vec2};

/// Control surface of the map widget the tour drives.
///
/// Passed into the controller at construction; the core never looks a map
/// up by itself.
pub trait Viewport {
    fn center(&self) -> LatLng;
    fn zoom(&self) -> f64;
    fn min_zoom(&self) -> f64;
    /// Visible map area in pixels.
    fn size(&self) -> Vec2;

    /// Starts an eased flight. Completion is reported later as a
    /// [`ViewportEvent::MoveEnd`].
    fn fly_to(&mut self, center: LatLng, zoom: f64, duration_ms: f64) -> FlightId;

    /// Recenters immediately, without the widget's own easing.
    fn pan_to(&mut self, center: LatLng);

    /// Projects to pixel space at the current zoom.
    fn project(&self, at: LatLng) -> Vec2;
    fn unproject(&self, point: Vec2) -> LatLng;

    /// Draws the dashed trajectory polyline.
    fn draw_polyline(&mut self, points: &[LatLng]) -> PolylineId;
    fn update_polyline(&mut self, line: PolylineId, points: &[LatLng]);
    fn remove_polyline(&mut self, line: PolylineId);

    fn find_marker_at(&self, lat: f64, lon: f64) -> Option<MarkerId>;
    fn marker_location(&self, marker: MarkerId) -> Option<LatLng>;
    fn open_popup(&mut self, marker: MarkerId);
}

/// Events the widget reports, on the same event loop as everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    ZoomStart,
    MoveStart,
    Move,
    /// `flight` names the eased flight this move-end terminates, if any.
    /// Plain recenters and user gestures report `None`.
    MoveEnd { flight: Option<FlightId> },
    PopupOpen(MarkerId),
}
