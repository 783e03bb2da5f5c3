//! Spherical Web-Mercator (EPSG:3857) pixel projection.
//!
//! Pixel coordinates are absolute "world pixels" at a given zoom level: the
//! whole world spans `TILE_SIZE * 2^zoom` pixels on both axes, origin at the
//! north-west corner.

use super::{LatLng, LatLngBounds, Vec2};

pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the square Mercator world.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

pub fn world_size_px(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

pub fn project_px(at: LatLng, zoom: f64) -> Vec2 {
    let size = world_size_px(zoom);
    let lat = at.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = (at.lon + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) * 0.5 * size;
    Vec2::new(x, y)
}

pub fn unproject_px(p: Vec2, zoom: f64) -> LatLng {
    let size = world_size_px(zoom);
    let lon = p.x / size * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * p.y / size);
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, lon)
}

/// Ground resolution at `lat` (meters per pixel).
pub fn meters_per_pixel(lat: f64, zoom: f64) -> f64 {
    let circumference = 2.0 * std::f64::consts::PI * super::WGS84_A;
    circumference * lat.to_radians().cos() / world_size_px(zoom)
}

/// Largest whole zoom at which `bounds` fits in a `size_px` screen with
/// `padding_px` kept free on every side, capped at `max_zoom`.
pub fn fit_bounds_zoom(bounds: LatLngBounds, size_px: Vec2, padding_px: f64, max_zoom: f64) -> f64 {
    let sw = project_px(bounds.south_west, 0.0);
    let ne = project_px(bounds.north_east, 0.0);
    let span = Vec2::new((ne.x - sw.x).abs(), (sw.y - ne.y).abs());
    let room = Vec2::new(size_px.x - 2.0 * padding_px, size_px.y - 2.0 * padding_px);
    if room.x <= 0.0 || room.y <= 0.0 {
        return 0.0;
    }

    let scale_x = if span.x > 0.0 { room.x / span.x } else { f64::INFINITY };
    let scale_y = if span.y > 0.0 { room.y / span.y } else { f64::INFINITY };
    let scale = scale_x.min(scale_y);
    if !scale.is_finite() {
        return max_zoom;
    }
    scale.log2().floor().clamp(0.0, max_zoom)
}

/// Center of `bounds` in pixel space, which is what a fitted view shows.
pub fn bounds_center(bounds: LatLngBounds) -> LatLng {
    let sw = project_px(bounds.south_west, 0.0);
    let ne = project_px(bounds.north_east, 0.0);
    unproject_px(sw.lerp(ne, 0.5), 0.0)
}
