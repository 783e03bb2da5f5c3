/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// Mean Earth radius used for great-circle distances (meters).
///
/// Matches the spherical earth model slippy-map widgets use for
/// `distanceTo`, so thresholds tuned against them carry over unchanged.
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_000.0;

/// Geographic coordinates in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Great-circle (haversine) distance in meters.
    pub fn distance_to(self, other: LatLng) -> f64 {
        haversine_m(self, other)
    }

    /// Coordinate equality within `eps_deg` on both axes.
    pub fn approx_eq(self, other: LatLng, eps_deg: f64) -> bool {
        (self.lat - other.lat).abs() < eps_deg && (self.lon - other.lon).abs() < eps_deg
    }
}

/// Axis-aligned geographic box. Does not handle antimeridian wrap.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    /// Smallest box containing every point; `None` for no points.
    pub fn from_points<I: IntoIterator<Item = LatLng>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            south_west: first,
            north_east: first,
        };
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lon = self.south_west.lon.min(p.lon);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lon = self.north_east.lon.max(p.lon);
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lon >= self.south_west.lon
            && p.lon <= self.north_east.lon
    }
}

impl From<[f64; 2]> for LatLng {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

pub fn haversine_m(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.lon - a.lon).to_radians();

    let sin_dlat = (d_lat * 0.5).sin();
    let sin_dlon = (d_lon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_MEAN_RADIUS_M * c
}

/// Linear interpolation on raw degrees. Only meaningful for short hops.
pub fn lerp_lat_lng(a: LatLng, b: LatLng, t: f64) -> LatLng {
    LatLng::new(a.lat + (b.lat - a.lat) * t, a.lon + (b.lon - a.lon) * t)
}
