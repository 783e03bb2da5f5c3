//! Playback tuning.
//!
//! Thresholds are in meters (great-circle), durations in milliseconds, zoom
//! levels in slippy-map units. The defaults were tuned for a city-scale tour,
//! so every value can be overridden from a JSON file or the environment.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TourError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourConfig {
    /// How long playback holds at each waypoint.
    pub dwell_ms: f64,
    /// Below this distance a move is a plain flight with no trajectory line.
    pub near_threshold_m: f64,
    /// Above this distance the map zooms out before drawing the line.
    pub long_distance_threshold_m: f64,
    /// Manual drag distance that pauses playback.
    pub manual_move_threshold_m: f64,
    pub playback_zoom: f64,
    pub long_distance_zoom_out: f64,
    pub line_speed_px_per_s: f64,
    /// Extra time past an animation's nominal duration before it is
    /// force-cancelled.
    pub safety_grace_ms: f64,
    pub first_flight_ms: f64,
    pub zoom_out_flight_ms: f64,
    pub zoom_back_flight_ms: f64,
    pub seek_flight_ms: f64,
    pub seek_zoom: f64,
    /// A seek skips its flight when already this close in and near the target.
    pub seek_min_zoom: f64,
    pub key_cooldown_ms: f64,
    pub overview_flight_ms: f64,
    pub marker_epsilon_deg: f64,
    /// A playback move closer than this is already there: no flight at all.
    pub arrival_epsilon_m: f64,
    /// Opening a popup below this zoom flies in to it.
    pub popup_zoom: f64,
    pub popup_flight_ms: f64,
    pub global_view_max_zoom: f64,
    /// Screen margin kept around the fitted waypoint bounds.
    pub global_view_padding_px: f64,
    pub global_view_flight_ms: f64,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            dwell_ms: 4000.0,
            near_threshold_m: 50.0,
            long_distance_threshold_m: 6000.0,
            manual_move_threshold_m: 500.0,
            playback_zoom: 17.0,
            long_distance_zoom_out: 13.0,
            line_speed_px_per_s: 1000.0,
            safety_grace_ms: 2000.0,
            first_flight_ms: 1500.0,
            zoom_out_flight_ms: 1500.0,
            zoom_back_flight_ms: 1000.0,
            seek_flight_ms: 1500.0,
            seek_zoom: 17.0,
            seek_min_zoom: 15.0,
            key_cooldown_ms: 1500.0,
            overview_flight_ms: 1500.0,
            marker_epsilon_deg: 1e-6,
            arrival_epsilon_m: 1.0,
            popup_zoom: 18.0,
            popup_flight_ms: 1500.0,
            global_view_max_zoom: 15.0,
            global_view_padding_px: 50.0,
            global_view_flight_ms: 1500.0,
        }
    }
}

impl TourConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TourError> {
        let config: TourConfig =
            serde_json::from_str(json).map_err(|e| TourError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, TourError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Applies `TOUR_*` environment overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Result<Self, TourError> {
        self.dwell_ms = env_var_f64("TOUR_DWELL_MS", self.dwell_ms);
        self.near_threshold_m = env_var_f64("TOUR_NEAR_THRESHOLD_M", self.near_threshold_m);
        self.long_distance_threshold_m =
            env_var_f64("TOUR_LONG_DISTANCE_THRESHOLD_M", self.long_distance_threshold_m);
        self.manual_move_threshold_m =
            env_var_f64("TOUR_MANUAL_MOVE_THRESHOLD_M", self.manual_move_threshold_m);
        self.playback_zoom = env_var_f64("TOUR_PLAYBACK_ZOOM", self.playback_zoom);
        self.long_distance_zoom_out =
            env_var_f64("TOUR_LONG_DISTANCE_ZOOM_OUT", self.long_distance_zoom_out);
        self.line_speed_px_per_s =
            env_var_f64("TOUR_LINE_SPEED_PX_PER_S", self.line_speed_px_per_s);
        self.safety_grace_ms = env_var_f64("TOUR_SAFETY_GRACE_MS", self.safety_grace_ms);
        self.key_cooldown_ms = env_var_f64("TOUR_KEY_COOLDOWN_MS", self.key_cooldown_ms);
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), TourError> {
        let positive = [
            ("line_speed_px_per_s", self.line_speed_px_per_s),
            ("manual_move_threshold_m", self.manual_move_threshold_m),
            ("long_distance_threshold_m", self.long_distance_threshold_m),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TourError::Config(format!("{name} must be > 0 (got {value})")));
            }
        }

        let non_negative = [
            ("dwell_ms", self.dwell_ms),
            ("near_threshold_m", self.near_threshold_m),
            ("safety_grace_ms", self.safety_grace_ms),
            ("first_flight_ms", self.first_flight_ms),
            ("zoom_out_flight_ms", self.zoom_out_flight_ms),
            ("zoom_back_flight_ms", self.zoom_back_flight_ms),
            ("seek_flight_ms", self.seek_flight_ms),
            ("key_cooldown_ms", self.key_cooldown_ms),
            ("overview_flight_ms", self.overview_flight_ms),
            ("marker_epsilon_deg", self.marker_epsilon_deg),
            ("arrival_epsilon_m", self.arrival_epsilon_m),
            ("popup_flight_ms", self.popup_flight_ms),
            ("global_view_padding_px", self.global_view_padding_px),
            ("global_view_flight_ms", self.global_view_flight_ms),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(TourError::Config(format!("{name} must be >= 0 (got {value})")));
            }
        }

        if self.long_distance_zoom_out > self.playback_zoom {
            return Err(TourError::Config(format!(
                "long_distance_zoom_out ({}) must not exceed playback_zoom ({})",
                self.long_distance_zoom_out, self.playback_zoom
            )));
        }
        if self.near_threshold_m >= self.long_distance_threshold_m {
            return Err(TourError::Config(format!(
                "near_threshold_m ({}) must be below long_distance_threshold_m ({})",
                self.near_threshold_m, self.long_distance_threshold_m
            )));
        }
        Ok(())
    }
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}
