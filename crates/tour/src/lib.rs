//! Map virtual-tour playback.
//!
//! A tour walks a year-ordered list of waypoints on a slippy map: it flies
//! to each one, draws a dashed line for longer hops, opens the waypoint's
//! popup and dwells before moving on. The host supplies the map widget
//! ([`Viewport`]) and the year strip ([`TimelineSurface`]) and pumps frames,
//! widget events and clock ticks into a [`PlaybackController`].

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod interruption;
pub mod keyboard;
pub mod sequencer;
pub mod sim;
pub mod timeline;
pub mod viewport;
pub mod waypoint;

pub use config::TourConfig;
pub use controller::{
    Command, MovePlan, MoveStage, PauseReason, PlaybackController, PlaybackState, TourEvent,
    plan_move,
};
pub use engine::{AnimationEngine, AnimationOutcome, Completion, Trajectory};
pub use error::TourError;
pub use interruption::{Interruption, InterruptionDetector};
pub use keyboard::{KeyCommand, KeyCooldowns, KeyOutcome};
pub use sequencer::WaypointSequencer;
pub use timeline::TimelineSurface;
pub use viewport::{Viewport, ViewportEvent};
pub use waypoint::{RawWaypoint, Waypoint, load_dataset, parse_dataset};
