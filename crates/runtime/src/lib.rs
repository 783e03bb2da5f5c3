pub mod event_bus;
pub mod frame;
pub mod frames;
pub mod timers;

pub use event_bus::*;
pub use frame::*;
pub use frames::*;
pub use timers::*;
