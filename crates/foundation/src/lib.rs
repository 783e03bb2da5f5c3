pub mod ids;
pub mod math;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use ids::*;
pub use math::*;
pub use time::*;
