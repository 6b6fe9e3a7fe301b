//! Combat event and logging surface
//!
//! - `events`: Bevy events fired at the engine's mutation points
//! - `log`: the tick-stamped combat log with aggregation queries

pub mod events;
pub mod log;
