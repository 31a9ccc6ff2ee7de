//! Merge-and-game-over decision layer
//!
//! Sits on top of the external physics simulation and must stay
//! deterministic:
//! - Fixed timestep, seeded RNG, stable tile iteration order (by body id)
//! - Collision batches are processed in reported order with an idempotent
//!   removal guard, so reordering within a step cannot double-merge
//! - Single-threaded: each frame runs engine step, merge resolution,
//!   relaxation, then the danger-line check, in that order, to completion

pub mod danger;
pub mod merge;
pub mod state;
pub mod tick;

pub use danger::DangerState;
pub use state::{ActiveTile, GameEvent, Session, SessionError};
pub use tick::{request_drop, step};
