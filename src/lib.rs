//! Tiledrop - merge-puzzle core logic
//!
//! Circular tiles are dropped into a bounded container, settle under an
//! external rigid-body simulation, and two resting tiles of the same level
//! fuse into one tile of the next level. The session ends when a settled
//! tile stays above the danger line for a sustained interval.
//!
//! Core modules:
//! - `catalog`: Static tile table and weighted spawn selection
//! - `difficulty`: Named configuration bundles (cooldown, gravity, level caps)
//! - `physics`: Narrow interface to the external physics engine
//! - `bounds`: Container geometry and danger-line placement
//! - `sim`: Session state, merge resolution, danger-line tracking, frame step
//! - `scores`: Best-score table keyed by difficulty
//!
//! The crate never integrates bodies itself; it reacts to (and corrects) the
//! collision batches an engine reports each step. Rendering, input capture,
//! and storage are host collaborators.

pub mod bounds;
pub mod catalog;
pub mod difficulty;
pub mod physics;
pub mod scores;
pub mod sim;

pub use bounds::{ArenaBounds, DangerLineMode};
pub use catalog::TileKind;
pub use difficulty::DifficultyProfile;
pub use physics::{BodyId, ContactBody, ContactPair, PhysicsEngine, TileMaterial};
pub use scores::BestScores;
pub use sim::{GameEvent, Session, request_drop, step};

/// Game tuning constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Spawn height for dropped tiles (just below the container top edge)
    pub const SPAWN_Y: f32 = 10.0;

    /// Visual inset of the walls from the container edges
    pub const EDGE_INSET: f32 = 2.0;

    /// Danger line position shared by the built-in difficulties (px from top)
    pub const DANGER_LINE_PX: f32 = 100.0;
    /// Jitter absorption when comparing a tile top against the danger line
    pub const DANGER_EPS: f32 = 0.5;
    /// Continuous settled time above the line required to end the session
    pub const SETTLE_REQUIRED_MS: f64 = 100.0;
    /// A contact only counts as support when the other body's center is lower
    /// by at least this much (excludes side and upward contacts)
    pub const SUPPORT_EPS: f32 = 2.0;

    /// Score bonus when two ceiling-level tiles annihilate
    pub const TERMINAL_FUSION_BONUS: u32 = 100;

    /// Overlap relaxation passes after a promotion
    pub const RELAX_ITERATIONS: usize = 3;
    /// Extra separation targeted beyond touching radii
    pub const RELAX_SLACK: f32 = 0.5;
    /// Share of the correction applied to the pre-existing tile
    pub const RELAX_PUSH_EXISTING: f32 = 0.60;
    /// Share of the correction applied to the freshly merged tile
    pub const RELAX_PUSH_NEW: f32 = 0.40;
    /// Wake radius around a promotion = new tile radius + this pad
    pub const PROMOTION_WAKE_PAD: f32 = 160.0;
    /// Wake radius around a terminal fusion
    pub const TERMINAL_WAKE_RADIUS: f32 = 180.0;
    /// Minimum downward speed given to woken neighbors so they don't float
    /// after a fusion removes their support
    pub const MIN_WAKE_FALL_SPEED: f32 = 0.15;

    /// Rolling damping: spin decay factor per step
    pub const ROLL_DAMP_FACTOR: f32 = 0.995;
    /// Rolling damping only applies below this linear speed
    pub const ROLL_DAMP_MAX_SPEED: f32 = 1.0;
    /// ...and above this angular speed
    pub const ROLL_DAMP_MIN_SPIN: f32 = 0.1;

    /// Display/physics radius scale applied to catalog entries
    pub const RADIUS_SCALE: f32 = 1.00;
    /// Catalog radius sanity bounds
    pub const MIN_TILE_RADIUS: f32 = 10.0;
    pub const MAX_TILE_RADIUS: f32 = 200.0;
}
