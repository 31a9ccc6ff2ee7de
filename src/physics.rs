//! Narrow interface to the external rigid-body engine
//!
//! The engine exclusively owns body simulation (integration, contact
//! resolution, sleeping); the session only creates/removes circle bodies,
//! mutates them through this trait, and consumes the collision batch each
//! step returns. Contacts are delivered synchronously as one batch per step
//! so merge processing stays deterministic and testable without a live
//! engine.

use glam::Vec2;

use crate::bounds::ArenaBounds;

/// Opaque handle for a body owned by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

/// One side of a reported contact. Adapters label static geometry so the
/// core never has to track wall handles itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactBody {
    Tile(BodyId),
    Floor,
    Wall,
}

/// A pair of bodies newly in contact this step
#[derive(Debug, Clone, Copy)]
pub struct ContactPair {
    pub a: ContactBody,
    pub b: ContactBody,
}

impl ContactPair {
    pub fn new(a: ContactBody, b: ContactBody) -> Self {
        Self { a, b }
    }
}

/// Material parameters for tile bodies, tuned for slow, stable stacking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub friction_static: f32,
    pub friction_air: f32,
    /// Allowed interpenetration before the solver corrects
    pub slop: f32,
    pub density: f32,
    pub sleep_threshold: f32,
}

impl Default for TileMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.04,
            friction: 0.45,
            friction_static: 0.55,
            friction_air: 0.015,
            slop: 0.002,
            density: 0.0014,
            sleep_threshold: 30.0,
        }
    }
}

/// Everything the merge layer needs from a physics engine.
///
/// Implementations must fully re-synchronize walls inside `set_bounds`
/// before the next `step`, and must report each newly-touching pair at most
/// once per step batch. Read accessors may be called for ids the core has
/// already logically removed within the same batch; returning the last known
/// value is fine.
pub trait PhysicsEngine {
    fn create_tile_body(&mut self, pos: Vec2, radius: f32, material: TileMaterial) -> BodyId;
    fn remove_body(&mut self, id: BodyId);

    fn set_position(&mut self, id: BodyId, pos: Vec2);
    fn set_velocity(&mut self, id: BodyId, vel: Vec2);
    fn set_angular_velocity(&mut self, id: BodyId, omega: f32);
    fn set_sleeping(&mut self, id: BodyId, sleeping: bool);

    fn position(&self, id: BodyId) -> Vec2;
    fn velocity(&self, id: BodyId) -> Vec2;
    fn angular_velocity(&self, id: BodyId) -> f32;
    fn radius(&self, id: BodyId) -> f32;
    fn is_sleeping(&self, id: BodyId) -> bool;

    fn set_gravity(&mut self, scale: f32);
    fn set_bounds(&mut self, bounds: ArenaBounds);

    /// Advance by one fixed timestep and return the collision-start batch
    fn step(&mut self, dt: f32) -> Vec<ContactPair>;
}
