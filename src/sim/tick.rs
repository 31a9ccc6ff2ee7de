//! Frame step and drop scheduling
//!
//! One frame, in strict order: advance the engine by the fixed timestep,
//! resolve the collision batch it queued (merges + relaxation), damp excess
//! rolling, poll the drop cooldown, then evaluate the danger line. The whole
//! sequence completes before the next input event; drop requests arriving
//! while the gate is closed are discarded, never queued.

use glam::Vec2;

use super::{danger, merge};
use super::state::{ActiveTile, Session};
use crate::consts::{
    ROLL_DAMP_FACTOR, ROLL_DAMP_MAX_SPEED, ROLL_DAMP_MIN_SPIN, SIM_DT, SPAWN_Y,
};
use crate::physics::{PhysicsEngine, TileMaterial};

/// User-initiated drop at horizontal position `x` (clamped to the walls).
/// Returns whether the drop was accepted.
pub fn request_drop<E: PhysicsEngine>(
    session: &mut Session,
    engine: &mut E,
    x: f32,
    now_ms: f64,
) -> bool {
    if !session.drop_enabled || session.game_over {
        return false;
    }
    let Some(kind) = session.next_tile else {
        return false;
    };

    let spawn_x = session.bounds.clamp_drop_x(x, kind.radius);
    let body = engine.create_tile_body(
        Vec2::new(spawn_x, SPAWN_Y),
        kind.radius,
        TileMaterial::default(),
    );
    session.tiles.insert(body, ActiveTile::new(kind.level));

    session.drop_enabled = false;
    session.drop_ready_at_ms = Some(now_ms + session.profile.drop_cooldown_ms);
    session.prepare_next_tile();
    log::debug!("dropped level {} tile at x={spawn_x:.1}", kind.level);
    true
}

/// Advance one frame. `now_ms` is the host's wall clock (monotonic).
pub fn step<E: PhysicsEngine>(session: &mut Session, engine: &mut E, now_ms: f64) {
    if session.game_over {
        return;
    }
    let pairs = engine.step(SIM_DT);
    merge::process_contacts(session, engine, &pairs);
    apply_rolling_damping(session, engine);
    poll_cooldown(session, engine, now_ms);
    danger::evaluate(session, engine, now_ms);
}

/// Re-open the drop gate once the cooldown has elapsed. The expiry edge also
/// re-runs the danger evaluation, covering hosts that stop stepping while
/// idle: cooldown expiry may then be the only event that catches a settled
/// violation.
fn poll_cooldown<E: PhysicsEngine>(session: &mut Session, engine: &E, now_ms: f64) {
    let Some(ready_at) = session.drop_ready_at_ms else {
        return;
    };
    if now_ms >= ready_at {
        session.drop_ready_at_ms = None;
        if !session.game_over {
            session.drop_enabled = true;
            danger::evaluate(session, engine, now_ms);
        }
    }
}

/// Mild spin decay for slow tiles with excess rotation, so stacks don't
/// creep sideways from perpetual rolling
fn apply_rolling_damping<E: PhysicsEngine>(session: &Session, engine: &mut E) {
    for &id in session.tiles.keys() {
        let speed = engine.velocity(id).length();
        let spin = engine.angular_velocity(id);
        if speed < ROLL_DAMP_MAX_SPEED && spin.abs() > ROLL_DAMP_MIN_SPIN {
            engine.set_angular_velocity(id, spin * ROLL_DAMP_FACTOR);
        }
    }
}
