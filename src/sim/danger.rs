//! Danger-line dwell tracking
//!
//! A tile only ends the session after it has stayed above the line, settled,
//! and grounded for a continuous interval. Without the dwell requirement a
//! tile that merely grazes the line while bouncing into its resting spot
//! would end the session prematurely.

use super::state::{GameEvent, Session};
use crate::consts::{DANGER_EPS, SETTLE_REQUIRED_MS};
use crate::physics::{BodyId, PhysicsEngine};

/// Per-tile danger progression. The terminal "triggered" state lives on the
/// session as the one-way `game_over` flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DangerState {
    Below,
    /// Top edge above the line but still moving or unsupported
    AboveUnsettled,
    /// Fully qualifying since `since_ms`; dwell timer running
    AboveSettling { since_ms: f64 },
}

/// Evaluate every tile against the danger line. Runs each step and once on
/// cooldown expiry. Short-circuits on the first tile whose dwell completes:
/// the trigger is a pure per-tile predicate, so cross-tile order is
/// irrelevant.
pub(crate) fn evaluate<E: PhysicsEngine>(session: &mut Session, engine: &E, now_ms: f64) {
    if session.game_over {
        return;
    }
    let danger_y = session.danger_y;
    let mut triggered = false;

    for (&id, tile) in session.tiles.iter_mut() {
        let top_y = engine.position(id).y - engine.radius(id);
        let above = top_y < danger_y - DANGER_EPS;

        if above && tile.grounded && is_settled(engine, id) {
            let since_ms = match tile.danger {
                DangerState::AboveSettling { since_ms } => since_ms,
                _ => {
                    tile.danger = DangerState::AboveSettling { since_ms: now_ms };
                    now_ms
                }
            };
            if now_ms - since_ms >= SETTLE_REQUIRED_MS {
                triggered = true;
                break;
            }
        } else {
            // Any broken condition resets the dwell timer
            tile.danger = if above {
                DangerState::AboveUnsettled
            } else {
                DangerState::Below
            };
        }
    }

    if triggered {
        trigger_game_over(session);
    }
}

/// Settled means the engine put the body to sleep, or its linear and angular
/// velocities read exactly zero
fn is_settled<E: PhysicsEngine>(engine: &E, id: BodyId) -> bool {
    if engine.is_sleeping(id) {
        return true;
    }
    let vel = engine.velocity(id);
    vel.x == 0.0 && vel.y == 0.0 && engine.angular_velocity(id) == 0.0
}

/// One-way transition: no further drops, merges, or score changes
fn trigger_game_over(session: &mut Session) {
    session.game_over = true;
    session.drop_enabled = false;
    session.push_event(GameEvent::GameOver {
        score: session.score,
    });
    log::info!(
        "game over on {} with score {}",
        session.profile.name,
        session.score
    );
}
