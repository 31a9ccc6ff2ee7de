//! Merge resolution and post-merge overlap relaxation
//!
//! Consumes the collision batch the engine reports each step. Equal-level
//! tile contacts either promote (one next-level tile at the midpoint) or,
//! at the difficulty's ceiling, annihilate for a fixed bonus. Removal is
//! idempotent within a batch: a body consumed by an earlier pair is skipped
//! when it shows up again, so chains of touching tiles merge one pair per
//! step and the survivors are re-evaluated on the next step.

use glam::Vec2;

use super::state::{ActiveTile, GameEvent, Session};
use crate::catalog;
use crate::consts::{
    MIN_WAKE_FALL_SPEED, PROMOTION_WAKE_PAD, RELAX_ITERATIONS, RELAX_PUSH_EXISTING,
    RELAX_PUSH_NEW, RELAX_SLACK, SUPPORT_EPS, TERMINAL_FUSION_BONUS, TERMINAL_WAKE_RADIUS,
};
use crate::physics::{BodyId, ContactBody, ContactPair, PhysicsEngine, TileMaterial};

/// Process one step's collision batch, in reported order
pub(crate) fn process_contacts<E: PhysicsEngine>(
    session: &mut Session,
    engine: &mut E,
    pairs: &[ContactPair],
) {
    if session.game_over {
        return;
    }
    for pair in pairs {
        update_grounded(session, engine, pair);

        let (ContactBody::Tile(a), ContactBody::Tile(b)) = (pair.a, pair.b) else {
            continue;
        };
        if a == b {
            continue;
        }
        // Idempotent-removal guard: either body may already have been
        // consumed by an earlier pair in this batch
        let (Some(tile_a), Some(tile_b)) = (session.tiles.get(&a), session.tiles.get(&b))
        else {
            continue;
        };
        if tile_a.level != tile_b.level {
            continue;
        }

        let level = tile_a.level;
        if level >= session.profile.max_allowed_level {
            terminal_fusion(session, engine, a, b);
        } else {
            promote(session, engine, a, b, level);
        }
    }
}

/// Mark tiles grounded when paired with the floor or with another tile whose
/// center sits lower by more than the support epsilon. Side and upward
/// contacts never count as support.
fn update_grounded<E: PhysicsEngine>(session: &mut Session, engine: &E, pair: &ContactPair) {
    for (this, other) in [(pair.a, pair.b), (pair.b, pair.a)] {
        let ContactBody::Tile(id) = this else { continue };
        if !session.tiles.contains_key(&id) {
            continue;
        }
        let supported = match other {
            ContactBody::Floor => true,
            ContactBody::Tile(o) => {
                session.tiles.contains_key(&o)
                    && engine.position(o).y > engine.position(id).y + SUPPORT_EPS
            }
            ContactBody::Wall => false,
        };
        if supported
            && let Some(tile) = session.tiles.get_mut(&id)
        {
            tile.grounded = true;
        }
    }
}

/// Replace a same-level pair with one next-level tile at their midpoint
fn promote<E: PhysicsEngine>(
    session: &mut Session,
    engine: &mut E,
    a: BodyId,
    b: BodyId,
    level: u8,
) {
    let Some(next) = catalog::next_level(level) else {
        // Ceiling misconfigured past the catalog: leave the pair untouched
        log::warn!("merge at level {level} has no successor, skipping");
        return;
    };
    let mid = (engine.position(a) + engine.position(b)) * 0.5;
    remove_tile(session, engine, a);
    remove_tile(session, engine, b);

    let body = engine.create_tile_body(mid, next.radius, TileMaterial::default());
    session.tiles.insert(body, ActiveTile::new(next.level));
    relax_overlaps(session, engine, body);

    session.add_score(next.score);
    session.push_event(GameEvent::Promotion {
        pos: mid,
        level: next.level,
    });
    log::debug!("promoted {level}+{level} -> {} at {mid}", next.level);
}

/// Two tiles at the ceiling annihilate for a fixed bonus; no new body
fn terminal_fusion<E: PhysicsEngine>(session: &mut Session, engine: &mut E, a: BodyId, b: BodyId) {
    let mid = (engine.position(a) + engine.position(b)) * 0.5;
    remove_tile(session, engine, a);
    remove_tile(session, engine, b);

    wake_nearby(session, engine, mid, TERMINAL_WAKE_RADIUS);
    session.add_score(TERMINAL_FUSION_BONUS);
    session.push_event(GameEvent::TerminalFusion { pos: mid });
    log::info!("terminal fusion at {mid}, +{TERMINAL_FUSION_BONUS}");
}

fn remove_tile<E: PhysicsEngine>(session: &mut Session, engine: &mut E, id: BodyId) {
    engine.remove_body(id);
    session.tiles.remove(&id);
}

/// Positional correction after a promotion: deleting two bodies and inserting
/// a larger one in the same step can leave it interpenetrating neighbors, and
/// letting the solver resolve that alone produces a visible pop. A few fixed
/// passes push overlapping pairs apart along the center line, moving the
/// pre-existing tile more than the new one. Not momentum-conserving.
fn relax_overlaps<E: PhysicsEngine>(session: &mut Session, engine: &mut E, new_id: BodyId) {
    let wake_radius = engine.radius(new_id) + PROMOTION_WAKE_PAD;
    wake_nearby(session, engine, engine.position(new_id), wake_radius);

    let new_radius = engine.radius(new_id);
    for _ in 0..RELAX_ITERATIONS {
        for &other in session.tiles.keys() {
            if other == new_id {
                continue;
            }
            let new_pos = engine.position(new_id);
            let delta = engine.position(other) - new_pos;
            let mut dist = delta.length();
            let min_dist = engine.radius(other) + new_radius + RELAX_SLACK;
            if dist == 0.0 {
                dist = 1e-3;
            }
            if dist < min_dist {
                let overlap = min_dist - dist;
                let normal = delta / dist;
                engine.set_position(
                    other,
                    engine.position(other) + normal * (overlap * RELAX_PUSH_EXISTING),
                );
                engine.set_position(new_id, new_pos - normal * (overlap * RELAX_PUSH_NEW));
            }
        }
    }
}

/// Wake sleeping tiles near `center` and floor their downward speed, so a
/// stack doesn't hang in the air after a fusion removes its support
fn wake_nearby<E: PhysicsEngine>(session: &Session, engine: &mut E, center: Vec2, radius: f32) {
    let radius_sq = radius * radius;
    for &id in session.tiles.keys() {
        if engine.position(id).distance_squared(center) <= radius_sq {
            engine.set_sleeping(id, false);
            let vel = engine.velocity(id);
            engine.set_velocity(id, Vec2::new(vel.x, vel.y.max(MIN_WAKE_FALL_SPEED)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::ArenaBounds;
    use crate::difficulty;
    use crate::physics::stub::{StubEngine, floor_pair, tile_pair};

    fn session(engine: &mut StubEngine) -> Session {
        Session::new(
            engine,
            7,
            difficulty::preset("hard").unwrap(),
            ArenaBounds::new(400.0, 600.0),
        )
        .unwrap()
    }

    fn place_tile(
        session: &mut Session,
        engine: &mut StubEngine,
        level: u8,
        pos: Vec2,
    ) -> BodyId {
        let kind = catalog::by_level(level).unwrap();
        let id = engine.create_tile_body(pos, kind.radius, TileMaterial::default());
        session.tiles.insert(id, ActiveTile::new(level));
        id
    }

    #[test]
    fn promotion_produces_midpoint_tile_and_score() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        let a = place_tile(&mut session, &mut engine, 3, Vec2::new(10.0, 10.0));
        let b = place_tile(&mut session, &mut engine, 3, Vec2::new(20.0, 10.0));

        process_contacts(&mut session, &mut engine, &[tile_pair(a, b)]);

        assert!(!engine.alive(a));
        assert!(!engine.alive(b));
        assert_eq!(session.tiles.len(), 1);
        let (&new_id, tile) = session.tiles.iter().next().unwrap();
        assert_eq!(tile.level, 4);
        assert_eq!(engine.position(new_id), Vec2::new(15.0, 10.0));
        assert_eq!(session.score(), u64::from(catalog::by_level(4).unwrap().score));
        assert_eq!(
            session.drain_events(),
            vec![GameEvent::Promotion {
                pos: Vec2::new(15.0, 10.0),
                level: 4
            }]
        );
    }

    #[test]
    fn terminal_fusion_awards_bonus_without_new_tile() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        // hard's merge ceiling is level 10
        let a = place_tile(&mut session, &mut engine, 10, Vec2::new(100.0, 200.0));
        let b = place_tile(&mut session, &mut engine, 10, Vec2::new(160.0, 200.0));

        process_contacts(&mut session, &mut engine, &[tile_pair(a, b)]);

        assert!(session.tiles.is_empty());
        assert_eq!(engine.live_bodies(), 0);
        assert_eq!(session.score(), u64::from(TERMINAL_FUSION_BONUS));
        assert_eq!(
            session.drain_events(),
            vec![GameEvent::TerminalFusion {
                pos: Vec2::new(130.0, 200.0)
            }]
        );
    }

    #[test]
    fn double_pair_in_one_batch_merges_once() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        let a = place_tile(&mut session, &mut engine, 1, Vec2::new(100.0, 500.0));
        let b = place_tile(&mut session, &mut engine, 1, Vec2::new(136.0, 500.0));
        let c = place_tile(&mut session, &mut engine, 1, Vec2::new(172.0, 500.0));

        // Three mutually touching equal tiles reported as two pairs: only the
        // first pair merges, the third tile is untouched this step
        process_contacts(
            &mut session,
            &mut engine,
            &[tile_pair(a, b), tile_pair(b, c)],
        );

        assert!(engine.alive(c));
        assert_eq!(session.tiles.get(&c).unwrap().level, 1);
        let levels: Vec<u8> = session.tiles.values().map(|t| t.level).collect();
        assert_eq!(levels.iter().filter(|&&l| l == 2).count(), 1);
        assert_eq!(session.tiles.len(), 2);
        assert_eq!(session.score(), u64::from(catalog::by_level(2).unwrap().score));
    }

    #[test]
    fn mismatched_levels_do_not_merge() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        let a = place_tile(&mut session, &mut engine, 1, Vec2::new(100.0, 500.0));
        let b = place_tile(&mut session, &mut engine, 2, Vec2::new(140.0, 500.0));

        process_contacts(&mut session, &mut engine, &[tile_pair(a, b)]);

        assert!(engine.alive(a) && engine.alive(b));
        assert_eq!(session.tiles.len(), 2);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn ceiling_past_catalog_is_a_no_op() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        // Misconfigured ceiling: promotion path selected at catalog max
        session.profile.max_allowed_level = 12;
        let a = place_tile(&mut session, &mut engine, 11, Vec2::new(100.0, 400.0));
        let b = place_tile(&mut session, &mut engine, 11, Vec2::new(200.0, 400.0));

        process_contacts(&mut session, &mut engine, &[tile_pair(a, b)]);

        assert!(engine.alive(a) && engine.alive(b));
        assert_eq!(session.tiles.len(), 2);
        assert_eq!(session.score(), 0);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn floor_contact_grounds_a_tile() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        let a = place_tile(&mut session, &mut engine, 1, Vec2::new(100.0, 580.0));

        process_contacts(&mut session, &mut engine, &[floor_pair(a)]);
        assert!(session.tiles.get(&a).unwrap().grounded);
    }

    #[test]
    fn only_lower_tiles_count_as_support() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        // b rests below a; side-by-side c is level with a
        let a = place_tile(&mut session, &mut engine, 1, Vec2::new(100.0, 500.0));
        let b = place_tile(&mut session, &mut engine, 2, Vec2::new(100.0, 540.0));
        let c = place_tile(&mut session, &mut engine, 2, Vec2::new(140.0, 501.0));

        process_contacts(
            &mut session,
            &mut engine,
            &[tile_pair(a, b), tile_pair(a, c)],
        );

        assert!(session.tiles.get(&a).unwrap().grounded);
        // b's only contact is above it
        assert!(!session.tiles.get(&b).unwrap().grounded);
        // c's contact is within the support epsilon (side contact)
        assert!(!session.tiles.get(&c).unwrap().grounded);
    }

    #[test]
    fn relaxation_separates_interpenetrating_neighbor() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        // Neighbor sits right where the merged tile will appear
        let neighbor = place_tile(&mut session, &mut engine, 1, Vec2::new(20.0, 100.0));
        let a = place_tile(&mut session, &mut engine, 3, Vec2::new(0.0, 100.0));
        let b = place_tile(&mut session, &mut engine, 3, Vec2::new(30.0, 100.0));

        process_contacts(&mut session, &mut engine, &[tile_pair(a, b)]);

        let (&new_id, _) = session
            .tiles
            .iter()
            .find(|(_, t)| t.level == 4)
            .expect("promoted tile");
        let gap = engine.position(neighbor).distance(engine.position(new_id));
        let min_dist = engine.radius(neighbor) + engine.radius(new_id);
        assert!(
            gap + 1.0 >= min_dist,
            "still interpenetrating: gap {gap}, min {min_dist}"
        );
        // Pre-existing tile was pushed more than the new one
        assert!(engine.position(neighbor).x > 20.0);
    }

    #[test]
    fn wake_gives_minimum_downward_velocity() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        let sleeper = place_tile(&mut session, &mut engine, 4, Vec2::new(150.0, 120.0));
        engine.set_sleeping(sleeper, true);
        engine.set_velocity(sleeper, Vec2::new(0.5, -2.0));
        let a = place_tile(&mut session, &mut engine, 10, Vec2::new(100.0, 200.0));
        let b = place_tile(&mut session, &mut engine, 10, Vec2::new(160.0, 200.0));

        process_contacts(&mut session, &mut engine, &[tile_pair(a, b)]);

        assert!(!engine.is_sleeping(sleeper));
        let vel = engine.velocity(sleeper);
        assert_eq!(vel.x, 0.5);
        assert_eq!(vel.y, MIN_WAKE_FALL_SPEED);
    }

    #[test]
    fn nothing_processes_after_game_over() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        let a = place_tile(&mut session, &mut engine, 1, Vec2::new(100.0, 500.0));
        let b = place_tile(&mut session, &mut engine, 1, Vec2::new(136.0, 500.0));
        session.game_over = true;

        process_contacts(&mut session, &mut engine, &[tile_pair(a, b)]);

        assert!(engine.alive(a) && engine.alive(b));
        assert_eq!(session.score(), 0);
    }
}
