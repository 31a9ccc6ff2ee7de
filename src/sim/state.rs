//! Session state and core types
//!
//! The session exclusively owns the set of active tiles; the engine owns the
//! bodies. Per-tile flags (grounded, danger timer) live in a side table keyed
//! by body id rather than on the engine's body representation.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::collections::BTreeMap;
use thiserror::Error;

use super::danger::DangerState;
use crate::bounds::ArenaBounds;
use crate::catalog::{self, TileKind};
use crate::difficulty::{self, DifficultyProfile, ProfileError};
use crate::physics::{BodyId, PhysicsEngine};
use crate::scores::BestScores;

/// Fire-and-forget notifications for the presentation collaborator. Purely
/// cosmetic except for `GameOver`, which carries the final score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// A merge produced a tile of `level` at `pos`
    Promotion { pos: Vec2, level: u8 },
    /// Two ceiling-level tiles annihilated at `pos`
    TerminalFusion { pos: Vec2 },
    GameOver { score: u64 },
}

/// Side-table entry for one live physics body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveTile {
    pub level: u8,
    /// Has touched the floor or a lower tile at least once since creation
    pub grounded: bool,
    pub danger: DangerState,
}

impl ActiveTile {
    pub fn new(level: u8) -> Self {
        Self {
            level,
            grounded: false,
            danger: DangerState::Below,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown difficulty {0:?}")]
    UnknownDifficulty(String),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// One game session: score, difficulty, the active-tile table, and the drop
/// gate. Owned by the host's frame driver; no globals.
pub struct Session {
    pub(crate) profile: DifficultyProfile,
    pub(crate) rng: Pcg32,
    pub(crate) score: u64,
    pub(crate) best: BestScores,
    pub(crate) drop_enabled: bool,
    pub(crate) game_over: bool,
    pub(crate) next_tile: Option<TileKind>,
    /// BTreeMap keeps iteration order stable across runs
    pub(crate) tiles: BTreeMap<BodyId, ActiveTile>,
    pub(crate) bounds: ArenaBounds,
    pub(crate) danger_y: f32,
    pub(crate) drop_ready_at_ms: Option<f64>,
    pub(crate) events: Vec<GameEvent>,
}

impl Session {
    /// Start a session. Pushes gravity and walls to the engine so the first
    /// step already runs against the right boundaries.
    pub fn new<E: PhysicsEngine>(
        engine: &mut E,
        seed: u64,
        profile: DifficultyProfile,
        bounds: ArenaBounds,
    ) -> Result<Self, SessionError> {
        profile.validate()?;
        engine.set_gravity(profile.gravity);
        engine.set_bounds(bounds);
        let danger_y = profile.danger_line.line_y(&bounds);
        let mut session = Self {
            rng: Pcg32::seed_from_u64(seed),
            score: 0,
            best: BestScores::new(),
            drop_enabled: true,
            game_over: false,
            next_tile: None,
            tiles: BTreeMap::new(),
            bounds,
            danger_y,
            drop_ready_at_ms: None,
            events: Vec::new(),
            profile,
        };
        session.prepare_next_tile();
        log::info!(
            "session started: difficulty={} bounds={}x{}",
            session.profile.name,
            bounds.width,
            bounds.height
        );
        Ok(session)
    }

    /// Switch to a built-in difficulty. Gravity and the danger line update
    /// immediately; tiles, score, and the pending next tile are kept.
    pub fn set_difficulty<E: PhysicsEngine>(
        &mut self,
        engine: &mut E,
        name: &str,
    ) -> Result<(), SessionError> {
        let profile = difficulty::preset(name)
            .ok_or_else(|| SessionError::UnknownDifficulty(name.to_string()))?;
        profile.validate()?;
        engine.set_gravity(profile.gravity);
        self.danger_y = profile.danger_line.line_y(&self.bounds);
        log::info!("difficulty changed to {name}");
        self.profile = profile;
        Ok(())
    }

    /// Container resize: walls must re-synchronize before the next step
    pub fn resize<E: PhysicsEngine>(&mut self, engine: &mut E, bounds: ArenaBounds) {
        self.bounds = bounds;
        engine.set_bounds(bounds);
        self.danger_y = self.profile.danger_line.line_y(&bounds);
    }

    /// Pre-selected tile for the next drop (for preview rendering)
    pub fn next_tile(&self) -> Option<TileKind> {
        self.next_tile
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Best score for the active difficulty
    pub fn best_score(&self) -> u64 {
        self.best.get(&self.profile.name)
    }

    pub fn best_score_for(&self, difficulty: &str) -> u64 {
        self.best.get(difficulty)
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn difficulty(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn bounds(&self) -> ArenaBounds {
        self.bounds
    }

    /// Danger line y for the current bounds and difficulty
    pub fn danger_line_y(&self) -> f32 {
        self.danger_y
    }

    /// Live tiles as (body, level) for board rendering
    pub fn tiles(&self) -> impl Iterator<Item = (BodyId, u8)> + '_ {
        self.tiles.iter().map(|(id, tile)| (*id, tile.level))
    }

    /// Restore a previously persisted best-score table
    pub fn load_best_scores(&mut self, scores: BestScores) {
        self.best = scores;
    }

    /// Current best-score table, for the host to persist
    pub fn best_scores(&self) -> &BestScores {
        &self.best
    }

    /// Drain queued effect/game-over notifications
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Where a vertical drop ray at `x` first meets a tile top (or the
    /// container bottom). Used by the host for the drop guide line.
    pub fn drop_guide_y<E: PhysicsEngine>(&self, engine: &E, x: f32) -> f32 {
        if x < 0.0 || x > self.bounds.width {
            return self.bounds.height;
        }
        let mut min_y = self.bounds.height;
        for &id in self.tiles.keys() {
            let center = engine.position(id);
            let radius = engine.radius(id);
            let dx = (x - center.x).abs();
            if dx <= radius {
                let dy = (radius * radius - dx * dx).sqrt();
                let top = center.y - dy;
                if top >= 0.0 && top < min_y {
                    min_y = top;
                }
            }
        }
        min_y
    }

    /// Monotonic score bump; keeps the best-score entry live
    pub(crate) fn add_score(&mut self, points: u32) {
        self.score += u64::from(points);
        if self.best.record(&self.profile.name, self.score) {
            log::debug!("new best for {}: {}", self.profile.name, self.score);
        }
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Draw the next droppable tile from the weighted pool
    pub(crate) fn prepare_next_tile(&mut self) {
        self.next_tile = Some(catalog::select_spawn(
            &mut self.rng,
            self.profile.max_drop_level,
            Some(&self.profile.drop_weights),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::TileMaterial;
    use crate::physics::stub::StubEngine;

    fn session(engine: &mut StubEngine) -> Session {
        Session::new(
            engine,
            7,
            difficulty::preset("normal").unwrap(),
            ArenaBounds::new(400.0, 600.0),
        )
        .unwrap()
    }

    #[test]
    fn new_session_syncs_engine_and_draws_next_tile() {
        let mut engine = StubEngine::new();
        let session = session(&mut engine);
        assert_eq!(engine.gravity, 0.8);
        assert_eq!(engine.bounds, Some(ArenaBounds::new(400.0, 600.0)));
        let next = session.next_tile().unwrap();
        assert!(next.level <= 4);
        assert_eq!(session.score(), 0);
        assert!(!session.is_game_over());
    }

    #[test]
    fn spawn_sequence_is_seed_deterministic() {
        let mut engine_a = StubEngine::new();
        let mut engine_b = StubEngine::new();
        let mut a = session(&mut engine_a);
        let mut b = session(&mut engine_b);
        for _ in 0..50 {
            assert_eq!(a.next_tile(), b.next_tile());
            a.prepare_next_tile();
            b.prepare_next_tile();
        }
    }

    #[test]
    fn set_difficulty_updates_gravity_and_best_score_key() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        session.add_score(30);
        assert_eq!(session.best_score(), 30);
        session.set_difficulty(&mut engine, "hard").unwrap();
        assert_eq!(session.difficulty().max_allowed_level, 10);
        // Best score is tracked per difficulty
        assert_eq!(session.best_score(), 0);
        assert_eq!(session.best_score_for("normal"), 30);
        assert!(matches!(
            session.set_difficulty(&mut engine, "nope"),
            Err(SessionError::UnknownDifficulty(_))
        ));
    }

    #[test]
    fn resize_pushes_bounds_and_recomputes_fraction_line() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        session.profile.danger_line = crate::bounds::DangerLineMode::Fraction(0.2);
        session.resize(&mut engine, ArenaBounds::new(300.0, 900.0));
        assert_eq!(engine.bounds, Some(ArenaBounds::new(300.0, 900.0)));
        assert_eq!(session.danger_line_y(), 180.0);
    }

    #[test]
    fn drop_guide_hits_topmost_tile() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        let id = engine.create_tile_body(glam::Vec2::new(100.0, 300.0), 50.0, TileMaterial::default());
        session.tiles.insert(id, ActiveTile::new(3));

        assert_eq!(session.drop_guide_y(&engine, 100.0), 250.0);
        // 30px off-center: intersection sits at 300 - sqrt(50^2 - 30^2) = 260
        assert_eq!(session.drop_guide_y(&engine, 130.0), 260.0);
        // Misses the tile entirely: falls through to the container bottom
        assert_eq!(session.drop_guide_y(&engine, 300.0), 600.0);
        // Outside the container
        assert_eq!(session.drop_guide_y(&engine, -5.0), 600.0);
    }

    #[test]
    fn drain_events_empties_queue() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        session.push_event(GameEvent::TerminalFusion {
            pos: glam::Vec2::new(1.0, 2.0),
        });
        assert_eq!(session.drain_events().len(), 1);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn best_scores_survive_round_trip() {
        let mut engine = StubEngine::new();
        let mut session = session(&mut engine);
        session.add_score(77);
        let json = session.best_scores().to_json().unwrap();
        let mut engine2 = StubEngine::new();
        let mut restored = self::session(&mut engine2);
        restored.load_best_scores(BestScores::from_json(&json).unwrap());
        assert_eq!(restored.best_score(), 77);
    }
}
