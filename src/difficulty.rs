//! Difficulty profiles
//!
//! A profile bundles drop cadence, gravity, the droppable level pool, the
//! merge ceiling, and optional per-level weight overrides. Hosts can ship
//! custom profiles as JSON; the built-in presets mirror the stock game.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::bounds::DangerLineMode;
use crate::catalog::MAX_LEVEL;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub name: String,
    /// Wall-clock delay before the next drop is accepted
    pub drop_cooldown_ms: f64,
    /// Gravity scale pushed to the physics engine
    pub gravity: f32,
    /// Ceiling of the spawn pool
    pub max_drop_level: u8,
    /// Level at which two equal tiles annihilate instead of promoting
    pub max_allowed_level: u8,
    /// Per-level spawn weight overrides; absent levels keep catalog defaults
    #[serde(default)]
    pub drop_weights: HashMap<u8, f32>,
    #[serde(default)]
    pub danger_line: DangerLineMode,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("drop pool ceiling {max_drop} exceeds merge ceiling {max_allowed}")]
    DropPoolAboveCeiling { max_drop: u8, max_allowed: u8 },
    #[error("merge ceiling {0} exceeds the catalog maximum")]
    CeilingAboveCatalog(u8),
    #[error("drop pool must contain at least level 1")]
    EmptyDropPool,
}

impl DifficultyProfile {
    /// Enforce `max_drop_level <= max_allowed_level <= MAX_LEVEL`
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.max_drop_level == 0 {
            return Err(ProfileError::EmptyDropPool);
        }
        if self.max_drop_level > self.max_allowed_level {
            return Err(ProfileError::DropPoolAboveCeiling {
                max_drop: self.max_drop_level,
                max_allowed: self.max_allowed_level,
            });
        }
        if self.max_allowed_level > MAX_LEVEL {
            return Err(ProfileError::CeilingAboveCatalog(self.max_allowed_level));
        }
        Ok(())
    }
}

/// Built-in preset names, mildest first
pub const PRESET_NAMES: [&str; 4] = ["easy", "normal", "hard", "paradise"];

/// Look up a built-in profile by name
pub fn preset(name: &str) -> Option<DifficultyProfile> {
    let profile = match name {
        "easy" => DifficultyProfile {
            name: "easy".to_string(),
            drop_cooldown_ms: 300.0,
            gravity: 0.8,
            max_drop_level: 3,
            max_allowed_level: 8,
            drop_weights: HashMap::from([(1, 6.0), (2, 4.0), (3, 2.0)]),
            danger_line: DangerLineMode::default(),
        },
        "normal" => DifficultyProfile {
            name: "normal".to_string(),
            drop_cooldown_ms: 300.0,
            gravity: 0.8,
            max_drop_level: 4,
            max_allowed_level: 9,
            drop_weights: HashMap::from([(1, 6.0), (2, 4.0), (3, 3.0), (4, 2.0)]),
            danger_line: DangerLineMode::default(),
        },
        "hard" => DifficultyProfile {
            name: "hard".to_string(),
            drop_cooldown_ms: 300.0,
            gravity: 0.8,
            max_drop_level: 5,
            max_allowed_level: 10,
            drop_weights: HashMap::from([
                (1, 6.0),
                (2, 4.0),
                (3, 3.0),
                (4, 2.0),
                (5, 1.0),
            ]),
            danger_line: DangerLineMode::default(),
        },
        "paradise" => DifficultyProfile {
            name: "paradise".to_string(),
            drop_cooldown_ms: 300.0,
            gravity: 0.8,
            max_drop_level: 5,
            max_allowed_level: 11,
            drop_weights: HashMap::from([
                (1, 8.0),
                (2, 5.0),
                (3, 3.0),
                (4, 2.0),
                (5, 1.0),
            ]),
            danger_line: DangerLineMode::default(),
        },
        _ => return None,
    };
    Some(profile)
}
