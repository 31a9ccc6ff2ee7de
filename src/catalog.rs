//! Static tile catalog and weighted spawn selection
//!
//! The catalog is populated once and read-only afterwards. Levels past the
//! droppable pool (default weight 0) are only reachable through merges.

use rand::Rng;
use std::collections::HashMap;
use thiserror::Error;

use crate::consts::{MAX_TILE_RADIUS, MIN_TILE_RADIUS, RADIUS_SCALE};

/// One catalog entry. The display fields are carried through for the host's
/// renderer and never consulted by game logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileKind {
    /// Rank, 1-based; higher levels only appear through merging
    pub level: u8,
    pub radius: f32,
    /// Awarded when a tile of this level is produced by a merge (not on spawn)
    pub score: u32,
    /// Default spawn frequency weight (0 = merge-only)
    pub weight: f32,
    pub color: &'static str,
    pub glyph: &'static str,
    pub image: &'static str,
}

impl TileKind {
    /// Defensive copy with the radius scale applied and clamped to sane
    /// bounds. Callers never get a reference into the catalog.
    fn scaled(&self) -> TileKind {
        let radius = if (MIN_TILE_RADIUS..=MAX_TILE_RADIUS).contains(&self.radius) {
            self.radius
        } else {
            MIN_TILE_RADIUS
        };
        TileKind {
            radius: (radius * RADIUS_SCALE).round(),
            ..*self
        }
    }
}

/// Highest catalog level
pub const MAX_LEVEL: u8 = CATALOG.len() as u8;

/// The full tile table, ordered by level. Radii increase monotonically.
pub const CATALOG: [TileKind; 11] = [
    TileKind { level: 1, radius: 18.0, score: 1, weight: 4.0, color: "#FFE4B5", glyph: "🐱", image: "assets/tiles/tile1.png" },
    TileKind { level: 2, radius: 24.0, score: 3, weight: 3.0, color: "#FFDAB9", glyph: "😺", image: "assets/tiles/tile2.png" },
    TileKind { level: 3, radius: 32.0, score: 6, weight: 3.0, color: "#FFD700", glyph: "😸", image: "assets/tiles/tile3.png" },
    TileKind { level: 4, radius: 40.0, score: 10, weight: 2.0, color: "#FFA500", glyph: "😹", image: "assets/tiles/tile4.png" },
    TileKind { level: 5, radius: 50.0, score: 15, weight: 2.0, color: "#FF8C00", glyph: "😻", image: "assets/tiles/tile5.png" },
    TileKind { level: 6, radius: 62.0, score: 21, weight: 0.0, color: "#FF6347", glyph: "🙀", image: "assets/tiles/tile6.png" },
    TileKind { level: 7, radius: 76.0, score: 28, weight: 0.0, color: "#FF4500", glyph: "😾", image: "assets/tiles/tile7.png" },
    TileKind { level: 8, radius: 92.0, score: 36, weight: 0.0, color: "#DC143C", glyph: "😿", image: "assets/tiles/tile8.png" },
    TileKind { level: 9, radius: 110.0, score: 45, weight: 0.0, color: "#8B0000", glyph: "🐈", image: "assets/tiles/tile9.png" },
    TileKind { level: 10, radius: 130.0, score: 55, weight: 0.0, color: "#4B0082", glyph: "🐈‍⬛", image: "assets/tiles/tile10.png" },
    TileKind { level: 11, radius: 152.0, score: 100, weight: 0.0, color: "#FFD700", glyph: "🦁", image: "assets/tiles/tile11.png" },
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Callers treat this as "no such level", not a crash
    #[error("no tile at level {0}")]
    NotFound(u8),
}

/// Look up a catalog entry by level (1-based)
pub fn by_level(level: u8) -> Result<TileKind, CatalogError> {
    if level == 0 || level > MAX_LEVEL {
        return Err(CatalogError::NotFound(level));
    }
    Ok(CATALOG[level as usize - 1].scaled())
}

/// The entry one level up, or `None` when `level` is already the last
pub fn next_level(level: u8) -> Option<TileKind> {
    by_level(level.checked_add(1)?).ok()
}

/// Weight for a candidate, honoring a per-level override when it is usable.
/// Malformed overrides (NaN, infinite, negative) are ignored per entry and
/// the catalog default applies for that level only.
fn effective_weight(kind: &TileKind, overrides: Option<&HashMap<u8, f32>>) -> f32 {
    match overrides.and_then(|m| m.get(&kind.level)) {
        Some(&w) if w.is_finite() && w >= 0.0 => w,
        _ => kind.weight,
    }
}

/// Pick the next droppable tile.
///
/// Candidates are catalog entries with `level <= max_drop_level` and a
/// positive effective weight. Selection is a cumulative weighted draw in
/// catalog order. Cascading fallbacks guarantee a tile is always returned:
/// - empty candidate set: first entry with a positive default weight under
///   the cap, else the lowest catalog level
/// - degenerate override total: redo the draw with catalog default weights,
///   and if those also sum to zero, take the lowest qualifying level
pub fn select_spawn<R: Rng>(
    rng: &mut R,
    max_drop_level: u8,
    overrides: Option<&HashMap<u8, f32>>,
) -> TileKind {
    let droppable: Vec<&TileKind> = CATALOG
        .iter()
        .filter(|&k| k.level <= max_drop_level && effective_weight(k, overrides) > 0.0)
        .collect();

    if droppable.is_empty() {
        let fallback = CATALOG
            .iter()
            .find(|k| k.level <= max_drop_level && k.weight > 0.0);
        return fallback.unwrap_or(&CATALOG[0]).scaled();
    }

    let override_total: f32 = droppable
        .iter()
        .map(|&k| effective_weight(k, overrides))
        .sum();
    let use_overrides = override_total > 0.0 && override_total.is_finite();
    let total = if use_overrides {
        override_total
    } else {
        droppable.iter().map(|k| k.weight).sum()
    };
    if !(total > 0.0 && total.is_finite()) {
        // Catalog defaults for this set are degenerate too; lowest level wins
        return droppable[0].scaled();
    }

    let mut remaining = rng.random_range(0.0..total);
    for &kind in &droppable {
        remaining -= if use_overrides {
            effective_weight(kind, overrides)
        } else {
            kind.weight
        };
        // `<= 0` cutoff absorbs float rounding at the bucket edges
        if remaining <= 0.0 {
            return kind.scaled();
        }
    }
    droppable[0].scaled()
}
