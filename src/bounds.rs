//! Container geometry and danger-line placement
//!
//! Coordinates are screen-style: y grows downward, the floor sits at large y
//! and the danger line near the top. On resize the host must push the new
//! bounds to the engine (via [`crate::Session::resize`]) before the next
//! step, or merge and danger-line decisions operate on stale walls.

use serde::{Deserialize, Serialize};

use crate::consts::{DANGER_LINE_PX, EDGE_INSET};

/// Container extents in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub width: f32,
    pub height: f32,
}

impl ArenaBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Top surface of the floor
    pub fn floor_y(&self) -> f32 {
        self.height - EDGE_INSET
    }

    pub fn left_wall_x(&self) -> f32 {
        EDGE_INSET
    }

    pub fn right_wall_x(&self) -> f32 {
        self.width - EDGE_INSET
    }

    /// Clamp a requested drop x so a tile of the given radius clears both
    /// walls. Degenerate containers fall back to the center line.
    pub fn clamp_drop_x(&self, x: f32, radius: f32) -> f32 {
        let min = self.left_wall_x() + radius;
        let max = self.right_wall_x() - radius;
        if min > max {
            return self.width / 2.0;
        }
        x.clamp(min, max)
    }
}

/// How a difficulty anchors the danger line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerLineMode {
    /// Fixed distance from the container top
    FixedPx(f32),
    /// Fraction of container height, re-derived on resize
    Fraction(f32),
}

impl Default for DangerLineMode {
    fn default() -> Self {
        DangerLineMode::FixedPx(DANGER_LINE_PX)
    }
}

impl DangerLineMode {
    pub fn line_y(&self, bounds: &ArenaBounds) -> f32 {
        match *self {
            DangerLineMode::FixedPx(y) => y,
            DangerLineMode::Fraction(f) => bounds.height * f.clamp(0.0, 1.0),
        }
    }
}
