//! Board geometry configuration.
//!
//! These values are shared between the placement/collision math and whatever
//! renders note rectangles. Both sides must read the same [`BoardConfig`] or
//! collision results will not match visual overlap.

use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Board width in board units.
pub const BOARD_WIDTH: f64 = 4000.0;
/// Board height in board units.
pub const BOARD_HEIGHT: f64 = 3000.0;
/// Width of a pinned note.
pub const NOTE_W: f64 = 220.0;
/// Height of a pinned note.
pub const NOTE_H: f64 = 260.0;
/// Width of the in-progress composition.
pub const EDIT_W: f64 = 320.0;
/// Height of the in-progress composition.
pub const EDIT_H: f64 = 380.0;
/// Minimum distance between a note and the board edge.
pub const MARGIN: f64 = 60.0;
/// Padding used by the overlap test.
pub const COLLISION_PADDING: f64 = 40.0;
/// How far the placement search extends beyond the visible region.
pub const SEARCH_PADDING: f64 = 300.0;
/// Number of random candidates tried before falling back.
pub const PLACEMENT_ATTEMPTS: usize = 60;
/// Smallest allowed zoom factor.
pub const MIN_SCALE: f64 = 0.5;
/// Largest allowed zoom factor.
pub const MAX_SCALE: f64 = 2.0;
/// Wheel delta that changes the scale by a factor of `e`.
pub const WHEEL_ZOOM_DIVISOR: f64 = 300.0;
/// Pointer travel (screen px) below which a press on a note counts as a click.
pub const CLICK_SLOP: f64 = 4.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse board config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid board config: {0}")]
    Invalid(String),
}

/// Geometry constants for a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub board_size: Size,
    pub note_size: Size,
    pub edit_size: Size,
    pub margin: f64,
    pub collision_padding: f64,
    pub search_padding: f64,
    pub placement_attempts: usize,
    pub min_scale: f64,
    pub max_scale: f64,
    pub wheel_zoom_divisor: f64,
    pub click_slop: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            board_size: Size::new(BOARD_WIDTH, BOARD_HEIGHT),
            note_size: Size::new(NOTE_W, NOTE_H),
            edit_size: Size::new(EDIT_W, EDIT_H),
            margin: MARGIN,
            collision_padding: COLLISION_PADDING,
            search_padding: SEARCH_PADDING,
            placement_attempts: PLACEMENT_ATTEMPTS,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            wheel_zoom_divisor: WHEEL_ZOOM_DIVISOR,
            click_slop: CLICK_SLOP,
        }
    }
}

impl BoardConfig {
    /// Parse a config from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the geometry is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("board width", self.board_size.width),
            ("board height", self.board_size.height),
            ("note width", self.note_size.width),
            ("note height", self.note_size.height),
            ("edit width", self.edit_size.width),
            ("edit height", self.edit_size.height),
            ("min scale", self.min_scale),
            ("wheel zoom divisor", self.wheel_zoom_divisor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.margin < 0.0 || self.collision_padding < 0.0 || self.search_padding < 0.0 {
            return Err(ConfigError::Invalid("margins and paddings must not be negative".into()));
        }
        if self.max_scale < self.min_scale {
            return Err(ConfigError::Invalid(format!(
                "max scale {} is below min scale {}",
                self.max_scale, self.min_scale
            )));
        }
        let bounds = self.position_bounds();
        if bounds.x1 < bounds.x0 || bounds.y1 < bounds.y0 {
            return Err(ConfigError::Invalid(
                "board is too small to hold a note inside its margins".into(),
            ));
        }
        Ok(())
    }

    /// Rectangle that every note's top-left corner must lie inside.
    pub fn position_bounds(&self) -> Rect {
        Rect::new(
            self.margin,
            self.margin,
            self.board_size.width - self.note_size.width - self.margin,
            self.board_size.height - self.note_size.height - self.margin,
        )
    }

    /// Clamp a note position into [`position_bounds`](Self::position_bounds).
    pub fn clamp_position(&self, position: Point) -> Point {
        let bounds = self.position_bounds();
        Point::new(
            position.x.clamp(bounds.x0, bounds.x1),
            position.y.clamp(bounds.y0, bounds.y1),
        )
    }

    /// The rectangle a pinned note occupies, in board coordinates.
    pub fn note_rect(&self, position: Point) -> Rect {
        Rect::from_origin_size(position, self.note_size)
    }

    /// Clamp a zoom factor to the allowed range.
    pub fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}
