//! Non-overlapping placement search for newly posted notes.

use crate::config::BoardConfig;
use kurbo::{Point, Rect, Size};
use rand::Rng;

/// Viewport size assumed when no live viewport is available.
pub const DEFAULT_VIEW_SIZE: Size = Size::new(1200.0, 800.0);

/// Outcome of a placement search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// A candidate that clears every existing note.
    Free(Point),
    /// Budget exhausted; centered in the visible region and may overlap.
    Fallback(Point),
}

impl Placement {
    pub fn position(self) -> Point {
        match self {
            Placement::Free(p) | Placement::Fallback(p) => p,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Placement::Fallback(_))
    }
}

/// Padded AABB overlap between two notes of the same `size` at `a` and `b`.
///
/// Notes exactly `padding` apart still count as overlapping.
pub fn overlaps(a: Point, b: Point, size: Size, padding: f64) -> bool {
    !(a.x + size.width + padding < b.x
        || a.x > b.x + size.width + padding
        || a.y + size.height + padding < b.y
        || a.y > b.y + size.height + padding)
}

/// Finds positions for new notes.
pub struct PlacementEngine<'a> {
    config: &'a BoardConfig,
}

impl<'a> PlacementEngine<'a> {
    pub fn new(config: &'a BoardConfig) -> Self {
        Self { config }
    }

    /// Region used when there is no live viewport: centered on the board.
    pub fn default_region(&self) -> Rect {
        let board = self.config.board_size;
        let center = Point::new(board.width / 2.0, board.height / 2.0);
        Rect::from_center_size(center, DEFAULT_VIEW_SIZE)
    }

    /// Visible region grown by the search padding, with left/top kept at or past the margin.
    pub fn search_region(&self, visible: Rect) -> Rect {
        let pad = self.config.search_padding;
        let margin = self.config.margin;
        Rect::new(
            (visible.x0 - pad).max(margin),
            (visible.y0 - pad).max(margin),
            visible.x1 + pad,
            visible.y1 + pad,
        )
    }

    /// Whether a note at `candidate` collides with any of `existing`.
    pub fn collides(&self, candidate: Point, existing: &[Point]) -> bool {
        existing.iter().any(|&other| {
            overlaps(
                candidate,
                other,
                self.config.note_size,
                self.config.collision_padding,
            )
        })
    }

    /// Search for a free spot near `visible` (board coordinates).
    pub fn place<R: Rng + ?Sized>(
        &self,
        existing: &[Point],
        visible: Rect,
        rng: &mut R,
    ) -> Placement {
        let search = self.search_region(visible);
        let note = self.config.note_size;
        let span_x = (search.width() - note.width).max(0.0);
        let span_y = (search.height() - note.height).max(0.0);

        for attempt in 0..self.config.placement_attempts {
            let raw = Point::new(
                search.x0 + rng.r#gen::<f64>() * span_x,
                search.y0 + rng.r#gen::<f64>() * span_y,
            );
            let candidate = self.config.clamp_position(raw);
            if !self.collides(candidate, existing) {
                log::debug!("placed note at {candidate:?} after {} attempt(s)", attempt + 1);
                return Placement::Free(candidate);
            }
        }

        let center = visible.center();
        let fallback = self.config.clamp_position(Point::new(
            center.x - note.width / 2.0,
            center.y - note.height / 2.0,
        ));
        log::debug!(
            "placement budget of {} exhausted, falling back to {fallback:?}",
            self.config.placement_attempts
        );
        Placement::Fallback(fallback)
    }
}
