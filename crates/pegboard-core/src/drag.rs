//! Single-note drag sessions.

use crate::config::BoardConfig;
use crate::coords::CoordinateSpace;
use crate::note::NoteId;
use kurbo::{Point, Vec2};

/// State of one note being dragged by one pointer.
#[derive(Debug, Clone)]
pub struct DragSession {
    note_id: NoteId,
    /// Pointer board position minus note position, captured at start.
    drag_offset: Vec2,
    start_client: Point,
    position: Point,
    last_client: Point,
    moved: bool,
}

/// How a drag session finished.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// The pointer never left the click slop.
    Click(NoteId),
    /// The note was moved; `position` is the value to commit.
    Moved { note_id: NoteId, position: Point },
}

impl DragSession {
    /// Start dragging the note at `note_position` with the pointer at `client`.
    pub fn start(
        note_id: NoteId,
        note_position: Point,
        client: Point,
        space: &CoordinateSpace,
    ) -> Self {
        let pointer = space.to_board(client);
        Self {
            note_id,
            drag_offset: pointer - note_position,
            start_client: client,
            position: note_position,
            last_client: client,
            moved: false,
        }
    }

    pub fn note_id(&self) -> &NoteId {
        &self.note_id
    }

    pub fn drag_offset(&self) -> Vec2 {
        self.drag_offset
    }

    /// Last emitted position.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn last_client(&self) -> Point {
        self.last_client
    }

    /// Recompute the note position from the live pointer and the current transform.
    pub fn update(
        &mut self,
        client: Point,
        space: &CoordinateSpace,
        config: &BoardConfig,
    ) -> Point {
        self.last_client = client;
        if !self.moved && (client - self.start_client).hypot() > config.click_slop {
            self.moved = true;
        }
        let pointer = space.to_board(client);
        self.position = config.clamp_position(pointer - self.drag_offset);
        self.position
    }

    /// Re-evaluate at the last pointer position, e.g. after the viewport changed.
    pub fn refresh(&mut self, space: &CoordinateSpace, config: &BoardConfig) -> Point {
        let pointer = space.to_board(self.last_client);
        self.position = config.clamp_position(pointer - self.drag_offset);
        self.position
    }

    pub fn finish(self) -> DragOutcome {
        if self.moved {
            DragOutcome::Moved {
                note_id: self.note_id,
                position: self.position,
            }
        } else {
            DragOutcome::Click(self.note_id)
        }
    }
}
