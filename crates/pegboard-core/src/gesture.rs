//! Gesture routing for pointer and touch input.
//!
//! Mouse, pen and touch input arrive as one normalized [`PointerEvent`] stream.
//! At the start of an interaction the router picks exactly one gesture
//! (note-drag, board-pan or pinch-zoom) and sends every following event of
//! that stream to it until the stream ends. Moves are always evaluated against
//! the values captured when the gesture began, never by summing deltas.

use crate::config::BoardConfig;
use crate::drag::{DragOutcome, DragSession};
use crate::note::NoteId;
use crate::viewport::ViewportController;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Host-assigned pointer identifier (touch identifier, or a fixed id for the mouse).
pub type PointerId = u64;

/// Input device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Whether a wheel event should zoom rather than scroll.
    /// Trackpad pinch on macOS arrives as ctrl+wheel.
    pub fn zooms(self) -> bool {
        self.ctrl || self.meta
    }
}

/// What a pointer went down on, as reported by the host's hit test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitTarget {
    /// The body of a pinned note.
    Note(NoteId),
    /// A note's delete button.
    DeleteControl(NoteId),
    /// The in-progress composition.
    Composer,
    /// Any other button or control.
    Control,
    /// Empty board.
    Background,
}

/// A normalized pointer event, with positions in client pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        id: PointerId,
        kind: PointerKind,
        position: Point,
        target: HitTarget,
    },
    Move {
        id: PointerId,
        position: Point,
    },
    Up {
        id: PointerId,
        position: Point,
    },
    Cancel {
        id: PointerId,
    },
    Wheel {
        position: Point,
        delta: Vec2,
        modifiers: Modifiers,
    },
}

/// Which gesture currently owns the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureMode {
    Idle,
    NoteDrag,
    BoardPan,
    PinchZoom,
}

/// Something the board must react to after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEffect {
    /// Live position of the dragged note, for local rendering only.
    NoteMoved { note_id: NoteId, position: Point },
    /// Drag ended; `position` should be published.
    NoteDropped { note_id: NoteId, position: Point },
    /// Drag was aborted; the note goes back to its stored position.
    DragCancelled(NoteId),
    NoteClicked(NoteId),
    BackgroundClicked,
    ViewportChanged,
}

#[derive(Debug, Clone)]
enum Active {
    Idle,
    NoteDrag {
        pointer: PointerId,
        session: DragSession,
    },
    BoardPan {
        pointer: PointerId,
        anchor_client: Point,
        anchor_scroll: Vec2,
        moved: bool,
        /// Mouse presses only classify clicks; desktop scrolling is native.
        drags: bool,
    },
    PinchZoom {
        pointers: [PointerId; 2],
        start_distance: f64,
        start_scale: f64,
        focal: Point,
    },
}

/// Classifies pointer streams and drives the matching gesture.
#[derive(Debug, Clone)]
pub struct GestureRouter {
    active: Active,
    /// Touch points currently down, in arrival order.
    touches: Vec<(PointerId, Point)>,
}

impl Default for GestureRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureRouter {
    pub fn new() -> Self {
        Self {
            active: Active::Idle,
            touches: Vec::new(),
        }
    }

    pub fn mode(&self) -> GestureMode {
        match self.active {
            Active::Idle => GestureMode::Idle,
            Active::NoteDrag { .. } => GestureMode::NoteDrag,
            Active::BoardPan { .. } => GestureMode::BoardPan,
            Active::PinchZoom { .. } => GestureMode::PinchZoom,
        }
    }

    /// The note being dragged and its live position.
    pub fn dragging(&self) -> Option<(&NoteId, Point)> {
        match &self.active {
            Active::NoteDrag { session, .. } => Some((session.note_id(), session.position())),
            _ => None,
        }
    }

    /// Number of touch points currently down.
    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    /// Route one event. `note_position` looks up a pinned note's stored position.
    pub fn handle<F>(
        &mut self,
        event: PointerEvent,
        viewport: &mut ViewportController,
        config: &BoardConfig,
        note_position: F,
    ) -> Vec<GestureEffect>
    where
        F: Fn(&NoteId) -> Option<Point>,
    {
        match event {
            PointerEvent::Down {
                id,
                kind,
                position,
                target,
            } => {
                if kind == PointerKind::Touch {
                    self.touches.retain(|(t, _)| *t != id);
                    self.touches.push((id, position));
                }
                self.pointer_down(id, kind, position, target, viewport, note_position)
            }
            PointerEvent::Move { id, position } => {
                if let Some(touch) = self.touches.iter_mut().find(|(t, _)| *t == id) {
                    touch.1 = position;
                }
                self.pointer_move(id, position, viewport, config)
            }
            PointerEvent::Up { id, position } => {
                self.touches.retain(|(t, _)| *t != id);
                self.pointer_up(id, Some(position), viewport, config)
            }
            PointerEvent::Cancel { id } => {
                self.touches.retain(|(t, _)| *t != id);
                self.pointer_up(id, None, viewport, config)
            }
            PointerEvent::Wheel {
                position,
                delta,
                modifiers,
            } => self.wheel(position, delta, modifiers, viewport, config),
        }
    }

    /// Abort any gesture. A drag in progress is cancelled without a commit.
    pub fn cancel(&mut self) -> Vec<GestureEffect> {
        let previous = std::mem::replace(&mut self.active, Active::Idle);
        self.touches.clear();
        match previous {
            Active::NoteDrag { session, .. } => {
                log::debug!("drag of {} cancelled", session.note_id());
                vec![GestureEffect::DragCancelled(session.note_id().clone())]
            }
            _ => Vec::new(),
        }
    }

    fn pointer_down<F>(
        &mut self,
        id: PointerId,
        kind: PointerKind,
        position: Point,
        target: HitTarget,
        viewport: &mut ViewportController,
        note_position: F,
    ) -> Vec<GestureEffect>
    where
        F: Fn(&NoteId) -> Option<Point>,
    {
        match self.mode() {
            GestureMode::Idle => {}
            // A second finger turns a touch pan into a pinch.
            GestureMode::BoardPan if kind == PointerKind::Touch && self.touches.len() == 2 => {
                self.start_pinch(viewport);
                return Vec::new();
            }
            // Everything else is ignored until the active gesture ends.
            _ => return Vec::new(),
        }

        if let HitTarget::Note(note_id) = &target {
            if let Some(note_pos) = note_position(note_id) {
                log::debug!("note-drag start on {note_id}");
                let session =
                    DragSession::start(note_id.clone(), note_pos, position, &viewport.space());
                self.active = Active::NoteDrag { pointer: id, session };
                return Vec::new();
            }
        }

        if kind == PointerKind::Touch && self.touches.len() == 2 {
            self.start_pinch(viewport);
        } else if target == HitTarget::Background {
            log::debug!("board-pan start at {position:?}");
            self.active = Active::BoardPan {
                pointer: id,
                anchor_client: position,
                anchor_scroll: viewport.scroll(),
                moved: false,
                drags: kind != PointerKind::Mouse,
            };
        }
        Vec::new()
    }

    fn start_pinch(&mut self, viewport: &ViewportController) {
        let [(a, pa), (b, pb)] = [self.touches[0], self.touches[1]];
        log::debug!("pinch-zoom start with touches {a} and {b}");
        self.active = Active::PinchZoom {
            pointers: [a, b],
            start_distance: (pb - pa).hypot(),
            start_scale: viewport.scale(),
            focal: pa.midpoint(pb),
        };
    }

    fn pointer_move(
        &mut self,
        id: PointerId,
        position: Point,
        viewport: &mut ViewportController,
        config: &BoardConfig,
    ) -> Vec<GestureEffect> {
        if let Active::PinchZoom {
            pointers,
            start_distance,
            start_scale,
            focal,
        } = self.active
        {
            if !pointers.contains(&id) {
                return Vec::new();
            }
            let (Some(pa), Some(pb)) = (self.touch(pointers[0]), self.touch(pointers[1])) else {
                return Vec::new();
            };
            let distance = (pb - pa).hypot();
            let start = if start_distance > 0.0 { start_distance } else { 1.0 };
            return if viewport.zoom_at(focal, start_scale * distance / start) {
                vec![GestureEffect::ViewportChanged]
            } else {
                Vec::new()
            };
        }

        match &mut self.active {
            Active::NoteDrag { pointer, session } if *pointer == id => {
                let position = session.update(position, &viewport.space(), config);
                vec![GestureEffect::NoteMoved {
                    note_id: session.note_id().clone(),
                    position,
                }]
            }
            Active::BoardPan {
                pointer,
                anchor_client,
                anchor_scroll,
                moved,
                drags,
            } if *pointer == id => {
                let travel = position - *anchor_client;
                if travel.hypot() > config.click_slop {
                    *moved = true;
                }
                if !*drags {
                    return Vec::new();
                }
                viewport.set_scroll(*anchor_scroll - travel);
                vec![GestureEffect::ViewportChanged]
            }
            _ => Vec::new(),
        }
    }

    fn touch(&self, id: PointerId) -> Option<Point> {
        self.touches.iter().find(|(t, _)| *t == id).map(|(_, p)| *p)
    }

    /// `position` is `None` for a cancel.
    fn pointer_up(
        &mut self,
        id: PointerId,
        position: Option<Point>,
        viewport: &mut ViewportController,
        config: &BoardConfig,
    ) -> Vec<GestureEffect> {
        let owns = match &self.active {
            Active::Idle => false,
            Active::NoteDrag { pointer, .. } | Active::BoardPan { pointer, .. } => *pointer == id,
            Active::PinchZoom { pointers, .. } => pointers.contains(&id),
        };
        if !owns {
            return Vec::new();
        }

        match std::mem::replace(&mut self.active, Active::Idle) {
            Active::NoteDrag { mut session, .. } => {
                let Some(position) = position else {
                    log::debug!("drag of {} cancelled by the host", session.note_id());
                    return vec![GestureEffect::DragCancelled(session.note_id().clone())];
                };
                session.update(position, &viewport.space(), config);
                match session.finish() {
                    DragOutcome::Click(note_id) => vec![GestureEffect::NoteClicked(note_id)],
                    DragOutcome::Moved { note_id, position } => {
                        log::debug!("note-drag end on {note_id} at {position:?}");
                        vec![GestureEffect::NoteDropped { note_id, position }]
                    }
                }
            }
            Active::BoardPan { moved, .. } if !moved && position.is_some() => {
                vec![GestureEffect::BackgroundClicked]
            }
            _ => Vec::new(),
        }
    }

    fn wheel(
        &mut self,
        position: Point,
        delta: Vec2,
        modifiers: Modifiers,
        viewport: &mut ViewportController,
        config: &BoardConfig,
    ) -> Vec<GestureEffect> {
        if matches!(
            self.active,
            Active::BoardPan { drags: true, .. } | Active::PinchZoom { .. }
        ) {
            return Vec::new();
        }

        let before = (viewport.scale(), viewport.scroll());
        if modifiers.zooms() {
            viewport.wheel_zoom(position, delta.y);
        } else {
            viewport.scroll_by(delta);
        }
        if before == (viewport.scale(), viewport.scroll()) {
            return Vec::new();
        }

        let mut effects = vec![GestureEffect::ViewportChanged];
        // Keep a dragged note under the pointer after the transform changed.
        if let Active::NoteDrag { session, .. } = &mut self.active {
            let position = session.refresh(&viewport.space(), config);
            effects.push(GestureEffect::NoteMoved {
                note_id: session.note_id().clone(),
                position,
            });
        }
        effects
    }
}
