//! The shared board as seen by one client.
//!
//! [`Board`] ties the pieces together: it routes pointer input, keeps the
//! latest snapshot from the store, overlays the live position of a note being
//! dragged, and publishes posts, moves and deletes through the injected
//! [`SyncAdapter`]. Store calls are queued as futures (see
//! [`Board::take_pending`]) and never awaited by the board itself.

use crate::composer::Composer;
use crate::config::BoardConfig;
use crate::gesture::{GestureEffect, GestureRouter, PointerEvent};
use crate::note::{AuthorId, NewNote, Note, NoteId, NotePatch};
use crate::placement::PlacementEngine;
use crate::sync::{BoxFuture, Subscription, SyncAdapter, SyncResult};
use crate::viewport::ViewportController;
use kurbo::Point;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// A queued store call. The host must drive these to completion.
pub type PendingTask = BoxFuture<'static, ()>;

/// Why a post was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PostError {
    #[error("Note text is empty")]
    EmptyText,
    #[error("Composer is not open")]
    NotComposing,
}

/// Why a delete was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeleteError {
    #[error("Only the author may delete note {0}")]
    NotAuthor(NoteId),
    #[error("Unknown note: {0}")]
    UnknownNote(NoteId),
}

/// Local state of the shared board for one client.
pub struct Board {
    config: BoardConfig,
    author: AuthorId,
    adapter: Rc<dyn SyncAdapter>,
    subscription: Subscription,
    /// Latest snapshot delivered by the store and not yet applied.
    inbox: Rc<RefCell<Option<Vec<Note>>>>,
    notes: Vec<Note>,
    viewport: ViewportController,
    router: GestureRouter,
    composer: Composer,
    selected: Option<NoteId>,
    has_posted: bool,
    pending: Vec<PendingTask>,
    rng: StdRng,
}

impl Board {
    /// Create a board and subscribe to `adapter`.
    pub fn new(config: BoardConfig, author: AuthorId, adapter: Rc<dyn SyncAdapter>) -> Self {
        Self::with_rng(config, author, adapter, StdRng::from_entropy())
    }

    /// Like [`new`](Self::new) with a caller-supplied placement RNG.
    pub fn with_rng(
        config: BoardConfig,
        author: AuthorId,
        adapter: Rc<dyn SyncAdapter>,
        rng: StdRng,
    ) -> Self {
        let inbox: Rc<RefCell<Option<Vec<Note>>>> = Rc::new(RefCell::new(None));
        let sink = inbox.clone();
        let subscription = adapter.subscribe(Box::new(move |notes| {
            // Only the newest snapshot matters.
            *sink.borrow_mut() = Some(notes.to_vec());
        }));

        let viewport = ViewportController::new(&config);
        let mut board = Self {
            config,
            author,
            adapter,
            subscription,
            inbox,
            notes: Vec::new(),
            viewport,
            router: GestureRouter::new(),
            composer: Composer::new(),
            selected: None,
            has_posted: false,
            pending: Vec::new(),
            rng,
        };
        board.poll_snapshots();
        board
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn author(&self) -> &AuthorId {
        &self.author
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportController {
        &mut self.viewport
    }

    pub fn router(&self) -> &GestureRouter {
        &self.router
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    /// Show the composer again (the floating post button).
    pub fn open_composer(&mut self) {
        self.composer.open();
    }

    /// Whether this client has posted at least once.
    pub fn has_posted(&self) -> bool {
        self.has_posted
    }

    /// Notes from the latest snapshot, in creation order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| &n.id == id)
    }

    /// Position to draw `note` at, including a drag in progress.
    pub fn display_position(&self, note: &Note) -> Point {
        match self.router.dragging() {
            Some((id, position)) if *id == note.id => position,
            _ => note.position,
        }
    }

    /// Notes paired with their display positions, in creation order.
    pub fn render_notes(&self) -> impl Iterator<Item = (&Note, Point)> {
        self.notes.iter().map(|n| (n, self.display_position(n)))
    }

    /// Note shown in the detail view, if any.
    pub fn selected_note(&self) -> Option<&Note> {
        self.selected.as_ref().and_then(|id| self.note(id))
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }

    /// Apply the newest snapshot delivered since the last call.
    /// Returns `true` if the note list was replaced.
    pub fn poll_snapshots(&mut self) -> bool {
        let snapshot = self.inbox.borrow_mut().take();
        match snapshot {
            Some(notes) => {
                self.apply_snapshot(notes);
                true
            }
            None => false,
        }
    }

    /// Replace local notes wholesale with `notes`.
    pub fn apply_snapshot(&mut self, notes: Vec<Note>) {
        log::debug!("applying snapshot with {} note(s)", notes.len());
        self.notes = notes;

        let vanished = self
            .router
            .dragging()
            .is_some_and(|(id, _)| self.note(id).is_none());
        if vanished {
            log::debug!("dragged note vanished from the snapshot");
            self.router.cancel();
        }
        if self.selected.as_ref().is_some_and(|id| self.note(id).is_none()) {
            self.selected = None;
        }
    }

    /// Route a pointer event. Returned effects tell the host what to redraw.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Vec<GestureEffect> {
        let notes = &self.notes;
        let effects = self.router.handle(event, &mut self.viewport, &self.config, |id| {
            notes.iter().find(|n| &n.id == id).map(|n| n.position)
        });

        for effect in &effects {
            match effect {
                GestureEffect::NoteDropped { note_id, position } => {
                    self.move_note(note_id, *position);
                }
                GestureEffect::NoteClicked(note_id) => {
                    self.selected = Some(note_id.clone());
                }
                GestureEffect::BackgroundClicked => {
                    self.selected = None;
                }
                GestureEffect::NoteMoved { .. }
                | GestureEffect::DragCancelled(_)
                | GestureEffect::ViewportChanged => {}
            }
        }
        effects
    }

    /// Post the composer's text as a new note. Returns the chosen position.
    pub fn post(&mut self) -> Result<Point, PostError> {
        if !self.composer.is_open() {
            return Err(PostError::NotComposing);
        }
        let text = self
            .composer
            .postable_text()
            .ok_or(PostError::EmptyText)?
            .to_string();

        let existing: Vec<Point> = self.notes.iter().map(|n| n.position).collect();
        let engine = PlacementEngine::new(&self.config);
        let visible = if self.viewport.is_live() {
            self.viewport.visible_region()
        } else {
            engine.default_region()
        };
        let placement = engine.place(&existing, visible, &mut self.rng);
        let position = placement.position();

        let note = NewNote {
            text,
            color: self.composer.color(),
            position,
            author_id: self.author.clone(),
        };
        log::info!("posting note at {position:?}");
        let task = self.adapter.create(note);
        self.dispatch("create note".to_string(), task);

        self.composer.finish();
        self.has_posted = true;
        Ok(position)
    }

    /// Publish a new position for a note. Any client may move any note.
    pub fn move_note(&mut self, id: &NoteId, position: Point) {
        let position = self.config.clamp_position(position);
        let task = self.adapter.update(id, NotePatch::position(position));
        self.dispatch(format!("move note {id}"), task);
    }

    /// Whether the delete action should be offered for `id`.
    pub fn can_delete(&self, id: &NoteId) -> bool {
        self.note(id).is_some_and(|n| n.is_authored_by(&self.author))
    }

    /// Delete a note this client authored.
    pub fn delete(&mut self, id: &NoteId) -> Result<(), DeleteError> {
        let note = self
            .note(id)
            .ok_or_else(|| DeleteError::UnknownNote(id.clone()))?;
        if !note.is_authored_by(&self.author) {
            return Err(DeleteError::NotAuthor(id.clone()));
        }
        let task = self.adapter.remove(id);
        self.dispatch(format!("delete note {id}"), task);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    /// Store calls queued since the last call, ready to be spawned by the host.
    pub fn take_pending(&mut self) -> Vec<PendingTask> {
        std::mem::take(&mut self.pending)
    }

    /// Detach from the store. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.router.cancel();
        if self.subscription.unsubscribe() {
            log::debug!("board unsubscribed from store");
        }
    }

    fn dispatch<T: 'static>(&mut self, what: String, task: BoxFuture<'static, SyncResult<T>>) {
        self.pending.push(Box::pin(async move {
            if let Err(e) = task.await {
                log::error!("{what} failed: {e}");
            }
        }));
    }
}

impl Drop for Board {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{HitTarget, PointerKind};
    use crate::note::NoteColor;
    use crate::placement::overlaps;
    use crate::sync::MemoryStore;
    use kurbo::{Rect, Size, Vec2};

    fn assert_close(a: Point, b: Point) {
        assert!((a - b).hypot() < 1e-9, "{a:?} != {b:?}");
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn board_for(store: &MemoryStore, author: &str, seed: u64) -> Board {
        let mut board = Board::with_rng(
            BoardConfig::default(),
            AuthorId::new(author),
            Rc::new(store.clone()),
            StdRng::seed_from_u64(seed),
        );
        board
            .viewport_mut()
            .set_viewport(Point::ZERO, Size::new(1200.0, 800.0));
        board
    }

    fn run_pending(board: &mut Board) {
        for task in board.take_pending() {
            pollster::block_on(task);
        }
        board.poll_snapshots();
    }

    fn post(board: &mut Board, text: &str) -> Point {
        board.open_composer();
        board.composer_mut().set_text(text);
        let position = board.post().unwrap();
        run_pending(board);
        position
    }

    fn mouse(
        board: &mut Board,
        events: &[(char, f64, f64)],
        target: HitTarget,
    ) -> Vec<GestureEffect> {
        let mut effects = Vec::new();
        for &(kind, x, y) in events {
            let position = Point::new(x, y);
            let event = match kind {
                'd' => PointerEvent::Down {
                    id: 0,
                    kind: PointerKind::Mouse,
                    position,
                    target: target.clone(),
                },
                'm' => PointerEvent::Move { id: 0, position },
                _ => PointerEvent::Up { id: 0, position },
            };
            effects.extend(board.handle_pointer(event));
        }
        effects
    }

    #[test]
    fn test_empty_text_makes_no_store_call() {
        let store = MemoryStore::new();
        let mut board = board_for(&store, "alice", 1);
        board.composer_mut().set_text("   ");
        assert_eq!(board.post(), Err(PostError::EmptyText));
        assert!(board.take_pending().is_empty());
        assert!(board.composer().is_open());
    }

    #[test]
    fn test_post_requires_open_composer() {
        let store = MemoryStore::new();
        let mut board = board_for(&store, "alice", 1);
        board.composer_mut().set_text("hi");
        board.composer_mut().close();
        assert_eq!(board.post(), Err(PostError::NotComposing));
    }

    #[test]
    fn test_post_roundtrip() {
        init_logging();
        let store = MemoryStore::new();
        let mut board = board_for(&store, "alice", 2);
        board.composer_mut().set_text("  buy milk ");
        board.composer_mut().set_color(NoteColor::Yellow);
        let position = board.post().unwrap();

        // Not published until the host drives the queued call.
        assert!(board.notes().is_empty());
        assert!(!board.composer().is_open());
        assert_eq!(board.composer().color(), NoteColor::LightBlue);
        assert!(board.has_posted());

        run_pending(&mut board);
        let note = &board.notes()[0];
        assert_eq!(note.text, "buy milk");
        assert_eq!(note.color, NoteColor::Yellow);
        assert_eq!(note.position, position);
        assert_eq!(note.author_id, AuthorId::new("alice"));
    }

    #[test]
    fn test_post_without_viewport_uses_centered_region() {
        let store = MemoryStore::new();
        let mut board = Board::with_rng(
            BoardConfig::default(),
            AuthorId::new("alice"),
            Rc::new(store.clone()),
            StdRng::seed_from_u64(4),
        );
        assert!(!board.viewport().is_live());

        let engine = PlacementEngine::new(board.config());
        let search = engine.search_region(engine.default_region());
        assert_eq!(search, Rect::new(1100.0, 800.0, 2900.0, 2200.0));
        for i in 0..5 {
            let position = post(&mut board, &format!("note {i}"));
            assert!(search.contains(position), "{position:?} outside {search:?}");
        }
    }

    #[test]
    fn test_posts_do_not_overlap() {
        let store = MemoryStore::new();
        let mut board = board_for(&store, "alice", 3);
        board
            .viewport_mut()
            .set_viewport(Point::ZERO, Size::new(3000.0, 2200.0));
        for i in 0..6 {
            post(&mut board, &format!("note {i}"));
        }
        let config = board.config().clone();
        let positions: Vec<Point> = board.notes().iter().map(|n| n.position).collect();
        assert_eq!(positions.len(), 6);
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert!(!overlaps(*a, *b, config.note_size, config.collision_padding));
            }
        }
    }

    #[test]
    fn test_placement_scenario_from_viewport() {
        let store = MemoryStore::new();
        for p in [(100.0, 100.0), (400.0, 100.0), (700.0, 100.0)] {
            pollster::block_on(store.create(NewNote {
                text: "x".into(),
                color: NoteColor::Pink,
                position: Point::new(p.0, p.1),
                author_id: AuthorId::new("seed"),
            }))
            .unwrap();
        }

        let mut board = board_for(&store, "alice", 11);
        assert_eq!(board.viewport().visible_region(), Rect::new(0.0, 0.0, 1200.0, 800.0));
        let position = post(&mut board, "mine");
        let rect = board.config().note_rect(position);
        for other in &board.notes()[..3] {
            let padded = board.config().note_rect(other.position).inflate(40.0, 40.0);
            assert_eq!(rect.intersect(padded).area(), 0.0);
        }
    }

    #[test]
    fn test_drag_commits_single_update() {
        let store = MemoryStore::new();
        let mut board = board_for(&store, "alice", 4);
        let start = post(&mut board, "drag me");
        let id = board.notes()[0].id.clone();

        let grab = board.viewport().to_screen(start + Vec2::new(20.0, 20.0));
        let effects = mouse(
            &mut board,
            &[
                ('d', grab.x, grab.y),
                ('m', grab.x + 30.0, grab.y),
                ('m', grab.x + 60.0, grab.y + 10.0),
            ],
            HitTarget::Note(id.clone()),
        );
        assert_eq!(effects.len(), 2);
        // The live position overlays the stored one while dragging.
        let note = board.note(&id).unwrap().clone();
        assert_eq!(note.position, start);
        assert_close(board.display_position(&note), start + Vec2::new(60.0, 10.0));
        assert!(board.take_pending().is_empty());

        mouse(&mut board, &[('u', grab.x + 60.0, grab.y + 10.0)], HitTarget::Background);
        let pending = board.take_pending();
        assert_eq!(pending.len(), 1);
        for task in pending {
            pollster::block_on(task);
        }
        board.poll_snapshots();
        assert_close(board.notes()[0].position, start + Vec2::new(60.0, 10.0));
    }

    #[test]
    fn test_click_opens_detail_and_background_closes() {
        let store = MemoryStore::new();
        let mut board = board_for(&store, "alice", 5);
        let at = post(&mut board, "read me");
        let id = board.notes()[0].id.clone();
        let p = board.viewport().to_screen(at + Vec2::new(5.0, 5.0));

        mouse(&mut board, &[('d', p.x, p.y), ('u', p.x, p.y)], HitTarget::Note(id.clone()));
        assert_eq!(board.selected_note().map(|n| &n.id), Some(&id));
        assert!(board.take_pending().is_empty());

        mouse(&mut board, &[('d', 5.0, 5.0), ('u', 5.0, 5.0)], HitTarget::Background);
        assert!(board.selected_note().is_none());
    }

    #[test]
    fn test_delete_gated_by_author() {
        let store = MemoryStore::new();
        let mut alice = board_for(&store, "alice", 6);
        let mut bob = board_for(&store, "bob", 7);
        post(&mut alice, "alice's");
        bob.poll_snapshots();
        let id = bob.notes()[0].id.clone();

        assert!(!bob.can_delete(&id));
        assert_eq!(bob.delete(&id), Err(DeleteError::NotAuthor(id.clone())));
        assert!(bob.take_pending().is_empty());

        assert!(alice.can_delete(&id));
        alice.delete(&id).unwrap();
        run_pending(&mut alice);
        bob.poll_snapshots();
        assert!(alice.notes().is_empty());
        assert!(bob.notes().is_empty());
        assert_eq!(bob.delete(&id), Err(DeleteError::UnknownNote(id.clone())));
    }

    #[test]
    fn test_any_client_may_move() {
        let store = MemoryStore::new();
        let mut alice = board_for(&store, "alice", 8);
        let mut bob = board_for(&store, "bob", 9);
        post(&mut alice, "shared");
        bob.poll_snapshots();
        let id = bob.notes()[0].id.clone();
        bob.move_note(&id, Point::new(900.0, 900.0));
        run_pending(&mut bob);
        alice.poll_snapshots();
        assert_eq!(alice.notes()[0].position, Point::new(900.0, 900.0));
    }

    #[test]
    fn test_snapshot_removal_cancels_drag() {
        let store = MemoryStore::new();
        let mut board = board_for(&store, "alice", 10);
        let at = post(&mut board, "doomed");
        let id = board.notes()[0].id.clone();
        let p = board.viewport().to_screen(at);
        mouse(&mut board, &[('d', p.x, p.y), ('m', p.x + 50.0, p.y)], HitTarget::Note(id.clone()));
        assert!(board.router().dragging().is_some());

        pollster::block_on(store.remove(&id)).unwrap();
        board.poll_snapshots();
        assert!(board.router().dragging().is_none());
        mouse(&mut board, &[('u', p.x + 50.0, p.y)], HitTarget::Background);
        assert!(board.take_pending().is_empty());
    }

    #[test]
    fn test_store_failure_is_only_logged() {
        init_logging();
        let store = MemoryStore::new();
        let mut board = board_for(&store, "alice", 12);
        store.set_offline(true);
        board.composer_mut().set_text("lost");
        assert!(board.post().is_ok());
        run_pending(&mut board);
        assert!(board.notes().is_empty());
        assert!(!board.composer().is_open());
    }

    #[test]
    fn test_shutdown_unsubscribes_once() {
        let store = MemoryStore::new();
        let mut board = board_for(&store, "alice", 13);
        assert_eq!(store.subscriber_count(), 1);
        board.shutdown();
        board.shutdown();
        assert_eq!(store.subscriber_count(), 0);
        drop(board);
        assert_eq!(store.subscriber_count(), 0);
    }
}
