//! In-process document store.

use super::{BoxFuture, SnapshotCallback, Subscription, SyncAdapter, SyncError, SyncResult};
use crate::note::{NewNote, Note, NoteId, NotePatch};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    notes: Vec<Note>,
    next_created_at: u64,
    subscribers: Vec<(u64, Rc<RefCell<SnapshotCallback>>)>,
    next_subscriber: u64,
    offline: bool,
    /// A delivery loop is running further up the stack.
    notifying: bool,
    /// The notes changed since the last snapshot was taken for delivery.
    dirty: bool,
}

impl Inner {
    fn snapshot(&self) -> Vec<Note> {
        let mut notes = self.notes.clone();
        notes.sort_by_key(|n| n.created_at);
        notes
    }

    fn check_online(&self) -> SyncResult<()> {
        if self.offline {
            Err(SyncError::Unavailable("memory store is offline".into()))
        } else {
            Ok(())
        }
    }
}

/// A [`SyncAdapter`] that keeps notes in memory and notifies subscribers synchronously.
///
/// Clones share the same notes, so one instance can stand in for several clients.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail with [`SyncError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.borrow_mut().offline = offline;
    }

    /// Current notes in creation order.
    pub fn notes(&self) -> Vec<Note> {
        self.inner.borrow().snapshot()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Deliver the latest snapshot to every subscriber.
    ///
    /// Writes made from inside a callback mark the store dirty and are
    /// delivered by the outermost call once the current round finishes.
    fn notify(inner: &Rc<RefCell<Inner>>) {
        {
            let mut guard = inner.borrow_mut();
            guard.dirty = true;
            if guard.notifying {
                return;
            }
            guard.notifying = true;
        }

        loop {
            let (snapshot, keys) = {
                let mut guard = inner.borrow_mut();
                if !guard.dirty {
                    guard.notifying = false;
                    return;
                }
                guard.dirty = false;
                let keys: Vec<u64> = guard.subscribers.iter().map(|(k, _)| *k).collect();
                (guard.snapshot(), keys)
            };

            for key in keys {
                // Skips subscribers detached earlier in this round.
                let callback = inner
                    .borrow()
                    .subscribers
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, cb)| cb.clone());
                if let Some(callback) = callback {
                    // A callback never re-enters itself.
                    if let Ok(mut callback) = callback.try_borrow_mut() {
                        (*callback)(&snapshot);
                    }
                }
            }
        }
    }
}

impl SyncAdapter for MemoryStore {
    fn create(&self, note: NewNote) -> BoxFuture<'static, SyncResult<NoteId>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let id = {
                let mut guard = inner.borrow_mut();
                guard.check_online()?;
                let id = NoteId::new(Uuid::new_v4().simple().to_string());
                let created_at = guard.next_created_at;
                guard.next_created_at += 1;
                guard.notes.push(note.into_note(id.clone(), created_at));
                id
            };
            Self::notify(&inner);
            Ok(id)
        })
    }

    fn update(&self, id: &NoteId, patch: NotePatch) -> BoxFuture<'static, SyncResult<()>> {
        let inner = self.inner.clone();
        let id = id.clone();
        Box::pin(async move {
            {
                let mut guard = inner.borrow_mut();
                guard.check_online()?;
                let note = guard
                    .notes
                    .iter_mut()
                    .find(|n| n.id == id)
                    .ok_or(SyncError::NotFound(id))?;
                patch.apply_to(note);
            }
            Self::notify(&inner);
            Ok(())
        })
    }

    fn remove(&self, id: &NoteId) -> BoxFuture<'static, SyncResult<()>> {
        let inner = self.inner.clone();
        let id = id.clone();
        Box::pin(async move {
            {
                let mut guard = inner.borrow_mut();
                guard.check_online()?;
                let before = guard.notes.len();
                guard.notes.retain(|n| n.id != id);
                if guard.notes.len() == before {
                    return Err(SyncError::NotFound(id));
                }
            }
            Self::notify(&inner);
            Ok(())
        })
    }

    fn subscribe(&self, mut callback: SnapshotCallback) -> Subscription {
        let snapshot = self.inner.borrow().snapshot();
        callback(&snapshot);

        let key = {
            let mut guard = self.inner.borrow_mut();
            let key = guard.next_subscriber;
            guard.next_subscriber += 1;
            guard.subscribers.push((key, Rc::new(RefCell::new(callback))));
            key
        };

        let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subscribers.retain(|(k, _)| *k != key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{AuthorId, NoteColor};
    use kurbo::Point;
    use pollster::block_on;
    use std::cell::RefCell;

    fn new_note(text: &str) -> NewNote {
        NewNote {
            text: text.into(),
            color: NoteColor::Pink,
            position: Point::new(100.0, 100.0),
            author_id: AuthorId::new("alice"),
        }
    }

    fn recorder(store: &MemoryStore) -> (Rc<RefCell<Vec<Vec<Note>>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let sub = store.subscribe(Box::new(move |notes| sink.borrow_mut().push(notes.to_vec())));
        (seen, sub)
    }

    #[test]
    fn test_subscribe_delivers_immediately() {
        let store = MemoryStore::new();
        let (seen, _sub) = recorder(&store);
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].is_empty());
    }

    #[test]
    fn test_create_assigns_ids_in_order() {
        let store = MemoryStore::new();
        let (seen, _sub) = recorder(&store);
        let first = block_on(store.create(new_note("one"))).unwrap();
        let second = block_on(store.create(new_note("two"))).unwrap();
        assert_ne!(first, second);

        let last = seen.borrow().last().cloned().unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].id, first);
        assert!(last[0].created_at < last[1].created_at);
    }

    #[test]
    fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let id = block_on(store.create(new_note("one"))).unwrap();
        block_on(store.update(&id, NotePatch::position(Point::new(7.0, 8.0)))).unwrap();
        let note = &store.notes()[0];
        assert_eq!(note.position, Point::new(7.0, 8.0));
        assert_eq!(note.text, "one");
        assert_eq!(note.color, NoteColor::Pink);
    }

    #[test]
    fn test_missing_note_errors() {
        let store = MemoryStore::new();
        let missing = NoteId::new("missing");
        assert!(matches!(
            block_on(store.update(&missing, NotePatch::default())),
            Err(SyncError::NotFound(_))
        ));
        assert!(matches!(block_on(store.remove(&missing)), Err(SyncError::NotFound(_))));
    }

    #[test]
    fn test_offline_rejects_writes() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(matches!(
            block_on(store.create(new_note("x"))),
            Err(SyncError::Unavailable(_))
        ));
        assert!(store.notes().is_empty());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let store = MemoryStore::new();
        let (seen, mut sub) = recorder(&store);
        assert_eq!(store.subscriber_count(), 1);
        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        assert_eq!(store.subscriber_count(), 0);
        block_on(store.create(new_note("late"))).unwrap();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_unsubscribe_from_inside_callback() {
        let store = MemoryStore::new();
        let calls = Rc::new(RefCell::new(0));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let counter = calls.clone();
        let handle = slot.clone();
        let sub = store.subscribe(Box::new(move |_| {
            *counter.borrow_mut() += 1;
            if *counter.borrow() == 2 {
                let mut sub = handle.borrow_mut().take().unwrap();
                assert!(sub.unsubscribe());
            }
        }));
        *slot.borrow_mut() = Some(sub);

        block_on(store.create(new_note("one"))).unwrap();
        assert_eq!(store.subscriber_count(), 0);
        block_on(store.create(new_note("two"))).unwrap();
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn test_write_inside_callback_reaches_every_subscriber() {
        let store = MemoryStore::new();
        let writer = store.clone();
        let sub_a = store.subscribe(Box::new(move |notes| {
            if notes.len() == 1 {
                block_on(writer.create(new_note("reply"))).unwrap();
            }
        }));
        let (seen, _sub_b) = recorder(&store);

        block_on(store.create(new_note("first"))).unwrap();
        assert_eq!(store.notes().len(), 2);
        let last = seen.borrow().last().cloned().unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[1].text, "reply");

        // Breaks the store -> callback -> store cycle.
        drop(sub_a);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn test_remove() {
        let store = MemoryStore::new();
        let id = block_on(store.create(new_note("gone"))).unwrap();
        block_on(store.remove(&id)).unwrap();
        assert!(store.notes().is_empty());
    }
}
