//! Contract with the external document store.
//!
//! The store owns the notes. The board publishes changes through
//! [`SyncAdapter`] and receives full, `created_at`-ordered snapshots through a
//! subscription. There is no incremental merge: each snapshot replaces the
//! previous one.

mod memory;

pub use memory::MemoryStore;

use crate::note::{NewNote, Note, NoteId, NotePatch};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Store errors. The board only logs them.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Note not found: {0}")]
    NotFound(NoteId),
    #[error("Write rejected: {0}")]
    Rejected(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Boxed future for store operations. Not `Send`: the board is single-threaded.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Receives every snapshot, oldest note first.
pub type SnapshotCallback = Box<dyn FnMut(&[Note])>;

/// Operations the board needs from a document store.
///
/// Mutations return `'static` futures so the board can queue them and carry
/// on without waiting; the host decides where they run.
pub trait SyncAdapter {
    /// Store a new note. Resolves to the assigned id.
    fn create(&self, note: NewNote) -> BoxFuture<'static, SyncResult<NoteId>>;

    /// Merge `patch` into an existing note.
    fn update(&self, id: &NoteId, patch: NotePatch) -> BoxFuture<'static, SyncResult<()>>;

    /// Delete a note.
    fn remove(&self, id: &NoteId) -> BoxFuture<'static, SyncResult<()>>;

    /// Call `callback` now with the current notes and again after every change.
    fn subscribe(&self, callback: SnapshotCallback) -> Subscription;
}

/// Handle that detaches a snapshot callback.
///
/// Detaching happens at most once, either through
/// [`unsubscribe`](Self::unsubscribe) or on drop.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.detach.is_some()
    }

    /// Detach the callback. Returns `false` if it was already detached.
    pub fn unsubscribe(&mut self) -> bool {
        match self.detach.take() {
            Some(detach) => {
                detach();
                true
            }
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
