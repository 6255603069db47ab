//! PegBoard Core Library
//!
//! Interactive surface engine for a shared, pannable and zoomable board of
//! sticky notes: coordinate math, gesture routing, note placement and
//! reconciliation with an external document store.

pub mod board;
pub mod composer;
pub mod config;
pub mod coords;
pub mod drag;
pub mod gesture;
pub mod identity;
pub mod note;
pub mod placement;
pub mod sync;
pub mod viewport;

pub use board::{Board, DeleteError, PendingTask, PostError};
pub use composer::Composer;
pub use config::{BoardConfig, ConfigError};
pub use coords::CoordinateSpace;
pub use drag::{DragOutcome, DragSession};
pub use gesture::{
    GestureEffect, GestureMode, GestureRouter, HitTarget, Modifiers, PointerEvent, PointerId,
    PointerKind,
};
pub use identity::IdentityError;
pub use note::{AuthorId, NewNote, Note, NoteColor, NoteId, NotePatch};
pub use placement::{Placement, PlacementEngine};
pub use sync::{MemoryStore, Subscription, SyncAdapter, SyncError, SyncResult};
pub use viewport::ViewportController;
