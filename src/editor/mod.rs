//! In-memory text editor host.
//!
//! Provides a rope-backed text buffer and an editor pane item that
//! implements the [`crate::host`] contracts, for tests and the preview CLI.

mod buffer;
mod text_editor;

use std::sync::atomic::{AtomicU64, Ordering};

pub use buffer::{Point, TextBuffer};
pub use text_editor::{Editor, EditorError, UNTITLED};

use crate::host::ItemId;

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique pane item id.
pub fn next_item_id() -> ItemId {
    NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed)
}
