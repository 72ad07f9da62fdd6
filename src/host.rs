//! Contracts between the title feature and the editor host.
//!
//! The host owns pane items, buffers, the workspace and the configuration
//! store. The feature only talks to them through these traits, so any editor
//! shell can plug in. [`crate::editor`] and [`crate::workspace`] provide an
//! in-memory host.

use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use regex::Regex;

use crate::config::{ConfigKey, ConfigValue};
use crate::event::Subscription;

/// Stable identity of a pane item for as long as the host keeps it open.
pub type ItemId = u64;

/// A title accessor, as invoked by the host's tab and window renderers.
pub type TitleFn = Rc<dyn Fn() -> String>;

/// The pair of title accessors a pane item answers `title()` and
/// `long_title()` with.
///
/// `long` is optional: items without a distinct long title fall back to
/// `short`.
#[derive(Clone)]
pub struct TitleAccessors {
    pub short: TitleFn,
    pub long: Option<TitleFn>,
}

impl TitleAccessors {
    pub fn new(short: TitleFn, long: Option<TitleFn>) -> Self {
        Self { short, long }
    }

    /// Accessors that always answer with `title`.
    pub fn fixed(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            short: Rc::new(move || title.clone()),
            long: None,
        }
    }

    /// Whether both accessors are the very same closures as `other`'s.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        let long_eq = match (&self.long, &other.long) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        Rc::ptr_eq(&self.short, &other.short) && long_eq
    }
}

impl fmt::Debug for TitleAccessors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TitleAccessors")
            .field("long", &self.long.is_some())
            .finish_non_exhaustive()
    }
}

/// Whether a buffer scan should keep going after a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

/// A single match reported by [`BufferLines::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanMatch {
    /// Zero-based row of the match.
    pub row: usize,
    /// Byte offset of the match start within the row.
    pub start: usize,
    /// Byte offset of the match end within the row.
    pub end: usize,
}

/// Read access to buffer lines.
pub trait BufferLines {
    /// Text of `row` without its line terminator, or `None` past the end.
    fn line_for_row(&self, row: usize) -> Option<String>;

    /// Report matches of `pattern` in row order until `on_match` returns
    /// [`ScanControl::Stop`] or the buffer ends.
    fn scan(&self, pattern: &Regex, on_match: &mut dyn FnMut(ScanMatch) -> ScanControl);
}

/// An item shown in a pane: text editors, settings views, images...
pub trait PaneItem {
    fn item_id(&self) -> ItemId;

    /// Short title, as the tab renderer asks for it.
    fn title(&self) -> String;

    /// Long title, as the window title renderer asks for it.
    fn long_title(&self) -> String;

    /// The accessors currently answering [`title`](Self::title) and
    /// [`long_title`](Self::long_title).
    fn title_accessors(&self) -> TitleAccessors;

    /// Swap in new accessors, returning the previous ones.
    fn replace_title_accessors(&self, accessors: TitleAccessors) -> TitleAccessors;

    /// Fire `did-change-title` with the current title.
    fn emit_did_change_title(&self);

    fn on_did_change_title(&self, callback: Box<dyn Fn(&str)>) -> Subscription;

    fn on_did_destroy(&self, callback: Box<dyn Fn()>) -> Subscription;

    /// Once true, destroy listeners never fire again.
    fn is_destroyed(&self) -> bool;

    /// This item as a text editor, if it is one.
    fn as_text_editor(self: Rc<Self>) -> Option<Rc<dyn TextEditor>>;
}

/// A pane item that edits a text buffer.
pub trait TextEditor: PaneItem + BufferLines {
    fn has_buffer(&self) -> bool;

    /// Filesystem path the buffer is bound to; `None` until first saved.
    fn buffer_path(&self) -> Option<PathBuf>;

    fn on_did_change_path(&self, callback: Box<dyn Fn()>) -> Subscription;

    fn on_did_change(&self, callback: Box<dyn Fn()>) -> Subscription;

    /// This editor viewed as a plain pane item.
    fn into_pane_item(self: Rc<Self>) -> Rc<dyn PaneItem>;
}

/// The host workspace: every open pane item and which one is active.
pub trait Workspace {
    /// Call `callback` for every open text editor now and for each one
    /// opened later, until the subscription is disposed.
    fn observe_text_editors(&self, callback: Rc<dyn Fn(Rc<dyn TextEditor>)>) -> Subscription;

    fn pane_items(&self) -> Vec<Rc<dyn PaneItem>>;

    fn active_text_editor(&self) -> Option<Rc<dyn TextEditor>>;

    /// Re-run the host's active-item bookkeeping for `item`.
    fn did_change_active_pane_item(&self, item: Rc<dyn PaneItem>);
}

/// Key/value settings with change notification.
pub trait ConfigStore {
    fn get(&self, key: ConfigKey) -> Option<ConfigValue>;

    /// `callback` receives the new value (`None` when unset).
    fn on_did_change(
        &self,
        key: ConfigKey,
        callback: Box<dyn Fn(Option<&ConfigValue>)>,
    ) -> Subscription;
}

/// An item is temporary when it has a buffer that is not bound to a file.
pub fn is_temporary(editor: &dyn TextEditor) -> bool {
    editor.has_buffer() && editor.buffer_path().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_accessors_answer_constant_title() {
        let accessors = TitleAccessors::fixed("Settings");
        assert_eq!((accessors.short)(), "Settings");
        assert!(accessors.long.is_none());
    }

    #[test]
    fn test_ptr_eq_tracks_identity_not_output() {
        let a = TitleAccessors::fixed("same");
        let b = TitleAccessors::fixed("same");
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));

        let with_long = TitleAccessors::new(Rc::clone(&a.short), Some(Rc::clone(&b.short)));
        assert!(!a.ptr_eq(&with_long));
    }
}
