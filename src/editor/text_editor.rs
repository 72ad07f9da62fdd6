use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use regex::Regex;
use thiserror::Error;

use super::buffer::{Point, TextBuffer};
use crate::event::{Emitter, Subscription};
use crate::host::{
    BufferLines, ItemId, PaneItem, ScanControl, ScanMatch, TextEditor, TitleAccessors,
};

/// Native label for a buffer that has never been saved.
pub const UNTITLED: &str = "untitled";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("editor {0} has been destroyed")]
    Destroyed(ItemId),
    #[error("failed to save {path}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An in-memory text editor pane item.
///
/// Title accessors are swappable. The ones installed at construction are
/// the editor's native titles: the file name once saved, `untitled` before.
pub struct Editor {
    id: ItemId,
    buffer: RefCell<TextBuffer>,
    cursor: Cell<Point>,
    accessors: RefCell<TitleAccessors>,
    destroyed: Cell<bool>,
    did_change: Emitter<()>,
    did_change_path: Emitter<()>,
    did_change_title: Emitter<String>,
    did_destroy: Emitter<()>,
}

impl Editor {
    /// Open an unsaved editor holding `text`.
    pub fn new(text: &str) -> Rc<Self> {
        Self::with_buffer(TextBuffer::from_text(text))
    }

    /// Open an editor for the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Rc<Self>> {
        let path = path.as_ref();
        let mut buffer = TextBuffer::from_text(&fs::read_to_string(path)?);
        buffer.set_path(Some(path.to_path_buf()));
        Ok(Self::with_buffer(buffer))
    }

    pub fn with_buffer(buffer: TextBuffer) -> Rc<Self> {
        Rc::new_cyclic(|me: &Weak<Self>| {
            let short = Weak::clone(me);
            let long = Weak::clone(me);
            Self {
                id: super::next_item_id(),
                buffer: RefCell::new(buffer),
                cursor: Cell::new(Point::default()),
                accessors: RefCell::new(TitleAccessors::new(
                    Rc::new(move || short.upgrade().map_or_else(String::new, |e| e.native_title())),
                    Some(Rc::new(move || {
                        long.upgrade()
                            .map_or_else(String::new, |e| e.native_long_title())
                    })),
                )),
                destroyed: Cell::new(false),
                did_change: Emitter::new(),
                did_change_path: Emitter::new(),
                did_change_title: Emitter::new(),
                did_destroy: Emitter::new(),
            }
        })
    }

    /// File name once saved, `untitled` before.
    pub fn native_title(&self) -> String {
        self.buffer
            .borrow()
            .path()
            .and_then(Path::file_name)
            .map_or_else(|| UNTITLED.to_string(), |name| name.to_string_lossy().into_owned())
    }

    /// File name and parent directory once saved, `untitled` before.
    pub fn native_long_title(&self) -> String {
        let buffer = self.buffer.borrow();
        let Some(path) = buffer.path() else {
            return UNTITLED.to_string();
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => format!("{name} \u{2014} {}", dir.display()),
            None => name,
        }
    }

    pub fn text(&self) -> String {
        self.buffer.borrow().text()
    }

    pub fn cursor(&self) -> Point {
        self.cursor.get()
    }

    pub fn set_cursor(&self, row: usize, column: usize) {
        let clipped = self.buffer.borrow().clip(Point::new(row, column));
        self.cursor.set(clipped);
    }

    /// Replace the whole buffer content.
    pub fn set_text(&self, text: &str) {
        if self.destroyed.get() {
            return;
        }
        self.buffer.borrow_mut().set_text(text);
        self.cursor.set(Point::default());
        self.did_change.emit(&());
    }

    /// Insert `text` at the cursor and move the cursor past it.
    pub fn insert_text(&self, text: &str) {
        if self.destroyed.get() || text.is_empty() {
            return;
        }
        let end = self.buffer.borrow_mut().insert(self.cursor.get(), text);
        self.cursor.set(end);
        self.did_change.emit(&());
    }

    /// Delete the text between two points.
    pub fn delete(&self, start: Point, end: Point) {
        if self.destroyed.get() {
            return;
        }
        self.buffer.borrow_mut().delete(start, end);
        let cursor = self.buffer.borrow().clip(self.cursor.get());
        self.cursor.set(cursor);
        self.did_change.emit(&());
    }

    /// Write the buffer to `path` and bind the buffer to it.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<(), EditorError> {
        if self.destroyed.get() {
            return Err(EditorError::Destroyed(self.id));
        }
        let path = path.as_ref().to_path_buf();
        let text = self.text();
        fs::write(&path, text).map_err(|source| EditorError::Save {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(item = self.id, path = %path.display(), "buffer saved");
        self.set_path(Some(path));
        Ok(())
    }

    /// Rebind (or unbind) the buffer's path without touching disk.
    pub fn set_path(&self, path: Option<PathBuf>) {
        if self.destroyed.get() {
            return;
        }
        {
            let mut buffer = self.buffer.borrow_mut();
            if buffer.path() == path.as_deref() {
                return;
            }
            buffer.set_path(path);
        }
        self.did_change_path.emit(&());
        self.emit_did_change_title();
    }

    /// Close the editor. Destroy listeners run once, then every emitter is
    /// cleared.
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.did_destroy.emit(&());
        self.did_change.clear();
        self.did_change_path.clear();
        self.did_change_title.clear();
        self.did_destroy.clear();
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("id", &self.id)
            .field("path", &self.buffer.borrow().path())
            .field("destroyed", &self.destroyed.get())
            .finish_non_exhaustive()
    }
}

impl PaneItem for Editor {
    fn item_id(&self) -> ItemId {
        self.id
    }

    fn title(&self) -> String {
        let short = Rc::clone(&self.accessors.borrow().short);
        short()
    }

    fn long_title(&self) -> String {
        let accessors = self.accessors.borrow().clone();
        accessors.long.map_or_else(|| (accessors.short)(), |long| long())
    }

    fn title_accessors(&self) -> TitleAccessors {
        self.accessors.borrow().clone()
    }

    fn replace_title_accessors(&self, accessors: TitleAccessors) -> TitleAccessors {
        self.accessors.replace(accessors)
    }

    fn emit_did_change_title(&self) {
        let title = self.title();
        self.did_change_title.emit(&title);
    }

    fn on_did_change_title(&self, callback: Box<dyn Fn(&str)>) -> Subscription {
        self.did_change_title
            .subscribe(move |title: &String| callback(title))
    }

    fn on_did_destroy(&self, callback: Box<dyn Fn()>) -> Subscription {
        self.did_destroy.subscribe(move |_: &()| callback())
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn as_text_editor(self: Rc<Self>) -> Option<Rc<dyn TextEditor>> {
        Some(self)
    }
}

impl BufferLines for Editor {
    fn line_for_row(&self, row: usize) -> Option<String> {
        self.buffer.borrow().line_at(row)
    }

    fn scan(&self, pattern: &Regex, on_match: &mut dyn FnMut(ScanMatch) -> ScanControl) {
        self.buffer.borrow().scan(pattern, on_match);
    }
}

impl TextEditor for Editor {
    fn has_buffer(&self) -> bool {
        true
    }

    fn buffer_path(&self) -> Option<PathBuf> {
        self.buffer.borrow().path().map(Path::to_path_buf)
    }

    fn on_did_change_path(&self, callback: Box<dyn Fn()>) -> Subscription {
        self.did_change_path.subscribe(move |_: &()| callback())
    }

    fn on_did_change(&self, callback: Box<dyn Fn()>) -> Subscription {
        self.did_change.subscribe(move |_: &()| callback())
    }

    fn into_pane_item(self: Rc<Self>) -> Rc<dyn PaneItem> {
        self
    }
}
