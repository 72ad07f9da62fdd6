//! Per-editor title tracking.
//!
//! Each open text editor gets one [`EditorState`], kept in an
//! [`EditorStateCache`] keyed by item id. The state remembers the last title
//! it saw and only prods the host to redraw when a content or path change
//! actually produces a different title.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::config::SharedConfig;
use crate::event::CompositeSubscription;
use crate::host::{ItemId, TextEditor, is_temporary};
use crate::title::compute_title;

type Entries = RefCell<HashMap<ItemId, Rc<EditorState>>>;

/// Title bookkeeping for one editor. Holds the editor weakly.
pub struct EditorState {
    id: ItemId,
    editor: Weak<dyn TextEditor>,
    config: SharedConfig,
    last_title: RefCell<String>,
    subscriptions: RefCell<CompositeSubscription>,
}

impl EditorState {
    fn attach(editor: &Rc<dyn TextEditor>, config: SharedConfig, entries: Weak<Entries>) -> Rc<Self> {
        let id = editor.item_id();
        let baseline = compute_title(&**editor, &config.borrow());
        let state = Rc::new(Self {
            id,
            editor: Rc::downgrade(editor),
            config,
            last_title: RefCell::new(baseline),
            subscriptions: RefCell::new(CompositeSubscription::new()),
        });

        let mut subscriptions = CompositeSubscription::new();
        let on_path = Rc::downgrade(&state);
        subscriptions.add(editor.on_did_change_path(Box::new(move || {
            if let Some(state) = on_path.upgrade() {
                state.dispatch();
            }
        })));
        let on_change = Rc::downgrade(&state);
        subscriptions.add(editor.on_did_change(Box::new(move || {
            if let Some(state) = on_change.upgrade() {
                state.dispatch();
            }
        })));
        let on_destroy = Rc::downgrade(&state);
        subscriptions.add(editor.on_did_destroy(Box::new(move || {
            let Some(state) = on_destroy.upgrade() else {
                return;
            };
            if let Some(entries) = entries.upgrade() {
                let _removed = entries.borrow_mut().remove(&state.id);
            }
            state.dispose();
            tracing::trace!(item = state.id, "editor state released");
        })));
        *state.subscriptions.borrow_mut() = subscriptions;

        tracing::trace!(item = id, title = %state.last_title.borrow(), "editor state attached");
        state
    }

    pub const fn item_id(&self) -> ItemId {
        self.id
    }

    /// The title last seen by [`dispatch`](Self::dispatch) (or at creation).
    pub fn last_title(&self) -> String {
        self.last_title.borrow().clone()
    }

    /// Recompute the title after a content or path change.
    ///
    /// A different title always replaces the remembered one, but only a
    /// temporary editor is told to redraw. Returns whether it was told.
    pub fn dispatch(&self) -> bool {
        let Some(editor) = self.editor.upgrade() else {
            return false;
        };
        let title = compute_title(&*editor, &self.config.borrow());
        if *self.last_title.borrow() == title {
            return false;
        }
        tracing::trace!(item = self.id, %title, "derived title changed");
        self.last_title.replace(title);
        if !is_temporary(&*editor) {
            return false;
        }
        editor.emit_did_change_title();
        true
    }

    /// Drop every subscription. No callback reaches this state afterwards.
    pub fn dispose(&self) {
        self.subscriptions.borrow_mut().dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.subscriptions.borrow().is_disposed()
    }
}

/// Identity-keyed store of [`EditorState`]s.
///
/// Entries never keep their editor alive and leave the cache exactly once:
/// when the editor is destroyed or the cache is cleared.
pub struct EditorStateCache {
    entries: Rc<Entries>,
    config: SharedConfig,
}

impl EditorStateCache {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            entries: Rc::new(RefCell::new(HashMap::new())),
            config,
        }
    }

    /// The state for `editor`, created and subscribed on first use.
    ///
    /// A destroyed editor gets an already disposed state that is not cached.
    pub fn get_or_create(&self, editor: &Rc<dyn TextEditor>) -> Rc<EditorState> {
        let id = editor.item_id();
        if let Some(state) = self.get(id) {
            return state;
        }
        let state = EditorState::attach(
            editor,
            Rc::clone(&self.config),
            Rc::downgrade(&self.entries),
        );
        if editor.is_destroyed() {
            state.dispose();
            return state;
        }
        self.entries.borrow_mut().insert(id, Rc::clone(&state));
        state
    }

    pub fn get(&self, id: ItemId) -> Option<Rc<EditorState>> {
        self.entries.borrow().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Dispose and forget every state.
    pub fn clear(&self) {
        let drained: Vec<_> = self
            .entries
            .borrow_mut()
            .drain()
            .map(|(_, state)| state)
            .collect();
        for state in drained {
            state.dispose();
        }
    }
}

impl Drop for EditorStateCache {
    fn drop(&mut self) {
        self.clear();
    }
}
