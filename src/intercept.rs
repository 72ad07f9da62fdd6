//! Reversible override of a pane item's title accessors.
//!
//! Installing swaps the item's accessors for wrappers that route each call
//! either to the item's original accessors or to the computed title. The
//! originals live in a side table keyed by item id and are handed back
//! untouched on uninstall.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::config::SharedConfig;
use crate::event::Subscription;
use crate::host::{ItemId, PaneItem, TextEditor, TitleAccessors, is_temporary};
use crate::title::compute_title;

/// Process-wide "feature is active" switch shared with every wrapper.
#[derive(Debug, Clone, Default)]
pub struct ActivationFlag(Rc<Cell<bool>>);

impl ActivationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, active: bool) {
        self.0.set(active);
    }
}

/// Something that can answer an item's title questions.
pub trait TitleSource {
    fn title(&self) -> String;
    fn long_title(&self) -> String;
}

/// The item's own accessors, as they were before interception.
pub struct OriginalTitleSource {
    accessors: TitleAccessors,
}

impl OriginalTitleSource {
    pub const fn new(accessors: TitleAccessors) -> Self {
        Self { accessors }
    }
}

impl TitleSource for OriginalTitleSource {
    fn title(&self) -> String {
        (self.accessors.short)()
    }

    fn long_title(&self) -> String {
        self.accessors
            .long
            .as_ref()
            .map_or_else(|| (self.accessors.short)(), |long| long())
    }
}

/// Title derived from the editor's buffer content.
pub struct ComputedTitleSource {
    editor: Weak<dyn TextEditor>,
    config: SharedConfig,
}

impl ComputedTitleSource {
    pub fn new(editor: Weak<dyn TextEditor>, config: SharedConfig) -> Self {
        Self { editor, config }
    }
}

impl TitleSource for ComputedTitleSource {
    fn title(&self) -> String {
        let config = self.config.borrow();
        self.editor.upgrade().map_or_else(
            || config.default_label.clone(),
            |editor| compute_title(&*editor, &config),
        )
    }

    fn long_title(&self) -> String {
        self.title()
    }
}

/// Whether calls on `editor` should get the computed title.
pub fn uses_computed_title(active: &ActivationFlag, editor: &dyn TextEditor) -> bool {
    active.is_active() && is_temporary(editor)
}

/// Picks a [`TitleSource`] per call.
struct TitleRouter {
    editor: Weak<dyn TextEditor>,
    active: ActivationFlag,
    original: OriginalTitleSource,
    computed: ComputedTitleSource,
}

impl TitleRouter {
    fn source(&self) -> &dyn TitleSource {
        let computed = self
            .editor
            .upgrade()
            .is_some_and(|editor| uses_computed_title(&self.active, &*editor));
        if computed {
            &self.computed
        } else {
            &self.original
        }
    }
}

struct OverrideRecord {
    original: TitleAccessors,
    _on_destroy: Subscription,
}

/// Installs and removes title interception on pane items.
pub struct InterceptionManager {
    records: Rc<RefCell<HashMap<ItemId, OverrideRecord>>>,
    active: ActivationFlag,
    config: SharedConfig,
}

impl InterceptionManager {
    pub fn new(active: ActivationFlag, config: SharedConfig) -> Self {
        Self {
            records: Rc::new(RefCell::new(HashMap::new())),
            active,
            config,
        }
    }

    /// Route `editor`'s title accessors through the title router and
    /// refresh its label. Does nothing if already installed or destroyed.
    pub fn install(&self, editor: &Rc<dyn TextEditor>) {
        let id = editor.item_id();
        if editor.is_destroyed() {
            tracing::debug!(item = id, "not intercepting destroyed item");
            return;
        }
        if self.records.borrow().contains_key(&id) {
            return;
        }

        let original = editor.title_accessors();
        let weak = Rc::downgrade(editor);
        let router = Rc::new(TitleRouter {
            editor: Weak::clone(&weak),
            active: self.active.clone(),
            original: OriginalTitleSource::new(original.clone()),
            computed: ComputedTitleSource::new(weak, Rc::clone(&self.config)),
        });
        let short = Rc::clone(&router);
        let long = router;
        editor.replace_title_accessors(TitleAccessors::new(
            Rc::new(move || short.source().title()),
            Some(Rc::new(move || long.source().long_title())),
        ));

        let records = Rc::downgrade(&self.records);
        let on_destroy = editor.on_did_destroy(Box::new(move || {
            if let Some(records) = records.upgrade() {
                let _dropped = records.borrow_mut().remove(&id);
            }
        }));
        self.records.borrow_mut().insert(
            id,
            OverrideRecord {
                original,
                _on_destroy: on_destroy,
            },
        );
        tracing::debug!(item = id, "title interception installed");

        editor.emit_did_change_title();
    }

    /// Hand `item` its original accessors back and refresh its label.
    /// Does nothing if the item was never intercepted.
    pub fn uninstall(&self, item: &dyn PaneItem) {
        let id = item.item_id();
        let Some(record) = self.records.borrow_mut().remove(&id) else {
            return;
        };
        item.replace_title_accessors(record.original.clone());
        drop(record);
        tracing::debug!(item = id, "title interception removed");

        item.emit_did_change_title();
    }

    pub fn is_installed(&self, id: ItemId) -> bool {
        self.records.borrow().contains_key(&id)
    }

    pub fn installed_count(&self) -> usize {
        self.records.borrow().len()
    }
}
