//! In-memory workspace: panes of items, the active item and the window
//! title that follows it.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::editor::{Editor, next_item_id};
use crate::event::{Emitter, Subscription};
use crate::host::{ItemId, PaneItem, TextEditor, TitleAccessors, Workspace};

/// Index of a pane within the workspace.
pub type PaneId = usize;

#[derive(Default)]
struct Layout {
    panes: Vec<Vec<Rc<dyn PaneItem>>>,
    active: Option<ItemId>,
}

impl Layout {
    fn locate(&self, id: ItemId) -> Option<(PaneId, usize)> {
        self.panes.iter().enumerate().find_map(|(pane, items)| {
            items
                .iter()
                .position(|item| item.item_id() == id)
                .map(|index| (pane, index))
        })
    }

    fn find(&self, id: ItemId) -> Option<Rc<dyn PaneItem>> {
        self.locate(id)
            .map(|(pane, index)| Rc::clone(&self.panes[pane][index]))
    }
}

/// A workspace that keeps its items in memory.
///
/// Items leave the workspace when they are destroyed.
pub struct MemoryWorkspace {
    layout: Rc<RefCell<Layout>>,
    editor_opened: Emitter<Rc<dyn TextEditor>>,
    window_title: Rc<RefCell<String>>,
    active_title_subscription: RefCell<Option<Subscription>>,
    destroy_subscriptions: Rc<RefCell<HashMap<ItemId, Subscription>>>,
}

impl MemoryWorkspace {
    /// A workspace with a single empty pane.
    pub fn new() -> Self {
        Self {
            layout: Rc::new(RefCell::new(Layout {
                panes: vec![Vec::new()],
                active: None,
            })),
            editor_opened: Emitter::new(),
            window_title: Rc::new(RefCell::new(String::new())),
            active_title_subscription: RefCell::new(None),
            destroy_subscriptions: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Open an unsaved editor with `text` in the first pane and activate it.
    pub fn open_editor(&self, text: &str) -> Rc<Editor> {
        let editor = Editor::new(text);
        self.add_item(0, Rc::clone(&editor) as Rc<dyn PaneItem>);
        editor
    }

    /// Add a new pane to the right of the others.
    pub fn split(&self) -> PaneId {
        let mut layout = self.layout.borrow_mut();
        layout.panes.push(Vec::new());
        layout.panes.len() - 1
    }

    pub fn pane_count(&self) -> usize {
        self.layout.borrow().panes.len()
    }

    /// Append `item` to `pane` (the last pane if out of range) and activate it.
    pub fn add_item(&self, pane: PaneId, item: Rc<dyn PaneItem>) {
        let id = item.item_id();
        {
            let mut layout = self.layout.borrow_mut();
            let pane = pane.min(layout.panes.len() - 1);
            layout.panes[pane].push(Rc::clone(&item));
        }

        let layout = Rc::downgrade(&self.layout);
        let subscriptions = Rc::downgrade(&self.destroy_subscriptions);
        let subscription = item.on_did_destroy(Box::new(move || {
            forget_item(&layout, id);
            if let Some(subscriptions) = subscriptions.upgrade() {
                let _finished = subscriptions.borrow_mut().remove(&id);
            }
        }));
        self.destroy_subscriptions
            .borrow_mut()
            .insert(id, subscription);

        if let Some(editor) = Rc::clone(&item).as_text_editor() {
            self.editor_opened.emit(&editor);
        }
        self.activate_item(id);
    }

    /// Move an item to `pane` at `index`, keeping the item itself intact.
    pub fn move_item(&self, id: ItemId, pane: PaneId, index: usize) -> bool {
        let mut layout = self.layout.borrow_mut();
        if pane >= layout.panes.len() {
            return false;
        }
        let Some((from, position)) = layout.locate(id) else {
            return false;
        };
        let item = layout.panes[from].remove(position);
        let target = &mut layout.panes[pane];
        let index = index.min(target.len());
        target.insert(index, item);
        true
    }

    pub fn pane_for_item(&self, id: ItemId) -> Option<PaneId> {
        self.layout.borrow().locate(id).map(|(pane, _)| pane)
    }

    pub fn items_in_pane(&self, pane: PaneId) -> Vec<Rc<dyn PaneItem>> {
        self.layout
            .borrow()
            .panes
            .get(pane)
            .cloned()
            .unwrap_or_default()
    }

    /// Make `id` the active item.
    pub fn activate_item(&self, id: ItemId) {
        let item = {
            let mut layout = self.layout.borrow_mut();
            let Some(item) = layout.find(id) else {
                return;
            };
            layout.active = Some(id);
            item
        };
        self.did_change_active_pane_item(item);
    }

    pub fn active_item(&self) -> Option<Rc<dyn PaneItem>> {
        let layout = self.layout.borrow();
        layout.active.and_then(|id| layout.find(id))
    }

    /// The window title, which tracks the active item's long title.
    pub fn window_title(&self) -> String {
        self.window_title.borrow().clone()
    }
}

fn forget_item(layout: &Weak<RefCell<Layout>>, id: ItemId) {
    let Some(layout) = layout.upgrade() else {
        return;
    };
    let mut layout = layout.borrow_mut();
    if let Some((pane, index)) = layout.locate(id) {
        layout.panes[pane].remove(index);
    }
    if layout.active == Some(id) {
        layout.active = None;
    }
}

impl Default for MemoryWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace for MemoryWorkspace {
    fn observe_text_editors(&self, callback: Rc<dyn Fn(Rc<dyn TextEditor>)>) -> Subscription {
        let existing: Vec<_> = self
            .pane_items()
            .into_iter()
            .filter_map(|item| item.as_text_editor())
            .collect();
        for editor in existing {
            callback(editor);
        }
        self.editor_opened
            .subscribe(move |editor: &Rc<dyn TextEditor>| callback(Rc::clone(editor)))
    }

    fn pane_items(&self) -> Vec<Rc<dyn PaneItem>> {
        self.layout
            .borrow()
            .panes
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    fn active_text_editor(&self) -> Option<Rc<dyn TextEditor>> {
        self.active_item().and_then(|item| item.as_text_editor())
    }

    fn did_change_active_pane_item(&self, item: Rc<dyn PaneItem>) {
        let title = item.long_title();
        *self.window_title.borrow_mut() = title;

        let sink = Rc::downgrade(&self.window_title);
        let watched: Weak<dyn PaneItem> = Rc::downgrade(&item);
        let subscription = item.on_did_change_title(Box::new(move |_: &str| {
            if let (Some(sink), Some(item)) = (sink.upgrade(), watched.upgrade()) {
                let title = item.long_title();
                *sink.borrow_mut() = title;
            }
        }));
        self.active_title_subscription.replace(Some(subscription));
    }
}

/// A pane item that is not a text editor, e.g. a settings view.
pub struct StaticItem {
    id: ItemId,
    accessors: RefCell<TitleAccessors>,
    destroyed: Cell<bool>,
    did_change_title: Emitter<String>,
    did_destroy: Emitter<()>,
}

impl StaticItem {
    pub fn new(title: &str) -> Rc<Self> {
        Rc::new(Self {
            id: next_item_id(),
            accessors: RefCell::new(TitleAccessors::fixed(title)),
            destroyed: Cell::new(false),
            did_change_title: Emitter::new(),
            did_destroy: Emitter::new(),
        })
    }

    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.did_destroy.emit(&());
        self.did_change_title.clear();
        self.did_destroy.clear();
    }
}

impl PaneItem for StaticItem {
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
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_editor_activates_it() {
        let workspace = MemoryWorkspace::new();
        let editor = workspace.open_editor("lorem");
        let active = workspace.active_text_editor().unwrap();
        assert_eq!(active.item_id(), editor.item_id());
        assert_eq!(workspace.window_title(), "untitled");
    }

    #[test]
    fn test_observe_sees_existing_and_new_editors_only() {
        let workspace = MemoryWorkspace::new();
        workspace.open_editor("one");
        workspace.add_item(0, StaticItem::new("Settings"));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = workspace.observe_text_editors(Rc::new(move |editor: Rc<dyn TextEditor>| {
            sink.borrow_mut().push(editor.item_id());
        }));
        assert_eq!(seen.borrow().len(), 1);

        workspace.open_editor("two");
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_destroyed_items_leave_the_workspace() {
        let workspace = MemoryWorkspace::new();
        let editor = workspace.open_editor("a");
        let other = workspace.open_editor("b");
        assert_eq!(workspace.pane_items().len(), 2);

        other.destroy();
        assert_eq!(workspace.pane_items().len(), 1);
        assert!(workspace.active_item().is_none());
        assert_eq!(workspace.pane_items()[0].item_id(), editor.item_id());
    }

    #[test]
    fn test_move_item_between_panes() {
        let workspace = MemoryWorkspace::new();
        let right = workspace.split();
        let editor = workspace.open_editor("wat");
        assert_eq!(workspace.pane_for_item(editor.item_id()), Some(0));

        assert!(workspace.move_item(editor.item_id(), right, 0));
        assert_eq!(workspace.pane_for_item(editor.item_id()), Some(right));
        assert!(workspace.items_in_pane(0).is_empty());
        assert!(!workspace.move_item(editor.item_id(), 9, 0));
    }

    #[test]
    fn test_window_title_follows_active_item_title_changes() {
        let workspace = MemoryWorkspace::new();
        let editor = workspace.open_editor("a");
        editor.replace_title_accessors(TitleAccessors::fixed("renamed"));
        editor.emit_did_change_title();
        assert_eq!(workspace.window_title(), "renamed");

        let settings = StaticItem::new("Settings");
        workspace.add_item(0, Rc::clone(&settings) as Rc<dyn PaneItem>);
        assert_eq!(workspace.window_title(), "Settings");
        editor.emit_did_change_title();
        assert_eq!(workspace.window_title(), "Settings");
    }
}
