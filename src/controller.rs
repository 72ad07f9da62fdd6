//! Feature lifecycle: wires the tracker and the interception layer into a
//! workspace on activation and takes everything back out on deactivation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::{ConfigKey, ConfigValue, SharedConfig, TitleConfig};
use crate::event::CompositeSubscription;
use crate::host::{ConfigStore, TextEditor, Workspace};
use crate::intercept::{ActivationFlag, InterceptionManager};
use crate::tracker::EditorStateCache;

pub struct FeatureController {
    workspace: Rc<dyn Workspace>,
    store: Rc<dyn ConfigStore>,
    active: ActivationFlag,
    config: SharedConfig,
    cache: Rc<EditorStateCache>,
    interceptor: Rc<InterceptionManager>,
    subscriptions: RefCell<CompositeSubscription>,
}

impl FeatureController {
    pub fn new(workspace: Rc<dyn Workspace>, store: Rc<dyn ConfigStore>) -> Self {
        let active = ActivationFlag::new();
        let config = TitleConfig::from_store(&*store).shared();
        Self {
            cache: Rc::new(EditorStateCache::new(Rc::clone(&config))),
            interceptor: Rc::new(InterceptionManager::new(
                active.clone(),
                Rc::clone(&config),
            )),
            workspace,
            store,
            active,
            config,
            subscriptions: RefCell::new(CompositeSubscription::new()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_active()
    }

    /// The config snapshot title computation currently reads.
    pub fn config(&self) -> TitleConfig {
        self.config.borrow().clone()
    }

    pub fn tracked_editors(&self) -> usize {
        self.cache.len()
    }

    pub fn activate(&self) {
        if self.is_active() {
            return;
        }
        *self.config.borrow_mut() = TitleConfig::from_store(&*self.store);
        self.active.set(true);

        let mut subscriptions = CompositeSubscription::new();

        let cache = Rc::clone(&self.cache);
        let interceptor = Rc::clone(&self.interceptor);
        subscriptions.add(self.workspace.observe_text_editors(Rc::new(
            move |editor: Rc<dyn TextEditor>| {
                let _state = cache.get_or_create(&editor);
                interceptor.install(&editor);
            },
        )));

        for key in ConfigKey::ALL {
            let config = Rc::clone(&self.config);
            let workspace = Rc::downgrade(&self.workspace);
            subscriptions.add(self.store.on_did_change(
                key,
                Box::new(move |value: Option<&ConfigValue>| {
                    config.borrow_mut().apply(key, value);
                    tracing::debug!(%key, "title setting changed");
                    refresh_text_editors(&workspace);
                }),
            ));
        }

        *self.subscriptions.borrow_mut() = subscriptions;

        if let Some(editor) = self.workspace.active_text_editor() {
            editor.emit_did_change_title();
            self.workspace
                .did_change_active_pane_item(editor.into_pane_item());
        }
        tracing::info!(editors = self.cache.len(), "scratch titles activated");
    }

    pub fn deactivate(&self) {
        if !self.is_active() {
            return;
        }
        self.active.set(false);
        let mut subscriptions = self.subscriptions.replace(CompositeSubscription::new());
        subscriptions.dispose();
        self.cache.clear();
        for item in self.workspace.pane_items() {
            self.interceptor.uninstall(&*item);
        }
        tracing::info!("scratch titles deactivated");
    }
}

impl Drop for FeatureController {
    fn drop(&mut self) {
        self.deactivate();
    }
}

/// Ask every open text editor to re-read its title.
fn refresh_text_editors(workspace: &Weak<dyn Workspace>) {
    let Some(workspace) = workspace.upgrade() else {
        return;
    };
    for editor in workspace
        .pane_items()
        .into_iter()
        .filter_map(|item| item.as_text_editor())
    {
        editor.emit_did_change_title();
    }
}
