//! Single-threaded event emitters with disposable subscriptions.
//!
//! Every subscription returns a [`Subscription`] handle. Dropping or
//! disposing the handle disconnects the callback immediately: a handler that
//! has been disposed never runs again, even if the emission that disposed it
//! is still in progress.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Identifies one handler registered on an [`Emitter`].
    pub struct HandlerId;
}

struct Handler<T> {
    callback: Rc<dyn Fn(&T)>,
    live: Rc<Cell<bool>>,
}

type Registry<T> = RefCell<SlotMap<HandlerId, Handler<T>>>;

/// Broadcasts values of type `T` to every subscribed handler.
pub struct Emitter<T> {
    handlers: Rc<Registry<T>>,
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            handlers: Rc::new(RefCell::new(SlotMap::with_key())),
        }
    }

    /// Register `callback`; it runs on every [`emit`](Self::emit) until the
    /// returned handle is disposed or dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let live = Rc::new(Cell::new(true));
        let id = self.handlers.borrow_mut().insert(Handler {
            callback: Rc::new(callback),
            live: Rc::clone(&live),
        });
        let registry: Weak<Registry<T>> = Rc::downgrade(&self.handlers);
        Subscription::new(move || {
            live.set(false);
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().remove(id);
            }
        })
    }

    /// Invoke every live handler with `value`.
    ///
    /// Handlers are snapshotted first, so a handler may subscribe or
    /// dispose other handlers while the emission runs.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<_> = self
            .handlers
            .borrow()
            .values()
            .map(|handler| (Rc::clone(&handler.live), Rc::clone(&handler.callback)))
            .collect();
        for (live, callback) in snapshot {
            if live.get() {
                callback(value);
            }
        }
    }

    /// Number of currently connected handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Disconnect every handler.
    pub fn clear(&self) {
        let drained: Vec<_> = self.handlers.borrow_mut().drain().map(|(_, h)| h).collect();
        for handler in drained {
            handler.live.set(false);
        }
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("handlers", &self.handlers.borrow().len())
            .finish()
    }
}

/// Handle to a registered callback. Disconnects on [`dispose`](Self::dispose)
/// or drop.
#[must_use = "dropping a Subscription disconnects it immediately"]
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a teardown action.
    pub fn new(dispose: impl FnOnce() + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A handle with nothing to tear down.
    pub fn empty() -> Self {
        Self { dispose: None }
    }

    /// Run the teardown action. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }

    pub const fn is_disposed(&self) -> bool {
        self.dispose.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A group of subscriptions disposed together.
///
/// Once disposed, any subscription added afterwards is disposed on the spot.
#[derive(Debug, Default)]
pub struct CompositeSubscription {
    items: Vec<Subscription>,
    disposed: bool,
}

impl CompositeSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut subscription: Subscription) {
        if self.disposed {
            subscription.dispose();
        } else {
            self.items.push(subscription);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
        for mut subscription in self.items.drain(..) {
            subscription.dispose();
        }
    }
}

impl Drop for CompositeSubscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<usize>>, impl Fn(&u32) + 'static) {
        let count = Rc::new(Cell::new(0));
        let inner = Rc::clone(&count);
        (count, move |_: &u32| inner.set(inner.get() + 1))
    }

    #[test]
    fn test_emit_reaches_all_handlers() {
        let emitter = Emitter::new();
        let (a, handler_a) = counter();
        let (b, handler_b) = counter();
        let _sa = emitter.subscribe(handler_a);
        let _sb = emitter.subscribe(handler_b);

        emitter.emit(&1);
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 1);
        assert_eq!(emitter.handler_count(), 2);
    }

    #[test]
    fn test_dispose_disconnects() {
        let emitter = Emitter::new();
        let (count, handler) = counter();
        let mut sub = emitter.subscribe(handler);
        sub.dispose();
        emitter.emit(&1);
        assert_eq!(count.get(), 0);
        assert_eq!(emitter.handler_count(), 0);
        assert!(sub.is_disposed());
    }

    #[test]
    fn test_drop_disconnects() {
        let emitter = Emitter::new();
        let (count, handler) = counter();
        drop(emitter.subscribe(handler));
        emitter.emit(&1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_handler_disposed_mid_emit_does_not_run() {
        let emitter: Emitter<u32> = Emitter::new();
        let later: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let (count, handler) = counter();

        let slot = Rc::clone(&later);
        let _first = emitter.subscribe(move |_| {
            if let Some(mut sub) = slot.borrow_mut().take() {
                sub.dispose();
            }
        });
        *later.borrow_mut() = Some(emitter.subscribe(handler));

        emitter.emit(&7);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_subscription_outliving_emitter_is_harmless() {
        let emitter = Emitter::new();
        let (_count, handler) = counter();
        let mut sub = emitter.subscribe(handler);
        drop(emitter);
        sub.dispose();
    }

    #[test]
    fn test_composite_disposes_members_and_late_additions() {
        let emitter = Emitter::new();
        let (count, handler) = counter();
        let (late_count, late_handler) = counter();

        let mut group = CompositeSubscription::new();
        group.add(emitter.subscribe(handler));
        assert_eq!(group.len(), 1);
        group.dispose();
        group.add(emitter.subscribe(late_handler));

        emitter.emit(&1);
        assert_eq!(count.get(), 0);
        assert_eq!(late_count.get(), 0);
        assert!(group.is_empty());
    }
}
