#![forbid(unsafe_code)]

//! Listener table and the [`Notifier`] seam.
//!
//! # Design
//!
//! [`Dispatcher`] wraps its listener table in shared, reference-counted
//! storage. Each listener is kept as a `Weak` callback next to the event name
//! it was registered for; the matching strong reference is owned by the
//! [`Subscription`] returned to the caller. Dropping the guard is therefore
//! enough to silence the listener, and dead slots are swept on the next
//! `subscribe` or [`notify`](Dispatcher::notify).
//!
//! # Failure Modes
//!
//! - **Listener panics**: the panic unwinds out of `notify`. Listeners after
//!   the panicking one are not invoked for that notification. The table is
//!   not borrowed at that point and stays usable.
//! - **Dispatcher dropped first**: outstanding subscriptions become inert and
//!   [`Subscription::detach`] is a no-op.
//! - **Detached listener owning its source**: a detached callback is owned by
//!   the table. If it captures a strong `Rc` of the vector that reports to
//!   this dispatcher, neither is ever freed. Capture a `Weak` instead.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::event::{Axis, Event};

/// Callback invoked for each matching notification.
pub type Handler = Rc<dyn Fn(&Event<'_>)>;

/// A subscribe/notify facility a value can report its writes to.
///
/// [`Dispatcher`] is the stock implementation. Tests and embedders can supply
/// their own, e.g. to record notifications or forward them elsewhere.
pub trait Notifier {
    /// Register `handler` for notifications named `event`.
    fn subscribe(&self, event: &str, handler: Handler) -> Subscription;

    /// Synchronously deliver a notification to every listener of `event`.
    ///
    /// Returns the number of listeners invoked.
    fn notify(&self, event: &str, field: Option<Axis>) -> usize;
}

struct Listener {
    id: u64,
    event: String,
    callback: Weak<dyn Fn(&Event<'_>)>,
    /// Strong reference held once the subscription has been detached.
    pinned: Option<Handler>,
}

impl Listener {
    fn is_alive(&self) -> bool {
        self.pinned.is_some() || self.callback.strong_count() > 0
    }
}

#[derive(Default)]
struct DispatcherInner {
    listeners: Vec<Listener>,
    next_id: u64,
    notifications: u64,
}

impl DispatcherInner {
    fn prune(&mut self) {
        let before = self.listeners.len();
        self.listeners.retain(Listener::is_alive);
        let pruned = before - self.listeners.len();
        if pruned > 0 {
            tracing::trace!(message = "dispatcher.prune", pruned);
        }
    }
}

/// Shared listener table keyed by event name.
///
/// Cloning a `Dispatcher` creates a new handle to the **same** table.
#[derive(Default)]
pub struct Dispatcher {
    inner: Rc<RefCell<DispatcherInner>>,
}

impl Clone for Dispatcher {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Dispatcher")
            .field(
                "listeners",
                &inner.listeners.iter().filter(|l| l.is_alive()).count(),
            )
            .field("notifications", &inner.notifications)
            .finish()
    }
}

impl Dispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure for `event`.
    pub fn on(&self, event: &str, handler: impl Fn(&Event<'_>) + 'static) -> Subscription {
        self.subscribe(event, Rc::new(handler))
    }

    /// Number of live listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.event == event && l.is_alive())
            .count()
    }

    /// Total number of `notify` calls, whether or not anyone listened.
    #[must_use]
    pub fn notification_count(&self) -> u64 {
        self.inner.borrow().notifications
    }
}

impl Notifier for Dispatcher {
    fn subscribe(&self, event: &str, handler: Handler) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        inner.prune();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push(Listener {
            id,
            event: event.to_owned(),
            callback: Rc::downgrade(&handler),
            pinned: None,
        });
        tracing::trace!(message = "dispatcher.subscribe", event, id);

        let owner = Rc::downgrade(&self.inner);
        Subscription::with_detach(handler, move |callback| {
            if let Some(inner) = owner.upgrade() {
                let mut inner = inner.borrow_mut();
                if let Some(listener) = inner.listeners.iter_mut().find(|l| l.id == id) {
                    listener.pinned = Some(callback);
                }
            }
        })
    }

    fn notify(&self, event: &str, field: Option<Axis>) -> usize {
        // Snapshot first: listeners run with the table unborrowed.
        let live: Vec<Handler> = {
            let mut inner = self.inner.borrow_mut();
            inner.notifications += 1;
            inner.prune();

            inner
                .listeners
                .iter()
                .filter(|l| l.event == event)
                .filter_map(|l| l.pinned.clone().or_else(|| l.callback.upgrade()))
                .collect()
        };

        let payload = Event::new(event, field);
        for handler in &live {
            handler(&payload);
        }
        live.len()
    }
}

type DetachHook = Box<dyn FnOnce(Handler)>;

/// RAII guard for a registered listener.
///
/// The listener stays registered for as long as this guard is alive.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    callback: Handler,
    on_detach: Option<DetachHook>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("detach_hook", &self.on_detach.is_some())
            .finish()
    }
}

impl Subscription {
    /// Wrap a callback that is kept alive by this guard alone.
    ///
    /// [`detach`](Self::detach) on such a guard keeps the callback alive
    /// indefinitely, so a notifier holding it weakly keeps delivering to it.
    pub fn new(callback: Handler) -> Self {
        Self {
            callback,
            on_detach: None,
        }
    }

    /// Wrap a callback and the hook that takes ownership of it on
    /// [`detach`](Self::detach).
    ///
    /// A [`Notifier`] that stores listeners weakly passes a hook that moves
    /// the strong `Handler` into its own table.
    pub fn with_detach(callback: Handler, on_detach: impl FnOnce(Handler) + 'static) -> Self {
        Self {
            callback,
            on_detach: Some(Box::new(on_detach)),
        }
    }

    /// The guarded callback.
    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.callback
    }

    /// Give up the guard, leaving the listener registered.
    ///
    /// The callback is then owned by the notifier (or, without a detach
    /// hook, by nobody and never freed). A detached callback that captures
    /// a strong `Rc` of the value it observes forms a cycle through the
    /// value's notifier and is never dropped; capture `Rc::downgrade` of it
    /// instead.
    pub fn detach(self) {
        let Self {
            callback,
            on_detach,
        } = self;
        match on_detach {
            Some(hook) => hook(callback),
            None => std::mem::forget(callback),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CHANGE;
    use std::cell::Cell;
    use tracing_test::traced_test;

    fn counter(dispatcher: &Dispatcher, event: &str) -> (Rc<Cell<u32>>, Subscription) {
        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let sub = dispatcher.on(event, move |_| hits_clone.set(hits_clone.get() + 1));
        (hits, sub)
    }

    #[test]
    fn notify_reaches_listener() {
        let dispatcher = Dispatcher::new();
        let (hits, _sub) = counter(&dispatcher, CHANGE);

        assert_eq!(dispatcher.notify(CHANGE, None), 1);
        assert_eq!(dispatcher.notify(CHANGE, None), 1);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn notify_filters_by_event_name() {
        let dispatcher = Dispatcher::new();
        let (change_hits, _a) = counter(&dispatcher, CHANGE);
        let (other_hits, _b) = counter(&dispatcher, "remove");

        assert_eq!(dispatcher.notify(CHANGE, None), 1);
        assert_eq!(change_hits.get(), 1);
        assert_eq!(other_hits.get(), 0);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let subs: Vec<_> = (0..4)
            .map(|i| {
                let log = Rc::clone(&log);
                dispatcher.on(CHANGE, move |_| log.borrow_mut().push(i))
            })
            .collect();

        dispatcher.notify(CHANGE, None);
        assert_eq!(*log.borrow(), vec![0, 1, 2, 3]);
        drop(subs);
    }

    #[test]
    fn payload_carries_field() {
        let dispatcher = Dispatcher::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = dispatcher.on(CHANGE, move |event| {
            seen_clone.borrow_mut().push(event.field);
        });

        dispatcher.notify(CHANGE, Some(Axis::X));
        dispatcher.notify(CHANGE, None);
        assert_eq!(*seen.borrow(), vec![Some(Axis::X), None]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let dispatcher = Dispatcher::new();
        let (hits, sub) = counter(&dispatcher, CHANGE);
        assert_eq!(dispatcher.listener_count(CHANGE), 1);

        drop(sub);
        assert_eq!(dispatcher.listener_count(CHANGE), 0);
        assert_eq!(dispatcher.notify(CHANGE, None), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn detach_keeps_listener() {
        let dispatcher = Dispatcher::new();
        let (hits, sub) = counter(&dispatcher, CHANGE);
        sub.detach();

        assert_eq!(dispatcher.listener_count(CHANGE), 1);
        dispatcher.notify(CHANGE, None);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn detach_after_dispatcher_dropped_is_noop() {
        let dispatcher = Dispatcher::new();
        let (_hits, sub) = counter(&dispatcher, CHANGE);
        drop(dispatcher);
        sub.detach();
    }

    /// Stores listeners weakly, like `Dispatcher`, but knows nothing of it.
    #[derive(Default)]
    struct WeakTable {
        listeners: RefCell<Vec<Weak<dyn Fn(&Event<'_>)>>>,
        pinned: Rc<RefCell<Vec<Handler>>>,
        with_hook: bool,
    }

    impl Notifier for WeakTable {
        fn subscribe(&self, _event: &str, handler: Handler) -> Subscription {
            self.listeners.borrow_mut().push(Rc::downgrade(&handler));
            if self.with_hook {
                let pinned = Rc::clone(&self.pinned);
                Subscription::with_detach(handler, move |callback| {
                    pinned.borrow_mut().push(callback);
                })
            } else {
                Subscription::new(handler)
            }
        }

        fn notify(&self, event: &str, field: Option<Axis>) -> usize {
            let live: Vec<Handler> = self
                .listeners
                .borrow()
                .iter()
                .filter_map(|listener| listener.upgrade())
                .collect();
            for handler in &live {
                handler(&Event::new(event, field));
            }
            live.len()
        }
    }

    fn weak_table_counter(table: &WeakTable) -> (Rc<Cell<u32>>, Subscription) {
        let hits = Rc::new(Cell::new(0u32));
        let hits_clone = Rc::clone(&hits);
        let sub = table.subscribe(
            CHANGE,
            Rc::new(move |_: &Event<'_>| hits_clone.set(hits_clone.get() + 1)),
        );
        (hits, sub)
    }

    #[test]
    fn detach_hook_hands_callback_to_custom_notifier() {
        let table = WeakTable {
            with_hook: true,
            ..WeakTable::default()
        };
        let (hits, sub) = weak_table_counter(&table);
        sub.detach();

        assert_eq!(table.pinned.borrow().len(), 1);
        assert_eq!(table.notify(CHANGE, None), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn detach_without_hook_keeps_weak_listener_alive() {
        let table = WeakTable::default();
        let (hits, sub) = weak_table_counter(&table);
        sub.detach();

        assert_eq!(table.notify(CHANGE, None), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn dropped_custom_subscription_goes_quiet() {
        let table = WeakTable::default();
        let (hits, sub) = weak_table_counter(&table);
        drop(sub);

        assert_eq!(table.notify(CHANGE, None), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn subscribe_prunes_dead_listeners() {
        let dispatcher = Dispatcher::new();
        for _ in 0..100 {
            let (_hits, sub) = counter(&dispatcher, CHANGE);
            drop(sub);
        }
        let (_hits, _live) = counter(&dispatcher, CHANGE);

        assert_eq!(dispatcher.inner.borrow().listeners.len(), 1);
        assert_eq!(dispatcher.notification_count(), 0);
    }

    #[test]
    fn clone_shares_table() {
        let a = Dispatcher::new();
        let b = a.clone();
        let (hits, _sub) = counter(&a, CHANGE);

        assert_eq!(b.notify(CHANGE, None), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(a.notification_count(), 1);
    }

    #[test]
    fn reentrant_subscribe_during_notify() {
        let dispatcher = Dispatcher::new();
        let late = Rc::new(RefCell::new(Vec::new()));

        let d = dispatcher.clone();
        let late_clone = Rc::clone(&late);
        let _sub = dispatcher.on(CHANGE, move |_| {
            let sub = d.on(CHANGE, |_| {});
            late_clone.borrow_mut().push(sub);
        });

        // The listener added mid-dispatch is not part of the current snapshot.
        assert_eq!(dispatcher.notify(CHANGE, None), 1);
        assert_eq!(dispatcher.listener_count(CHANGE), 2);
        assert_eq!(dispatcher.notify(CHANGE, None), 2);
    }

    #[test]
    fn reentrant_notify_from_listener() {
        let dispatcher = Dispatcher::new();
        let (inner_hits, _inner) = counter(&dispatcher, "inner");

        let d = dispatcher.clone();
        let _outer = dispatcher.on(CHANGE, move |_| {
            d.notify("inner", None);
        });

        dispatcher.notify(CHANGE, None);
        assert_eq!(inner_hits.get(), 1);
    }

    #[test]
    fn custom_subscription_holds_callback() {
        let handler: Handler = Rc::new(|_| {});
        let sub = Subscription::new(Rc::clone(&handler));
        assert_eq!(Rc::strong_count(&handler), 2);
        assert!(Rc::ptr_eq(sub.handler(), &handler));
        drop(sub);
        assert_eq!(Rc::strong_count(&handler), 1);
    }

    #[test]
    fn debug_format() {
        let dispatcher = Dispatcher::new();
        let (_hits, _sub) = counter(&dispatcher, CHANGE);
        let dbg = format!("{dispatcher:?}");
        assert!(dbg.contains("Dispatcher"));
        assert!(dbg.contains("listeners: 1"));
    }

    #[traced_test]
    #[test]
    fn prune_is_logged() {
        let dispatcher = Dispatcher::new();
        let (_hits, sub) = counter(&dispatcher, CHANGE);
        drop(sub);
        dispatcher.notify(CHANGE, None);
        assert!(logs_contain("dispatcher.prune"));
    }
}
