#![forbid(unsafe_code)]

//! Lazy upgrade from plain storage to observed storage.
//!
//! A vector pays nothing for observability until someone subscribes. The
//! first [`Vector::subscribe`] moves the current coordinates into shadow
//! storage, latches the vector as bound, and then hands the listener to the
//! notifier. Later subscriptions skip straight to the hand-off.
//!
//! # Invariants
//!
//! 1. The transition runs at most once per vector; `is_bound()` never goes
//!    back to `false`.
//! 2. Coordinates read the same immediately before and after binding.
//! 3. Any subscription binds, whatever event name it is for.

use std::rc::Rc;

use planar_events::{Dispatcher, Event, Notifier, Subscription};

use crate::vector::{Shadow, Storage, Vector};

impl Vector {
    /// Register `handler` for `event`, binding the vector first if needed.
    ///
    /// Once bound, every write to this vector notifies [`CHANGE`] listeners.
    ///
    /// [`CHANGE`]: planar_events::CHANGE
    pub fn subscribe(
        &self,
        event: &str,
        handler: impl Fn(&Event<'_>) + 'static,
    ) -> Subscription {
        let notifier = self.bind();
        notifier.subscribe(event, Rc::new(handler))
    }

    /// Whether a subscription has upgraded this vector to observed storage.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        matches!(&*self.storage.borrow(), Storage::Bound { .. })
    }

    /// The notifier this vector reports to, if it is bound.
    #[must_use]
    pub fn notifier(&self) -> Option<Rc<dyn Notifier>> {
        match &*self.storage.borrow() {
            Storage::Bound { notifier, .. } => Some(Rc::clone(notifier)),
            Storage::Unbound { .. } => None,
        }
    }

    fn bind(&self) -> Rc<dyn Notifier> {
        let mut storage = self.storage.borrow_mut();
        let (x, y, pending) = match &mut *storage {
            Storage::Bound { notifier, .. } => return Rc::clone(notifier),
            Storage::Unbound { x, y, pending } => (*x, *y, pending.take()),
        };

        let notifier: Rc<dyn Notifier> = match pending {
            Some(notifier) => notifier,
            None => Rc::new(Dispatcher::new()),
        };
        *storage = Storage::Bound {
            shadow: Shadow { x, y },
            notifier: Rc::clone(&notifier),
        };
        tracing::debug!(message = "vector.bind", x, y);

        notifier
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
