#![forbid(unsafe_code)]

//! Synchronous change notification for planar values.
//!
//! - [`Notifier`]: the subscribe/notify seam a value holds a reference to.
//! - [`Dispatcher`]: the default `Notifier`, a shared listener table keyed
//!   by event name.
//! - [`Subscription`]: RAII guard that removes its listener on drop.
//! - [`Event`] / [`Axis`]: what a listener receives.
//!
//! # Architecture
//!
//! `Dispatcher` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Listeners are stored as `Weak` callbacks; the strong side lives in the
//! [`Subscription`]. Dead entries are pruned lazily during notification.
//!
//! # Invariants
//!
//! 1. Listeners for an event are invoked in registration order.
//! 2. Delivery is synchronous: `notify` returns after every listener ran.
//! 3. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 4. No internal borrow is held while a listener runs, so listeners may
//!    subscribe, drop subscriptions, or notify re-entrantly.

pub mod dispatcher;
pub mod event;

pub use dispatcher::{Dispatcher, Handler, Notifier, Subscription};
pub use event::{Axis, CHANGE, Event};
