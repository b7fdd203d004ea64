#![forbid(unsafe_code)]

//! Planar: 2D vectors that stay plain data until something listens.
//!
//! Re-exports [`Vector`] with the event types needed to observe it, and the
//! stock [`Dispatcher`] for sharing one listener table across vectors.

pub use planar_core::{EPSILON, ParseVectorError, Vector};
pub use planar_events::{Axis, CHANGE, Dispatcher, Event, Notifier, Subscription};

pub mod prelude {
    pub use planar_core as core;
    pub use planar_events as events;

    pub use crate::{Axis, CHANGE, Vector};
}
