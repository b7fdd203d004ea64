#![forbid(unsafe_code)]

//! Two-component vector with opt-in change notification.
//!
//! A [`Vector`] starts out *unbound*: its coordinates are plain storage and
//! writes are silent. The first call to [`Vector::subscribe`] binds it
//! (see [`crate::binding`]), after which every write lands in shadow storage
//! and reports a [`CHANGE`] notification through the vector's [`Notifier`].
//!
//! # Write policy
//!
//! Every mutating operation funnels into one of two internal writes:
//!
//! - whole-value writes (`set`, `add`, `lerp`, ...) emit one notification
//!   with no field payload;
//! - accessor writes (`set_x`, `set_y`) emit one notification naming the
//!   field.
//!
//! Unbound vectors skip the notification in both cases. Either way the
//! operation returns `&Self` so calls chain.
//!
//! # Invariants
//!
//! 1. `x()`/`y()` return the last written coordinates in both modes.
//! 2. Only [`Clone::clone`] allocates a new vector; every other operation
//!    mutates the receiver in place.
//! 3. Arguments are read before the receiver is written, so
//!    `v.add_self(&v)` doubles `v`.
//! 4. No internal borrow is held while listeners run.
//!
//! # Failure Modes
//!
//! - **Zero divisor**: [`Vector::divide_scalar`] with `0` (or NaN) resets the
//!   receiver to `(0, 0)`. `normalize` and `set_length` inherit this.
//! - **Self-writing listener**: a listener that writes the vector it observes
//!   re-enters the write path and recurses without bound.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use planar_events::{Axis, CHANGE, Notifier};

/// Tolerance shared by [`Vector::equals`] and [`Vector::is_zero`].
pub const EPSILON: f64 = 1e-4;

/// Backing storage once a vector is observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Shadow {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

pub(crate) enum Storage {
    Unbound {
        x: f64,
        y: f64,
        /// Collaborator injected ahead of binding, if any.
        pending: Option<Rc<dyn Notifier>>,
    },
    Bound {
        shadow: Shadow,
        notifier: Rc<dyn Notifier>,
    },
}

/// A 2D vector used as position, scale, or translation in a scene graph.
///
/// Holders that need to observe each other's writes share one instance
/// through `Rc<Vector>`; all operations take `&self`.
pub struct Vector {
    pub(crate) storage: RefCell<Storage>,
}

impl Default for Vector {
    fn default() -> Self {
        Self::zero()
    }
}

impl Clone for Vector {
    /// Copy the coordinates into a fresh, unbound vector.
    ///
    /// Listeners and the notifier are not carried over.
    fn clone(&self) -> Self {
        let (x, y) = self.coords();
        Self::new(x, y)
    }
}

impl fmt::Debug for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.coords();
        f.debug_struct("Vector")
            .field("x", &x)
            .field("y", &y)
            .field("bound", &self.is_bound())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Construction and access
// ---------------------------------------------------------------------------

impl Vector {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            storage: RefCell::new(Storage::Unbound {
                x,
                y,
                pending: None,
            }),
        }
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Create an unbound vector that will report to `notifier` once bound.
    ///
    /// Without an injected notifier, binding creates a private
    /// [`Dispatcher`](planar_events::Dispatcher).
    #[must_use]
    pub fn with_notifier(x: f64, y: f64, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            storage: RefCell::new(Storage::Unbound {
                x,
                y,
                pending: Some(notifier),
            }),
        }
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.coords().0
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.coords().1
    }

    /// Both coordinates as a tuple.
    #[must_use]
    pub fn to_tuple(&self) -> (f64, f64) {
        self.coords()
    }

    /// Write the x coordinate. Bound vectors notify with field `x`.
    pub fn set_x(&self, value: f64) -> &Self {
        self.write_field(Axis::X, value)
    }

    /// Write the y coordinate. Bound vectors notify with field `y`.
    pub fn set_y(&self, value: f64) -> &Self {
        self.write_field(Axis::Y, value)
    }

    pub(crate) fn coords(&self) -> (f64, f64) {
        match &*self.storage.borrow() {
            Storage::Unbound { x, y, .. } => (*x, *y),
            Storage::Bound { shadow, .. } => (shadow.x, shadow.y),
        }
    }

    /// Whole-value write; one payload-free notification when bound.
    fn write(&self, x: f64, y: f64) -> &Self {
        let notifier = match &mut *self.storage.borrow_mut() {
            Storage::Unbound {
                x: cur_x, y: cur_y, ..
            } => {
                *cur_x = x;
                *cur_y = y;
                None
            }
            Storage::Bound { shadow, notifier } => {
                *shadow = Shadow { x, y };
                Some(Rc::clone(notifier))
            }
        };
        if let Some(notifier) = notifier {
            notifier.notify(CHANGE, None);
        }
        self
    }

    fn write_field(&self, axis: Axis, value: f64) -> &Self {
        let notifier = match &mut *self.storage.borrow_mut() {
            Storage::Unbound { x, y, .. } => {
                match axis {
                    Axis::X => *x = value,
                    Axis::Y => *y = value,
                }
                None
            }
            Storage::Bound { shadow, notifier } => {
                match axis {
                    Axis::X => shadow.x = value,
                    Axis::Y => shadow.y = value,
                }
                Some(Rc::clone(notifier))
            }
        };
        if let Some(notifier) = notifier {
            notifier.notify(CHANGE, Some(axis));
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Mutating operations
// ---------------------------------------------------------------------------

impl Vector {
    /// Assign both coordinates.
    pub fn set(&self, x: f64, y: f64) -> &Self {
        self.write(x, y)
    }

    /// Assign the coordinates of `v`.
    pub fn copy_from(&self, v: &Vector) -> &Self {
        let (x, y) = v.coords();
        self.write(x, y)
    }

    pub fn clear(&self) -> &Self {
        self.write(0.0, 0.0)
    }

    /// Become `v1 + v2`.
    #[allow(clippy::should_implement_trait)]
    pub fn add(&self, v1: &Vector, v2: &Vector) -> &Self {
        let (ax, ay) = v1.coords();
        let (bx, by) = v2.coords();
        self.write(ax + bx, ay + by)
    }

    pub fn add_self(&self, v: &Vector) -> &Self {
        let (vx, vy) = v.coords();
        let (x, y) = self.coords();
        self.write(x + vx, y + vy)
    }

    /// Become `v1 - v2`.
    #[allow(clippy::should_implement_trait)]
    pub fn sub(&self, v1: &Vector, v2: &Vector) -> &Self {
        let (ax, ay) = v1.coords();
        let (bx, by) = v2.coords();
        self.write(ax - bx, ay - by)
    }

    pub fn sub_self(&self, v: &Vector) -> &Self {
        let (vx, vy) = v.coords();
        let (x, y) = self.coords();
        self.write(x - vx, y - vy)
    }

    /// Component-wise product with `v`.
    pub fn multiply_self(&self, v: &Vector) -> &Self {
        let (vx, vy) = v.coords();
        let (x, y) = self.coords();
        self.write(x * vx, y * vy)
    }

    pub fn multiply_scalar(&self, s: f64) -> &Self {
        let (x, y) = self.coords();
        self.write(x * s, y * s)
    }

    /// Divide by `s`, or reset to `(0, 0)` when `s` is zero or NaN.
    pub fn divide_scalar(&self, s: f64) -> &Self {
        if s == 0.0 || s.is_nan() {
            return self.set(0.0, 0.0);
        }
        let (x, y) = self.coords();
        self.write(x / s, y / s)
    }

    pub fn negate(&self) -> &Self {
        self.multiply_scalar(-1.0)
    }

    /// Scale to unit length.
    ///
    /// Only an exact zero length falls back to `(0, 0)`; a nonzero vector
    /// shorter than [`EPSILON`] still becomes a unit vector.
    pub fn normalize(&self) -> &Self {
        self.divide_scalar(self.length())
    }

    /// Scale to length `l`, keeping direction.
    ///
    /// Runs as `normalize` then `multiply_scalar`, so a bound vector
    /// notifies twice.
    pub fn set_length(&self, l: f64) -> &Self {
        self.normalize().multiply_scalar(l)
    }

    /// Move toward `v` by fraction `t`.
    ///
    /// `t = 0` keeps the current value; `t = 1` lands on `v`.
    pub fn lerp(&self, v: &Vector, t: f64) -> &Self {
        let (vx, vy) = v.coords();
        let (x, y) = self.coords();
        self.set((vx - x) * t + x, (vy - y) * t + y)
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Vector {
    #[must_use]
    pub fn dot(&self, v: &Vector) -> f64 {
        let (x, y) = self.coords();
        let (vx, vy) = v.coords();
        x * vx + y * vy
    }

    #[must_use]
    pub fn length_squared(&self) -> f64 {
        let (x, y) = self.coords();
        x * x + y * y
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    #[must_use]
    pub fn distance_to_squared(&self, v: &Vector) -> f64 {
        let (x, y) = self.coords();
        let (vx, vy) = v.coords();
        let dx = x - vx;
        let dy = y - vy;
        dx * dx + dy * dy
    }

    #[must_use]
    pub fn distance_to(&self, v: &Vector) -> f64 {
        self.distance_to_squared(v).sqrt()
    }

    /// Whether `v` lies within [`EPSILON`] of this vector.
    #[must_use]
    pub fn equals(&self, v: &Vector) -> bool {
        self.distance_to(v) < EPSILON
    }

    /// Whether the length is below [`EPSILON`].
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.length() < EPSILON
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
