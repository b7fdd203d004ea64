#![forbid(unsafe_code)]

//! Event payloads delivered to listeners.

use std::fmt;

/// Event name emitted whenever an observed value is written.
pub const CHANGE: &str = "change";

/// One coordinate of a planar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Field name carried as the payload of a single-field write.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification as seen by a listener.
///
/// `field` is `Some` when exactly one coordinate was written through its
/// accessor, and `None` for writes that replace the whole value at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event<'a> {
    pub name: &'a str,
    pub field: Option<Axis>,
}

impl<'a> Event<'a> {
    #[must_use]
    pub const fn new(name: &'a str, field: Option<Axis>) -> Self {
        Self { name, field }
    }

    /// Whether this is a [`CHANGE`] notification.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.name == CHANGE
    }
}
