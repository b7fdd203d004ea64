use std::num::ParseFloatError;

use planar_events::Axis;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseVectorError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseVectorError {
    #[error("expected 2 components, found {found}")]
    ComponentCount { found: usize },

    #[error("invalid {axis} component {value:?}")]
    InvalidComponent {
        axis: Axis,
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("unbalanced parenthesis in {input:?}")]
    UnbalancedParen { input: String },
}

impl ParseVectorError {
    /// The coordinate that failed to parse, if any.
    #[must_use]
    pub fn axis(&self) -> Option<Axis> {
        match self {
            Self::InvalidComponent { axis, .. } => Some(*axis),
            _ => None,
        }
    }
}
