#![forbid(unsafe_code)]

//! Conversions between [`Vector`] and plain coordinate data.
//!
//! The text form is `(x, y)`. Parsing also accepts the components without
//! parentheses and separated by whitespace instead of a comma, as found in
//! scene attribute strings: `"10 20"`, `"10,20"`, `"( 1.5 , -2 )"`.

use std::fmt;
use std::str::FromStr;

use planar_events::Axis;

use crate::error::{ParseVectorError, Result};
use crate::vector::Vector;

impl From<(f64, f64)> for Vector {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Vector {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<&Vector> for (f64, f64) {
    fn from(v: &Vector) -> Self {
        v.to_tuple()
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.to_tuple();
        write!(f, "({x}, {y})")
    }
}

impl FromStr for Vector {
    type Err = ParseVectorError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let open = trimmed.starts_with('(');
        let close = trimmed.ends_with(')');
        if open != close || (open && trimmed.len() < 2) {
            return Err(ParseVectorError::UnbalancedParen {
                input: s.to_owned(),
            });
        }
        let body = if open {
            &trimmed[1..trimmed.len() - 1]
        } else {
            trimmed
        };

        let parts: Vec<&str> = body
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect();
        let [x, y] = parts.as_slice() else {
            return Err(ParseVectorError::ComponentCount { found: parts.len() });
        };

        Ok(Self::new(parse_component(Axis::X, x)?, parse_component(Axis::Y, y)?))
    }
}

fn parse_component(axis: Axis, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|source| ParseVectorError::InvalidComponent {
            axis,
            value: raw.to_owned(),
            source,
        })
}
