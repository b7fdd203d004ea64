#![forbid(unsafe_code)]

//! Core: the lazily observable [`Vector`] and its conversions.

pub mod binding;
pub mod convert;
pub mod error;
pub mod vector;

pub use error::{ParseVectorError, Result};
pub use vector::{EPSILON, Vector};
