//! Shared value types: transforms and colours.

pub mod types;

pub use types::{Color, ColorParseError, Transform};
