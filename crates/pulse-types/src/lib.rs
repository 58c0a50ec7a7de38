//! Shared domain types for the Pulse stats engine.

pub mod analytics;
pub mod config;
pub mod live;
pub mod records;

mod errors;

pub use errors::{PulseError, Result};
