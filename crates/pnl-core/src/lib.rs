#![forbid(unsafe_code)]

//! Core: canonical input events, hit-test geometry, host clocks, and logging.

pub mod clock;
pub mod event;
pub mod geometry;
pub mod logging;
pub mod text;

#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span};
