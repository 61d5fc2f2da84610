#![forbid(unsafe_code)]

//! Interactive widgets for the PayNetLink site shell.
//!
//! Widgets here are controllers, not painters: they own interaction state,
//! bind to elements the host created in its [`Document`](pnl_runtime::Document),
//! and expose observable state the host renders from.
//!
//! - [`search`]: the search overlay controller used by the navigation bar.
//! - [`host`]: element handles a host hands to a widget on mount.

pub mod host;
pub mod search;

pub use host::SearchElements;
pub use search::{SearchAction, SearchController, SearchOptions};
