#![forbid(unsafe_code)]

//! Optional diagnostics for widget controllers.
//!
//! Widgets log state transitions (overlay opened or closed, search
//! submitted, auto-search fired, unmount) through `pnl_core::debug!` and wrap
//! input handling in `pnl_core::debug_span!`. With the `tracing` feature these
//! are the `tracing` macros. Without it they expand to nothing, so a host
//! that does not want the dependency pays nothing for the call sites.
//!
//! Query text is never a field: only its length is recorded.
//!
//! With `tracing-json`, [`init_subscriber`] installs the JSON formatter the
//! replay harness uses for its stderr log.

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span};

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// Expands to nothing without the `tracing` feature.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Expands to an inert span without the `tracing` feature.
    #[macro_export]
    macro_rules! debug_span {
        ($($arg:tt)*) => {
            $crate::logging::NoopSpan
        };
    }
}

/// Stand-in for `tracing::Span` when the feature is off.
#[cfg(not(feature = "tracing"))]
#[derive(Debug, Clone, Copy)]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Mirrors `Span::entered`.
    #[must_use]
    pub fn entered(self) -> NoopGuard {
        NoopGuard
    }
}

/// Guard returned by [`NoopSpan::entered`].
#[cfg(not(feature = "tracing"))]
#[derive(Debug)]
pub struct NoopGuard;

/// Install a global JSON subscriber writing to stderr.
///
/// `filter` uses `EnvFilter` directive syntax (`"info"`,
/// `"pnl_widgets=debug,info"`). An unparsable filter falls back to `info`.
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_subscriber(filter: &str) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
