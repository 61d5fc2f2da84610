#![forbid(unsafe_code)]

//! Monotonic clocks.
//!
//! Widgets never read wall time directly. The host owns time: a browser host
//! forwards `performance.now()`, a terminal host wraps [`Instant`], and tests
//! advance a [`DeterministicClock`] by hand.

use std::time::{Duration, Instant};

/// A monotonic time source measured from an arbitrary origin.
pub trait Clock {
    /// Time elapsed since the clock's origin. Never decreases.
    fn now_mono(&self) -> Duration;
}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time. Moving backwards is ignored.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl Clock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

/// Clock backed by [`Instant`], for native hosts.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_mono(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_clock_advances() {
        let mut clock = DeterministicClock::new();
        assert_eq!(clock.now_mono(), Duration::ZERO);
        clock.advance(Duration::from_millis(150));
        clock.advance(Duration::from_millis(150));
        assert_eq!(clock.now_mono(), Duration::from_millis(300));
    }

    #[test]
    fn deterministic_clock_never_moves_backwards() {
        let mut clock = DeterministicClock::new();
        clock.set(Duration::from_secs(2));
        clock.set(Duration::from_secs(1));
        assert_eq!(clock.now_mono(), Duration::from_secs(2));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_mono();
        let b = clock.now_mono();
        assert!(b >= a);
    }
}
