#![forbid(unsafe_code)]

//! Debouncing on top of [`TimerQueue`].
//!
//! [`Debouncer`] is the primitive: a single timer slot where scheduling a new
//! task cancels the one still waiting. [`Debounced`] applies it to an
//! [`Observable`], producing a second observable that only catches up once
//! the source has been quiet for the configured delay.
//!
//! # Invariants
//!
//! 1. At most one timer is live per debouncer.
//! 2. A zero delay still defers to the next timer tick.
//! 3. Dropping a debouncer (or a `Debounced`) cancels its pending timer, so
//!    nothing is written after teardown.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::reactive::{Observable, Subscription};
use crate::timer::{TimerId, TimerQueue};

/// Single-slot, last-write-wins delayed task runner.
pub struct Debouncer {
    timers: TimerQueue,
    delay: Duration,
    pending: Rc<Cell<Option<TimerId>>>,
}

impl Debouncer {
    /// Create a debouncer that runs tasks `delay` after the last schedule.
    #[must_use]
    pub fn new(timers: TimerQueue, delay: Duration) -> Self {
        Self {
            timers,
            delay,
            pending: Rc::new(Cell::new(None)),
        }
    }

    /// The configured delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancel whatever is pending and schedule `task` in its place.
    pub fn schedule(&self, task: impl FnOnce() + 'static) {
        self.cancel();
        let slot = Rc::clone(&self.pending);
        let id = self.timers.schedule(self.delay, move || {
            slot.set(None);
            task();
        });
        self.pending.set(Some(id));
    }

    /// Cancel the pending task. Returns `true` if one was waiting.
    pub fn cancel(&self) -> bool {
        match self.pending.take() {
            Some(id) => self.timers.cancel(id),
            None => false,
        }
    }

    /// Whether a task is waiting to run.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// An observable that trails its source by a quiet period.
///
/// The output starts equal to the source. Each source change restarts the
/// countdown; when it completes, the output takes the value the source had at
/// its last change.
pub struct Debounced<T> {
    output: Observable<T>,
    debouncer: Rc<Debouncer>,
    _source: Subscription,
}

impl<T: Clone + PartialEq + 'static> Debounced<T> {
    /// Debounce `source` by `delay`, using `timers` for scheduling.
    #[must_use]
    pub fn new(source: &Observable<T>, delay: Duration, timers: &TimerQueue) -> Self {
        let output = Observable::new(source.get());
        let debouncer = Rc::new(Debouncer::new(timers.clone(), delay));
        let subscription = source.subscribe({
            let output = output.clone();
            let debouncer = Rc::downgrade(&debouncer);
            move |value: &T| {
                let Some(debouncer) = debouncer.upgrade() else {
                    return;
                };
                let output = output.clone();
                let value = value.clone();
                debouncer.schedule(move || {
                    output.set(value);
                });
            }
        });
        Self {
            output,
            debouncer,
            _source: subscription,
        }
    }

    /// The settled value.
    #[must_use]
    pub fn get(&self) -> T {
        self.output.get()
    }

    /// The output observable, for subscribing to settled changes.
    #[must_use]
    pub fn observable(&self) -> &Observable<T> {
        &self.output
    }

    /// Whether a source change is still waiting out the delay.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

impl<T: fmt::Debug> fmt::Debug for Debounced<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounced")
            .field("output", &self.output)
            .field("debouncer", &self.debouncer)
            .finish()
    }
}
