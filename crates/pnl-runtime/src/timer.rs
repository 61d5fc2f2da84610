#![forbid(unsafe_code)]

//! Host-driven one-shot timers.
//!
//! [`TimerQueue`] is the `setTimeout`/`clearTimeout` of this runtime, minus
//! the event loop: tasks only run when the host calls
//! [`advance`](TimerQueue::advance) (or [`advance_to`](TimerQueue::advance_to)
//! with a reading from its own clock). Tests drive it exactly like fake
//! timers.
//!
//! # Ordering
//!
//! Due tasks run in deadline order, ties broken by scheduling order. A task
//! scheduled from inside another task is eligible in the same `advance` call
//! if its deadline falls inside the advanced window. A zero delay never runs
//! synchronously; it runs on the next `advance`, including `advance(ZERO)`.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use pnl_core::clock::{Clock, DeterministicClock};

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct Queue {
    clock: DeterministicClock,
    next_id: u64,
    /// Keyed by (deadline, id) so iteration order is firing order.
    tasks: BTreeMap<(Duration, u64), Task>,
    deadlines: HashMap<u64, Duration>,
    fired: u64,
}

impl Queue {
    fn pop_due(&mut self, limit: Duration) -> Option<(TimerId, Duration, Task)> {
        let (&(deadline, id), _) = self.tasks.first_key_value()?;
        if deadline > limit {
            return None;
        }
        let task = self.tasks.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        Some((TimerId(id), deadline, task))
    }
}

/// Shared timer queue. Clones refer to the same queue.
#[derive(Clone, Default)]
pub struct TimerQueue {
    inner: Rc<RefCell<Queue>>,
}

impl TimerQueue {
    /// Create an empty queue with its clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time on the queue's clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.inner.borrow().clock.now_mono()
    }

    /// Schedule `task` to run once, `delay` from now.
    pub fn schedule(&self, delay: Duration, task: impl FnOnce() + 'static) -> TimerId {
        let mut queue = self.inner.borrow_mut();
        let id = queue.next_id;
        queue.next_id += 1;
        let deadline = queue.clock.now_mono().saturating_add(delay);
        queue.tasks.insert((deadline, id), Box::new(task));
        queue.deadlines.insert(id, deadline);
        tracing::trace!(timer = id, delay_ms = delay.as_millis() as u64, "timer scheduled");
        TimerId(id)
    }

    /// Cancel a pending task. Returns `false` if it already ran or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        let mut queue = self.inner.borrow_mut();
        match queue.deadlines.remove(&id.0) {
            Some(deadline) => {
                queue.tasks.remove(&(deadline, id.0));
                tracing::trace!(timer = id.0, "timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether `id` is still waiting to run.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.inner.borrow().deadlines.contains_key(&id.0)
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Earliest pending deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner
            .borrow()
            .tasks
            .first_key_value()
            .map(|(&(deadline, _), _)| deadline)
    }

    /// Total number of tasks that have run.
    #[must_use]
    pub fn fired_count(&self) -> u64 {
        self.inner.borrow().fired
    }

    /// Advance the clock by `dt`, running every task that comes due.
    ///
    /// Returns the number of tasks run.
    pub fn advance(&self, dt: Duration) -> usize {
        let target = self.now().saturating_add(dt);
        self.advance_to(target)
    }

    /// Advance the clock to `target` (ignored if in the past), running every
    /// task that comes due on the way.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut ran = 0;
        loop {
            let next = {
                let mut queue = self.inner.borrow_mut();
                let due = queue.pop_due(target);
                if let Some((_, deadline, _)) = &due {
                    queue.clock.set(*deadline);
                    queue.fired += 1;
                }
                due
            };
            let Some((id, _, task)) = next else { break };
            tracing::trace!(timer = id.0, "timer fired");
            task();
            ran += 1;
        }
        self.inner.borrow_mut().clock.set(target);
        ran
    }

    /// Run tasks already due without moving the clock.
    pub fn run_due(&self) -> usize {
        self.advance(Duration::ZERO)
    }
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.inner.borrow();
        f.debug_struct("TimerQueue")
            .field("now", &queue.clock.now_mono())
            .field("pending", &queue.tasks.len())
            .field("fired", &queue.fired)
            .finish()
    }
}
