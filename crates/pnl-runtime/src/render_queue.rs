#![forbid(unsafe_code)]

//! Deferred "after the next render" tasks.
//!
//! Focus can only move to an element once the host has rendered it. Widgets
//! therefore hand focus work to an [`AfterRender`] scheduler instead of doing
//! it inline; the host flushes the queue right after it paints.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// Something that can run a task after the host's next render.
pub trait AfterRender {
    /// Queue `task` to run once the next render has completed.
    fn schedule_after_render(&self, task: Box<dyn FnOnce()>);
}

/// FIFO queue of after-render tasks. Clones share the queue.
#[derive(Clone, Default)]
pub struct RenderQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl RenderQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task.
    pub fn schedule(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Number of tasks waiting for the next flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Run every task queued before this call, in order.
    ///
    /// Tasks queued while flushing wait for the next flush.
    pub fn flush(&self) -> usize {
        let batch: Vec<Task> = self.tasks.borrow_mut().drain(..).collect();
        let ran = batch.len();
        for task in batch {
            task();
        }
        if ran > 0 {
            tracing::trace!(ran, "after-render flush");
        }
        ran
    }
}

impl AfterRender for RenderQueue {
    fn schedule_after_render(&self, task: Box<dyn FnOnce()>) {
        self.tasks.borrow_mut().push_back(task);
    }
}

impl fmt::Debug for RenderQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderQueue")
            .field("pending", &self.pending())
            .finish()
    }
}
