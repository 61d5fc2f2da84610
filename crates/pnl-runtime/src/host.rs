#![forbid(unsafe_code)]

//! The bundle of host services a widget is mounted into.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::document::Document;
use crate::render_queue::{AfterRender, RenderQueue};
use crate::timer::TimerQueue;

/// Document, timers and after-render scheduling for one page.
///
/// Clones share all services. The host drives time with
/// [`advance`](Self::advance) and signals paints with
/// [`render`](Self::render).
#[derive(Clone)]
pub struct HostContext {
    document: Document,
    timers: TimerQueue,
    frames: RenderQueue,
    after_render: Rc<dyn AfterRender>,
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new()
    }
}

impl HostContext {
    /// Fresh document, timers at zero, after-render backed by the internal queue.
    #[must_use]
    pub fn new() -> Self {
        let frames = RenderQueue::new();
        Self {
            document: Document::new(),
            timers: TimerQueue::new(),
            after_render: Rc::new(frames.clone()),
            frames,
        }
    }

    /// Route after-render tasks to a host-provided scheduler instead.
    ///
    /// [`render`](Self::render) then only flushes tasks queued directly on
    /// [`frames`](Self::frames).
    #[must_use]
    pub fn with_after_render(mut self, scheduler: Rc<dyn AfterRender>) -> Self {
        self.after_render = scheduler;
        self
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    #[must_use]
    pub fn frames(&self) -> &RenderQueue {
        &self.frames
    }

    #[must_use]
    pub fn after_render(&self) -> &Rc<dyn AfterRender> {
        &self.after_render
    }

    /// Advance host time, firing due timers. Returns how many fired.
    pub fn advance(&self, dt: Duration) -> usize {
        self.timers.advance(dt)
    }

    /// Signal that the host has rendered. Returns how many tasks ran.
    pub fn render(&self) -> usize {
        self.frames.flush()
    }

    /// Advance time, then render.
    pub fn step(&self, dt: Duration) {
        self.advance(dt);
        self.render();
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("document", &self.document)
            .field("timers", &self.timers)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}
