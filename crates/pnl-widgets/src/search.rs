#![forbid(unsafe_code)]

//! Search overlay controller.
//!
//! [`SearchController`] owns the overlay's open/closed state and query text,
//! moves focus between the trigger and the input, dismisses on Escape and on
//! pointer presses outside the overlay, locks page scrolling while open, and
//! optionally runs a debounced auto-search.
//!
//! # Usage
//!
//! ```ignore
//! let ctx = HostContext::new();
//! let search = SearchController::mount(
//!     &ctx,
//!     SearchElements::new().trigger(button).input(field).container(panel),
//!     SearchOptions::new()
//!         .on_search(|q| println!("search {q}"))
//!         .debounce(Duration::from_millis(300)),
//! );
//!
//! search.open_search();
//! ctx.render(); // focus lands on the input
//! search.set_query("fibra");
//! ctx.advance(Duration::from_millis(300)); // on_search("fibra")
//! ```
//!
//! # State machine
//!
//! ```text
//!            open / toggle
//!   CLOSED ─────────────────▶ OPEN
//!     ▲                         │
//!     └─────────────────────────┘
//!   close / toggle / Escape / outside press
//! ```
//!
//! # Invariants
//!
//! 1. After any close, `query` is empty.
//! 2. `on_close` runs once per OPEN to CLOSED transition; closing while
//!    already closed only clears the query.
//! 3. The scroll lock follows `is_open` changes and is released on unmount
//!    whatever the state.
//! 4. At most one auto-search timer is pending; every query change cancels it
//!    first, and a blank query schedules nothing.
//! 5. After unmount the document listeners are gone and no callback fires.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use pnl_core::event::{Event, KeyCode, KeyEvent, Modifiers};
use pnl_core::text::{non_blank, pop_grapheme};
use pnl_runtime::{
    AfterRender, Debouncer, Document, DocumentEvent, HostContext, ListenerId, ListenerKind,
    Observable, Subscription,
};

use crate::host::SearchElements;

type SearchCallback = Rc<dyn Fn(&str)>;
type CloseCallback = Rc<dyn Fn()>;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Controller configuration. Every field is optional.
#[derive(Clone, Default)]
pub struct SearchOptions {
    on_search: Option<SearchCallback>,
    on_close: Option<CloseCallback>,
    debounce: Duration,
}

impl SearchOptions {
    /// No callbacks, auto-search disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the trimmed query on submit and on auto-search.
    #[must_use]
    pub fn on_search(mut self, f: impl Fn(&str) + 'static) -> Self {
        self.on_search = Some(Rc::new(f));
        self
    }

    /// Called on every OPEN to CLOSED transition.
    #[must_use]
    pub fn on_close(mut self, f: impl Fn() + 'static) -> Self {
        self.on_close = Some(Rc::new(f));
        self
    }

    /// Auto-search delay. Zero (the default) disables auto-search.
    #[must_use]
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    /// The configured auto-search delay.
    #[must_use]
    pub fn debounce_delay(&self) -> Duration {
        self.debounce
    }
}

impl fmt::Debug for SearchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOptions")
            .field("on_search", &self.on_search.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("debounce", &self.debounce)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Outcome of [`SearchController::handle_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    /// A non-blank query was submitted (trimmed).
    Submit(String),
    /// The overlay was dismissed.
    Dismiss,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

struct Inner {
    document: Document,
    after_render: Rc<dyn AfterRender>,
    elements: Cell<SearchElements>,
    is_open: Observable<bool>,
    query: Observable<String>,
    on_search: Option<SearchCallback>,
    on_close: Option<CloseCallback>,
    auto_search: Option<Debouncer>,
}

impl Inner {
    fn open(self: &Rc<Self>) {
        if self.is_open.set(true) {
            pnl_core::debug!(transition = "open", "search overlay");
        }
        let weak = Rc::downgrade(self);
        self.after_render.schedule_after_render(Box::new(move || {
            let Some(inner) = weak.upgrade() else { return };
            if !inner.is_open.get() {
                return;
            }
            if let Some(input) = inner.elements.get().input {
                inner.document.focus(input);
            }
        }));
    }

    fn close(self: &Rc<Self>) {
        let was_open = self.is_open.set(false);
        self.query.set(String::new());
        if !was_open {
            return;
        }
        pnl_core::debug!(transition = "close", "search overlay");
        if let Some(on_close) = &self.on_close {
            on_close();
        }
        let weak = Rc::downgrade(self);
        self.after_render.schedule_after_render(Box::new(move || {
            let Some(inner) = weak.upgrade() else { return };
            if inner.is_open.get() {
                return;
            }
            if let Some(trigger) = inner.elements.get().trigger {
                inner.document.focus(trigger);
            }
        }));
    }

    fn toggle(self: &Rc<Self>) {
        if self.is_open.get() {
            self.close();
        } else {
            self.open();
        }
    }

    fn clear(&self) {
        self.query.set(String::new());
        if let Some(input) = self.elements.get().input {
            self.document.focus(input);
        }
    }

    fn submit(&self) -> Option<String> {
        let trimmed = self.query.with(|q| non_blank(q).map(str::to_owned))?;
        pnl_core::debug!(query_len = trimmed.len(), "search submitted");
        if let Some(on_search) = &self.on_search {
            on_search(&trimmed);
        }
        Some(trimmed)
    }

    fn query_changed(&self, query: &str) {
        let (Some(debouncer), Some(on_search)) = (&self.auto_search, &self.on_search) else {
            return;
        };
        debouncer.cancel();
        let Some(trimmed) = non_blank(query) else {
            return;
        };
        let trimmed = trimmed.to_owned();
        let on_search = Rc::clone(on_search);
        debouncer.schedule(move || {
            pnl_core::debug!(query_len = trimmed.len(), "auto-search fired");
            on_search(&trimmed);
        });
    }

    fn on_key_down(self: &Rc<Self>, ev: &mut DocumentEvent) {
        if ev.key().is_some_and(KeyEvent::is_escape) && self.is_open.get() {
            ev.prevent_default();
            self.close();
        }
    }

    fn on_pointer_down(self: &Rc<Self>, ev: &mut DocumentEvent) {
        if !self.is_open.get() {
            return;
        }
        let Some((container, trigger)) = self.elements.get().dismiss_bounds(&self.document)
        else {
            return;
        };
        let inside = ev.target().is_some_and(|target| {
            self.document.contains(container, target) || self.document.contains(trigger, target)
        });
        if !inside {
            pnl_core::debug!(element = ?ev.target(), "outside press dismisses search");
            self.close();
        }
    }
}

/// Search overlay controller bound to one host.
///
/// Mounting registers the document listeners; dropping the controller (or
/// calling [`unmount`](Self::unmount)) removes them, cancels a pending
/// auto-search, and releases the scroll lock.
///
/// State is read through [`is_open`](Self::is_open), [`query`](Self::query)
/// and the `subscribe_*` methods. It only changes through the operations
/// below, so a host cannot close the overlay behind the controller's back:
///
/// ```compile_fail
/// use pnl_runtime::HostContext;
/// use pnl_widgets::{SearchController, SearchElements, SearchOptions};
///
/// let ctx = HostContext::new();
/// let search = SearchController::mount(&ctx, SearchElements::new(), SearchOptions::new());
/// search.open_search();
/// search.open_state().set(false);
/// ```
///
/// ```compile_fail
/// use pnl_runtime::HostContext;
/// use pnl_widgets::{SearchController, SearchElements, SearchOptions};
///
/// let ctx = HostContext::new();
/// let search = SearchController::mount(&ctx, SearchElements::new(), SearchOptions::new());
/// search.inner.is_open.set(false);
/// ```
pub struct SearchController {
    inner: Rc<Inner>,
    listeners: Vec<ListenerId>,
    _subscriptions: Vec<Subscription>,
}

impl SearchController {
    /// Create a closed, empty session and attach it to `ctx`.
    #[must_use]
    pub fn mount(ctx: &HostContext, elements: SearchElements, options: SearchOptions) -> Self {
        let SearchOptions {
            on_search,
            on_close,
            debounce,
        } = options;
        let auto_search = (!debounce.is_zero() && on_search.is_some())
            .then(|| Debouncer::new(ctx.timers().clone(), debounce));

        let inner = Rc::new(Inner {
            document: ctx.document().clone(),
            after_render: Rc::clone(ctx.after_render()),
            elements: Cell::new(elements),
            is_open: Observable::new(false),
            query: Observable::new(String::new()),
            on_search,
            on_close,
            auto_search,
        });

        let mut subscriptions = Vec::with_capacity(2);
        subscriptions.push(inner.is_open.subscribe({
            let document = inner.document.clone();
            move |open: &bool| document.set_scroll_locked(*open)
        }));
        if inner.auto_search.is_some() {
            let weak = Rc::downgrade(&inner);
            subscriptions.push(inner.query.subscribe(move |query: &String| {
                if let Some(inner) = weak.upgrade() {
                    inner.query_changed(query);
                }
            }));
        }

        let listeners = vec![
            inner.document.add_listener(
                ListenerKind::KeyDown,
                listener(Rc::downgrade(&inner), Inner::on_key_down),
            ),
            inner.document.add_listener(
                ListenerKind::PointerDown,
                listener(Rc::downgrade(&inner), Inner::on_pointer_down),
            ),
        ];
        pnl_core::debug!(debounce_ms = debounce.as_millis() as u64, "search mounted");

        Self {
            inner,
            listeners,
            _subscriptions: subscriptions,
        }
    }

    /// Replace the bound elements, for hosts that create them after mount.
    pub fn bind_elements(&self, elements: SearchElements) {
        self.inner.elements.set(elements);
    }

    /// The bound elements.
    #[must_use]
    pub fn elements(&self) -> SearchElements {
        self.inner.elements.get()
    }

    // --- State ---

    /// Whether the overlay is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.is_open.get()
    }

    /// Current query text.
    #[must_use]
    pub fn query(&self) -> String {
        self.inner.query.get()
    }

    /// Subscribe to open/close changes.
    pub fn subscribe_open(&self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.inner.is_open.subscribe(callback)
    }

    /// Subscribe to query changes.
    pub fn subscribe_query(&self, callback: impl Fn(&String) + 'static) -> Subscription {
        self.inner.query.subscribe(callback)
    }

    /// Whether an auto-search is waiting for the query to settle.
    #[must_use]
    pub fn auto_search_pending(&self) -> bool {
        self.inner
            .auto_search
            .as_ref()
            .is_some_and(Debouncer::is_pending)
    }

    // --- Operations ---

    /// Open if closed, close if open.
    pub fn toggle_search(&self) {
        self.inner.toggle();
    }

    /// Open the overlay; the input is focused after the next render.
    pub fn open_search(&self) {
        self.inner.open();
    }

    /// Close the overlay and clear the query; the trigger is focused after
    /// the next render.
    pub fn close_search(&self) {
        self.inner.close();
    }

    /// Clear the query and focus the input. Open state is unchanged.
    pub fn clear_search(&self) {
        self.inner.clear();
    }

    /// Submit the trimmed query if it is not blank.
    ///
    /// Returns the submitted text.
    pub fn handle_search_submit(&self) -> Option<String> {
        self.inner.submit()
    }

    /// Replace the query (the input's value binding).
    pub fn set_query(&self, text: impl Into<String>) {
        self.inner.query.set(text.into());
    }

    /// Handle an event routed to the focused search input.
    ///
    /// Ignored while closed. Enter submits, Escape dismisses, Backspace
    /// deletes the last grapheme, Ctrl+U clears, printable keys and pastes
    /// append.
    pub fn handle_event(&self, event: &Event) -> Option<SearchAction> {
        if !self.is_open() {
            return None;
        }

        let _span = pnl_core::debug_span!("search_handle_event").entered();

        match event {
            Event::Paste(paste) => {
                let text: String = paste
                    .text
                    .chars()
                    .filter(|c| *c != '\n' && *c != '\r')
                    .collect();
                if !text.is_empty() {
                    self.inner.query.update(|q| q.push_str(&text));
                }
                None
            }
            _ => {
                let key = event.as_key_down()?;
                self.handle_key(key)
            }
        }
    }

    fn handle_key(&self, key: &KeyEvent) -> Option<SearchAction> {
        match key.code {
            KeyCode::Escape => {
                self.inner.close();
                Some(SearchAction::Dismiss)
            }
            KeyCode::Enter => self.inner.submit().map(SearchAction::Submit),
            KeyCode::Backspace => {
                self.inner.query.update(|q| {
                    pop_grapheme(q);
                });
                None
            }
            KeyCode::Char('u') if key.modifiers.contains(Modifiers::CTRL) => {
                self.inner.clear();
                None
            }
            _ => {
                let c = key.text_char()?;
                self.inner.query.update(|q| q.push(c));
                None
            }
        }
    }

    /// Tear down now. Equivalent to dropping the controller.
    pub fn unmount(self) {}

    fn teardown(&mut self) {
        for id in self.listeners.drain(..) {
            self.inner.document.remove_listener(id);
        }
        if let Some(debouncer) = &self.inner.auto_search {
            debouncer.cancel();
        }
        self.inner.document.set_scroll_locked(false);
        pnl_core::debug!("search unmounted");
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for SearchController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchController")
            .field("is_open", &self.is_open())
            .field("query", &self.query())
            .field("elements", &self.elements())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn listener(
    weak: Weak<Inner>,
    handler: fn(&Rc<Inner>, &mut DocumentEvent),
) -> impl Fn(&mut DocumentEvent) + 'static {
    move |ev| {
        if let Some(inner) = weak.upgrade() {
            handler(&inner, ev);
        }
    }
}
