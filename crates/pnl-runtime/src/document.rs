#![forbid(unsafe_code)]

//! The host document: element tree, focus, global listeners, page flags.
//!
//! [`Document`] stands in for the browser's `document`. Widgets never own
//! elements; they hold [`ElementId`] handles that the host created and that
//! may be removed at any time (every operation on a removed element is a
//! quiet no-op).
//!
//! Input reaches listeners through [`Document::dispatch_event`]: keyboard
//! events target the focused element, pointer presses target the deepest
//! element whose bounds contain the pointer.
//!
//! # Invariants
//!
//! 1. `contains(a, b)` holds iff `b` is `a` or a descendant of `a`, and both
//!    are attached.
//! 2. The active element is always attached (removal blurs).
//! 3. Listeners run in registration order with no internal borrow held; a
//!    listener removed during dispatch does not run afterwards.
//! 4. The scroll lock is a single flag: last writer wins.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use pnl_core::event::{Event, KeyEvent, MouseEvent};
use pnl_core::geometry::Rect;

/// Handle to an element owned by a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

/// Handle to a registered document listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Which global event a listener receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Key presses and repeats.
    KeyDown,
    /// Pointer button presses.
    PointerDown,
}

impl ListenerKind {
    /// Classify an event, if any listener kind receives it.
    #[must_use]
    pub fn of(event: &Event) -> Option<Self> {
        if event.as_key_down().is_some() {
            Some(Self::KeyDown)
        } else if event.as_pointer_down().is_some() {
            Some(Self::PointerDown)
        } else {
            None
        }
    }
}

/// An event in flight through the document's listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEvent {
    event: Event,
    target: Option<ElementId>,
    default_prevented: bool,
}

impl DocumentEvent {
    /// Wrap `event` aimed at `target`.
    #[must_use]
    pub fn new(event: Event, target: Option<ElementId>) -> Self {
        Self {
            event,
            target,
            default_prevented: false,
        }
    }

    /// The underlying input event.
    #[must_use]
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// The element the event was aimed at, if any.
    #[must_use]
    pub fn target(&self) -> Option<ElementId> {
        self.target
    }

    /// The key event, for keydowns.
    #[must_use]
    pub fn key(&self) -> Option<&KeyEvent> {
        self.event.as_key_down()
    }

    /// The pointer event, for pointer presses.
    #[must_use]
    pub fn pointer(&self) -> Option<&MouseEvent> {
        self.event.as_pointer_down()
    }

    /// Ask the host to skip its default handling.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether any listener called [`prevent_default`](Self::prevent_default).
    #[must_use]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

type Listener = Rc<dyn Fn(&mut DocumentEvent)>;

#[derive(Debug)]
struct Element {
    label: String,
    parent: Option<ElementId>,
    bounds: Option<Rect>,
    attached: bool,
}

/// Number of focus moves [`Document::focus_history`] remembers.
pub const FOCUS_HISTORY_LIMIT: usize = 32;

struct State {
    elements: Vec<Element>,
    active: Option<ElementId>,
    focus_log: VecDeque<ElementId>,
    listeners: Vec<(ListenerId, ListenerKind, Listener)>,
    next_listener: u64,
    scroll_locked: bool,
    lang: String,
}

impl State {
    fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0 as usize).filter(|el| el.attached)
    }

    fn depth(&self, id: ElementId) -> usize {
        let mut depth = 0;
        let mut cursor = self.element(id).and_then(|el| el.parent);
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.element(parent).and_then(|el| el.parent);
        }
        depth
    }
}

/// Shared document handle. Clones refer to the same document.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<State>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with no listeners, scroll unlocked.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(State {
                elements: Vec::new(),
                active: None,
                focus_log: VecDeque::with_capacity(FOCUS_HISTORY_LIMIT),
                listeners: Vec::new(),
                next_listener: 0,
                scroll_locked: false,
                lang: String::new(),
            })),
        }
    }

    // --- Elements ---

    /// Create an element under `parent` (or at the root).
    ///
    /// A detached or unknown parent attaches the element at the root.
    pub fn create_element(&self, label: impl Into<String>, parent: Option<ElementId>) -> ElementId {
        let mut state = self.inner.borrow_mut();
        let parent = parent.filter(|p| state.element(*p).is_some());
        let id = ElementId(state.elements.len() as u32);
        state.elements.push(Element {
            label: label.into(),
            parent,
            bounds: None,
            attached: true,
        });
        id
    }

    /// Set the layout bounds used for pointer hit testing.
    pub fn set_bounds(&self, id: ElementId, bounds: Rect) {
        let mut state = self.inner.borrow_mut();
        if let Some(el) = state.elements.get_mut(id.0 as usize).filter(|el| el.attached) {
            el.bounds = Some(bounds);
        }
    }

    /// Detach `id` and its whole subtree.
    pub fn remove_element(&self, id: ElementId) {
        let mut state = self.inner.borrow_mut();
        if state.element(id).is_none() {
            return;
        }
        // Children always have larger ids than their parents.
        let mut removed = vec![id];
        for idx in (id.0 as usize + 1)..state.elements.len() {
            let child = ElementId(idx as u32);
            if state.elements[idx]
                .parent
                .is_some_and(|p| removed.contains(&p))
                && state.elements[idx].attached
            {
                removed.push(child);
            }
        }
        for gone in &removed {
            state.elements[gone.0 as usize].attached = false;
        }
        if state.active.is_some_and(|a| removed.contains(&a)) {
            state.active = None;
        }
    }

    /// Whether `id` exists and is attached.
    #[must_use]
    pub fn is_attached(&self, id: ElementId) -> bool {
        self.inner.borrow().element(id).is_some()
    }

    /// The label given at creation, for logs and diagnostics.
    #[must_use]
    pub fn label(&self, id: ElementId) -> Option<String> {
        self.inner.borrow().element(id).map(|el| el.label.clone())
    }

    /// Whether `node` is `ancestor` or lies inside it.
    #[must_use]
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let state = self.inner.borrow();
        if state.element(ancestor).is_none() {
            return false;
        }
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let Some(el) = state.element(id) else {
                return false;
            };
            if id == ancestor {
                return true;
            }
            cursor = el.parent;
        }
        false
    }

    /// The deepest attached element whose bounds contain `(x, y)`.
    ///
    /// Among equally deep candidates the most recently created wins.
    #[must_use]
    pub fn hit_test(&self, x: u16, y: u16) -> Option<ElementId> {
        let state = self.inner.borrow();
        state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.attached && el.bounds.is_some_and(|b| b.contains(x, y)))
            .map(|(idx, _)| ElementId(idx as u32))
            .max_by_key(|id| (state.depth(*id), *id))
    }

    // --- Focus ---

    /// Move focus to `id`. Returns `false` if the element is not attached.
    pub fn focus(&self, id: ElementId) -> bool {
        let mut state = self.inner.borrow_mut();
        if state.element(id).is_none() {
            return false;
        }
        state.active = Some(id);
        if state.focus_log.len() == FOCUS_HISTORY_LIMIT {
            state.focus_log.pop_front();
        }
        state.focus_log.push_back(id);
        true
    }

    /// Clear focus.
    pub fn blur(&self) {
        self.inner.borrow_mut().active = None;
    }

    /// The focused element.
    #[must_use]
    pub fn active_element(&self) -> Option<ElementId> {
        self.inner.borrow().active
    }

    /// The most recent successful focus calls, oldest first. At most
    /// [`FOCUS_HISTORY_LIMIT`] entries are kept.
    #[must_use]
    pub fn focus_history(&self) -> Vec<ElementId> {
        self.inner.borrow().focus_log.iter().copied().collect()
    }

    // --- Listeners ---

    /// Register a global listener. It stays until [`remove_listener`](Self::remove_listener).
    pub fn add_listener(
        &self,
        kind: ListenerKind,
        listener: impl Fn(&mut DocumentEvent) + 'static,
    ) -> ListenerId {
        let mut state = self.inner.borrow_mut();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push((id, kind, Rc::new(listener)));
        tracing::trace!(listener = id.0, ?kind, "listener added");
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self.inner.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|(lid, _, _)| *lid != id);
        let removed = state.listeners.len() != before;
        if removed {
            tracing::trace!(listener = id.0, "listener removed");
        }
        removed
    }

    /// Number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: ListenerKind) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    /// Route `event` to its natural target and run matching listeners.
    ///
    /// Keyboard events target the focused element; pointer presses target
    /// [`hit_test`](Self::hit_test) at the pointer position.
    pub fn dispatch_event(&self, event: Event) -> DocumentEvent {
        let target = match &event {
            Event::Key(_) | Event::Paste(_) => self.active_element(),
            Event::Mouse(mouse) => self.hit_test(mouse.x, mouse.y),
            Event::Focus(_) | Event::Tick => None,
        };
        self.dispatch(event, target)
    }

    /// Run matching listeners for `event` with an explicit target.
    pub fn dispatch(&self, event: Event, target: Option<ElementId>) -> DocumentEvent {
        let mut doc_event = DocumentEvent::new(event, target);
        let Some(kind) = ListenerKind::of(doc_event.event()) else {
            return doc_event;
        };
        let snapshot: Vec<(ListenerId, Listener)> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(id, _, l)| (*id, Rc::clone(l)))
            .collect();
        tracing::trace!(?kind, ?target, listeners = snapshot.len(), "dispatch");
        for (id, listener) in snapshot {
            let live = self
                .inner
                .borrow()
                .listeners
                .iter()
                .any(|(lid, _, _)| *lid == id);
            if live {
                listener(&mut doc_event);
            }
        }
        doc_event
    }

    // --- Page flags ---

    /// Lock or unlock page scrolling.
    pub fn set_scroll_locked(&self, locked: bool) {
        let mut state = self.inner.borrow_mut();
        if state.scroll_locked != locked {
            tracing::debug!(locked, "scroll lock");
        }
        state.scroll_locked = locked;
    }

    /// Whether page scrolling is locked.
    #[must_use]
    pub fn is_scroll_locked(&self) -> bool {
        self.inner.borrow().scroll_locked
    }

    /// Set the document language attribute.
    pub fn set_lang(&self, lang: impl Into<String>) {
        self.inner.borrow_mut().lang = lang.into();
    }

    /// The document language attribute (empty until set).
    #[must_use]
    pub fn lang(&self) -> String {
        self.inner.borrow().lang.clone()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Document")
            .field("elements", &state.elements.iter().filter(|e| e.attached).count())
            .field("active", &state.active)
            .field("listeners", &state.listeners.len())
            .field("scroll_locked", &state.scroll_locked)
            .field("lang", &state.lang)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnl_core::event::{KeyCode, KeyEventKind, MouseEventKind};
    use std::cell::Cell;

    fn nav(doc: &Document) -> (ElementId, ElementId, ElementId) {
        let header = doc.create_element("header", None);
        doc.set_bounds(header, Rect::new(0, 0, 100, 10));
        let container = doc.create_element("search-container", Some(header));
        doc.set_bounds(container, Rect::new(50, 0, 40, 3));
        let input = doc.create_element("search-input", Some(container));
        doc.set_bounds(input, Rect::new(51, 1, 30, 1));
        (header, container, input)
    }

    #[test]
    fn contains_follows_parent_chain() {
        let doc = Document::new();
        let (header, container, input) = nav(&doc);
        assert!(doc.contains(container, input));
        assert!(doc.contains(header, input));
        assert!(doc.contains(input, input));
        assert!(!doc.contains(input, container));
    }

    #[test]
    fn removed_subtree_is_detached() {
        let doc = Document::new();
        let (header, container, input) = nav(&doc);
        doc.focus(input);
        doc.remove_element(container);
        assert!(doc.is_attached(header));
        assert!(!doc.is_attached(container));
        assert!(!doc.is_attached(input));
        assert_eq!(doc.active_element(), None);
        assert!(!doc.contains(header, input));
        assert!(!doc.focus(input));
    }

    #[test]
    fn hit_test_prefers_deepest() {
        let doc = Document::new();
        let (header, container, input) = nav(&doc);
        assert_eq!(doc.hit_test(55, 1), Some(input));
        assert_eq!(doc.hit_test(55, 2), Some(container));
        assert_eq!(doc.hit_test(5, 5), Some(header));
        assert_eq!(doc.hit_test(5, 50), None);
    }

    #[test]
    fn listeners_receive_matching_kind_only() {
        let doc = Document::new();
        let keys = Rc::new(Cell::new(0));
        let clicks = Rc::new(Cell::new(0));
        doc.add_listener(ListenerKind::KeyDown, {
            let keys = Rc::clone(&keys);
            move |_| keys.set(keys.get() + 1)
        });
        doc.add_listener(ListenerKind::PointerDown, {
            let clicks = Rc::clone(&clicks);
            move |_| clicks.set(clicks.get() + 1)
        });

        doc.dispatch_event(Event::Key(KeyEvent::new(KeyCode::Escape)));
        doc.dispatch_event(Event::Key(
            KeyEvent::new(KeyCode::Escape).with_kind(KeyEventKind::Release),
        ));
        doc.dispatch_event(Event::Mouse(MouseEvent::click(1, 1)));
        doc.dispatch_event(Event::Mouse(MouseEvent::new(MouseEventKind::Moved, 1, 1)));

        assert_eq!(keys.get(), 1);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn prevent_default_is_reported() {
        let doc = Document::new();
        doc.add_listener(ListenerKind::KeyDown, |ev| {
            if ev.key().is_some_and(KeyEvent::is_escape) {
                ev.prevent_default();
            }
        });
        let esc = doc.dispatch_event(Event::Key(KeyEvent::new(KeyCode::Escape)));
        let enter = doc.dispatch_event(Event::Key(KeyEvent::new(KeyCode::Enter)));
        assert!(esc.is_default_prevented());
        assert!(!enter.is_default_prevented());
    }

    #[test]
    fn removed_listener_stops_firing() {
        let doc = Document::new();
        let hits = Rc::new(Cell::new(0));
        let id = doc.add_listener(ListenerKind::PointerDown, {
            let hits = Rc::clone(&hits);
            move |_| hits.set(hits.get() + 1)
        });
        doc.dispatch_event(Event::Mouse(MouseEvent::click(0, 0)));
        assert!(doc.remove_listener(id));
        assert!(!doc.remove_listener(id));
        doc.dispatch_event(Event::Mouse(MouseEvent::click(0, 0)));
        assert_eq!(hits.get(), 1);
        assert_eq!(doc.listener_count(ListenerKind::PointerDown), 0);
    }

    #[test]
    fn listener_may_remove_a_later_listener() {
        let doc = Document::new();
        let second_hits = Rc::new(Cell::new(0));
        let second_id: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        doc.add_listener(ListenerKind::KeyDown, {
            let doc = doc.clone();
            let second_id = Rc::clone(&second_id);
            move |_| {
                if let Some(id) = second_id.get() {
                    doc.remove_listener(id);
                }
            }
        });
        second_id.set(Some(doc.add_listener(ListenerKind::KeyDown, {
            let second_hits = Rc::clone(&second_hits);
            move |_| second_hits.set(second_hits.get() + 1)
        })));
        doc.dispatch_event(Event::Key(KeyEvent::new(KeyCode::Tab)));
        assert_eq!(second_hits.get(), 0);
    }

    #[test]
    fn key_events_target_focus() {
        let doc = Document::new();
        let (_, _, input) = nav(&doc);
        doc.focus(input);
        let ev = doc.dispatch_event(Event::Key(KeyEvent::new(KeyCode::Char('a'))));
        assert_eq!(ev.target(), Some(input));
        assert_eq!(doc.focus_history(), vec![input]);
    }

    #[test]
    fn focus_history_is_bounded() {
        let doc = Document::new();
        let (header, _, input) = nav(&doc);
        for _ in 0..FOCUS_HISTORY_LIMIT {
            doc.focus(header);
        }
        doc.focus(input);
        doc.focus(input);
        let history = doc.focus_history();
        assert_eq!(history.len(), FOCUS_HISTORY_LIMIT);
        assert_eq!(&history[FOCUS_HISTORY_LIMIT - 2..], &[input, input]);
        assert_eq!(history[0], header);
    }

    #[test]
    fn scroll_lock_is_last_writer_wins() {
        let doc = Document::new();
        doc.set_scroll_locked(true);
        doc.set_scroll_locked(true);
        assert!(doc.is_scroll_locked());
        doc.set_scroll_locked(false);
        assert!(!doc.is_scroll_locked());
    }
}
