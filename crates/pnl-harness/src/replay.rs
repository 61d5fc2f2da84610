#![forbid(unsafe_code)]

//! Replays scripts against a simulated navigation bar.
//!
//! # Layout
//!
//! ```text
//! header        (0,0 120x3)
//! ├── logo      (0,0 10x3)
//! ├── container (40,0 50x3)
//! │   ├── input (41,1 40x1)
//! │   └── clear (82,1 6x1)
//! └── trigger   (100,0 10x3)
//! main          (0,3 120x40)
//! ```
//!
//! # JSONL Schema
//!
//! One object per script line:
//! ```json
//! {
//!   "line": 3,
//!   "command": "type",
//!   "mounted": true,
//!   "is_open": true,
//!   "query": "planes",
//!   "scroll_locked": true,
//!   "focus": "search-input",
//!   "searches": [],
//!   "closes": 0,
//!   "pending_timers": 1,
//!   "lang": "es",
//!   "placeholder": "Buscar en PayNetLink..."
//! }
//! ```
//!
//! `searches` lists only the searches emitted during that step.

use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::Arc;

use pnl_core::event::{Event, KeyCode, KeyEvent, MouseEvent, PasteEvent};
use pnl_core::geometry::Rect;
use pnl_runtime::{
    AppConfig, Document, ElementId, EmbeddedCatalogs, HostContext, KeyValueStore, LocaleContext,
};
use pnl_widgets::{SearchController, SearchElements, SearchOptions};
use serde::Serialize;

use crate::script::{Command, LocaleCommand, ScriptLine};

/// Element ids of the simulated navigation bar.
#[derive(Debug, Clone, Copy)]
pub struct NavLayout {
    pub header: ElementId,
    pub logo: ElementId,
    pub trigger: ElementId,
    pub container: ElementId,
    pub input: ElementId,
    pub clear: ElementId,
    pub main: ElementId,
}

impl NavLayout {
    /// Build the layout into `doc`.
    pub fn build(doc: &Document) -> Self {
        let node = |label: &str, parent: Option<ElementId>, bounds: Rect| {
            let id = doc.create_element(label, parent);
            doc.set_bounds(id, bounds);
            id
        };
        let header = node("header", None, Rect::new(0, 0, 120, 3));
        let logo = node("logo", Some(header), Rect::new(0, 0, 10, 3));
        let container = node("search-container", Some(header), Rect::new(40, 0, 50, 3));
        let input = node("search-input", Some(container), Rect::new(41, 1, 40, 1));
        let clear = node("search-clear", Some(container), Rect::new(82, 1, 6, 1));
        let trigger = node("search-button", Some(header), Rect::new(100, 0, 10, 3));
        let main = node("main", None, Rect::new(0, 3, 120, 40));
        Self {
            header,
            logo,
            trigger,
            container,
            input,
            clear,
            main,
        }
    }

    #[must_use]
    pub const fn search_elements(&self) -> SearchElements {
        SearchElements::new()
            .trigger(self.trigger)
            .input(self.input)
            .container(self.container)
    }
}

/// Observable state after one script step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub line: usize,
    pub command: &'static str,
    pub mounted: bool,
    pub is_open: bool,
    pub query: String,
    pub scroll_locked: bool,
    pub focus: Option<String>,
    pub searches: Vec<String>,
    pub closes: usize,
    pub pending_timers: usize,
    pub lang: String,
    pub placeholder: String,
}

/// A mounted search overlay plus the host it lives in.
pub struct ReplaySession {
    ctx: HostContext,
    nav: NavLayout,
    search: Option<SearchController>,
    locale: LocaleContext,
    searches: Rc<RefCell<Vec<String>>>,
    closes: Rc<Cell<usize>>,
}

impl ReplaySession {
    /// Mount a fresh controller using `config` for debounce and dev warnings.
    pub fn new(
        config: &AppConfig,
        storage: Arc<dyn KeyValueStore>,
        system_language: Option<&str>,
    ) -> Self {
        let ctx = HostContext::new();
        let nav = NavLayout::build(ctx.document());
        let locale = LocaleContext::new(EmbeddedCatalogs, storage, system_language)
            .with_document(ctx.document().clone())
            .with_missing_warnings(config.is_dev);

        let searches = Rc::new(RefCell::new(Vec::new()));
        let closes = Rc::new(Cell::new(0));
        let options = SearchOptions::new()
            .debounce(config.search_debounce)
            .on_search({
                let searches = Rc::clone(&searches);
                move |query: &str| searches.borrow_mut().push(query.to_string())
            })
            .on_close({
                let closes = Rc::clone(&closes);
                move || closes.set(closes.get() + 1)
            });
        let search = SearchController::mount(&ctx, nav.search_elements(), options);

        Self {
            ctx,
            nav,
            search: Some(search),
            locale,
            searches,
            closes,
        }
    }

    #[must_use]
    pub fn host(&self) -> &HostContext {
        &self.ctx
    }

    #[must_use]
    pub fn nav(&self) -> &NavLayout {
        &self.nav
    }

    #[must_use]
    pub fn locale(&self) -> &LocaleContext {
        &self.locale
    }

    /// Execute one command and report the resulting state.
    pub fn apply(&mut self, step: &ScriptLine) -> StepReport {
        tracing::debug!(line = step.line, command = step.command.name(), "replay step");
        match &step.command {
            Command::Open => self.with_search(SearchController::open_search),
            Command::Close => self.with_search(SearchController::close_search),
            Command::Toggle => self.with_search(SearchController::toggle_search),
            Command::Clear => self.with_search(SearchController::clear_search),
            Command::Submit => self.with_search(|s| {
                s.handle_search_submit();
            }),
            Command::Render => {
                self.ctx.render();
            }
            Command::Unmount => {
                self.search = None;
            }
            Command::Type(text) => {
                for c in text.chars() {
                    self.key(KeyEvent::new(KeyCode::Char(c)));
                }
            }
            Command::Paste(text) => self.paste(PasteEvent::new(text.as_str())),
            Command::Key(key) => self.key(*key),
            Command::Click { x, y } => self.click(*x, *y),
            Command::Advance(dt) => {
                self.ctx.advance(*dt);
            }
            Command::Locale(LocaleCommand::Set(locale)) => {
                self.locale.set_locale(*locale);
            }
            Command::Locale(LocaleCommand::Toggle) => {
                self.locale.toggle_locale();
            }
        }
        self.report(step)
    }

    /// Route one canonical input event the way the page would.
    ///
    /// Key presses go to the focused element, pointer presses to whatever is
    /// under the pointer. Returns `None` for events the page ignores (key
    /// releases, pointer moves, focus changes, ticks).
    pub fn apply_event(&mut self, seq: usize, event: &Event) -> Option<StepReport> {
        let command = match event {
            Event::Key(key) if event.as_key_down().is_some() => {
                self.key(*key);
                "key"
            }
            Event::Mouse(mouse) if event.as_pointer_down().is_some() => {
                self.click(mouse.x, mouse.y);
                "click"
            }
            Event::Paste(paste) => {
                self.paste(paste.clone());
                "paste"
            }
            _ => return None,
        };
        tracing::debug!(seq, command, "live event");
        Some(self.snapshot(seq, command))
    }

    /// Snapshot the current state for `step`.
    pub fn report(&self, step: &ScriptLine) -> StepReport {
        self.snapshot(step.line, step.command.name())
    }

    fn snapshot(&self, line: usize, command: &'static str) -> StepReport {
        let doc = self.ctx.document();
        StepReport {
            line,
            command,
            mounted: self.search.is_some(),
            is_open: self.search.as_ref().is_some_and(SearchController::is_open),
            query: self
                .search
                .as_ref()
                .map(SearchController::query)
                .unwrap_or_default(),
            scroll_locked: doc.is_scroll_locked(),
            focus: doc.active_element().and_then(|id| doc.label(id)),
            searches: std::mem::take(&mut *self.searches.borrow_mut()),
            closes: self.closes.get(),
            pending_timers: self.ctx.timers().pending_count(),
            lang: doc.lang(),
            placeholder: self.locale.translate("nav.search.placeholder"),
        }
    }

    fn with_search(&self, f: impl FnOnce(&SearchController)) {
        if let Some(search) = &self.search {
            f(search);
        }
    }

    fn input_focused(&self) -> bool {
        self.ctx.document().active_element() == Some(self.nav.input)
    }

    /// The input's own handler runs first, then document listeners.
    fn key(&self, key: KeyEvent) {
        let event = Event::Key(key);
        if self.input_focused() {
            self.with_search(|s| {
                s.handle_event(&event);
            });
        }
        self.ctx.document().dispatch_event(event);
    }

    fn paste(&self, paste: PasteEvent) {
        if self.input_focused() {
            self.with_search(|s| {
                s.handle_event(&Event::Paste(paste));
            });
        }
    }

    /// Pointer down goes to document listeners, then the hit element's
    /// click action runs.
    fn click(&self, x: u16, y: u16) {
        let doc = self.ctx.document();
        let target = doc.hit_test(x, y);
        doc.dispatch_event(Event::Mouse(MouseEvent::click(x, y)));
        let Some(target) = target else {
            return;
        };
        if doc.contains(self.nav.trigger, target) {
            self.with_search(SearchController::toggle_search);
        } else if target == self.nav.clear {
            self.with_search(SearchController::clear_search);
        } else if target == self.nav.input {
            doc.focus(target);
        }
    }
}

/// Replay `script`, writing one JSON line per step to `out`.
pub fn run_script<W: Write>(
    session: &mut ReplaySession,
    script: &[ScriptLine],
    mut out: W,
) -> io::Result<Vec<StepReport>> {
    let mut reports = Vec::with_capacity(script.len());
    for step in script {
        let report = session.apply(step);
        writeln!(out, "{}", serde_json::to_string(&report)?)?;
        reports.push(report);
    }
    out.flush()?;
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse_script;
    use pnl_core::event::KeyEventKind;
    use pnl_runtime::MemoryStore;

    fn session() -> ReplaySession {
        ReplaySession::new(&AppConfig::default(), Arc::new(MemoryStore::new()), None)
    }

    #[test]
    fn layout_hit_tests_match_labels() {
        let s = session();
        let doc = s.host().document();
        let label_at = |x, y| doc.hit_test(x, y).and_then(|id| doc.label(id));
        assert_eq!(label_at(5, 1).as_deref(), Some("logo"));
        assert_eq!(label_at(50, 1).as_deref(), Some("search-input"));
        assert_eq!(label_at(84, 1).as_deref(), Some("search-clear"));
        assert_eq!(label_at(45, 0).as_deref(), Some("search-container"));
        assert_eq!(label_at(104, 2).as_deref(), Some("search-button"));
        assert_eq!(label_at(60, 20).as_deref(), Some("main"));
        assert_eq!(label_at(115, 1).as_deref(), Some("header"));
        assert!(doc.contains(s.nav().header, s.nav().input));
    }

    #[test]
    fn report_drains_searches() {
        let mut s = session();
        let script =
            parse_script("open\nrender\ntype cable\nkey enter\nkey esc\nrender").unwrap();
        let reports: Vec<StepReport> = script.iter().map(|step| s.apply(step)).collect();
        assert_eq!(reports[1].focus.as_deref(), Some("search-input"));
        assert_eq!(reports[2].query, "cable");
        assert_eq!(reports[3].searches, vec!["cable".to_string()]);
        assert!(reports[3].is_open);
        assert!(reports[4].searches.is_empty());
        assert!(!reports[4].is_open);
        assert_eq!(reports[4].closes, 1);
        assert_eq!(reports[5].focus.as_deref(), Some("search-button"));
    }

    #[test]
    fn typing_before_render_is_not_routed() {
        let mut s = session();
        let script = parse_script("open\ntype abc").unwrap();
        let last = script.iter().map(|step| s.apply(step)).last().unwrap();
        assert!(last.is_open);
        assert_eq!(last.query, "");
    }

    #[test]
    fn canonical_events_drive_the_overlay() {
        let mut s = session();
        let trigger = Event::Mouse(MouseEvent::click(104, 1));
        let report = s.apply_event(1, &trigger).unwrap();
        assert_eq!(report.command, "click");
        assert!(report.is_open);
        s.host().render();

        for c in "isp".chars() {
            s.apply_event(2, &Event::Key(KeyEvent::new(KeyCode::Char(c))));
        }
        let pasted = s
            .apply_event(3, &Event::Paste(PasteEvent::new(" plans")))
            .unwrap();
        assert_eq!(pasted.query, "isp plans");

        let release = KeyEvent::new(KeyCode::Escape).with_kind(KeyEventKind::Release);
        assert_eq!(s.apply_event(4, &Event::Key(release)), None);
        assert_eq!(s.apply_event(5, &Event::Tick), None);

        let closed = s
            .apply_event(6, &Event::Key(KeyEvent::new(KeyCode::Escape)))
            .unwrap();
        assert_eq!(closed.line, 6);
        assert!(!closed.is_open);
        assert_eq!(closed.query, "");
        assert_eq!(closed.closes, 1);
    }

    #[test]
    fn unmount_releases_scroll_lock() {
        let mut s = session();
        let script = parse_script("open\nunmount\nopen").unwrap();
        let reports: Vec<StepReport> = script.iter().map(|step| s.apply(step)).collect();
        assert!(reports[0].scroll_locked);
        assert!(!reports[1].mounted);
        assert!(!reports[1].scroll_locked);
        assert!(!reports[2].is_open);
    }
}
