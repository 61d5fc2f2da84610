#![forbid(unsafe_code)]

//! Tracing integration tests.
//!
//! Controller events enabled:
//!   cargo test -p pnl-widgets --features tracing --test tracing_tests
//!
//! Zero-overhead verification (no feature):
//!   cargo test -p pnl-widgets --test tracing_tests -- zero_overhead

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pnl_core::event::{Event, KeyCode, KeyEvent};
use pnl_runtime::HostContext;
use pnl_widgets::{SearchController, SearchElements, SearchOptions};

use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    target: String,
    level: tracing::Level,
    fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn message(&self) -> &str {
        self.fields.get("message").map_or("", String::as_str)
    }
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            level: *event.metadata().level(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_events(f: impl FnOnce()) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: Arc::clone(&events),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn exercise_controller() {
    let ctx = HostContext::new();
    let doc = ctx.document();
    let trigger = doc.create_element("trigger", None);
    let input = doc.create_element("input", None);
    let search = SearchController::mount(
        &ctx,
        SearchElements::new().trigger(trigger).input(input),
        SearchOptions::new().on_search(|_| {}),
    );
    search.open_search();
    ctx.render();
    search.set_query("planes");
    search.handle_search_submit();
    doc.dispatch_event(Event::Key(KeyEvent::new(KeyCode::Escape)));
    ctx.render();
}

// ============================================================================
// Tests
// ============================================================================

#[test]
#[cfg(feature = "tracing")]
fn controller_transitions_are_logged() {
    let events = with_captured_events(exercise_controller);
    let widget_events: Vec<&CapturedEvent> = events
        .iter()
        .filter(|e| e.target.starts_with("pnl_widgets"))
        .collect();

    let transitions: Vec<&str> = widget_events
        .iter()
        .filter(|e| e.message() == "search overlay")
        .filter_map(|e| e.fields.get("transition").map(String::as_str))
        .collect();
    assert_eq!(transitions, vec!["open", "close"]);

    let submitted = widget_events
        .iter()
        .find(|e| e.message() == "search submitted")
        .expect("submit event");
    assert_eq!(submitted.level, tracing::Level::DEBUG);
    assert_eq!(submitted.fields.get("query_len").map(String::as_str), Some("6"));
    assert!(
        widget_events.iter().any(|e| e.message() == "search unmounted"),
        "teardown should be logged"
    );
}

#[test]
#[cfg(feature = "tracing")]
fn query_text_is_never_logged() {
    let events = with_captured_events(exercise_controller);
    for event in events {
        for value in event.fields.values() {
            assert!(!value.contains("planes"), "query leaked in {event:?}");
        }
    }
}

#[test]
fn runtime_logs_scroll_lock() {
    let events = with_captured_events(exercise_controller);
    let locks: Vec<&str> = events
        .iter()
        .filter(|e| e.target.starts_with("pnl_runtime") && e.message() == "scroll lock")
        .filter_map(|e| e.fields.get("locked").map(String::as_str))
        .collect();
    assert_eq!(locks, vec!["true", "false"]);
}

#[test]
#[cfg(not(feature = "tracing"))]
fn zero_overhead_without_feature() {
    let events = with_captured_events(exercise_controller);
    assert!(
        events.iter().all(|e| !e.target.starts_with("pnl_widgets")),
        "widget events must compile out without the tracing feature"
    );
}
