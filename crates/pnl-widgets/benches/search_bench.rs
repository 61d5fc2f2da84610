//! Benchmarks for the search overlay controller.
//!
//! Run with: cargo bench -p pnl-widgets

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pnl_core::event::{Event, KeyCode, KeyEvent, MouseEvent};
use pnl_core::geometry::Rect;
use pnl_runtime::HostContext;
use pnl_widgets::{SearchController, SearchElements, SearchOptions};
use std::hint::black_box;
use std::time::Duration;

fn mounted(debounce: Duration) -> (HostContext, SearchController) {
    let ctx = HostContext::new();
    let doc = ctx.document();
    let trigger = doc.create_element("trigger", None);
    doc.set_bounds(trigger, Rect::new(100, 0, 10, 3));
    let container = doc.create_element("container", None);
    doc.set_bounds(container, Rect::new(40, 0, 50, 3));
    let input = doc.create_element("input", Some(container));
    doc.set_bounds(input, Rect::new(41, 1, 40, 1));
    let search = SearchController::mount(
        &ctx,
        SearchElements::new()
            .trigger(trigger)
            .input(input)
            .container(container),
        SearchOptions::new()
            .debounce(debounce)
            .on_search(|q| {
                black_box(q);
            }),
    );
    (ctx, search)
}

// ============================================================================
// Open / close cycle
// ============================================================================

fn bench_open_close(c: &mut Criterion) {
    let mut group = c.benchmark_group("search/cycle");
    let (ctx, search) = mounted(Duration::ZERO);

    group.bench_function("toggle_render", |b| {
        b.iter(|| {
            search.toggle_search();
            ctx.render();
            black_box(search.is_open());
        })
    });

    group.bench_function("escape_dismiss", |b| {
        b.iter(|| {
            search.open_search();
            ctx.render();
            let ev = ctx
                .document()
                .dispatch_event(Event::Key(KeyEvent::new(KeyCode::Escape)));
            black_box(ev.is_default_prevented());
            ctx.render();
        })
    });

    group.bench_function("outside_press", |b| {
        b.iter(|| {
            search.open_search();
            ctx.document()
                .dispatch_event(Event::Mouse(MouseEvent::click(5, 20)));
            ctx.render();
            black_box(search.is_open());
        })
    });

    group.finish();
}

// ============================================================================
// Typing
// ============================================================================

fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("search/typing");

    for debounce_ms in [0u64, 300] {
        let (ctx, search) = mounted(Duration::from_millis(debounce_ms));
        search.open_search();
        ctx.render();
        let keys: Vec<Event> = "payment gateway"
            .chars()
            .map(|c| Event::Key(KeyEvent::new(KeyCode::Char(c))))
            .collect();

        group.bench_with_input(
            BenchmarkId::new("type_then_clear", format!("{debounce_ms}ms")),
            &keys,
            |b, keys| {
                b.iter(|| {
                    for key in keys {
                        search.handle_event(key);
                    }
                    ctx.advance(Duration::from_millis(debounce_ms));
                    search.clear_search();
                    black_box(search.query());
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_open_close, bench_typing);
criterion_main!(benches);
