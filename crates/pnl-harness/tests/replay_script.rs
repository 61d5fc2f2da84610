#![forbid(unsafe_code)]

//! Replays the bundled script and checks the JSONL it produces.

use std::sync::Arc;
use std::time::Duration;

use pnl_harness::{ReplaySession, StepReport, parse_script, run_script};
use pnl_runtime::{AppConfig, KeyValueStore, LOCALE_STORAGE_KEY, MemoryStore};
use pretty_assertions::assert_eq;

const BASIC: &str = include_str!("../scripts/basic.txt");

fn replay(config: &AppConfig, source: &str) -> (Vec<StepReport>, String, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let script = parse_script(source).unwrap();
    let mut session = ReplaySession::new(config, store.clone(), None);
    let mut out = Vec::new();
    let reports = run_script(&mut session, &script, &mut out).unwrap();
    (reports, String::from_utf8(out).unwrap(), store)
}

/// (line, is_open, query, scroll_locked, focus, closes, lang)
type Row<'a> = (usize, bool, &'a str, bool, Option<&'a str>, usize, &'a str);

#[test]
fn basic_script_walkthrough() {
    let (reports, _, store) = replay(&AppConfig::default(), BASIC);
    let rows: Vec<Row<'_>> = reports
        .iter()
        .map(|r| {
            (
                r.line,
                r.is_open,
                r.query.as_str(),
                r.scroll_locked,
                r.focus.as_deref(),
                r.closes,
                r.lang.as_str(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            (2, true, "", true, None, 0, "es"),
            (3, true, "", true, Some("search-input"), 0, "es"),
            (4, true, "fibra óptica", true, Some("search-input"), 0, "es"),
            (5, true, "fibra óptica", true, Some("search-input"), 0, "es"),
            (6, false, "", false, Some("search-input"), 1, "es"),
            (7, false, "", false, Some("search-button"), 1, "es"),
            (10, true, "", true, Some("search-button"), 1, "es"),
            (11, true, "", true, Some("search-input"), 1, "es"),
            (12, true, "cable", true, Some("search-input"), 1, "es"),
            (13, false, "", false, Some("search-input"), 2, "es"),
            (14, false, "", false, Some("search-button"), 2, "es"),
            (17, false, "", false, Some("search-button"), 2, "en"),
            (18, false, "", false, Some("search-button"), 2, "es"),
        ]
    );

    let searches: Vec<&str> = reports
        .iter()
        .flat_map(|r| r.searches.iter().map(String::as_str))
        .collect();
    assert_eq!(searches, vec!["fibra óptica"]);
    assert_eq!(reports[4].searches, Vec::<String>::new());

    assert_eq!(reports[11].placeholder, "Search PayNetLink...");
    assert_eq!(reports[12].placeholder, "Buscar en PayNetLink...");
    assert_eq!(store.get(LOCALE_STORAGE_KEY).unwrap().as_deref(), Some("es"));
}

#[test]
fn jsonl_has_one_object_per_step() {
    let (reports, out, _) = replay(&AppConfig::default(), BASIC);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), reports.len());
    for (line, report) in lines.iter().zip(&reports) {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["line"], report.line);
        assert_eq!(value["command"], report.command);
        assert_eq!(value["is_open"], report.is_open);
    }
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["focus"], serde_json::Value::Null);
    assert_eq!(first["mounted"], true);
}

#[test]
fn debounced_auto_search_fires_once() {
    let config = AppConfig {
        search_debounce: Duration::from_millis(300),
        ..AppConfig::default()
    };
    let script = "open\nrender\ntype a\nadvance 200\ntype b\nadvance 299\nadvance 1\nadvance 500";
    let (reports, _, _) = replay(&config, script);
    let pending: Vec<usize> = reports.iter().map(|r| r.pending_timers).collect();
    assert_eq!(pending, vec![0, 0, 1, 1, 1, 1, 0, 0]);
    assert_eq!(reports[6].searches, vec!["ab".to_string()]);
    let total: usize = reports.iter().map(|r| r.searches.len()).sum();
    assert_eq!(total, 1);
}

#[test]
fn close_cancels_pending_auto_search() {
    let config = AppConfig {
        search_debounce: Duration::from_millis(300),
        ..AppConfig::default()
    };
    let (reports, _, _) = replay(&config, "open\nrender\ntype net\nclose\nadvance 1000");
    assert_eq!(reports[3].pending_timers, 0);
    assert!(reports.iter().all(|r| r.searches.is_empty()));
}

#[test]
fn clear_button_keeps_overlay_open() {
    let (reports, _, _) = replay(
        &AppConfig::default(),
        "open\nrender\ntype planes\nclick 84 1\nkey ctrl+u",
    );
    let last = &reports[3];
    assert!(last.is_open);
    assert_eq!(last.query, "");
    assert_eq!(last.focus.as_deref(), Some("search-input"));
    assert_eq!(last.closes, 0);
    assert!(reports[4].is_open);
}
