#![forbid(unsafe_code)]

//! Search overlay replay harness.
//!
//! # Running
//!
//! ```sh
//! cargo run -p pnl-harness -- crates/pnl-harness/scripts/basic.txt
//! cat script.txt | cargo run -p pnl-harness
//! cargo run -p pnl-harness -- --live 2>harness.log
//! ```
//!
//! One JSON object per script line (or, with `--live`, per terminal input
//! event) goes to stdout; logs go to stderr as JSON, filtered by
//! `PAYNETLINK_LOG`.
//!
//! # Environment
//!
//! - `PAYNETLINK_*`: application configuration (see `AppConfig`)
//! - `PAYNETLINK_HARNESS_LANG`: browser language tag override
//! - `PAYNETLINK_HARNESS_STATE_FILE`: persist the locale choice to this JSON
//!   file (requires the `state-persistence` feature)

use std::io::{self, Read};
use std::sync::Arc;

use pnl_core::clock::SystemClock;
use pnl_harness::live::{self, LivePump, RawTerminal};
use pnl_harness::{ReplaySession, parse_script, run_script};
use pnl_runtime::{AppConfig, KeyValueStore, MemoryStore, detect_system_locale};

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(feature = "state-persistence")]
fn open_storage() -> Arc<dyn KeyValueStore> {
    match env_string("PAYNETLINK_HARNESS_STATE_FILE") {
        Some(path) => Arc::new(pnl_runtime::FileStore::new(path)),
        None => Arc::new(MemoryStore::new()),
    }
}

#[cfg(not(feature = "state-persistence"))]
fn open_storage() -> Arc<dyn KeyValueStore> {
    if env_string("PAYNETLINK_HARNESS_STATE_FILE").is_some() {
        tracing::warn!("PAYNETLINK_HARNESS_STATE_FILE ignored without state-persistence");
    }
    Arc::new(MemoryStore::new())
}

fn read_script() -> io::Result<String> {
    match std::env::args().nth(1) {
        Some(path) if path != "-" => std::fs::read_to_string(path),
        _ => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

fn run_live(mut session: ReplaySession) -> io::Result<()> {
    let terminal = RawTerminal::enter()?;
    let pump = LivePump::new(SystemClock::new());
    let handled = live::run_live(&mut session, &terminal, pump, io::stdout().lock())?;
    drop(terminal);
    tracing::info!(events = handled, "live session finished");
    Ok(())
}

fn main() -> io::Result<()> {
    let config =
        AppConfig::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    pnl_core::logging::init_subscriber(&config.log_filter);
    tracing::info!(
        debounce_ms = config.search_debounce.as_millis() as u64,
        dev = config.is_dev,
        "harness starting"
    );

    let system_language = env_string("PAYNETLINK_HARNESS_LANG").or_else(detect_system_locale);
    let mut session = ReplaySession::new(&config, open_storage(), system_language.as_deref());
    if std::env::args().nth(1).as_deref() == Some("--live") {
        return run_live(session);
    }

    let source = read_script()?;
    let script =
        parse_script(&source).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    let reports = run_script(&mut session, &script, io::stdout().lock())?;
    tracing::info!(steps = reports.len(), "replay finished");
    Ok(())
}
