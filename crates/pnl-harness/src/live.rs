#![forbid(unsafe_code)]

//! Interactive mode: drive the navigation bar from a real terminal.
//!
//! Terminal input is read with `crossterm`, mapped to canonical events, and
//! routed through the same [`ReplaySession`] the script runner uses. Host
//! time follows a [`Clock`], so debounced auto-search fires on wall time.
//!
//! Layout coordinates are terminal cells: clicking columns 100..110 of the
//! first three rows hits the search button.
//!
//! Ctrl+C or Ctrl+D quits.

use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;

use pnl_core::clock::Clock;
use pnl_core::event::{Event, KeyCode, Modifiers};

use crate::replay::{ReplaySession, StepReport};

/// How long one poll waits before host time is advanced anyway.
pub const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Whether `event` ends an interactive session.
#[must_use]
pub fn is_quit(event: &Event) -> bool {
    event.as_key_down().is_some_and(|key| {
        key.modifiers.contains(Modifiers::CTRL)
            && matches!(key.code, KeyCode::Char('c' | 'd'))
    })
}

/// Advances a session's host time from a clock between input events.
#[derive(Debug)]
pub struct LivePump<C: Clock> {
    clock: C,
    last: Duration,
    seq: usize,
}

impl<C: Clock> LivePump<C> {
    /// Start pumping from the clock's current reading.
    pub fn new(clock: C) -> Self {
        let last = clock.now_mono();
        Self {
            clock,
            last,
            seq: 0,
        }
    }

    /// The driving clock.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Catch host time up to the clock, apply `event` if any, then render.
    ///
    /// Returns the state report when the event reached the page.
    pub fn step(&mut self, session: &mut ReplaySession, event: Option<&Event>) -> Option<StepReport> {
        let now = self.clock.now_mono();
        let dt = now.saturating_sub(self.last);
        self.last = now;
        if !dt.is_zero() {
            session.host().advance(dt);
        }
        let report = event.and_then(|event| {
            self.seq += 1;
            session.apply_event(self.seq, event)
        });
        session.host().render();
        report
    }
}

/// Raw-mode terminal with mouse capture and bracketed paste.
///
/// Everything is switched back off on drop, in reverse order, and by a panic
/// hook installed on first use.
#[derive(Debug)]
pub struct RawTerminal {
    mouse_enabled: bool,
    paste_enabled: bool,
}

impl RawTerminal {
    /// Enter raw mode and enable pointer and paste reporting.
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();
        crossterm::terminal::enable_raw_mode()?;
        tracing::info!("terminal raw mode enabled");

        let mut terminal = Self {
            mouse_enabled: false,
            paste_enabled: false,
        };
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, crossterm::event::EnableMouseCapture)?;
        terminal.mouse_enabled = true;
        crossterm::execute!(stdout, crossterm::event::EnableBracketedPaste)?;
        terminal.paste_enabled = true;
        Ok(terminal)
    }

    /// Wait up to `timeout` for input. `Ok(None)` on timeout or for input
    /// with no canonical form.
    pub fn next_event(&self, timeout: Duration) -> io::Result<Option<Event>> {
        if !crossterm::event::poll(timeout)? {
            return Ok(None);
        }
        Ok(Event::from_crossterm(crossterm::event::read()?))
    }

    fn cleanup(&mut self) {
        let mut stdout = io::stdout();
        if self.paste_enabled {
            let _ = crossterm::execute!(stdout, crossterm::event::DisableBracketedPaste);
            self.paste_enabled = false;
        }
        if self.mouse_enabled {
            let _ = crossterm::execute!(stdout, crossterm::event::DisableMouseCapture);
            self.mouse_enabled = false;
        }
        let _ = crossterm::terminal::disable_raw_mode();
        tracing::info!("terminal raw mode disabled");
        let _ = stdout.flush();
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let mut stdout = io::stdout();
            let _ = crossterm::execute!(stdout, crossterm::event::DisableBracketedPaste);
            let _ = crossterm::execute!(stdout, crossterm::event::DisableMouseCapture);
            let _ = crossterm::terminal::disable_raw_mode();
            previous(info);
        }));
    });
}

/// Run an interactive session until the user quits.
///
/// Writes one JSON line per handled event to `out`. Lines end in `\r\n`
/// because the terminal is in raw mode.
pub fn run_live<C: Clock, W: Write>(
    session: &mut ReplaySession,
    terminal: &RawTerminal,
    mut pump: LivePump<C>,
    mut out: W,
) -> io::Result<usize> {
    let mut handled = 0;
    loop {
        let event = terminal.next_event(POLL_INTERVAL)?;
        if event.as_ref().is_some_and(is_quit) {
            break;
        }
        if let Some(report) = pump.step(session, event.as_ref()) {
            write!(out, "{}\r\n", serde_json::to_string(&report)?)?;
            out.flush()?;
            handled += 1;
        }
    }
    Ok(handled)
}
