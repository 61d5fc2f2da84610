#![forbid(unsafe_code)]

//! Script replay harness for the PayNetLink search overlay.
//!
//! Drives a [`SearchController`](pnl_widgets::SearchController) mounted in a
//! simulated navigation bar from a plain-text script, and records the
//! observable state after every step as JSONL. [`live`] drives the same
//! session from terminal input instead.
//!
//! # Quick Start
//!
//! ```ignore
//! use pnl_harness::{ReplaySession, parse_script, run_script};
//!
//! let script = parse_script("open\nrender\ntype cable\nkey enter")?;
//! let mut session = ReplaySession::new(&config, storage, None);
//! run_script(&mut session, &script, std::io::stdout().lock())?;
//! ```

pub mod live;
pub mod replay;
pub mod script;

pub use live::{LivePump, RawTerminal, is_quit};
pub use replay::{NavLayout, ReplaySession, StepReport, run_script};
pub use script::{Command, LocaleCommand, ScriptError, ScriptLine, parse_command, parse_script};
