#![forbid(unsafe_code)]

//! Line-oriented interaction scripts.
//!
//! One command per line. Blank lines and lines starting with `#` are
//! skipped. Keywords are case-insensitive; arguments are not.
//!
//! ```text
//! open | close | toggle | clear | submit | render | unmount
//! type <text>          keystrokes into the focused element
//! paste <text>         a paste into the focused element
//! key <chord>          e.g. `key esc`, `key ctrl+u`, `key enter`
//! click <x> <y>        pointer down at layout coordinates
//! advance <ms>         move host time forward
//! locale <es|en|toggle>
//! ```

use std::fmt;
use std::time::Duration;

use pnl_core::event::{KeyCode, KeyEvent, Modifiers};
use pnl_runtime::SupportedLocale;

/// A script line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    /// 1-based line number.
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ScriptError {}

/// Locale change requested by a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleCommand {
    Set(SupportedLocale),
    Toggle,
}

/// One parsed script command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Toggle,
    Clear,
    Submit,
    Render,
    Unmount,
    Type(String),
    Paste(String),
    Key(KeyEvent),
    Click { x: u16, y: u16 },
    Advance(Duration),
    Locale(LocaleCommand),
}

impl Command {
    /// Short name used in step reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Command::Open => "open",
            Command::Close => "close",
            Command::Toggle => "toggle",
            Command::Clear => "clear",
            Command::Submit => "submit",
            Command::Render => "render",
            Command::Unmount => "unmount",
            Command::Type(_) => "type",
            Command::Paste(_) => "paste",
            Command::Key(_) => "key",
            Command::Click { .. } => "click",
            Command::Advance(_) => "advance",
            Command::Locale(_) => "locale",
        }
    }
}

/// A command together with the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub command: Command,
}

/// Parse a whole script, stopping at the first bad line.
pub fn parse_script(source: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    let mut lines = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let command = parse_command(text).map_err(|message| ScriptError { line, message })?;
        lines.push(ScriptLine { line, command });
    }
    Ok(lines)
}

/// Parse a single non-empty, non-comment line.
pub fn parse_command(text: &str) -> Result<Command, String> {
    let (keyword, rest) = match text.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim_start()),
        None => (text, ""),
    };
    let keyword = keyword.to_ascii_lowercase();

    let command = match keyword.as_str() {
        "open" => no_args(Command::Open, rest)?,
        "close" => no_args(Command::Close, rest)?,
        "toggle" => no_args(Command::Toggle, rest)?,
        "clear" => no_args(Command::Clear, rest)?,
        "submit" => no_args(Command::Submit, rest)?,
        "render" => no_args(Command::Render, rest)?,
        "unmount" => no_args(Command::Unmount, rest)?,
        "type" => Command::Type(required(rest, "type")?.to_string()),
        "paste" => Command::Paste(required(rest, "paste")?.to_string()),
        "key" => Command::Key(parse_chord(required(rest, "key")?)?),
        "click" => {
            let mut parts = rest.split_whitespace();
            let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err("click expects <x> <y>".to_string());
            };
            Command::Click {
                x: parse_coord(x)?,
                y: parse_coord(y)?,
            }
        }
        "advance" => {
            let ms = required(rest, "advance")?;
            let ms: u64 = ms
                .parse()
                .map_err(|_| format!("invalid duration in milliseconds: {ms:?}"))?;
            Command::Advance(Duration::from_millis(ms))
        }
        "locale" => {
            let arg = required(rest, "locale")?;
            if arg.eq_ignore_ascii_case("toggle") {
                Command::Locale(LocaleCommand::Toggle)
            } else {
                let locale = SupportedLocale::parse(&arg.to_ascii_lowercase())
                    .ok_or_else(|| format!("unsupported locale: {arg:?}"))?;
                Command::Locale(LocaleCommand::Set(locale))
            }
        }
        other => return Err(format!("unknown command: {other:?}")),
    };
    Ok(command)
}

fn no_args(command: Command, rest: &str) -> Result<Command, String> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(format!("{} takes no arguments", command.name()))
    }
}

fn required<'a>(rest: &'a str, keyword: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("{keyword} expects an argument"))
    } else {
        Ok(rest)
    }
}

fn parse_coord(text: &str) -> Result<u16, String> {
    text.parse()
        .map_err(|_| format!("invalid coordinate: {text:?}"))
}

/// Parse `[mod+]*key`, e.g. `esc`, `ctrl+u`, `shift+alt+a`.
fn parse_chord(spec: &str) -> Result<KeyEvent, String> {
    let (mods, name) = if spec.len() > 2 && spec.ends_with("++") {
        (&spec[..spec.len() - 2], "+")
    } else {
        match spec.rsplit_once('+') {
            Some((mods, name)) if !name.is_empty() && !mods.is_empty() => (mods, name),
            _ => ("", spec),
        }
    };
    let code = KeyCode::from_key_name(name).ok_or_else(|| format!("unknown key: {name:?}"))?;
    let mut modifiers = Modifiers::NONE;
    for m in mods.split('+').filter(|m| !m.is_empty()) {
        modifiers |= match m.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => Modifiers::CTRL,
            "alt" | "option" => Modifiers::ALT,
            "shift" => Modifiers::SHIFT,
            "super" | "meta" | "cmd" => Modifiers::SUPER,
            other => return Err(format!("unknown modifier: {other:?}")),
        };
    }
    Ok(KeyEvent::new(code).with_modifiers(modifiers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        let script = "\
# warm up
open
type  hola mundo
paste a\tb
key ctrl+u
key Esc
click 12 7
advance 250
locale EN
locale toggle
submit
";
        let lines = parse_script(script).unwrap();
        let commands: Vec<Command> = lines.iter().map(|l| l.command.clone()).collect();
        assert_eq!(
            commands,
            vec![
                Command::Open,
                Command::Type("hola mundo".into()),
                Command::Paste("a\tb".into()),
                Command::Key(KeyEvent::new(KeyCode::Char('u')).with_modifiers(Modifiers::CTRL)),
                Command::Key(KeyEvent::new(KeyCode::Escape)),
                Command::Click { x: 12, y: 7 },
                Command::Advance(Duration::from_millis(250)),
                Command::Locale(LocaleCommand::Set(SupportedLocale::En)),
                Command::Locale(LocaleCommand::Toggle),
                Command::Submit,
            ]
        );
        assert_eq!(lines[0].line, 2);
        assert_eq!(lines.last().map(|l| l.line), Some(11));
    }

    #[test]
    fn plus_key_is_not_a_chord() {
        assert_eq!(
            parse_command("key +").unwrap(),
            Command::Key(KeyEvent::new(KeyCode::Char('+')))
        );
        assert_eq!(
            parse_command("key ctrl++").unwrap(),
            Command::Key(KeyEvent::new(KeyCode::Char('+')).with_modifiers(Modifiers::CTRL))
        );
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = parse_script("open\n\nclick 1\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.to_string(), "line 3: click expects <x> <y>");

        let err = parse_script("locale fr").unwrap_err();
        assert_eq!(err.message, "unsupported locale: \"fr\"");

        assert!(parse_command("open now").is_err());
        assert!(parse_command("type").is_err());
        assert!(parse_command("advance soon").is_err());
        assert!(parse_command("key hyper+a").is_err());
        assert!(parse_command("click 1 70000").is_err());
        assert!(parse_command("jump").is_err());
    }
}
