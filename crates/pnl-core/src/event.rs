#![forbid(unsafe_code)]

//! Canonical input events.
//!
//! Hosts translate whatever their platform delivers (browser DOM events,
//! terminal input, a replay script) into these types before handing them to
//! the document and the widgets. Every event is `Clone + Eq` so scenario
//! tests can build and compare them directly.
//!
//! # Design Notes
//!
//! - Pointer coordinates are 0-indexed, origin at top-left, in the same
//!   space as [`Rect`](crate::geometry::Rect).
//! - `KeyEventKind` defaults to `Press` when the source cannot tell.
//! - Only presses and repeats count as "keydown"; releases never dismiss.

use bitflags::bitflags;
#[cfg(not(target_arch = "wasm32"))]
use crossterm::event as cte;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),

    /// A pointer (mouse, touch, pen) event.
    Mouse(MouseEvent),

    /// Text pasted into the focused element.
    Paste(PasteEvent),

    /// The host window gained (`true`) or lost (`false`) focus.
    Focus(bool),

    /// A tick from the host loop. Carries no payload.
    Tick,
}

impl Event {
    /// Convert a Crossterm event into a canonical [`Event`].
    ///
    /// Returns `None` for events with no canonical counterpart (resizes,
    /// unmapped keys).
    #[must_use]
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_crossterm(event: cte::Event) -> Option<Self> {
        map_crossterm_event_internal(event)
    }

    /// The key event, if this is a press or repeat (a "keydown").
    #[must_use]
    pub fn as_key_down(&self) -> Option<&KeyEvent> {
        match self {
            Event::Key(key) if key.kind != KeyEventKind::Release => Some(key),
            _ => None,
        }
    }

    /// The mouse event, if this is a button press (a "pointerdown").
    #[must_use]
    pub fn as_pointer_down(&self) -> Option<&MouseEvent> {
        match self {
            Event::Mouse(mouse) if matches!(mouse.kind, MouseEventKind::Down(_)) => Some(mouse),
            _ => None,
        }
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with no modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Check if this is the Escape key.
    #[must_use]
    pub const fn is_escape(&self) -> bool {
        matches!(self.code, KeyCode::Escape)
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt modifier is held.
    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Check if Super/Meta/Cmd modifier is held.
    #[must_use]
    pub const fn super_key(&self) -> bool {
        self.modifiers.contains(Modifiers::SUPER)
    }

    /// The character this key would insert into a text field, if any.
    ///
    /// Chorded keys (Ctrl, Alt, Super) insert nothing.
    #[must_use]
    pub fn text_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c)
                if !self
                    .modifiers
                    .intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::SUPER)
                    && !c.is_control() =>
            {
                Some(c)
            }
            _ => None,
        }
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),

    /// Enter/Return key.
    Enter,

    /// Escape key.
    Escape,

    /// Backspace key.
    Backspace,

    /// Tab key.
    Tab,

    /// Shift+Tab (back-tab).
    BackTab,

    /// Delete key.
    Delete,

    /// Home key.
    Home,

    /// End key.
    End,

    /// Up arrow key.
    Up,

    /// Down arrow key.
    Down,

    /// Left arrow key.
    Left,

    /// Right arrow key.
    Right,

    /// Function key (F1-F24).
    F(u8),
}

impl KeyCode {
    /// Parse a DOM-style key name (`"Escape"`, `"Enter"`, `"a"`).
    ///
    /// Single-character names map to [`KeyCode::Char`]. Matching is
    /// case-insensitive for named keys; `"Esc"` is accepted as an alias.
    #[must_use]
    pub fn from_key_name(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(KeyCode::Char(c));
        }
        let code = match name.to_ascii_lowercase().as_str() {
            "escape" | "esc" => KeyCode::Escape,
            "enter" | "return" => KeyCode::Enter,
            "backspace" => KeyCode::Backspace,
            "tab" => KeyCode::Tab,
            "delete" | "del" => KeyCode::Delete,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "arrowup" | "up" => KeyCode::Up,
            "arrowdown" | "down" => KeyCode::Down,
            "arrowleft" | "left" => KeyCode::Left,
            "arrowright" | "right" => KeyCode::Right,
            "space" => KeyCode::Char(' '),
            other => {
                let n = other.strip_prefix('f')?.parse::<u8>().ok()?;
                if (1..=24).contains(&n) {
                    KeyCode::F(n)
                } else {
                    return None;
                }
            }
        };
        Some(code)
    }
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during an input event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    /// The type of pointer event.
    pub kind: MouseEventKind,

    /// X coordinate (0-indexed).
    pub x: u16,

    /// Y coordinate (0-indexed).
    pub y: u16,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Create a new pointer event.
    #[must_use]
    pub const fn new(kind: MouseEventKind, x: u16, y: u16) -> Self {
        Self {
            kind,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    /// Shorthand for a primary-button press at `(x, y)`.
    #[must_use]
    pub const fn click(x: u16, y: u16) -> Self {
        Self::new(MouseEventKind::Down(MouseButton::Left), x, y)
    }

    /// Create a pointer event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Get the position as a tuple.
    #[must_use]
    pub const fn position(&self) -> (u16, u16) {
        (self.x, self.y)
    }
}

/// The type of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// Button pressed down.
    Down(MouseButton),

    /// Button released.
    Up(MouseButton),

    /// Pointer dragged while a button is held.
    Drag(MouseButton),

    /// Pointer moved (no button pressed).
    Moved,

    /// Wheel scrolled up.
    ScrollUp,

    /// Wheel scrolled down.
    ScrollDown,
}

/// Pointer button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button.
    Left,

    /// Secondary button.
    Right,

    /// Middle button (wheel click).
    Middle,
}

/// Text pasted into the focused element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    /// The pasted text content.
    pub text: String,
}

impl PasteEvent {
    /// Create a new paste event.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn map_crossterm_event_internal(event: cte::Event) -> Option<Event> {
    match event {
        cte::Event::Key(key) => map_key_event(key).map(Event::Key),
        cte::Event::Mouse(mouse) => map_mouse_event(mouse).map(Event::Mouse),
        cte::Event::Paste(text) => Some(Event::Paste(PasteEvent::new(text))),
        cte::Event::FocusGained => Some(Event::Focus(true)),
        cte::Event::FocusLost => Some(Event::Focus(false)),
        cte::Event::Resize(..) => None,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn map_key_event(event: cte::KeyEvent) -> Option<KeyEvent> {
    let code = map_key_code(event.code)?;
    let kind = match event.kind {
        cte::KeyEventKind::Press => KeyEventKind::Press,
        cte::KeyEventKind::Repeat => KeyEventKind::Repeat,
        cte::KeyEventKind::Release => KeyEventKind::Release,
    };
    Some(KeyEvent {
        code,
        modifiers: map_modifiers(event.modifiers),
        kind,
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn map_key_code(code: cte::KeyCode) -> Option<KeyCode> {
    match code {
        cte::KeyCode::Backspace => Some(KeyCode::Backspace),
        cte::KeyCode::Enter => Some(KeyCode::Enter),
        cte::KeyCode::Left => Some(KeyCode::Left),
        cte::KeyCode::Right => Some(KeyCode::Right),
        cte::KeyCode::Up => Some(KeyCode::Up),
        cte::KeyCode::Down => Some(KeyCode::Down),
        cte::KeyCode::Home => Some(KeyCode::Home),
        cte::KeyCode::End => Some(KeyCode::End),
        cte::KeyCode::Tab => Some(KeyCode::Tab),
        cte::KeyCode::BackTab => Some(KeyCode::BackTab),
        cte::KeyCode::Delete => Some(KeyCode::Delete),
        cte::KeyCode::F(n) => Some(KeyCode::F(n)),
        cte::KeyCode::Char(c) => Some(KeyCode::Char(c)),
        cte::KeyCode::Esc => Some(KeyCode::Escape),
        _ => None,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn map_modifiers(modifiers: cte::KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(cte::KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(cte::KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(cte::KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.intersects(
        cte::KeyModifiers::SUPER | cte::KeyModifiers::HYPER | cte::KeyModifiers::META,
    ) {
        mapped |= Modifiers::SUPER;
    }
    mapped
}

#[cfg(not(target_arch = "wasm32"))]
fn map_mouse_event(event: cte::MouseEvent) -> Option<MouseEvent> {
    let kind = match event.kind {
        cte::MouseEventKind::Down(button) => MouseEventKind::Down(map_mouse_button(button)),
        cte::MouseEventKind::Up(button) => MouseEventKind::Up(map_mouse_button(button)),
        cte::MouseEventKind::Drag(button) => MouseEventKind::Drag(map_mouse_button(button)),
        cte::MouseEventKind::Moved => MouseEventKind::Moved,
        cte::MouseEventKind::ScrollUp => MouseEventKind::ScrollUp,
        cte::MouseEventKind::ScrollDown => MouseEventKind::ScrollDown,
        // Horizontal scrolling has no use in this input model.
        cte::MouseEventKind::ScrollLeft | cte::MouseEventKind::ScrollRight => return None,
    };

    Some(
        MouseEvent::new(kind, event.column, event.row)
            .with_modifiers(map_modifiers(event.modifiers)),
    )
}

#[cfg(not(target_arch = "wasm32"))]
fn map_mouse_button(button: cte::MouseButton) -> MouseButton {
    match button {
        cte::MouseButton::Left => MouseButton::Left,
        cte::MouseButton::Right => MouseButton::Right,
        cte::MouseButton::Middle => MouseButton::Middle,
    }
}
