use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// A decoded terminal input event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InputEvent {
    /// One token of ordinary (non-paste) input.
    Keypress(Keypress),
    /// Bracketed paste content (text between ESC[200~ and ESC[201~).
    Paste { content: String },
    /// A paste grew past `max_paste_bytes` and was discarded.
    PasteOverflow(PasteOverflow),
    /// A paste start marker was never followed by an end marker in time.
    PasteTimeout(PasteTimeout),
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::Keypress(_) => EventKind::Keypress,
            InputEvent::Paste { .. } => EventKind::Paste,
            InputEvent::PasteOverflow(_) => EventKind::PasteOverflow,
            InputEvent::PasteTimeout(_) => EventKind::PasteTimeout,
        }
    }
}

/// Discriminant of [`InputEvent`], used for listener bookkeeping and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Keypress,
    Paste,
    PasteOverflow,
    PasteTimeout,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::Keypress => "keypress",
            EventKind::Paste => "paste",
            EventKind::PasteOverflow => "paste-overflow",
            EventKind::PasteTimeout => "paste-timeout",
        })
    }
}

/// Result of classifying a single token.
///
/// `ch` is set when the token is exactly one character, `key` when the token
/// has a name. At least one of the two is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keypress {
    pub ch: Option<char>,
    pub key: Option<KeyEvent>,
}

/// A named key with its modifiers and the bytes it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyEvent {
    /// Token text exactly as received.
    pub sequence: String,
    pub name: KeyName,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    /// Escape code with leading ESCs, modifier and `1;` stripped (e.g. `[A`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl KeyEvent {
    pub(crate) fn new(sequence: &str, name: KeyName) -> Self {
        Self {
            sequence: sequence.to_string(),
            name,
            ctrl: false,
            meta: false,
            shift: false,
            code: None,
        }
    }
}

/// Canonical key name.
///
/// `Display` renders the lowercase names terminal applications match on:
/// `"return"`, `"up"`, `"f5"`, `"pagedown"`, a letter, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyName {
    Return,
    Enter,
    Tab,
    Backspace,
    Escape,
    Space,
    /// Letter, digit, or other character named after itself.
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Clear,
    Home,
    End,
    Insert,
    Delete,
    PageUp,
    PageDown,
    /// Function key F1–F12.
    F(u8),
    /// Well-formed function-key sequence with no table entry.
    Undefined,
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyName::Char(c) => return write!(f, "{c}"),
            KeyName::F(n) => return write!(f, "f{n}"),
            KeyName::Return => "return",
            KeyName::Enter => "enter",
            KeyName::Tab => "tab",
            KeyName::Backspace => "backspace",
            KeyName::Escape => "escape",
            KeyName::Space => "space",
            KeyName::Up => "up",
            KeyName::Down => "down",
            KeyName::Left => "left",
            KeyName::Right => "right",
            KeyName::Clear => "clear",
            KeyName::Home => "home",
            KeyName::End => "end",
            KeyName::Insert => "insert",
            KeyName::Delete => "delete",
            KeyName::PageUp => "pageup",
            KeyName::PageDown => "pagedown",
            KeyName::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

impl Serialize for KeyName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Payload of [`InputEvent::PasteOverflow`]. Sizes are UTF-8 byte counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasteOverflow {
    pub current_size: usize,
    pub attempted_size: usize,
    pub max_size: usize,
}

/// Payload of [`InputEvent::PasteTimeout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasteTimeout {
    /// Everything buffered since the start marker.
    pub buffer: String,
    pub size: usize,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_render_canonically() {
        assert_eq!(KeyName::PageDown.to_string(), "pagedown");
        assert_eq!(KeyName::F(12).to_string(), "f12");
        assert_eq!(KeyName::Char('q').to_string(), "q");
        assert_eq!(KeyName::Undefined.to_string(), "undefined");
    }

    #[test]
    fn event_kind_matches_variant() {
        let event = InputEvent::Paste {
            content: "x".to_string(),
        };
        assert_eq!(event.kind(), EventKind::Paste);
        assert_eq!(event.kind().to_string(), "paste");
    }
}
