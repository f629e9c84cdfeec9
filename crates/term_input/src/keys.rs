//! Maps tokens to keypresses.

use crate::event::{KeyEvent, KeyName, Keypress};
use crate::tokenizer::parse_function_key;

/// Extra modifier implied by a table entry on top of the xterm parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Implied {
    None,
    Shift,
    Ctrl,
}

/// Function-key codes (prefix + number + terminator, modifier stripped).
///
/// Sources: xterm, gnome-terminal, rxvt, putty, Cygwin/libuv.
const FUNCTION_KEYS: &[(&str, KeyName, Implied)] = &[
    // xterm/gnome ESC O letter
    ("OP", KeyName::F(1), Implied::None),
    ("OQ", KeyName::F(2), Implied::None),
    ("OR", KeyName::F(3), Implied::None),
    ("OS", KeyName::F(4), Implied::None),
    // xterm/rxvt ESC [ number ~
    ("[11~", KeyName::F(1), Implied::None),
    ("[12~", KeyName::F(2), Implied::None),
    ("[13~", KeyName::F(3), Implied::None),
    ("[14~", KeyName::F(4), Implied::None),
    // Cygwin, libuv
    ("[[A", KeyName::F(1), Implied::None),
    ("[[B", KeyName::F(2), Implied::None),
    ("[[C", KeyName::F(3), Implied::None),
    ("[[D", KeyName::F(4), Implied::None),
    ("[[E", KeyName::F(5), Implied::None),
    ("[15~", KeyName::F(5), Implied::None),
    ("[17~", KeyName::F(6), Implied::None),
    ("[18~", KeyName::F(7), Implied::None),
    ("[19~", KeyName::F(8), Implied::None),
    ("[20~", KeyName::F(9), Implied::None),
    ("[21~", KeyName::F(10), Implied::None),
    ("[23~", KeyName::F(11), Implied::None),
    ("[24~", KeyName::F(12), Implied::None),
    // xterm ESC [ letter
    ("[A", KeyName::Up, Implied::None),
    ("[B", KeyName::Down, Implied::None),
    ("[C", KeyName::Right, Implied::None),
    ("[D", KeyName::Left, Implied::None),
    ("[E", KeyName::Clear, Implied::None),
    ("[F", KeyName::End, Implied::None),
    ("[H", KeyName::Home, Implied::None),
    // xterm/gnome ESC O letter
    ("OA", KeyName::Up, Implied::None),
    ("OB", KeyName::Down, Implied::None),
    ("OC", KeyName::Right, Implied::None),
    ("OD", KeyName::Left, Implied::None),
    ("OE", KeyName::Clear, Implied::None),
    ("OF", KeyName::End, Implied::None),
    ("OH", KeyName::Home, Implied::None),
    ("[1~", KeyName::Home, Implied::None),
    ("[2~", KeyName::Insert, Implied::None),
    ("[3~", KeyName::Delete, Implied::None),
    ("[4~", KeyName::End, Implied::None),
    ("[5~", KeyName::PageUp, Implied::None),
    ("[6~", KeyName::PageDown, Implied::None),
    // putty
    ("[[5~", KeyName::PageUp, Implied::None),
    ("[[6~", KeyName::PageDown, Implied::None),
    // rxvt
    ("[7~", KeyName::Home, Implied::None),
    ("[8~", KeyName::End, Implied::None),
    ("[a", KeyName::Up, Implied::Shift),
    ("[b", KeyName::Down, Implied::Shift),
    ("[c", KeyName::Right, Implied::Shift),
    ("[d", KeyName::Left, Implied::Shift),
    ("[e", KeyName::Clear, Implied::Shift),
    ("[2$", KeyName::Insert, Implied::Shift),
    ("[3$", KeyName::Delete, Implied::Shift),
    ("[5$", KeyName::PageUp, Implied::Shift),
    ("[6$", KeyName::PageDown, Implied::Shift),
    ("[7$", KeyName::Home, Implied::Shift),
    ("[8$", KeyName::End, Implied::Shift),
    ("Oa", KeyName::Up, Implied::Ctrl),
    ("Ob", KeyName::Down, Implied::Ctrl),
    ("Oc", KeyName::Right, Implied::Ctrl),
    ("Od", KeyName::Left, Implied::Ctrl),
    ("Oe", KeyName::Clear, Implied::Ctrl),
    ("[2^", KeyName::Insert, Implied::Ctrl),
    ("[3^", KeyName::Delete, Implied::Ctrl),
    ("[5^", KeyName::PageUp, Implied::Ctrl),
    ("[6^", KeyName::PageDown, Implied::Ctrl),
    ("[7^", KeyName::Home, Implied::Ctrl),
    ("[8^", KeyName::End, Implied::Ctrl),
    ("[Z", KeyName::Tab, Implied::Shift),
];

/// Classify one token from [`crate::tokenizer::tokenize`].
///
/// A nonempty token always yields a character, a key, or both.
pub fn classify(token: &str) -> Keypress {
    Keypress {
        ch: single_char(token),
        key: key_event(token),
    }
}

fn key_event(s: &str) -> Option<KeyEvent> {
    let named = |name| Some(KeyEvent::new(s, name));
    let meta = |name| {
        let mut key = KeyEvent::new(s, name);
        key.meta = true;
        Some(key)
    };
    match s {
        "\r" => return named(KeyName::Return),
        "\n" => return named(KeyName::Enter),
        "\t" => return named(KeyName::Tab),
        "\x08" | "\x7f" => return named(KeyName::Backspace),
        "\x1b\x08" | "\x1b\x7f" => return meta(KeyName::Backspace),
        "\x1b" => return named(KeyName::Escape),
        "\x1b\x1b" => return meta(KeyName::Escape),
        " " => return named(KeyName::Space),
        "\x1b " => return meta(KeyName::Space),
        _ => {}
    }

    if let Some(c) = single_char(s) {
        return plain_char(s, c);
    }

    let after_esc = s.strip_prefix('\x1b').and_then(single_char);
    if let Some(c) = after_esc.filter(char::is_ascii_alphanumeric) {
        let mut key = KeyEvent::new(s, KeyName::Char(c.to_ascii_lowercase()));
        key.meta = true;
        key.shift = c.is_ascii_uppercase();
        return Some(key);
    }

    if let Some(fk) = parse_function_key(s.as_bytes()).filter(|fk| fk.len == s.len() && !fk.mouse) {
        let bits = fk.modifier.saturating_sub(1);
        let mut key = KeyEvent::new(s, KeyName::Undefined);
        key.ctrl = bits & 4 != 0;
        key.meta = bits & 10 != 0;
        key.shift = bits & 1 != 0;
        if let Some(&(_, name, implied)) = FUNCTION_KEYS.iter().find(|(code, ..)| *code == fk.code) {
            key.name = name;
            match implied {
                Implied::Shift => key.shift = true,
                Implied::Ctrl => key.ctrl = true,
                Implied::None => {}
            }
        }
        key.code = Some(fk.code);
        return Some(key);
    }

    // ESC + anything else: meta applied to whatever the trailing char is.
    let c = after_esc?;
    let inner = &s[1..];
    let mut key = key_event(inner).unwrap_or_else(|| KeyEvent::new(inner, KeyName::Char(c)));
    key.sequence = s.to_string();
    key.meta = true;
    Some(key)
}

fn plain_char(s: &str, c: char) -> Option<KeyEvent> {
    let key = match c {
        '\0'..='\x1a' => {
            let mut key = KeyEvent::new(s, KeyName::Char(char::from(b'a' - 1 + c as u8)));
            key.ctrl = true;
            key
        }
        'a'..='z' => KeyEvent::new(s, KeyName::Char(c)),
        'A'..='Z' => {
            let mut key = KeyEvent::new(s, KeyName::Char(c.to_ascii_lowercase()));
            key.shift = true;
            key
        }
        _ => return None,
    };
    Some(key)
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
