//! Splits decoded input text into atomic key tokens.
//!
//! A token is either one literal character or the longest escape sequence
//! the grammar accepts at that position. Alternatives are tried in a fixed
//! priority order:
//!
//! 1. mouse and focus reports (consumed, never yielded)
//! 2. function/cursor keys: `ESC+ (O|N|[|[[) ...`
//! 3. meta keys: `ESC` + one ASCII alphanumeric
//! 4. `ESC` + any single character except CR/LF
//! 5. a literal character (a trailing lone `ESC` included)

const ESC: u8 = 0x1b;

/// Function-key prefixes in the order they are tried.
const PREFIXES: [&[u8]; 4] = [b"O", b"N", b"[", b"[["];

/// Lazy iterator over the tokens of a string. Cloning restarts from the
/// clone point.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    input: &'a str,
    pos: usize,
}

/// Tokenize `input`. Mouse reports are filtered out.
pub fn tokenize(input: &str) -> Tokens<'_> {
    Tokens { input, pos: 0 }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let rest = &self.input[self.pos..];
            let first = rest.chars().next()?;
            let len = if first == '\x1b' {
                match scan_escape(rest) {
                    Scan::Report(len) => {
                        self.pos += len;
                        continue;
                    }
                    Scan::Token(len) => len,
                }
            } else {
                first.len_utf8()
            };
            self.pos += len;
            return Some(&rest[..len]);
        }
    }
}

impl std::iter::FusedIterator for Tokens<'_> {}

enum Scan {
    /// Mouse/focus report of this many bytes; dropped.
    Report(usize),
    /// Key token of this many bytes.
    Token(usize),
}

/// `s` starts with ESC.
fn scan_escape(s: &str) -> Scan {
    let b = s.as_bytes();
    if let Some(len) = mouse_report_len(b) {
        return Scan::Report(len);
    }
    if let Some(fk) = parse_function_key(b) {
        return if fk.mouse {
            Scan::Report(fk.len)
        } else {
            Scan::Token(fk.len)
        };
    }
    match s[1..].chars().next() {
        Some(c) if c.is_ascii_alphanumeric() => Scan::Token(2),
        Some(c) if c != '\n' && c != '\r' => Scan::Token(1 + c.len_utf8()),
        _ => Scan::Token(1),
    }
}

/// A function-key match anchored at the start of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FunctionKey {
    /// Bytes consumed, leading ESCs included.
    pub len: usize,
    /// Prefix + key number + terminator, e.g. `[15~`, `OP`, `[A`.
    pub code: String,
    /// xterm modifier parameter (1 = none).
    pub modifier: u16,
    /// X10 mouse report reached through the function-key prefix.
    pub mouse: bool,
}

/// Match `ESC+ (O|N|[|[[)` followed by one of
/// `digits(;digits)?(~|^|$)`, `M<button><x><y>` or `(1;)?digits?letter`.
pub(crate) fn parse_function_key(b: &[u8]) -> Option<FunctionKey> {
    let escs = b.iter().take_while(|&&x| x == ESC).count();
    if escs == 0 {
        return None;
    }
    let rest = &b[escs..];
    for prefix in PREFIXES {
        let Some(tail) = rest.strip_prefix(prefix) else {
            continue;
        };
        if let Some(body) = parse_body(tail) {
            let mut code = String::from_utf8_lossy(prefix).into_owned();
            code.push_str(&body.code);
            return Some(FunctionKey {
                len: escs + prefix.len() + body.len,
                code,
                modifier: body.modifier,
                mouse: body.mouse,
            });
        }
    }
    None
}

struct Body {
    len: usize,
    code: String,
    modifier: u16,
    mouse: bool,
}

fn parse_body(t: &[u8]) -> Option<Body> {
    numbered_key(t).or_else(|| x10_mouse(t)).or_else(|| lettered_key(t))
}

/// `digits(;digits)?(~|^|$)`
fn numbered_key(t: &[u8]) -> Option<Body> {
    let d1 = digit_run(t);
    if d1 == 0 {
        return None;
    }
    let after = &t[d1..];
    if after.first() == Some(&b';') {
        let d2 = digit_run(&after[1..]);
        if d2 > 0 {
            if let Some(&term) = after.get(1 + d2).filter(|b| is_terminator(**b)) {
                let mut code = ascii(&t[..d1]);
                code.push(char::from(term));
                return Some(Body {
                    len: d1 + 1 + d2 + 1,
                    code,
                    modifier: parse_number(&after[1..1 + d2]),
                    mouse: false,
                });
            }
        }
    }
    let term = *after.first().filter(|b| is_terminator(**b))?;
    let mut code = ascii(&t[..d1]);
    code.push(char::from(term));
    Some(Body {
        len: d1 + 1,
        code,
        modifier: 1,
        mouse: false,
    })
}

/// `M` + button byte + two coordinate characters.
fn x10_mouse(t: &[u8]) -> Option<Body> {
    if t.first() != Some(&b'M') || !t.get(1).is_some_and(|b| b"@ #!a`".contains(b)) {
        return None;
    }
    let x = line_char_len(t, 2)?;
    let y = line_char_len(t, 2 + x)?;
    Some(Body {
        len: 2 + x + y,
        code: String::new(),
        modifier: 1,
        mouse: true,
    })
}

/// `(1;)?digits?letter`
fn lettered_key(t: &[u8]) -> Option<Body> {
    let skip = if t.starts_with(b"1;") { 2 } else { 0 };
    let digits = digit_run(&t[skip..]);
    let letter = *t.get(skip + digits).filter(|b| b.is_ascii_alphabetic())?;
    let modifier = if digits > 0 {
        parse_number(&t[skip..skip + digits])
    } else {
        1
    };
    Some(Body {
        len: skip + digits + 1,
        code: char::from(letter).to_string(),
        modifier,
        mouse: false,
    })
}

/// Length of a mouse or focus report at the start of `b`, if any.
///
/// Recognised: X10 `ESC[M` + 3 chars, SGR `ESC[<b;x;y(M|m)`, urxvt
/// `ESC[b;x;yM`, DEC locator `ESC[<a;b;c;d&w`, vt300
/// `ESC[24(0|1|3|5)~[x,y]\r`, focus `ESC[I` / `ESC[O`.
fn mouse_report_len(b: &[u8]) -> Option<usize> {
    let t = b.strip_prefix(b"\x1b[")?;
    match t.first()? {
        b'I' | b'O' => return Some(3),
        b'M' => {
            // Truncated X10 reports are swallowed up to the end of input.
            let mut len = 3;
            for _ in 0..3 {
                match char_len(b, len) {
                    Some(n) => len += n,
                    None => break,
                }
            }
            return Some(len);
        }
        _ => {}
    }
    if let Some(sgr) = t.strip_prefix(b"<") {
        if let Some(n) = number_list(sgr, b';', 3) {
            if matches!(sgr.get(n), Some(b'M' | b'm')) {
                return Some(3 + n + 1);
            }
        }
        if let Some(n) = number_list(sgr, b';', 4) {
            if sgr[n..].starts_with(b"&w") {
                return Some(3 + n + 2);
            }
        }
        return None;
    }
    if let Some(n) = number_list(t, b';', 3) {
        if t.get(n) == Some(&b'M') {
            return Some(2 + n + 1);
        }
    }
    if t.starts_with(b"24") && matches!(t.get(2), Some(b'0' | b'1' | b'3' | b'5')) {
        let coords = t[3..].strip_prefix(b"~[")?;
        let n = number_list(coords, b',', 2)?;
        if coords[n..].starts_with(b"]\r") {
            return Some(2 + 3 + 2 + n + 2);
        }
    }
    None
}

/// Exactly `count` digit runs separated by `sep`; returns bytes consumed.
fn number_list(b: &[u8], sep: u8, count: usize) -> Option<usize> {
    let mut pos = 0;
    for i in 0..count {
        if i > 0 {
            if b.get(pos) != Some(&sep) {
                return None;
            }
            pos += 1;
        }
        let run = digit_run(&b[pos..]);
        if run == 0 {
            return None;
        }
        pos += run;
    }
    Some(pos)
}

fn digit_run(b: &[u8]) -> usize {
    b.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn parse_number(digits: &[u8]) -> u16 {
    digits.iter().fold(0u16, |acc, &b| {
        acc.saturating_mul(10).saturating_add(u16::from(b - b'0'))
    })
}

fn is_terminator(b: u8) -> bool {
    matches!(b, b'~' | b'^' | b'$')
}

fn ascii(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}

/// Byte length of the UTF-8 character starting at `b[i]`.
fn char_len(b: &[u8], i: usize) -> Option<usize> {
    let lead = *b.get(i)?;
    let len = match lead {
        0xf0..=0xf7 => 4,
        0xe0..=0xef => 3,
        0xc0..=0xdf => 2,
        _ => 1,
    };
    (i + len <= b.len()).then_some(len)
}

/// Like [`char_len`] but rejects CR and LF.
fn line_char_len(b: &[u8], i: usize) -> Option<usize> {
    match b.get(i)? {
        b'\n' | b'\r' => None,
        _ => char_len(b, i),
    }
}
