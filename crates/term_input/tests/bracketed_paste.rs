//! End-to-end decoding through the public `KeypressDecoder` API.

use std::sync::Arc;

use parking_lot::Mutex;
use term_input::{
    DecoderConfig, InputEvent, InputListener, KeyName, KeypressDecoder, ListenerResult,
    PasteOverflow,
};

const PASTE: &[u8] = b"\x1b[200~hello\x1b[31mred\x1b[0m\x1b[201~";

fn decoder() -> KeypressDecoder {
    KeypressDecoder::new(DecoderConfig::bracketed_paste())
}

fn paste(content: &str) -> InputEvent {
    InputEvent::Paste {
        content: content.to_string(),
    }
}

fn feed_all(decoder: &mut KeypressDecoder, chunks: &[&[u8]]) -> Vec<InputEvent> {
    chunks.iter().flat_map(|chunk| decoder.feed(chunk)).collect()
}

fn key_name(event: &InputEvent) -> Option<KeyName> {
    match event {
        InputEvent::Keypress(press) => press.key.as_ref().map(|key| key.name),
        _ => None,
    }
}

/// Splits right after the leading `ESC` or `ESC[` of the start marker are
/// delivered as keys, so they are left out.
fn splittable(i: usize) -> bool {
    i != 1 && i != 2
}

// -- chunking ------------------------------------------------------------------

#[test]
fn paste_survives_every_two_way_split() {
    for i in (1..PASTE.len()).filter(|&i| splittable(i)) {
        let mut d = decoder();
        let events = feed_all(&mut d, &[&PASTE[..i], &PASTE[i..]]);
        assert_eq!(events, vec![paste("hello\x1b[31mred\x1b[0m")], "split at {i}");
        assert!(!d.is_buffering() && !d.has_partial(), "split at {i}");
    }
}

#[test]
fn paste_survives_every_three_way_split() {
    for i in (1..PASTE.len()).filter(|&i| splittable(i)) {
        for j in i + 1..PASTE.len() {
            let mut d = decoder();
            let events = feed_all(&mut d, &[&PASTE[..i], &PASTE[i..j], &PASTE[j..]]);
            assert_eq!(events, vec![paste("hello\x1b[31mred\x1b[0m")], "split at {i},{j}");
        }
    }
}

#[test]
fn paste_fed_byte_by_byte_after_marker_start() {
    let mut d = decoder();
    let mut events = d.feed(&PASTE[..3]);
    for byte in &PASTE[3..] {
        events.extend(d.feed(std::slice::from_ref(byte)));
    }
    assert_eq!(events, vec![paste("hello\x1b[31mred\x1b[0m")]);
}

#[test]
fn lone_escape_is_never_held() {
    let mut d = decoder();
    let events = d.feed(b"\x1b");
    assert_eq!(events.len(), 1);
    assert_eq!(key_name(&events[0]), Some(KeyName::Escape));
}

#[test]
fn arrow_key_is_not_mistaken_for_marker() {
    let mut d = decoder();
    let events = d.feed(b"\x1b[A\x1b[2~");
    let names: Vec<_> = events.iter().filter_map(key_name).collect();
    assert_eq!(names, vec![KeyName::Up, KeyName::Insert]);
}

// -- ordering ------------------------------------------------------------------

#[test]
fn keys_around_paste_keep_order() {
    let mut d = decoder();
    let events = d.feed(b"a\x1b[200~pasted\x1b[201~b");
    assert_eq!(events.len(), 3);
    assert_eq!(key_name(&events[0]), Some(KeyName::Char('a')));
    assert_eq!(events[1], paste("pasted"));
    assert_eq!(key_name(&events[2]), Some(KeyName::Char('b')));
}

// -- limits --------------------------------------------------------------------

#[test]
fn oversized_paste_overflows_then_recovers() {
    let mut d = KeypressDecoder::new(DecoderConfig::bracketed_paste().with_max_paste_bytes(100));
    let mut big = b"\x1b[200~".to_vec();
    big.extend(std::iter::repeat(b'x').take(150));
    big.extend_from_slice(b"\x1b[201~");

    let events = d.feed(&big);
    assert_eq!(
        events,
        vec![InputEvent::PasteOverflow(PasteOverflow {
            current_size: 0,
            attempted_size: 150,
            max_size: 100,
        })]
    );
    assert!(!d.is_buffering());

    assert_eq!(d.feed(b"\x1b[200~small\x1b[201~"), vec![paste("small")]);
}

#[test]
fn disabling_mid_paste_replays_as_keys() {
    let mut d = decoder();
    assert!(d.feed(b"\x1b[200~ab").is_empty());
    let replayed = d.set_config(DecoderConfig::default());
    let names: Vec<_> = replayed.iter().filter_map(key_name).collect();
    assert_eq!(names, vec![KeyName::Char('a'), KeyName::Char('b')]);
    assert!(!d.is_buffering());
    assert_eq!(d.paste_deadline(), None);
}

// -- content -------------------------------------------------------------------

#[test]
fn unicode_content_is_preserved() {
    let mut d = decoder();
    let events = d.feed("\x1b[200~Hello 👋 世界\nline2\x1b[201~".as_bytes());
    let [InputEvent::Paste { content }] = &events[..] else {
        panic!("expected one paste, got {events:?}");
    };
    assert_eq!(content, "Hello 👋 世界\nline2");
    assert_eq!(content.len(), 23);
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn emoji_split_inside_paste() {
    let bytes = "\x1b[200~👋\x1b[201~".as_bytes();
    let mut d = decoder();
    let events = feed_all(&mut d, &[&bytes[..8], &bytes[8..]]);
    assert_eq!(events, vec![paste("👋")]);
}

// -- listeners -----------------------------------------------------------------

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl InputListener for Recorder {
    fn on_paste(&mut self, content: &str) -> ListenerResult {
        self.0.lock().push(content.to_string());
        Ok(())
    }
}

struct Exploding;

impl InputListener for Exploding {
    fn on_paste(&mut self, _content: &str) -> ListenerResult {
        panic!("listener failure");
    }
}

#[test]
fn panicking_listener_is_isolated() {
    let recorder = Recorder::default();
    let mut d = decoder()
        .with_listener(Exploding)
        .with_listener(recorder.clone());

    let events = d.feed(b"\x1b[200~one\x1b[201~\x1b[200~two\x1b[201~");

    assert_eq!(events, vec![paste("one"), paste("two")]);
    assert_eq!(*recorder.0.lock(), vec!["one", "two"]);
    assert!(!d.is_buffering());
}
