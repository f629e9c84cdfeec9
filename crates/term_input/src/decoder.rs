use std::mem;

use tokio::time::Instant;
use tracing::debug;

use crate::config::DecoderConfig;
use crate::emitter::{Emitter, InputListener};
use crate::event::InputEvent;
use crate::keys::classify;
use crate::paste::{PasteMachine, Segment};
use crate::tokenizer::tokenize;

/// Keypress decoder for one input source. Pure state machine, no I/O.
///
/// Feed raw chunks via [`feed`](Self::feed); every decoded event is handed
/// to the registered listeners and returned in order. While a paste is being
/// buffered, call [`expire`](Self::expire) once
/// [`paste_deadline`](Self::paste_deadline) has passed (the
/// [`crate::driver`] does this for you).
#[derive(Debug)]
pub struct KeypressDecoder {
    config: DecoderConfig,
    /// Incomplete UTF-8 sequence from the end of the last chunk.
    utf8_carry: Vec<u8>,
    paste: PasteMachine,
    emitter: Emitter,
}

impl KeypressDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            utf8_carry: Vec::with_capacity(4),
            paste: PasteMachine::default(),
            emitter: Emitter::new(),
        }
    }

    pub fn with_listener(mut self, listener: impl InputListener + 'static) -> Self {
        self.add_listener(listener);
        self
    }

    pub fn add_listener(&mut self, listener: impl InputListener + 'static) {
        self.emitter.add(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.emitter.len()
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Replace the configuration. A held partial marker survives. Turning
    /// paste support off mid-paste replays the buffered text, then any bytes
    /// held with it, as keypresses.
    pub fn set_config(&mut self, config: DecoderConfig) -> Vec<InputEvent> {
        let replay = if config.paste_enabled {
            None
        } else {
            self.paste.cancel()
        };
        self.config = config;
        match replay {
            Some(text) => {
                debug!(size = text.len(), "paste disabled mid-paste, replaying buffered input");
                let events = key_events(&text).collect();
                self.dispatch(events)
            }
            None => Vec::new(),
        }
    }

    /// Decode one raw chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<InputEvent> {
        self.feed_at(chunk, Instant::now())
    }

    /// [`feed`](Self::feed) with an explicit arrival time.
    ///
    /// A paste whose deadline has passed by `now` times out before the chunk
    /// is looked at, so a late end marker cannot complete it.
    pub fn feed_at(&mut self, chunk: &[u8], now: Instant) -> Vec<InputEvent> {
        let mut events: Vec<InputEvent> = self.paste.expire(now).into_iter().collect();
        let text = match chunk {
            [byte] if *byte >= 0x80 && self.utf8_carry.is_empty() && !self.paste.is_buffering() => {
                eight_bit_meta(*byte)
            }
            _ => self.decode_utf8(chunk),
        };
        for segment in self.paste.feed(&text, &self.config, now) {
            match segment {
                Segment::Keys(keys) => events.extend(key_events(&keys)),
                Segment::Event(event) => events.push(event),
            }
        }
        self.dispatch(events)
    }

    /// Fire the paste timeout if `now` is at or past the deadline.
    pub fn expire(&mut self, now: Instant) -> Vec<InputEvent> {
        let events = self.paste.expire(now).into_iter().collect();
        self.dispatch(events)
    }

    /// When the in-progress paste times out, if one is in progress.
    pub fn paste_deadline(&self) -> Option<Instant> {
        self.paste.deadline()
    }

    pub fn is_buffering(&self) -> bool {
        self.paste.is_buffering()
    }

    /// Whether bytes are being held for the next chunk.
    pub fn has_partial(&self) -> bool {
        self.paste.has_partial()
    }

    /// Release a held partial marker as ordinary keys. Does nothing while a
    /// paste is being buffered.
    pub fn flush(&mut self) -> Vec<InputEvent> {
        if self.paste.is_buffering() {
            return Vec::new();
        }
        let partial = self.paste.take_partial();
        let events = key_events(&partial).collect();
        self.dispatch(events)
    }

    /// Tear down: cancel the paste timer and clear all held state.
    pub fn close(&mut self) {
        self.paste.reset();
        self.utf8_carry.clear();
    }

    fn dispatch(&mut self, events: Vec<InputEvent>) -> Vec<InputEvent> {
        for event in &events {
            self.emitter.emit(event);
        }
        events
    }

    /// Lossy UTF-8 decoding that carries an incomplete trailing sequence
    /// over to the next chunk.
    fn decode_utf8(&mut self, chunk: &[u8]) -> String {
        let mut bytes = mem::take(&mut self.utf8_carry);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut rest = &bytes[..];
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            self.utf8_carry = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }
}

impl Default for KeypressDecoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl Drop for KeypressDecoder {
    fn drop(&mut self) {
        self.close();
    }
}

/// A lone high byte from a terminal sending meta as the eighth bit:
/// `ESC` followed by the byte with that bit cleared.
fn eight_bit_meta(byte: u8) -> String {
    let mut text = String::from("\x1b");
    text.push(char::from(byte - 0x80));
    text
}

fn key_events(text: &str) -> impl Iterator<Item = InputEvent> + '_ {
    tokenize(text).map(|token| InputEvent::Keypress(classify(token)))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::event::{KeyName, Keypress};

    fn names(events: &[InputEvent]) -> Vec<String> {
        events
            .iter()
            .map(|event| match event {
                InputEvent::Keypress(Keypress { key: Some(key), .. }) => key.name.to_string(),
                InputEvent::Keypress(Keypress { ch: Some(ch), .. }) => ch.to_string(),
                other => other.kind().to_string(),
            })
            .collect()
    }

    #[test]
    fn lone_escape_is_delivered_immediately() {
        let mut d = KeypressDecoder::new(DecoderConfig::bracketed_paste());
        let events = d.feed(b"\x1b");
        assert_eq!(names(&events), vec!["escape"]);
        assert!(!d.has_partial());
    }

    #[test]
    fn escape_then_bracket_split_is_two_keys() {
        let mut d = KeypressDecoder::default();
        assert_eq!(names(&d.feed(b"\x1b")), vec!["escape"]);
        assert_eq!(names(&d.feed(b"[A")), vec!["[", "a"]);
    }

    #[test]
    fn utf8_split_across_chunks() {
        let mut d = KeypressDecoder::default();
        let bytes = "世".as_bytes();
        assert!(d.feed(&bytes[..2]).is_empty());
        let events = d.feed(&bytes[2..]);
        assert_eq!(
            events,
            vec![InputEvent::Keypress(Keypress { ch: Some('世'), key: None })]
        );
    }

    #[test]
    fn utf8_split_byte_by_byte_inside_paste() {
        let mut d = KeypressDecoder::new(DecoderConfig::bracketed_paste());
        let mut events = d.feed(b"\x1b[200~");
        for byte in "世".as_bytes() {
            events.extend(d.feed(std::slice::from_ref(byte)));
        }
        events.extend(d.feed(b"\x1b[201~"));
        assert_eq!(
            events,
            vec![InputEvent::Paste {
                content: "世".to_string()
            }]
        );
    }

    #[test]
    fn lone_high_byte_is_meta_key() {
        let mut d = KeypressDecoder::default();
        let events = d.feed(&[0xe1]);
        match &events[..] {
            [InputEvent::Keypress(Keypress { key: Some(key), ch: None })] => {
                assert_eq!(key.name, KeyName::Char('a'));
                assert!(key.meta);
                assert_eq!(key.sequence, "\x1ba");
            }
            other => panic!("unexpected events: {other:?}"),
        }
        assert_eq!(names(&d.feed(b"x")), vec!["x"]);
    }

    #[test]
    fn late_chunk_cannot_finish_expired_paste() {
        let mut d = KeypressDecoder::new(DecoderConfig::bracketed_paste().with_paste_timeout_ms(50));
        let start = Instant::now();
        d.feed_at(b"\x1b[200~abc", start);
        let events = d.feed_at(b"d\x1b[201~", start + Duration::from_millis(60));
        assert_eq!(names(&events), vec!["paste-timeout", "d"]);
        match &events[0] {
            InputEvent::PasteTimeout(timeout) => assert_eq!(timeout.buffer, "abc"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn disabling_mid_paste_replays_held_escape() {
        let mut d = KeypressDecoder::new(DecoderConfig::bracketed_paste());
        assert!(d.feed(b"\x1b[200~ab\x1b").is_empty());
        let replayed = d.set_config(DecoderConfig::default());
        assert_eq!(names(&replayed), vec!["a", "b", "escape"]);
        assert!(!d.has_partial());
        assert!(!d.is_buffering());
    }

    #[test]
    fn invalid_utf8_becomes_replacement_char() {
        let mut d = KeypressDecoder::default();
        let events = d.feed(&[0xff, b'a']);
        assert_eq!(names(&events), vec!["\u{FFFD}", "a"]);
    }

    #[test]
    fn flush_releases_held_marker_prefix() {
        let mut d = KeypressDecoder::new(DecoderConfig::bracketed_paste());
        assert!(d.feed(b"\x1b[2").is_empty());
        assert!(d.has_partial());
        let events = d.flush();
        assert_eq!(names(&events), vec!["[", "2"]);
        assert!(!d.has_partial());
        assert!(d.flush().is_empty());
    }

    #[test]
    fn expire_fires_once() {
        let mut d = KeypressDecoder::new(DecoderConfig::bracketed_paste().with_paste_timeout_ms(50));
        let start = Instant::now();
        d.feed_at(b"\x1b[200~abc", start);
        assert_eq!(d.paste_deadline(), Some(start + Duration::from_millis(50)));
        assert!(d.expire(start + Duration::from_millis(10)).is_empty());
        assert_eq!(names(&d.expire(start + Duration::from_millis(50))), vec!["paste-timeout"]);
        assert!(d.expire(start + Duration::from_millis(500)).is_empty());
        assert_eq!(d.paste_deadline(), None);
    }

    #[test]
    fn set_config_keeps_partial_sequence() {
        let mut d = KeypressDecoder::new(DecoderConfig::bracketed_paste());
        d.feed(b"\x1b[20");
        assert!(d.set_config(DecoderConfig::bracketed_paste().with_max_paste_bytes(64)).is_empty());
        assert!(d.has_partial());
        let events = d.feed(b"0~hi\x1b[201~");
        assert_eq!(
            events,
            vec![InputEvent::Paste {
                content: "hi".to_string()
            }]
        );
    }

    #[test]
    fn close_clears_everything() {
        let mut d = KeypressDecoder::new(DecoderConfig::bracketed_paste());
        d.feed(b"\x1b[200~abc\x1b[20");
        d.close();
        assert!(!d.is_buffering());
        assert!(!d.has_partial());
        assert_eq!(d.paste_deadline(), None);
        assert_eq!(names(&d.feed(b"q")), vec!["q"]);
    }

    #[test]
    fn undefined_key_for_stray_marker_when_not_stripping() {
        let mut d = KeypressDecoder::new(DecoderConfig::bracketed_paste().with_strip_unmatched_markers(false));
        let events = d.feed(b"\x1b[201~");
        match &events[..] {
            [InputEvent::Keypress(Keypress { key: Some(key), ch: None })] => {
                assert_eq!(key.name, KeyName::Undefined);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }
}
